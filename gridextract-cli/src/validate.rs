use gridextract_core::ExtractError;
use std::path::Path;

/// Extension the output table must carry.
pub const OUTPUT_EXTENSION: &str = "dat";

pub fn require_dir(path: &Path, label: &str) -> Result<(), ExtractError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ExtractError::Path {
            path: path.to_path_buf(),
            message: format!("{label} directory does not exist"),
        })
    }
}

pub fn require_file(path: &Path, label: &str) -> Result<(), ExtractError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ExtractError::Path {
            path: path.to_path_buf(),
            message: format!("{label} file does not exist"),
        })
    }
}

/// The output must be a `.dat` file whose parent directory exists.
pub fn require_output(path: &Path) -> Result<(), ExtractError> {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == OUTPUT_EXTENSION);
    if !has_extension {
        return Err(ExtractError::Path {
            path: path.to_path_buf(),
            message: format!("output file must have the .{OUTPUT_EXTENSION} extension"),
        });
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => require_dir(parent, "output"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_requires_dat_extension() {
        assert!(require_output(Path::new("grid.dat")).is_ok());
        assert!(require_output(Path::new("grid.csv")).is_err());
        assert!(require_output(Path::new("grid")).is_err());
    }

    #[test]
    fn output_parent_must_exist() {
        let err = require_output(Path::new("/no/such/dir/grid.dat")).unwrap_err();
        assert!(err.to_string().contains("output directory does not exist"));
    }

    #[test]
    fn missing_directory_is_path_error() {
        let err = require_dir(Path::new("/no/such/results"), "results").unwrap_err();
        assert!(matches!(err, ExtractError::Path { .. }));
        assert!(require_dir(&std::env::temp_dir(), "results").is_ok());
    }

    #[test]
    fn directory_is_not_a_file() {
        assert!(require_file(&std::env::temp_dir(), "input-params").is_err());
    }
}
