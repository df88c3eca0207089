//! Run naming: pairing a result file with its input file.
use crate::config::RunConventions;

/// Identity of one simulation run, derived from its result filename.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunIdentity {
    /// Result filename with the result suffix (and anything after it) removed.
    pub name: String,
    /// Result filename as found in the results directory.
    pub result_file: String,
    /// Companion input filename, `<name><input_extension>`.
    pub input_file: String,
}

impl RunIdentity {
    /// Derive the run identity from a result filename.
    ///
    /// The name is cut at the first occurrence of the result suffix, so
    /// `run001_s_20.stat` becomes `run001` with input file `run001.in`.
    /// A filename without the suffix keeps its full text as the run name.
    #[must_use]
    pub fn from_result_filename(result_file: &str, conventions: &RunConventions) -> Self {
        let name = result_file
            .find(conventions.result_suffix.as_str())
            .map_or(result_file, |idx| &result_file[..idx]);
        Self {
            name: name.to_string(),
            result_file: result_file.to_string(),
            input_file: format!("{name}{}", conventions.input_extension),
        }
    }
}

impl std::fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
