//! Ordered key maps loaded from the CSV configuration files.
//!
//! Each map pairs a string to look for in a simulation file with the column
//! name it gets in the output table. Row order is column order.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Column holding the text searched for in the simulation files.
pub const SOURCE_COLUMN: &str = "name_in_file";
/// Display-name column of the input-parameter map.
pub const INPUT_PARAM_COLUMN: &str = "param_name";
/// Display-name column of the result-line map.
pub const RESULT_LINE_COLUMN: &str = "transition_name";

/// One `(source_key, output_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub source_key: String,
    pub output_name: String,
}

/// Ordered, immutable mapping from source key to output column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapping {
    entries: Vec<KeyEntry>,
}

impl KeyMapping {
    /// Build a mapping from pairs, rejecting repeated or empty source keys.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] naming `origin` on a repeated or empty key.
    pub fn from_pairs<I, K, V>(pairs: I, origin: &Path) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (key, name) in pairs {
            let source_key = key.into();
            if source_key.is_empty() {
                return Err(ExtractError::config(
                    origin,
                    format!("empty {SOURCE_COLUMN} on row {}", entries.len() + 1),
                ));
            }
            if !seen.insert(source_key.clone()) {
                return Err(ExtractError::config(
                    origin,
                    format!("duplicate {SOURCE_COLUMN} {source_key:?}"),
                ));
            }
            entries.push(KeyEntry {
                source_key,
                output_name: name.into(),
            });
        }
        Ok(Self { entries })
    }

    /// Read a mapping from CSV with a header row.
    ///
    /// `value_column` names the display-name column; any other columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if either column is missing, a row is
    /// malformed, or a source key repeats.
    pub fn from_csv_reader<R: Read>(reader: R, value_column: &str, origin: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| ExtractError::config(origin, err.to_string()))?
            .clone();
        let column_index = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| ExtractError::config(origin, format!("missing column {name:?}")))
        };
        let key_idx = column_index(SOURCE_COLUMN)?;
        let value_idx = column_index(value_column)?;

        let mut pairs = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|err| ExtractError::config(origin, err.to_string()))?;
            let cell = |idx: usize| {
                record.get(idx).map(str::to_string).ok_or_else(|| {
                    ExtractError::config(origin, format!("row {} is missing a cell", row + 1))
                })
            };
            pairs.push((cell(key_idx)?, cell(value_idx)?));
        }

        let mapping = Self::from_pairs(pairs, origin)?;
        log::debug!(
            "loaded {} keys ({SOURCE_COLUMN} -> {value_column}) from {}",
            mapping.len(),
            origin.display()
        );
        Ok(mapping)
    }

    /// Load a mapping from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if the file cannot be opened or parsed.
    pub fn load(path: &Path, value_column: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| ExtractError::config(path, format!("cannot open: {err}")))?;
        Self::from_csv_reader(file, value_column, path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries.iter()
    }

    /// Output column names in declaration order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.output_name.as_str())
    }
}

/// Load the input-parameter map (`name_in_file` -> `param_name`).
///
/// # Errors
///
/// See [`KeyMapping::load`].
pub fn load_input_params(path: &Path) -> Result<KeyMapping> {
    KeyMapping::load(path, INPUT_PARAM_COLUMN)
}

/// Load the result-line map (`name_in_file` -> `transition_name`).
///
/// # Errors
///
/// See [`KeyMapping::load`].
pub fn load_result_lines(path: &Path) -> Result<KeyMapping> {
    KeyMapping::load(path, RESULT_LINE_COLUMN)
}

/// Both maps needed to build one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMaps {
    pub input_params: KeyMapping,
    pub result_lines: KeyMapping,
}

impl KeyMaps {
    #[must_use]
    pub const fn new(input_params: KeyMapping, result_lines: KeyMapping) -> Self {
        Self {
            input_params,
            result_lines,
        }
    }

    /// Load both maps from their CSV files.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExtractError::Config`] encountered.
    pub fn load(input_params: &Path, result_lines: &Path) -> Result<Self> {
        Ok(Self::new(
            load_input_params(input_params)?,
            load_result_lines(result_lines)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("utils/input_params.csv")
    }

    #[test]
    fn preserves_row_order() {
        let csv = "name_in_file,param_name\nP0,gas_density\nG0,radm\nAv,avmax\n";
        let map = KeyMapping::from_csv_reader(csv.as_bytes(), INPUT_PARAM_COLUMN, origin()).unwrap();
        let names: Vec<_> = map.output_names().collect();
        assert_eq!(names, vec!["gas_density", "radm", "avmax"]);
        assert_eq!(map.iter().next().unwrap().source_key, "P0");
    }

    #[test]
    fn ignores_extra_columns_and_trims_cells() {
        let csv = "comment,transition_name,name_in_file\nx, CII158 , CII_158\n";
        let map = KeyMapping::from_csv_reader(csv.as_bytes(), RESULT_LINE_COLUMN, origin()).unwrap();
        let entry = map.iter().next().unwrap();
        assert_eq!(entry.source_key, "CII_158");
        assert_eq!(entry.output_name, "CII158");
    }

    #[test]
    fn missing_value_column_is_config_error() {
        let csv = "name_in_file,param_name\nP0,gas_density\n";
        let err =
            KeyMapping::from_csv_reader(csv.as_bytes(), RESULT_LINE_COLUMN, origin()).unwrap_err();
        match err {
            ExtractError::Config { reason, .. } => assert!(reason.contains("transition_name")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_key_column_is_config_error() {
        let csv = "key,param_name\nP0,gas_density\n";
        let err =
            KeyMapping::from_csv_reader(csv.as_bytes(), INPUT_PARAM_COLUMN, origin()).unwrap_err();
        assert!(matches!(err, ExtractError::Config { .. }));
    }

    #[test]
    fn duplicate_source_key_is_rejected() {
        let csv = "name_in_file,param_name\nP0,a\nP0,b\n";
        let err =
            KeyMapping::from_csv_reader(csv.as_bytes(), INPUT_PARAM_COLUMN, origin()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn header_only_gives_empty_mapping() {
        let map =
            KeyMapping::from_csv_reader("name_in_file,param_name\n".as_bytes(), INPUT_PARAM_COLUMN, origin())
                .unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn load_reports_unreadable_file_as_config_error() {
        let err = load_input_params(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ExtractError::Config { .. }));
    }
}
