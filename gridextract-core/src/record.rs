//! One row of the output table.
use std::collections::BTreeMap;

/// Raw values extracted for a single simulation run, keyed by output column name.
///
/// Values stay as the text found in the files; they are parsed and
/// normalised only when the table is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationRecord {
    run: String,
    values: BTreeMap<String, String>,
}

impl SimulationRecord {
    /// Start an empty record for `run`.
    #[must_use]
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn run(&self) -> &str {
        &self.run
    }

    /// Store a value, replacing any previous value for the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(column.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
