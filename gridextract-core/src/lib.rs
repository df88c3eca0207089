//! gridextract core
//!
//! Pulls scalar values out of the per-run input (`<run>.in`) and result
//! (`<run>_s_20.stat`) files of a PDR model grid and aggregates them into a
//! single fixed-width `.dat` table, one row per run.
//! This crate has no CLI or terminal dependencies.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod keymap;
pub mod record;
pub mod run;
pub mod table;

use std::path::PathBuf;

// Re-export commonly used types
pub use batch::{BatchAggregator, BatchObserver, BatchOptions, DirectoryStore, RunStore};
pub use config::RunConventions;
pub use error::{ExtractError, Result, SourceKind};
pub use extract::{extract_input_parameters, extract_record, extract_result_values};
pub use keymap::{KeyEntry, KeyMapping, KeyMaps, load_input_params, load_result_lines};
pub use record::SimulationRecord;
pub use run::RunIdentity;
pub use table::{
    ParsedTable, TableLayout, format_scientific, format_value, parse_table, render_header,
    render_row, render_rows, write_table,
};

/// Every path and convention one extraction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridJob {
    pub inputs_dir: PathBuf,
    pub results_dir: PathBuf,
    pub output: PathBuf,
    pub input_params: PathBuf,
    pub result_lines: PathBuf,
    pub conventions: RunConventions,
    pub options: BatchOptions,
}

/// What a finished extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSummary {
    pub runs: usize,
    pub columns: usize,
    pub output: PathBuf,
}

impl GridJob {
    /// Run the whole pipeline: load key maps, extract every run, write the table.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage; nothing is written unless every
    /// run was extracted and formatted.
    pub fn execute<O: BatchObserver>(&self, observer: &O) -> Result<GridSummary> {
        let maps = KeyMaps::load(&self.input_params, &self.result_lines)?;
        let layout = TableLayout::from_maps(&maps)?;
        let store = DirectoryStore::new(&self.inputs_dir, &self.results_dir);
        let aggregator =
            BatchAggregator::new(&store, &maps, &self.conventions).with_options(self.options);
        let runs = aggregator.discover()?;
        observer.discovered(&runs);
        let records = aggregator.collect(&runs, |run| observer.extracted(run))?;
        write_table(&self.output, &layout, &records)?;
        Ok(GridSummary {
            runs: records.len(),
            columns: layout.len(),
            output: self.output.clone(),
        })
    }

    /// List the runs this job would process, without extracting anything.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Path`] if no result file matches.
    pub fn discover_runs(&self) -> Result<Vec<RunIdentity>> {
        let store = DirectoryStore::new(&self.inputs_dir, &self.results_dir);
        let maps = KeyMaps::default();
        BatchAggregator::new(&store, &maps, &self.conventions).discover()
    }
}
