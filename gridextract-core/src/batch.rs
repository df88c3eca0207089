//! Batch aggregation over a directory of simulation runs.
//!
//! Runs are discovered from the result files, processed in filename order
//! and the first failure aborts the whole batch.

use std::path::{Path, PathBuf};

use crate::config::RunConventions;
use crate::error::{ExtractError, Result};
use crate::extract::extract_record;
use crate::keymap::KeyMaps;
use crate::record::SimulationRecord;
use crate::run::RunIdentity;

/// Where run files come from.
///
/// [`DirectoryStore`] reads a pair of directories on disk; tests supply
/// in-memory fixtures.
pub trait RunStore {
    /// Names (not paths) of every result file ending with the result suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing itself fails.
    fn result_files(&self, conventions: &RunConventions) -> Result<Vec<String>>;

    /// Directory (or other location) the result files are listed from.
    fn results_root(&self) -> PathBuf;

    /// Full path of the run's input file.
    fn input_path(&self, run: &RunIdentity) -> PathBuf;

    /// Full path of the run's result file.
    fn result_path(&self, run: &RunIdentity) -> PathBuf;

    /// Read a whole file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Path`] if the file does not exist and
    /// [`ExtractError::Io`] for any other read failure.
    fn read(&self, path: &Path) -> Result<String>;
}

/// Input files and result files living in two directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    pub inputs_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(inputs_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs_dir: inputs_dir.into(),
            results_dir: results_dir.into(),
        }
    }
}

impl RunStore for DirectoryStore {
    fn result_files(&self, conventions: &RunConventions) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/*{}",
            glob::Pattern::escape(&self.results_dir.to_string_lossy()),
            glob::Pattern::escape(&conventions.result_suffix)
        );
        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..glob::MatchOptions::new()
        };
        let entries = glob::glob_with(&pattern, options)
            .map_err(|err| ExtractError::path(&self.results_dir, format!("bad pattern: {err}")))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| {
                let path = err.path().to_path_buf();
                ExtractError::io(path, err.into())
            })?;
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            } else {
                log::warn!("skipping non UTF-8 filename {}", path.display());
            }
        }
        Ok(names)
    }

    fn results_root(&self) -> PathBuf {
        self.results_dir.clone()
    }

    fn input_path(&self, run: &RunIdentity) -> PathBuf {
        self.inputs_dir.join(&run.input_file)
    }

    fn result_path(&self, run: &RunIdentity) -> PathBuf {
        self.results_dir.join(&run.result_file)
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ExtractError::path(path, "file not found")
            } else {
                ExtractError::io(path, err)
            }
        })
    }
}

/// Progress hooks for a whole extraction.
pub trait BatchObserver: Sync {
    /// Called once with every run that is about to be extracted.
    fn discovered(&self, _runs: &[RunIdentity]) {}

    /// Called after a run's record has been built.
    fn extracted(&self, _run: &RunIdentity) {}
}

impl BatchObserver for () {}

/// Knobs for [`BatchAggregator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Extract runs on the rayon thread pool. Record order is unchanged.
    pub parallel: bool,
}

/// Drives extraction across every run a [`RunStore`] exposes.
pub struct BatchAggregator<'a, S: RunStore> {
    store: &'a S,
    maps: &'a KeyMaps,
    conventions: &'a RunConventions,
    options: BatchOptions,
}

impl<'a, S: RunStore + Sync> BatchAggregator<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, maps: &'a KeyMaps, conventions: &'a RunConventions) -> Self {
        Self {
            store,
            maps,
            conventions,
            options: BatchOptions { parallel: false },
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// List the runs of the batch, sorted by result filename.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Path`] when no result file matches, before
    /// anything is extracted.
    pub fn discover(&self) -> Result<Vec<RunIdentity>> {
        let mut files = self.store.result_files(self.conventions)?;
        files.sort();
        if files.is_empty() {
            return Err(ExtractError::path(
                self.store.results_root(),
                format!("no *{} files found", self.conventions.result_suffix),
            ));
        }
        log::info!("discovered {} runs", files.len());
        Ok(files
            .iter()
            .map(|file| RunIdentity::from_result_filename(file, self.conventions))
            .collect())
    }

    /// Build one record per run, in the order of `runs`.
    ///
    /// `on_run` is called after each run is extracted; in parallel mode the
    /// calls arrive in completion order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing run in `runs` order.
    pub fn collect<F>(&self, runs: &[RunIdentity], on_run: F) -> Result<Vec<SimulationRecord>>
    where
        F: Fn(&RunIdentity) + Sync,
    {
        if self.options.parallel {
            return self.collect_parallel(runs, &on_run);
        }
        runs.iter()
            .map(|run| -> Result<SimulationRecord> {
                let record = self.process_run(run)?;
                on_run(run);
                Ok(record)
            })
            .collect()
    }

    /// Discover every run and extract its record.
    ///
    /// # Errors
    ///
    /// See [`BatchAggregator::discover`] and [`BatchAggregator::collect`].
    pub fn run<F>(&self, on_run: F) -> Result<Vec<SimulationRecord>>
    where
        F: Fn(&RunIdentity) + Sync,
    {
        let runs = self.discover()?;
        self.collect(&runs, on_run)
    }

    /// Read one run's file pair and extract its record.
    ///
    /// # Errors
    ///
    /// Returns the read error of either file or the first extraction error.
    pub fn process_run(&self, run: &RunIdentity) -> Result<SimulationRecord> {
        let input_path = self.store.input_path(run);
        let input = self.store.read(&input_path)?;
        let result_path = self.store.result_path(run);
        let result = self.store.read(&result_path)?;
        extract_record(
            &run.name,
            (input_path.as_path(), input.as_str()),
            (result_path.as_path(), result.as_str()),
            &self.maps.input_params,
            &self.maps.result_lines,
            self.conventions,
        )
    }

    #[cfg(feature = "parallel")]
    fn collect_parallel<F>(&self, runs: &[RunIdentity], on_run: &F) -> Result<Vec<SimulationRecord>>
    where
        F: Fn(&RunIdentity) + Sync,
    {
        use rayon::prelude::*;

        log::debug!("extracting {} runs in parallel", runs.len());
        let outcomes: Vec<Result<SimulationRecord>> = runs
            .par_iter()
            .map(|run| -> Result<SimulationRecord> {
                let record = self.process_run(run)?;
                on_run(run);
                Ok(record)
            })
            .collect();
        outcomes.into_iter().collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn collect_parallel<F>(&self, runs: &[RunIdentity], on_run: &F) -> Result<Vec<SimulationRecord>>
    where
        F: Fn(&RunIdentity) + Sync,
    {
        log::warn!("built without the `parallel` feature; extracting sequentially");
        let sequential = Self {
            options: BatchOptions { parallel: false },
            ..*self
        };
        sequential.collect(runs, on_run)
    }
}
