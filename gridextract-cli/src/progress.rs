use colored::Colorize;
use gridextract_core::{BatchObserver, GridSummary, RunIdentity};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Drives an indicatif bar from the batch callbacks.
pub struct RunProgress {
    bar: ProgressBar,
}

impl RunProgress {
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl BatchObserver for RunProgress {
    fn discovered(&self, runs: &[RunIdentity]) {
        self.bar
            .set_length(u64::try_from(runs.len()).unwrap_or(u64::MAX));
    }

    fn extracted(&self, run: &RunIdentity) {
        self.bar.set_message(run.name.clone());
        self.bar.inc(1);
    }
}

pub fn announce_banner() {
    println!("{}", "📈 gridextract".bright_cyan().bold());
    println!("{}", "==============".cyan());
}

pub fn write_summary(
    out: &mut dyn Write,
    summary: &GridSummary,
    elapsed: Duration,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Extraction Summary".bright_cyan().bold())?;
    writeln!(out, "Runs:    {}", summary.runs.to_string().green())?;
    writeln!(out, "Columns: {}", summary.columns.to_string().green())?;
    writeln!(out, "Output:  {}", summary.output.display())?;
    writeln!(out, "🏁 Total time: {elapsed:?}")?;
    Ok(())
}

pub fn write_run_list(out: &mut dyn Write, runs: &[RunIdentity]) -> std::io::Result<()> {
    writeln!(out, "Discovered runs:")?;
    for run in runs {
        writeln!(out, "  {:25} <- {}", run.input_file, run.result_file)?;
    }
    writeln!(out, "{} runs", runs.len())?;
    Ok(())
}
