mod progress;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use gridextract_core::{BatchOptions, GridJob, RunConventions, parse_table};
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use progress::{RunProgress, announce_banner, write_run_list, write_summary};
use validate::{require_dir, require_file, require_output};

#[derive(Debug, Parser)]
#[command(name = "gridextract", version)]
#[command(
    about = "Extract input parameters and line intensities from a PDR model grid into one .dat table"
)]
struct Args {
    /// Directory holding the `<run>_s_20.stat` result files
    #[arg(long, default_value = "./data/results")]
    results_dir: PathBuf,

    /// Directory holding the `<run>.in` input files
    #[arg(long, default_value = "./data/inputs")]
    inputs_dir: PathBuf,

    /// Output table (must end in .dat)
    #[arg(short, long, default_value = "grid.dat")]
    output: PathBuf,

    /// CSV mapping input-file keys to column names (`name_in_file,param_name`)
    #[arg(long, default_value = "./utils/input_params.csv")]
    input_params: PathBuf,

    /// CSV mapping result-line keys to column names (`name_in_file,transition_name`)
    #[arg(long, default_value = "./utils/lines_to_extract.csv")]
    result_lines: PathBuf,

    /// Optional JSON file overriding file suffixes and line separators
    #[arg(long)]
    conventions: Option<PathBuf>,

    /// Extract runs in parallel (row order is unchanged)
    #[arg(long)]
    parallel: bool,

    /// List the discovered runs and exit
    #[arg(long)]
    list_runs: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    validate_args(&args)?;
    let job = build_job(&args)?;

    if maybe_list_runs(&args, &job, &mut stdout().lock())? {
        return Ok(());
    }

    announce_banner();
    let start_time = Instant::now();
    let progress = RunProgress::new(!args.no_progress);
    let summary = job
        .execute(&progress)
        .with_context(|| format!("failed to build {}", args.output.display()))?;
    progress.finish();
    verify_output(&summary.output)?;

    let mut out = stdout().lock();
    write_summary(&mut out, &summary, start_time.elapsed())?;
    out.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

/// Check every declared path before any file is read.
fn validate_args(args: &Args) -> Result<()> {
    require_dir(&args.results_dir, "results")?;
    if args.list_runs {
        return Ok(());
    }
    require_dir(&args.inputs_dir, "inputs")?;
    require_file(&args.input_params, "input-params")?;
    require_file(&args.result_lines, "result-lines")?;
    require_output(&args.output)?;
    if let Some(path) = &args.conventions {
        require_file(path, "conventions")?;
    }
    Ok(())
}

fn build_job(args: &Args) -> Result<GridJob> {
    let conventions = match &args.conventions {
        Some(path) => RunConventions::load(path)
            .with_context(|| format!("failed to load conventions from {}", path.display()))?,
        None => RunConventions::default(),
    };
    log::debug!("using conventions {conventions:?}");

    Ok(GridJob {
        inputs_dir: args.inputs_dir.clone(),
        results_dir: args.results_dir.clone(),
        output: args.output.clone(),
        input_params: args.input_params.clone(),
        result_lines: args.result_lines.clone(),
        conventions,
        options: BatchOptions {
            parallel: args.parallel,
        },
    })
}

/// Re-read the written table and log its shape.
fn verify_output(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to re-read {}", path.display()))?;
    let table = parse_table(&text)
        .with_context(|| format!("{} is not a valid table", path.display()))?;
    log::info!(
        "verified {}: {} columns, {} rows",
        path.display(),
        table.columns.len(),
        table.rows.len()
    );
    Ok(())
}

fn maybe_list_runs(args: &Args, job: &GridJob, out: &mut dyn Write) -> Result<bool> {
    if !args.list_runs {
        return Ok(false);
    }
    let runs = job.discover_runs()?;
    write_run_list(out, &runs)?;
    out.flush()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gridextract-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir_all(dir.join("inputs")).unwrap();
        fs::create_dir_all(dir.join("results")).unwrap();
        fs::write(dir.join("params.csv"), "name_in_file,param_name\nP0,n_H\n").unwrap();
        fs::write(dir.join("lines.csv"), "name_in_file,transition_name\nCII_158,CII158\n")
            .unwrap();
        dir
    }

    fn args_for(root: &std::path::Path) -> Args {
        Args {
            results_dir: root.join("results"),
            inputs_dir: root.join("inputs"),
            output: root.join("grid.dat"),
            input_params: root.join("params.csv"),
            result_lines: root.join("lines.csv"),
            conventions: None,
            parallel: false,
            list_runs: false,
            no_progress: true,
            verbose: false,
        }
    }

    #[test]
    fn validate_accepts_complete_layout() {
        let root = temp_root("valid");
        assert!(validate_args(&args_for(&root)).is_ok());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn validate_rejects_wrong_output_extension() {
        let root = temp_root("ext");
        let args = Args {
            output: root.join("grid.txt"),
            ..args_for(&root)
        };
        let err = validate_args(&args).unwrap_err();
        assert!(err.to_string().contains(".dat"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn validate_rejects_missing_config() {
        let root = temp_root("config");
        let args = Args {
            result_lines: root.join("nope.csv"),
            ..args_for(&root)
        };
        let err = validate_args(&args).unwrap_err();
        assert!(err.to_string().contains("result-lines file does not exist"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn build_job_loads_conventions_file() {
        let root = temp_root("conv");
        let conv = root.join("conv.json");
        fs::write(&conv, r#"{ "result_suffix": "_s_30.stat" }"#).unwrap();
        let args = Args {
            conventions: Some(conv),
            parallel: true,
            ..args_for(&root)
        };
        let job = build_job(&args).unwrap();
        assert_eq!(job.conventions.result_suffix, "_s_30.stat");
        assert!(job.options.parallel);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn maybe_list_runs_writes_runs() {
        let root = temp_root("list");
        fs::write(root.join("results/m1_s_20.stat"), "").unwrap();
        let args = Args {
            list_runs: true,
            ..args_for(&root)
        };
        let job = build_job(&args).unwrap();
        let mut buffer = Vec::new();
        assert!(maybe_list_runs(&args, &job, &mut buffer).unwrap());
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("m1.in"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn verify_output_rejects_garbage() {
        let root = temp_root("verify");
        let path = root.join("grid.dat");
        fs::write(&path, "not a table\n").unwrap();
        assert!(verify_output(&path).is_err());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn maybe_list_runs_returns_false_when_disabled() {
        let root = temp_root("nolist");
        let args = args_for(&root);
        let job = build_job(&args).unwrap();
        let mut buffer = Vec::new();
        assert!(!maybe_list_runs(&args, &job, &mut buffer).unwrap());
        assert!(buffer.is_empty());
        let _ = fs::remove_dir_all(root);
    }
}
