// fusion_sim/src/cli.rs

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use log::info;

use crate::config::FusionConfig;
use crate::error::SimError;
use crate::log_reader::{collect_logs, read_log_file};
use crate::output::write_estimates_file;
use crate::runner::run_filter;
use crate::synthetic::{generate, write_log};

/// Fusion: radar/lidar tracking of a single object with a CTRV Unscented Kalman Filter.
///
/// This struct defines the command-line arguments of the `fusion_sim` binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file overriding the default filter and scenario parameters.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, global = true, default_value_t = false)]
    pub print_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the filter over a sensor log, or over every `.txt` log in a directory.
    Run {
        /// A log file or a directory of log files.
        input: PathBuf,

        /// Where to write estimates. A file for a single log, a directory otherwise.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic scenario and run the filter over it.
    Simulate {
        /// Where to write the estimates.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the generated measurements in the sensor log format.
        #[arg(long)]
        write_log: Option<PathBuf>,

        /// Override the scenario seed.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Executes the parsed command line.
pub fn execute(cli: &Cli) -> Result<(), SimError> {
    let mut config = FusionConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    match &cli.command {
        Some(Command::Run { input, output }) => run_logs(&config, input, output.as_deref()),
        Some(Command::Simulate {
            output,
            write_log: log_path,
            seed,
        }) => {
            if let Some(seed) = seed {
                config.scenario.seed = *seed;
            }
            simulate(&config, output.as_deref(), log_path.as_deref())
        }
        None => Cli::command()
            .print_help()
            .map_err(|e| SimError::io("<stdout>", e)),
    }
}

fn run_logs(config: &FusionConfig, input: &Path, output: Option<&Path>) -> Result<(), SimError> {
    let files = collect_logs(input)?;
    let batch = input.is_dir();
    info!("Processing {} log file(s) from {:?}", files.len(), input);

    for file in &files {
        let records = read_log_file(file)?;
        let report = run_filter(&config.filter, &records)?;
        report.log_summary(&file.display().to_string());

        if let Some(output) = output {
            let target = if batch {
                batch_output_path(input, output, file)
            } else {
                output.to_path_buf()
            };
            write_estimates_file(&target, &report.estimates)?;
            info!("Estimates written to {:?}", target);
        }
    }
    Ok(())
}

/// Mirrors a log's location below `input` inside `output`, swapping the
/// `.txt` extension for `.tsv`.
fn batch_output_path(input: &Path, output: &Path, file: &Path) -> PathBuf {
    let relative = file
        .strip_prefix(input)
        .ok()
        .or_else(|| file.file_name().map(Path::new))
        .unwrap_or(file);
    output.join(relative).with_extension("tsv")
}

fn simulate(
    config: &FusionConfig,
    output: Option<&Path>,
    log_path: Option<&Path>,
) -> Result<(), SimError> {
    let records = generate(config)?;
    if let Some(path) = log_path {
        write_log(path, &records)?;
        info!("Synthetic sensor log written to {:?}", path);
    }

    let report = run_filter(&config.filter, &records)?;
    report.log_summary(&format!("synthetic (seed {})", config.scenario.seed));

    if let Some(path) = output {
        write_estimates_file(path, &report.estimates)?;
        info!("Estimates written to {:?}", path);
    }
    Ok(())
}
