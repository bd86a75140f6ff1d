//! `solbmc`: translates one or more Solidity-like contract ASTs (spec §6)
//! into a bounded-model-checking C model.
//!
//! Grounded on the `decision-gate-cli` binary's `clap`-derive /
//! `thiserror` / exit-code-on-stderr discipline, adapted from an async
//! MCP-server dispatcher to this translator's single synchronous
//! load-analyze-emit pipeline.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use solbmc_analysis::stack::AnalysisStack;
use solbmc_ast::SourceUnit;
use solbmc_codegen::Options;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Translates a Solidity-like AST bundle into a bounded-model-checking C
/// model (spec §6 "Command-line surface").
#[derive(Parser, Debug)]
#[command(name = "solbmc", author, version)]
struct Cli {
    /// Comma-separated bundle of contract names to translate.
    bundle: String,

    /// One or more AST JSON documents to load.
    #[arg(long = "input", value_name = "PATH", required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output path for the emitted model; defaults to stdout.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Raises the log level; repeatable (`-v`, `-vv`).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit only forward declarations (spec §6 `--forward-declare`).
    #[arg(long = "forward-declare")]
    forward_declare: bool,

    /// Bounds mapping key lowering to an alphabet of size N (spec §6
    /// `--map-k N`).
    #[arg(long = "map-k", value_name = "N")]
    map_k: Option<usize>,

    /// Advances every instance's clock under one shared step variable
    /// (spec §6 `--lockstep-time`).
    #[arg(long = "lockstep-time")]
    lockstep_time: bool,

    /// Adds running numeric-sum fields to lowered records (spec §6
    /// `--add-sums`).
    #[arg(long = "add-sums")]
    add_sums: bool,
}

/// Errors reported directly by the CLI boundary, distinct from
/// [`solbmc_analysis::error::TranslateError`]: argument/IO failures and a
/// non-empty bundle-miss list (spec §7, "bundle resolution errors" are
/// collected, not thrown, until the CLI decides here that they are
/// fatal).
#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read AST document {path}: {source}")]
    ReadInput { path: PathBuf, source: std::io::Error },
    #[error("failed to parse AST document {path}: {source}")]
    ParseInput { path: PathBuf, source: serde_json::Error },
    #[error("failed to write output {path}: {source}")]
    WriteOutput { path: PathBuf, source: std::io::Error },
    #[error("unresolved bundle name(s): {0}")]
    MissingBundleNames(String),
    #[error("no bundle names given")]
    EmptyBundle,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::Cli(err)) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
        Err(RunError::Translate(err)) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

enum RunError {
    Cli(CliError),
    Translate(solbmc_analysis::error::TranslateError),
}

impl From<CliError> for RunError {
    fn from(err: CliError) -> Self {
        Self::Cli(err)
    }
}

impl From<solbmc_analysis::error::TranslateError> for RunError {
    fn from(err: solbmc_analysis::error::TranslateError) -> Self {
        Self::Translate(err)
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let names: Vec<String> = cli.bundle.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
    if names.is_empty() {
        return Err(CliError::EmptyBundle.into());
    }

    let units = load_units(&cli.input)?;
    let stack = AnalysisStack::build(&units, &names)?;

    if !stack.bundle.missing().is_empty() {
        return Err(CliError::MissingBundleNames(stack.bundle.missing().join(", ")).into());
    }

    let opts = Options {
        forward_declare: cli.forward_declare,
        map_k: cli.map_k,
        lockstep_time: cli.lockstep_time,
        add_sums: cli.add_sums,
    };

    let model = solbmc_codegen::generate(&stack, &opts)?;
    write_output(cli.output.as_deref(), &model)?;
    Ok(())
}

fn load_units(paths: &[PathBuf]) -> Result<Vec<SourceUnit>, CliError> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).map_err(|source| CliError::ReadInput { path: path.clone(), source })?;
            serde_json::from_slice(&bytes).map_err(|source| CliError::ParseInput { path: path.clone(), source })
        })
        .collect()
}

fn write_output(path: Option<&std::path::Path>, model: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            fs::write(path, model).map_err(|source| CliError::WriteOutput { path: path.to_path_buf(), source })
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(model.as_bytes()).map_err(|source| CliError::WriteOutput { path: PathBuf::from("<stdout>"), source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_name_splitting_trims_and_drops_empties() {
        let raw = "Foo, Bar,, Baz ";
        let names: Vec<String> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        assert_eq!(names, vec!["Foo".to_string(), "Bar".to_string(), "Baz".to_string()]);
    }
}
