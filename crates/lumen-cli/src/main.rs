//! Command-line driver for the Lumen language: a file runner and an
//! interactive REPL over the `lumen-runtime` compiler/VM (§13.2).

mod exit;
mod logging;
mod repl;
mod run_file;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Compile and run Lumen scripts.
///
/// With no arguments, starts an interactive REPL on stdin/stdout. With a
/// file argument, compiles and runs it once, to completion.
#[derive(Parser, Debug)]
#[command(name = "lumen", version = lumen_runtime::VERSION, about)]
struct Cli {
    /// Lumen source file to run. Omit to start the REPL.
    file: Option<PathBuf>,

    /// Emit diagnostics as newline-delimited JSON instead of human-readable
    /// text. Only meaningful with a file argument.
    #[arg(long)]
    json: bool,

    /// Path to a config file (default: `./lumen.toml`, then a user-level
    /// config directory, then built-in defaults — see §13.1).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // clap treats `--help`/`--version` as a non-error exit; anything
            // else reaching here is a genuine usage mistake (§13.3).
            return ExitCode::from(if err.use_stderr() { exit::USAGE } else { exit::OK });
        }
    };

    let config = match lumen_config::Config::load_default_or(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(exit::USAGE);
        }
    };

    logging::init(config.log.level);

    let status = match &cli.file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "running file");
            run_file::run(path, cli.json, &config)
        }
        None => {
            tracing::debug!("starting REPL");
            repl::run(&config)
        }
    };
    ExitCode::from(status)
}
