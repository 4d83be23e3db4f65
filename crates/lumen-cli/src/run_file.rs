//! `prog <path>`: compile and run a file once, to completion (§13.2).

use std::path::Path;

use lumen_config::Config;
use lumen_runtime::{new_shared_interner, run_with_interner_and_frames_max, DiagnosticKind};

use crate::exit;

/// Runs the Lumen source at `path`. `json` selects newline-delimited JSON
/// diagnostics (one object per line) over human-readable text. Returns the
/// process exit code to use (§13.3); `std::process::ExitCode` is opaque and
/// not comparable, so the numeric code is plumbed up to `main` instead.
pub fn run(path: &Path, json: bool, config: &Config) -> u8 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: failed to read {}: {err}", path.display());
            return exit::USAGE;
        }
    };

    let interner = new_shared_interner();
    let mut stdout = std::io::stdout();
    match run_with_interner_and_frames_max(&source, &interner, config.vm.frames_max, &mut stdout) {
        Ok(()) => exit::OK,
        Err(diagnostics) => {
            let is_runtime_error =
                diagnostics.iter().all(|d| d.kind == DiagnosticKind::RuntimeError);
            for diag in &diagnostics {
                if json {
                    match diag.to_json_string() {
                        Ok(line) => println!("{line}"),
                        Err(err) => eprintln!("error: failed to serialize diagnostic: {err}"),
                    }
                } else {
                    eprint!("{diag}");
                }
            }
            if is_runtime_error { exit::RUNTIME_ERROR } else { exit::COMPILE_ERROR }
        }
    }
}
