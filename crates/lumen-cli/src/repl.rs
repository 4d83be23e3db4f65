//! REPL core logic (UI-agnostic) and its `rustyline`-backed driver.
//!
//! [`ReplCore`] owns one persistent [`lumen_runtime::Vm`] and interner, so
//! a `let`/`const`/`fn` declared on one line is visible on the next
//! (§13.2) — unlike [`lumen_runtime::run`], which loads a fresh `Vm` per
//! call. [`run`] wires that core up to a line editor for interactive use;
//! it is the only piece of this module that actually touches a terminal,
//! keeping `ReplCore` itself trivial to exercise in tests.

use std::io::Write;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lumen_config::Config;
use lumen_runtime::{compiler, lexer::Lexer, new_shared_interner, SharedInterner, Vm};

use crate::exit;

pub struct ReplCore {
    interner: SharedInterner,
    vm: Vm,
    show_disassembly: bool,
}

impl ReplCore {
    pub fn new(frames_max: usize, show_disassembly: bool) -> Self {
        let interner = new_shared_interner();
        let mut vm = Vm::with_frames_max(interner.clone(), frames_max);
        vm.install_natives();
        Self { interner, vm, show_disassembly }
    }

    /// Compiles and runs one line against the session's persistent `Vm`,
    /// writing `print` output, an optional disassembly, and any diagnostic
    /// to `out`. Returns `true` iff the line ran with no compile or
    /// runtime error; the session keeps going either way — a bad line does
    /// not end the REPL (§13.2).
    pub fn eval_line(&mut self, line: &str, out: &mut dyn Write) -> bool {
        let tokens = Lexer::new(line).tokenize();
        let output = match compiler::compile(&tokens, self.interner.clone()) {
            Ok(output) => output,
            Err(diagnostics) => {
                for diag in &diagnostics {
                    let _ = write!(out, "{diag}");
                }
                return false;
            }
        };

        if self.show_disassembly {
            let _ = writeln!(out, "{}", output.script.chunk.disassemble("repl"));
        }

        self.vm.push_script(output.script, output.const_globals);
        match self.vm.run(out) {
            Ok(()) => true,
            Err(diag) => {
                let _ = write!(out, "{diag}");
                false
            }
        }
    }
}

/// Drives an interactive session on stdin/stdout until `Ctrl-D` (EOF) or
/// `Ctrl-C` (interrupt), per §13.2. Returns the process exit code to use.
pub fn run(config: &Config) -> u8 {
    let mut core = ReplCore::new(config.vm.frames_max, config.repl.show_disassembly);
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("error: failed to start the line editor: {err}");
            return exit::USAGE;
        }
    };

    loop {
        match editor.readline(&config.repl.prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                let mut stdout = std::io::stdout();
                core.eval_line(&line, &mut stdout);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    exit::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_persist_across_successive_lines() {
        let mut core = ReplCore::new(64, false);
        let mut out = Vec::new();
        assert!(core.eval_line("let x = 10;", &mut out));
        assert!(core.eval_line("print(x + 5);", &mut out));
        assert_eq!(String::from_utf8(out).unwrap(), "15\n");
    }

    #[test]
    fn a_bad_line_reports_but_does_not_end_the_session() {
        let mut core = ReplCore::new(64, false);
        let mut out = Vec::new();
        assert!(!core.eval_line("let;", &mut out));
        assert!(core.eval_line("print(1 + 1);", &mut out));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error"));
        assert!(text.ends_with("2\n"));
    }

    #[test]
    fn a_runtime_error_does_not_lose_earlier_globals() {
        let mut core = ReplCore::new(64, false);
        let mut out = Vec::new();
        assert!(core.eval_line("const x = 1;", &mut out));
        assert!(!core.eval_line("print(1 / 0);", &mut out));
        out.clear();
        assert!(core.eval_line("print(x);", &mut out));
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }

    #[test]
    fn show_disassembly_prepends_a_chunk_dump() {
        let mut core = ReplCore::new(64, true);
        let mut out = Vec::new();
        core.eval_line("print(1);", &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== repl =="));
        assert!(text.ends_with("1\n"));
    }

    #[test]
    fn functions_declared_on_one_line_are_callable_on_the_next() {
        let mut core = ReplCore::new(64, false);
        let mut out = Vec::new();
        assert!(core.eval_line("fn double(n) { return n * 2; }", &mut out));
        assert!(core.eval_line("print(double(21));", &mut out));
        assert_eq!(String::from_utf8(out).unwrap(), "42\n");
    }
}
