//! Lumen language runtime — compiler and bytecode virtual machine.
//!
//! This crate implements the CORE described by the language specification:
//! a single-pass Pratt-style compiler ([`compiler`]) that lowers a token
//! stream straight into bytecode ([`chunk`], [`opcode`]), and a register-less
//! stack [`vm::Vm`] that executes it with closure-capturing call frames. The
//! scanner ([`lexer`]), the native function library ([`natives`]), and the
//! process-wide [`symbol`] interner are the external collaborators the core
//! is specified against.
//!
//! Host programs (the CLI, a REPL, embedders) drive these pieces through
//! [`run`] and [`run_with_interner`] rather than wiring the compiler and VM
//! together by hand.

pub mod chunk;
pub mod compiler;
pub mod diagnostic;
pub mod lexer;
pub mod natives;
pub mod opcode;
pub mod span;
pub mod symbol;
pub mod token;
pub mod value;
pub mod vm;

use std::io::Write;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use symbol::{new_shared_interner, SharedInterner, Symbol};
pub use value::{RuntimeError, Value};
pub use vm::{Vm, VmState};

/// Crate version, exposed for `--version` output and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile-then-run `source` against a fresh interner, writing `print`
/// output to `out`. Returns the first error encountered — every compile
/// error the compiler recorded, or the single runtime error that halted
/// execution.
///
/// This is the one-shot entry point file/stdin drivers want; a REPL that
/// needs global state (and the interner) to persist across lines should
/// call [`run_with_interner`] directly instead.
pub fn run(source: &str, out: &mut dyn Write) -> Result<(), Vec<Diagnostic>> {
    let interner = new_shared_interner();
    run_with_interner(source, &interner, out)
}

/// Like [`run`], but against a caller-supplied interner so repeated calls
/// (e.g. successive REPL lines) share one symbol table — required for
/// string equality to stay handle-based across lines, and for globals
/// declared in an earlier line to resolve correctly in a later one only if
/// the caller also persists a [`vm::Vm`] across calls; this function alone
/// creates a fresh `Vm` (and thus fresh globals) per call.
pub fn run_with_interner(
    source: &str,
    interner: &SharedInterner,
    out: &mut dyn Write,
) -> Result<(), Vec<Diagnostic>> {
    run_with_interner_and_frames_max(source, interner, vm::default_frames_max(), out)
}

/// Like [`run_with_interner`], but with the VM's call-frame cap overridden
/// — the path the CLI drives from a loaded `lumen_config::Config` (§13.1),
/// kept here as a plain `usize` so this crate doesn't need to depend back
/// on `lumen-config` just to thread one integer through.
pub fn run_with_interner_and_frames_max(
    source: &str,
    interner: &SharedInterner,
    frames_max: usize,
    out: &mut dyn Write,
) -> Result<(), Vec<Diagnostic>> {
    let tokens = lexer::Lexer::new(source).tokenize();
    let output = compiler::compile(&tokens, interner.clone())?;
    let mut vm = Vm::with_frames_max(interner.clone(), frames_max);
    vm.load(output.script, output.const_globals);
    vm.run(out).map_err(|diag| vec![diag])
}
