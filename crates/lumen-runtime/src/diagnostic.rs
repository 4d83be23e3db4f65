//! Unified diagnostic type for both compile-time and runtime errors (§7).
//!
//! Compile errors and runtime errors are reported through the same shape so
//! the CLI and REPL have one formatting path, even though §7 keeps their
//! *policies* distinct: the compiler suppresses everything after the first
//! error until it resynchronizes, while a runtime error halts execution
//! immediately.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    CompileError,
    RuntimeError,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: u32,
    pub message: String,
    /// Populated for runtime errors: one frame per active call, innermost
    /// first, matching §4.4.6's "[line N] in <name>" stack trace.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<String>,
}

impl Diagnostic {
    pub fn compile_error(line: u32, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::CompileError,
            line,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn runtime_error(line: u32, message: impl Into<String>, trace: Vec<String>) -> Self {
        Self {
            kind: DiagnosticKind::RuntimeError,
            line,
            message: message.into(),
            trace,
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::CompileError => {
                writeln!(f, "[line {}] Error: {}", self.line, self.message)?;
            }
            DiagnosticKind::RuntimeError => {
                writeln!(f, "{}", self.message)?;
                for frame in &self.trace {
                    writeln!(f, "{}", frame)?;
                }
            }
        }
        Ok(())
    }
}
