//! Process exit codes (§13.3), matching the `sysexits.h` convention a
//! lox-family toolchain typically follows.

/// The file ran to completion, or the REPL exited cleanly (EOF/interrupt).
pub const OK: u8 = 0;

/// Wrong number of arguments, an unrecognized flag, or an unreadable file
/// or config path (`EX_USAGE`).
pub const USAGE: u8 = 64;

/// One or more compile errors were reported (`EX_DATAERR`).
pub const COMPILE_ERROR: u8 = 65;

/// A runtime error halted execution (`EX_SOFTWARE`).
pub const RUNTIME_ERROR: u8 = 70;
