//! Configuration loading for the Lumen toolchain (§13.1).
//!
//! A small, optional, project-local TOML file controls behavior that is
//! neither source-level language semantics nor a compile-time constant: the
//! VM's call-frame cap, the REPL's prompt and disassembly flag, and the
//! CLI's own log verbosity. Absence of a file is not an error — every field
//! falls back to its documented default — but an unrecognized key in a
//! present file is (`deny_unknown_fields`), so a typo doesn't silently do
//! nothing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default project-local config file name, resolved relative to the
/// current directory unless `--config` overrides it.
pub const DEFAULT_CONFIG_FILE: &str = "lumen.toml";

/// Default VM call-frame cap (§4.4.1); matches `lumen_runtime::vm::Vm`'s own
/// built-in default, duplicated here only as the fallback this crate hands
/// back when a config file doesn't set `vm.frames_max`.
pub const DEFAULT_FRAMES_MAX: usize = 64;

const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub vm: VmConfig,
    pub repl: ReplConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self { vm: VmConfig::default(), repl: ReplConfig::default(), log: LogConfig::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct VmConfig {
    /// Override for the VM's hard cap on simultaneously active call frames.
    pub frames_max: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { frames_max: DEFAULT_FRAMES_MAX }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ReplConfig {
    pub prompt: String,
    pub show_disassembly: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self { prompt: DEFAULT_PROMPT.to_string(), show_disassembly: false }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    pub level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: LogLevel::default() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Config {
    /// Load from `path` if it exists, otherwise return the all-defaults
    /// configuration. A present-but-malformed file is an error; a missing
    /// file is not (§13.1).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Resolve the config path the CLI should load: an explicit
    /// `--config <path>` override; failing that, [`DEFAULT_CONFIG_FILE`] in
    /// the current directory if it exists; failing that, a user-level
    /// `lumen/config.toml` under the platform config directory, so a
    /// preference set once (e.g. a custom `repl.prompt`) applies to every
    /// project that doesn't ship its own `lumen.toml`.
    pub fn load_default_or(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path_override {
            return Self::load(p);
        }
        let project_path = Path::new(DEFAULT_CONFIG_FILE);
        if project_path.exists() {
            return Self::load(project_path);
        }
        if let Some(user_path) = user_config_path() {
            if user_path.exists() {
                return Self::load(&user_path);
            }
        }
        Ok(Self::default())
    }
}

/// `<config dir>/lumen/config.toml`, or `None` if the host has no notion of
/// a config directory.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lumen").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/lumen.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_a_partial_file_falling_back_for_the_rest() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[vm]\nframes_max = 128\n").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.vm.frames_max, 128);
        assert_eq!(config.repl.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn unknown_key_is_a_hard_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[vm]\nbogus = 1\n").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn full_file_overrides_every_field() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[vm]\nframes_max = 256\n\n[repl]\nprompt = \"lumen> \"\nshow_disassembly = true\n\n[log]\nlevel = \"debug\"\n"
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.vm.frames_max, 256);
        assert_eq!(config.repl.prompt, "lumen> ");
        assert!(config.repl.show_disassembly);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.level.to_string(), "debug");
    }

    #[test]
    fn load_default_or_prefers_explicit_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[vm]\nframes_max = 10\n").unwrap();
        let config = Config::load_default_or(Some(file.path())).unwrap();
        assert_eq!(config.vm.frames_max, 10);
    }
}
