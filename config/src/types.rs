use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TshConfig {
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Name used as the prefix of diagnostics.
    pub name: String,
    /// Prompt shown when the `prompt` variable is not set.
    pub prompt: String,
    /// File whose lines are executed at startup.
    pub init_file: String,
    /// Dump the resolved tree before executing each line.
    pub print_tree: bool,
    pub history: HistoryConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "tsh".to_string(),
            prompt: "> ".to_string(),
            init_file: "~/.config/tsh/init".to_string(),
            print_tree: false,
            history: HistoryConfig::default(),
        }
    }
}

impl ShellConfig {
    pub fn init_path(&self) -> PathBuf {
        expand_path(&self.init_file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub file: String,
    /// Capacity used when `HISTSIZE` is unset or malformed.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "~/.tsh_history".to_string(),
            max_entries: 100,
        }
    }
}

impl HistoryConfig {
    pub fn path(&self) -> PathBuf {
        expand_path(&self.file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
