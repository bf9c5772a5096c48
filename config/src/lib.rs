//! tsh Configuration System
//!
//! YAML configuration for the tsh shell.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/tsh/tsh.yaml` (system-wide)
//! 3. `~/.config/tsh/tsh.yaml` (user)
//! 4. `TSH_CONFIG=/path/to/config.yaml` (explicit, replaces 2 and 3)
//! 5. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   prompt: "tsh> "
//!   init_file: "~/.config/tsh/init"
//!   history:
//!     max_entries: 500
//!
//! logging:
//!   level: debug
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<TshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<TshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
