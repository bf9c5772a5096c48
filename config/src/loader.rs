use crate::{ConfigError, TshConfig};
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("/etc/tsh/tsh.yaml")];

        if let Some(config_dir) = dirs::home_dir() {
            search_paths.push(config_dir.join(".config/tsh/tsh.yaml"));
        }

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    pub fn load(&self) -> Result<TshConfig, ConfigError> {
        let mut config = TshConfig::default();

        if let Some(ref explicit) = self.explicit_file {
            config = self.read_file(explicit)?;
        } else if let Ok(env_path) = std::env::var("TSH_CONFIG") {
            config = self.read_file(&PathBuf::from(env_path))?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    debug!(path = %path.display(), "merging config file");
                    if let Ok(content) = std::fs::read_to_string(path) {
                        config = self.merge_yaml(&config, &content)?;
                    }
                }
            }
        }

        self.apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    fn read_file(&self, path: &PathBuf) -> Result<TshConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        self.parse_yaml(&content)
    }

    fn parse_yaml(&self, content: &str) -> Result<TshConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &TshConfig, content: &str) -> Result<TshConfig, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(Self::merge_configs(base, &overlay))
    }

    fn merge_configs(base: &TshConfig, overlay: &TshConfig) -> TshConfig {
        let defaults = TshConfig::default();
        let mut result = base.clone();

        if overlay.shell != defaults.shell {
            result.shell = overlay.shell.clone();
        }
        if overlay.logging != defaults.logging {
            result.logging = overlay.logging.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }

    fn apply_env_overrides(&self, config: &mut TshConfig) {
        if let Ok(prompt) = std::env::var("TSH_PROMPT") {
            config.shell.prompt = prompt;
        }
        if let Ok(file) = std::env::var("TSH_HISTORY_FILE") {
            config.shell.history.file = file;
        }
        if let Ok(level) = std::env::var("TSH_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str(&level) {
                config.logging.level = l;
            }
        }
    }

    fn validate(config: &TshConfig) -> Result<(), ConfigError> {
        let name = &config.shell.name;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "shell.name must be a single word, got {name:?}"
            )));
        }
        Ok(())
    }
}
