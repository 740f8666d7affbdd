/// Console configuration
use crate::error::{ConsoleError, Result};
use lobby_playback::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when no `--config` is given and it exists
pub const DEFAULT_CONFIG_FILE: &str = "lobby.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub user: UserSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserSettings {
    /// Signed-in user; none means anonymous
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "lobby_console=info,lobby_playback=info".to_string()
}

impl ConsoleConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `lobby.toml` in the working
    /// directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. LOBBY_SESSION__INITIAL_VOLUME
        settings = settings.add_source(
            config::Environment::with_prefix("LOBBY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.session
            .validate()
            .map_err(|e| ConsoleError::Config(e.to_string()))?;

        if let Some(id) = &self.user.id {
            if id.trim().is_empty() {
                return Err(ConsoleError::Config("user.id must not be blank".to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.filter, "lobby_console=info,lobby_playback=info");
        assert_eq!(config.session.initial_volume, 80);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[session]\ninitial_volume = 40\nloading_timeout_ms = 2500\n\n[user]\nid = \"dj\""
        )
        .unwrap();

        let config = ConsoleConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.session.initial_volume, 40);
        assert_eq!(config.session.loading_timeout_ms, 2500);
        assert_eq!(config.session.tick_interval_ms, 500);
        assert_eq!(config.user.id.as_deref(), Some("dj"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = ConsoleConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConsoleError::Config(_))));
    }

    #[test]
    fn rejects_invalid_session_settings() {
        let mut config = ConsoleConfig::default();
        config.session.initial_volume = 150;
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.user.id = Some("  ".to_string());
        assert!(config.validate().is_err());
    }
}
