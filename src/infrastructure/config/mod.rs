use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};
use crate::domain::settings::Settings;

/// Settings file picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "rowsift.toml";

/// Environment variable prefix; nested keys use `__`, e.g. `ROWSIFT_FIELDS__ID`
pub const ENV_PREFIX: &str = "ROWSIFT_";

pub struct ConfigService {
    config_file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigService {
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self {
            config_file,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Layer defaults, the TOML file and env vars, then validate
    pub fn load(&self) -> Result<Settings> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::NotFound(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        let settings: Settings = figment
            .merge(Env::prefixed(&self.env_prefix).split("__"))
            .extract()?;

        settings.validate()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_and_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [fields]
                text = "body"

                [markers]
                case_sensitive = true
                begin_words = ["BEGIN"]

                [latency]
                bins = 10
                "#,
            )?;
            jail.set_env("ROWSIFT_TEST_LATENCY__ACTION", "rewrite");

            let settings = ConfigService::new(Some(PathBuf::from("custom.toml")))
                .with_env_prefix("ROWSIFT_TEST_")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(settings.fields.text, "body");
            assert_eq!(settings.fields.id, "id");
            assert!(settings.markers.case_sensitive);
            assert_eq!(settings.markers.begin_words, vec!["BEGIN"]);
            assert_eq!(settings.markers.end_words, vec!["end", "ending"]);
            assert_eq!(settings.latency.bins, 10);
            assert_eq!(settings.latency.action, "rewrite");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[io]\ndelimiter = \";;\"\n")?;

            let result = ConfigService::new(Some(PathBuf::from("bad.toml")))
                .with_env_prefix("ROWSIFT_TEST_")
                .load();
            assert!(matches!(result, Err(AppError::ConfigError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        figment::Jail::expect_with(|_jail| {
            let result = ConfigService::new(Some(PathBuf::from("absent.toml"))).load();
            assert!(matches!(result, Err(AppError::NotFound(_))));
            Ok(())
        });
    }
}
