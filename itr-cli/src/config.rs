use std::path::Path;

use anyhow::{Context, Result};
use itr_core::EngineSettings;
use tracing::debug;

/// Read from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "itr.toml";

/// Loads engine settings.
///
/// An explicit path must exist. Without one, `itr.toml` is used when present
/// and built-in defaults otherwise.
///
/// ```toml
/// request_timeout_ms = 10000
/// collaborator_timeout_ms = 2000
/// bulk_concurrency = 8
///
/// [database]
/// backend = "sqlite"
/// connection_string = "itr.db"
/// ```
pub fn load_settings(explicit: Option<&Path>) -> Result<EngineSettings> {
    match explicit {
        Some(path) => read_settings(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                read_settings(default)
            } else {
                debug!("no {DEFAULT_CONFIG_FILE}; using default settings");
                Ok(EngineSettings::default())
            }
        }
    }
}

pub fn read_settings(path: &Path) -> Result<EngineSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let settings = parse_settings(&text)
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

pub fn parse_settings(text: &str) -> Result<EngineSettings, toml::de::Error> {
    toml::from_str(text)
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub backend: Option<String>,
    pub database: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub collaborator_timeout_ms: Option<u64>,
    pub bulk_concurrency: Option<usize>,
}

impl SettingsOverrides {
    pub fn apply(
        self,
        mut settings: EngineSettings,
    ) -> EngineSettings {
        if let Some(backend) = self.backend {
            settings.database.backend = backend;
        }
        if let Some(database) = self.database {
            settings.database.connection_string = database;
        }
        if let Some(ms) = self.request_timeout_ms {
            settings.request_timeout_ms = ms;
        }
        if let Some(ms) = self.collaborator_timeout_ms {
            settings.collaborator_timeout_ms = ms;
        }
        if let Some(n) = self.bulk_concurrency {
            settings.bulk_concurrency = n;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), EngineSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = parse_settings(
            r#"
bulk_concurrency = 8

[database]
connection_string = "/var/lib/itr/itr.db"
"#,
        )
        .unwrap();

        assert_eq!(settings.bulk_concurrency, 8);
        assert_eq!(settings.database.backend, "sqlite");
        assert_eq!(settings.database.connection_string, "/var/lib/itr/itr.db");
        assert_eq!(settings.request_timeout_ms, 30_000);
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(parse_settings("request_timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn missing_explicit_file_names_the_path() {
        let path = PathBuf::from("/nonexistent/itr.toml");

        let err = load_settings(Some(&path)).unwrap_err();

        assert!(format!("{err:#}").contains("/nonexistent/itr.toml"));
    }

    #[test]
    fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("itr-config-{}.toml", std::process::id()));
        std::fs::write(&path, "collaborator_timeout_ms = 1500\n").unwrap();

        let settings = read_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.collaborator_timeout_ms, 1500);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let file = parse_settings("request_timeout_ms = 1000\nbulk_concurrency = 2").unwrap();
        let overrides = SettingsOverrides {
            database: Some(":memory:".to_string()),
            request_timeout_ms: Some(9000),
            ..Default::default()
        };

        let settings = overrides.apply(file);

        assert_eq!(settings.request_timeout_ms, 9000);
        assert_eq!(settings.bulk_concurrency, 2);
        assert_eq!(settings.database.connection_string, ":memory:");
    }
}
