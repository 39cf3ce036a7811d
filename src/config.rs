use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Front Office";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_FILE_NAME: &str = "appsettings.json";
pub const CONFIG_ENV_VAR: &str = "CLINIC_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Default tracing filter when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "info,clinic_lib=debug"
}

/// ~/ClinicFrontOffice/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join("ClinicFrontOffice"))
}

/// Config path: explicit argument, then `CLINIC_CONFIG`, then the app dir.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(app_data_dir()?.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite file; relative paths resolve against the config file's directory.
    pub database_path: PathBuf,
    #[serde(default)]
    pub application_settings: ApplicationSettings,
    #[serde(default)]
    pub security_settings: SecuritySettings,
    #[serde(default)]
    pub server_settings: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationSettings {
    pub app_name: String,
    pub version: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    pub token_expiration_hours: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            token_expiration_hours: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8085,
        }
    }
}

impl AppConfig {
    pub fn with_database(database_path: PathBuf) -> Self {
        Self {
            database_path,
            application_settings: ApplicationSettings::default(),
            security_settings: SecuritySettings::default(),
            server_settings: ServerSettings::default(),
        }
    }

    /// Read the config at `path`, writing a default one first if missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if !path.exists() {
            let config = Self::with_database(PathBuf::from("clinic.db"));
            config.save(path)?;
            tracing::info!(path = %path.display(), "Wrote default configuration");
            return Ok(config.resolved(dir));
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.resolved(dir))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    fn resolved(mut self, dir: &Path) -> Self {
        if self.database_path.is_relative() {
            self.database_path = dir.join(&self.database_path);
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!(
            "{}:{}",
            self.server_settings.bind_address, self.server_settings.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("ClinicFrontOffice"));
    }

    #[test]
    fn explicit_path_wins() {
        let p = PathBuf::from("/tmp/custom.json");
        assert_eq!(resolve_config_path(Some(p.clone())).unwrap(), p);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = AppConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.security_settings.token_expiration_hours, 8);
        assert_eq!(config.server_settings.port, 8085);
        assert_eq!(config.database_path, dir.path().join("nested").join("clinic.db"));

        let again = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn camel_case_keys_and_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{
                "databasePath": "/var/lib/clinic/clinic.db",
                "securitySettings": { "tokenExpirationHours": 2 },
                "serverSettings": { "port": 9000 }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/clinic/clinic.db"));
        assert_eq!(config.security_settings.token_expiration_hours, 2);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.application_settings.app_name, APP_NAME);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_or_create(&path).unwrap_err(),
            ConfigError::Json { .. }
        ));
    }

    #[test]
    fn saved_file_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        AppConfig::with_database(PathBuf::from("clinic.db"))
            .save(&path)
            .unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"databasePath\""));
        assert!(raw.contains("\"tokenExpirationHours\": 8"));
    }
}
