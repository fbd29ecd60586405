use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub defaults: DefaultsConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Org/account pair used by the initial-load endpoint when the caller omits one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub default_org_id: String,
    pub default_account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                path: "activity.db".to_string(),
            },
            defaults: DefaultsConfig {
                default_org_id: "org_4m6zyrass98vvtk3xh5kcwcmaf".to_string(),
                default_account_id: "account_31crr1tcp2bmcv1fk6pcm0k6ag".to_string(),
            },
            pagination: PaginationConfig {
                default_page_size: 100,
                max_page_size: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    fn environment() -> Environment {
        Environment::with_prefix("TIMELINE")
            .prefix_separator("_")
            .separator("__")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.pagination.default_page_size, 100);
        assert_eq!(config.pagination.max_page_size, 500);
        assert_eq!(config.defaults.default_org_id, "org_4m6zyrass98vvtk3xh5kcwcmaf");
        assert_eq!(
            config.defaults.default_account_id,
            "account_31crr1tcp2bmcv1fk6pcm0k6ag"
        );
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  port: 9100
database:
  path: "/tmp/timeline.db"
defaults:
  default_org_id: "org_custom"
  default_account_id: "account_custom"
logging:
  level: "debug"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.path, "/tmp/timeline.db");
        assert_eq!(config.defaults.default_org_id, "org_custom");
        assert_eq!(config.defaults.default_account_id, "account_custom");
        assert_eq!(config.pagination.max_page_size, 500);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let config = Config::load_from_file("does-not-exist.yaml").unwrap();
        assert_eq!(config.database.path, "activity.db");
    }
}
