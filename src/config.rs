use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialAppConfig {
    database_url: Option<String>,
    max_connections: Option<u32>,
    log_dir: Option<String>,
    log_filter: Option<String>,
    bcrypt_cost: Option<u32>,
    report_dir: Option<String>,
}

fn default_max_connections() -> u32 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_filter() -> String {
    "info,sea_orm=warn,sqlx::query=warn".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_report_dir() -> String {
    ".".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let env_config: PartialAppConfig = envy::from_env::<PartialAppConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::layered(config_path, env_config)
    }

    fn layered(config_path: Option<&str>, env_config: PartialAppConfig) -> Result<Self, String> {
        // 1. Load from file (optional)
        let file_config: PartialAppConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let path = Path::new(path_str);
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialAppConfig::default(),
        };

        // 2. Merge: environment overrides file
        let final_config = AppConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            max_connections: env_config
                .max_connections
                .or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            log_filter: env_config
                .log_filter
                .or(file_config.log_filter)
                .unwrap_or_else(default_log_filter),
            bcrypt_cost: env_config
                .bcrypt_cost
                .or(file_config.bcrypt_cost)
                .unwrap_or_else(default_bcrypt_cost),
            report_dir: env_config
                .report_dir
                .or(file_config.report_dir)
                .unwrap_or_else(default_report_dir),
        };

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&final_config.bcrypt_cost) {
            return Err(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            ));
        }

        Ok(final_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("foodgram.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_file_values_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "database_url = \"sqlite::memory:\"\nreport_dir = \"/tmp/carts\"\n",
        );

        let config = AppConfig::layered(Some(&path), PartialAppConfig::default()).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.report_dir, "/tmp/carts");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "database_url = \"sqlite::memory:\"\nmax_connections = 3\n");
        let env = PartialAppConfig {
            database_url: Some("postgres://localhost/foodgram".to_string()),
            bcrypt_cost: Some(4),
            ..Default::default()
        };

        let config = AppConfig::layered(Some(&path), env).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/foodgram");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_missing_database_url() {
        let err = AppConfig::layered(Some("/nonexistent/foodgram.toml"), PartialAppConfig::default())
            .unwrap_err();
        assert_eq!(err, "DATABASE_URL is required");
    }

    #[test]
    fn test_rejects_out_of_range_cost() {
        let env = PartialAppConfig {
            database_url: Some("sqlite::memory:".to_string()),
            bcrypt_cost: Some(2),
            ..Default::default()
        };
        assert!(AppConfig::layered(None, env).is_err());
    }
}
