mod file_config;

pub use file_config::{EnrichmentConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub batch_size: usize,
    pub interval_secs: u64,
    pub item_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub api_key: Option<String>,
    pub proxy_url: Option<String>,

    // Enrichment settings (with defaults)
    pub enrichment: EnrichmentJobSettings,
}

#[derive(Debug, Clone)]
pub struct EnrichmentJobSettings {
    pub batch_size: usize,
    pub interval: Duration,
    pub item_delay: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let api_key = file
            .api_key
            .or_else(|| cli.api_key.clone())
            .filter(|key| !key.is_empty());
        let proxy_url = file
            .proxy_url
            .or_else(|| cli.proxy_url.clone())
            .filter(|url| !url.is_empty());

        if api_key.is_none() && proxy_url.is_none() {
            bail!("An API key (--api-key) or a proxy URL (--proxy-url) must be configured");
        }

        let enr_file = file.enrichment.unwrap_or_default();
        let enrichment = EnrichmentJobSettings {
            batch_size: enr_file.batch_size.unwrap_or(cli.batch_size),
            interval: Duration::from_secs(enr_file.interval_secs.unwrap_or(cli.interval_secs)),
            item_delay: Duration::from_millis(enr_file.item_delay_ms.unwrap_or(cli.item_delay_ms)),
        };

        Ok(Self {
            db_dir,
            api_key,
            proxy_url,
            enrichment,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_db_dir(temp_dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            api_key: Some("key".to_string()),
            batch_size: 10,
            interval_secs: 300,
            item_delay_ms: 500,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_db_dir(&temp_dir), None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert!(config.proxy_url.is_none());
        assert_eq!(config.enrichment.batch_size, 10);
        assert_eq!(config.enrichment.interval, Duration::from_secs(300));
        assert_eq!(config.enrichment.item_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            api_key: Some("toml-key".to_string()),
            enrichment: Some(EnrichmentConfig {
                batch_size: Some(25),
                interval_secs: None,
                item_delay_ms: Some(100),
            }),
            ..Default::default()
        };

        let config =
            AppConfig::resolve(&cli_with_db_dir(&temp_dir), Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.api_key.as_deref(), Some("toml-key"));
        assert_eq!(config.enrichment.batch_size, 25);
        assert_eq!(config.enrichment.item_delay, Duration::from_millis(100));
        // CLI value used when TOML doesn't specify
        assert_eq!(config.enrichment.interval, Duration::from_secs(300));
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_requires_key_or_proxy() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key"));
    }

    #[test]
    fn test_resolve_proxy_alone_is_enough() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            proxy_url: Some("https://proxy.example/rawg".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(
            config.proxy_url.as_deref(),
            Some("https://proxy.example/rawg")
        );
    }

    #[test]
    fn test_db_path_helper() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_db_dir(&temp_dir), None).unwrap();
        assert_eq!(config.catalog_db_path(), temp_dir.path().join("catalog.db"));
    }
}
