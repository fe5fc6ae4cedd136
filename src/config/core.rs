use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml};
use serde::{Deserialize, Serialize};

use super::{ApiConfig, BatchConfig, CollectConfig, PollingConfig, ScanFlowConfig};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Fully merged configuration, owned by the caller and passed down by reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanlinkConfig {
    pub api: ApiConfig,
    pub scan_batch: BatchConfig,
    pub polling: PollingConfig,
    pub scan: ScanFlowConfig,
    pub collect: CollectConfig,
}

impl ScanlinkConfig {
    pub fn load(custom_config: Option<&str>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");
        Self::from_figment(Self::figment(custom_config))
    }

    /// Provider chain: defaults, then user and repo files (or only `custom_config`), then env
    pub fn figment(custom_config: Option<&str>) -> Figment {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            figment = if custom_path.ends_with(".json") {
                figment.merge(Json::file(custom_path))
            } else {
                figment.merge(Toml::file(custom_path))
            };
        } else {
            let user_config = Self::user_config_base_path();
            figment = figment
                .merge(Toml::file(format!("{user_config}.toml")))
                .merge(Json::file(format!("{user_config}.json")))
                .merge(Toml::file("scanlink.toml"))
                .merge(Json::file("scanlink.json"));
        }

        // Environment variables always have highest priority
        figment.merge(Env::prefixed("SCANLINK_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .context("Failed to parse scanlink configuration")?;
        tracing::trace!(
            "CONFIG LOAD: base_url = {}, max_parallel_scans = {}",
            config.api.base_url,
            config.scan_batch.max_parallel_scans
        );
        Ok(config)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/scanlink/config"),
            Err(_) => "~/.config/scanlink/config".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_match_struct_defaults() {
        let config =
            ScanlinkConfig::from_figment(Figment::new().merge(Toml::string(DEFAULT_CONFIG)))
                .expect("Should parse embedded defaults");
        let defaults = ScanlinkConfig::default();

        assert_eq!(config.api.base_url, defaults.api.base_url);
        assert_eq!(
            config.api.ai_remediation_timeout_secs,
            defaults.api.ai_remediation_timeout_secs
        );
        assert_eq!(
            config.scan_batch.default_max_size_in_bytes,
            defaults.scan_batch.default_max_size_in_bytes
        );
        assert_eq!(
            config.scan_batch.max_size_in_bytes,
            defaults.scan_batch.max_size_in_bytes
        );
        assert_eq!(config.scan_batch.max_files_count, 1000);
        assert_eq!(config.scan_batch.scans_per_cpu, 1);
        assert_eq!(config.scan_batch.max_parallel_scans, 5);
        assert_eq!(config.polling.interval_ms, defaults.polling.interval_ms);
        assert_eq!(
            config.collect.max_file_size_bytes,
            defaults.collect.max_file_size_bytes
        );
        assert!(!config.scan.use_sync_flow);
    }

    #[test]
    fn test_custom_config_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[scan_batch]\nmax_parallel_scans = 12\n\n[scan_batch.max_size_in_bytes]\nsecret = 2048\n\n[api]\nbase_url = \"https://scanner.internal\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = ScanlinkConfig::from_figment(ScanlinkConfig::figment(Some(&path))).unwrap();

        assert_eq!(config.scan_batch.max_parallel_scans, 12);
        assert_eq!(config.api.base_url, "https://scanner.internal");
        assert_eq!(config.scan_batch.max_size_in_bytes.get("secret"), Some(&2048));
        // Table entries merge with the embedded ones
        assert_eq!(
            config.scan_batch.max_size_in_bytes.get("sast"),
            Some(&(50 * 1024 * 1024))
        );
        assert_eq!(config.scan_batch.max_files_count, 1000);
    }

    #[test]
    fn test_missing_custom_config_falls_back_to_defaults() {
        let config = ScanlinkConfig::load(Some("non_existent_scanlink.toml"));
        assert!(config.is_ok(), "Should handle missing custom config gracefully");
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::string("[scan_batch]\nmax_files_count = \"lots\""));
        assert!(ScanlinkConfig::from_figment(figment).is_err());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let mut config = ScanlinkConfig::default();
        config.api.token = Some("secret-token".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("max_parallel_scans"));
    }
}
