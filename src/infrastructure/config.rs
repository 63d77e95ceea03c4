use crate::application::metric_catalog::{CatalogFile, MetricCatalog};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub server: ServerSettings,
    pub source: SourceSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub url_template: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub default_meter: String,
    /// Poll interval; polling is off when absent.
    pub polling_secs: Option<u64>,
}

fn default_max_pages() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/engine"))
        .add_source(config::Environment::with_prefix("METERVIEW").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Load `config/metrics.toml`, or the compiled-in catalog when the file is absent.
pub fn load_metric_catalog() -> anyhow::Result<MetricCatalog> {
    if !Path::new("config/metrics.toml").exists() {
        tracing::info!("config/metrics.toml not found, using built-in metric catalog");
        return Ok(MetricCatalog::builtin()?);
    }

    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/metrics"))
        .build()?;
    let file: CatalogFile = settings.try_deserialize()?;
    MetricCatalog::from_file(file).context("Invalid metric catalog in config/metrics.toml")
}

/// Replace `${name}` placeholders in a URL template with URL-encoded values
pub fn prepare_url(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}
