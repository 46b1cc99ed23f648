//! Plugin metadata as the frontend consumes it, and the catalog of plugins
//! enabled for an organization.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod catalog;
pub mod registry;

pub use catalog::DbPluginCatalog;
pub use registry::PluginRegistry;

#[derive(Debug)]
pub enum PluginError {
    Manifest(String),
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::Manifest(e) => write!(f, "Plugin manifest error: {e}"),
            PluginError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for PluginError {}

/// Release maturity of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Alpha,
    Beta,
    #[default]
    Stable,
    Deprecated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourcePlugin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub info: serde_json::Value,
    pub module: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub preload: bool,
    /// Always available, no persisted record behind it.
    #[serde(default)]
    pub built_in: bool,
    #[serde(default)]
    pub metrics: bool,
    #[serde(default)]
    pub annotations: bool,
    #[serde(default)]
    pub alerting: bool,
    #[serde(default)]
    pub logs: bool,
    #[serde(default)]
    pub explore: bool,
    #[serde(default)]
    pub mixed: bool,
    #[serde(default)]
    pub state: PluginState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPlugin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub info: serde_json::Value,
    pub module: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub preload: bool,
    #[serde(default)]
    pub hide_from_list: bool,
    #[serde(default)]
    pub skip_data_query: bool,
    #[serde(default)]
    pub state: PluginState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPlugin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub info: serde_json::Value,
    pub module: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub preload: bool,
    /// Enabled for every org that has no explicit setting.
    #[serde(default)]
    pub auto_enabled: bool,
}

/// Plugins usable by one organization.
#[derive(Debug, Clone, Default)]
pub struct EnabledPlugins {
    pub apps: Vec<AppPlugin>,
    pub panels: Vec<PanelPlugin>,
    /// Keyed by data-source type (plugin id).
    pub data_sources: HashMap<String, DataSourcePlugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateInfo {
    pub latest_version: String,
    pub has_update: bool,
}

#[async_trait]
pub trait PluginCatalog: Send + Sync {
    async fn enabled_plugins(&self, org_id: i64) -> Result<EnabledPlugins, PluginError>;

    /// Registry data sources flagged built-in, in registry order.
    fn built_in_data_sources(&self) -> Vec<DataSourcePlugin>;

    /// Newest known release compared with the running version.
    fn update_info(&self, current_version: &str) -> UpdateInfo;
}
