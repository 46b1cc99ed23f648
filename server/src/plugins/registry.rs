use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use super::{AppPlugin, DataSourcePlugin, PanelPlugin, PluginError, PluginState};

/// Plugin declarations, either compiled in or read from a JSON manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    #[serde(default)]
    pub apps: Vec<AppPlugin>,
    #[serde(default)]
    pub panels: Vec<PanelPlugin>,
    #[serde(default)]
    pub datasources: Vec<DataSourcePlugin>,
    /// Newest published release, when known.
    #[serde(default)]
    pub latest_version: Option<String>,
}

static CORE_PLUGINS: OnceLock<PluginManifest> = OnceLock::new();

/// Plugins shipped with the server.
pub fn core_plugins() -> &'static PluginManifest {
    CORE_PLUGINS.get_or_init(|| PluginManifest {
        apps: vec![],
        panels: vec![
            core_panel("graph", "Graph"),
            core_panel("stat", "Stat"),
            core_panel("gauge", "Gauge"),
            core_panel("bargauge", "Bar gauge"),
            core_panel("table", "Table"),
            core_panel("singlestat", "Singlestat"),
            PanelPlugin {
                skip_data_query: true,
                ..core_panel("text", "Text")
            },
            core_panel("heatmap", "Heatmap"),
            PanelPlugin {
                skip_data_query: true,
                ..core_panel("alertlist", "Alert list")
            },
            PanelPlugin {
                skip_data_query: true,
                ..core_panel("dashlist", "Dashboard list")
            },
            PanelPlugin {
                skip_data_query: true,
                state: PluginState::Beta,
                ..core_panel("news", "News")
            },
        ],
        datasources: vec![
            DataSourcePlugin {
                built_in: true,
                metrics: true,
                annotations: true,
                ..core_data_source("grafana", "-- Grafana --")
            },
            DataSourcePlugin {
                built_in: true,
                metrics: true,
                mixed: true,
                ..core_data_source("mixed", "-- Mixed --")
            },
            DataSourcePlugin {
                built_in: true,
                metrics: true,
                ..core_data_source("dashboard", "-- Dashboard --")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                explore: true,
                ..core_data_source("prometheus", "Prometheus")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                ..core_data_source("graphite", "Graphite")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                explore: true,
                ..core_data_source("influxdb", "InfluxDB")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                logs: true,
                explore: true,
                ..core_data_source("elasticsearch", "Elasticsearch")
            },
            DataSourcePlugin {
                logs: true,
                explore: true,
                annotations: true,
                ..core_data_source("loki", "Loki")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                ..core_data_source("postgres", "PostgreSQL")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                ..core_data_source("mysql", "MySQL")
            },
            DataSourcePlugin {
                metrics: true,
                alerting: true,
                annotations: true,
                ..core_data_source("testdata", "TestData DB")
            },
        ],
        latest_version: None,
    })
}

fn core_data_source(id: &str, name: &str) -> DataSourcePlugin {
    DataSourcePlugin {
        id: id.to_string(),
        name: name.to_string(),
        info: serde_json::json!({}),
        module: format!("app/plugins/datasource/{id}/module"),
        base_url: format!("public/app/plugins/datasource/{id}"),
        preload: false,
        built_in: false,
        metrics: false,
        annotations: false,
        alerting: false,
        logs: false,
        explore: false,
        mixed: false,
        state: PluginState::Stable,
    }
}

fn core_panel(id: &str, name: &str) -> PanelPlugin {
    PanelPlugin {
        id: id.to_string(),
        name: name.to_string(),
        info: serde_json::json!({}),
        module: format!("app/plugins/panel/{id}/module"),
        base_url: format!("public/app/plugins/panel/{id}"),
        preload: false,
        hide_from_list: false,
        skip_data_query: false,
        state: PluginState::Stable,
    }
}

/// Every installed plugin, regardless of org enablement. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginRegistry {
    apps: Vec<AppPlugin>,
    panels: Vec<PanelPlugin>,
    data_sources: Vec<DataSourcePlugin>,
    latest_version: Option<String>,
}

impl PluginRegistry {
    /// Registry holding only the core plugins.
    pub fn core() -> Self {
        Self::default().merge(core_plugins().clone())
    }

    /// Core plugins plus the manifest at `path`, if any.
    pub fn load(path: Option<&Path>) -> Result<Self, PluginError> {
        let registry = Self::core();
        let Some(path) = path else {
            return Ok(registry);
        };

        let raw = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Manifest(format!("{}: {e}", path.display())))?;
        let manifest = parse_manifest(&raw)?;

        tracing::info!(
            path = %path.display(),
            apps = manifest.apps.len(),
            panels = manifest.panels.len(),
            datasources = manifest.datasources.len(),
            "loaded plugin manifest"
        );

        Ok(registry.merge(manifest))
    }

    /// Add the manifest's plugins; an id already registered is replaced in place.
    pub fn merge(mut self, manifest: PluginManifest) -> Self {
        for app in manifest.apps {
            upsert(&mut self.apps, app, |a| &a.id);
        }
        for panel in manifest.panels {
            upsert(&mut self.panels, panel, |p| &p.id);
        }
        for ds in manifest.datasources {
            upsert(&mut self.data_sources, ds, |d| &d.id);
        }
        if manifest.latest_version.is_some() {
            self.latest_version = manifest.latest_version;
        }
        self
    }

    pub fn apps(&self) -> &[AppPlugin] {
        &self.apps
    }

    pub fn panels(&self) -> &[PanelPlugin] {
        &self.panels
    }

    pub fn data_sources(&self) -> &[DataSourcePlugin] {
        &self.data_sources
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSourcePlugin> {
        self.data_sources.iter().find(|d| d.id == id)
    }

    pub fn built_in_data_sources(&self) -> impl Iterator<Item = &DataSourcePlugin> {
        self.data_sources.iter().filter(|d| d.built_in)
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }
}

pub fn parse_manifest(raw: &str) -> Result<PluginManifest, PluginError> {
    serde_json::from_str(raw).map_err(|e| PluginError::Manifest(e.to_string()))
}

fn upsert<T>(list: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match list.iter().position(|existing| id(existing) == id(&item)) {
        Some(i) => list[i] = item,
        None => list.push(item),
    }
}
