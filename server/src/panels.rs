use serde::Serialize;
use std::collections::BTreeMap;

use crate::plugins::{PanelPlugin, PluginState};

/// Rank used when the panel type is not in the table.
pub const DEFAULT_PANEL_SORT: i32 = 100;

/// Display order in the panel picker; lower comes first.
pub fn panel_sort(id: &str) -> i32 {
    match id {
        "graph" => 1,
        "stat" => 2,
        "gauge" => 3,
        "bargauge" => 4,
        "table" => 5,
        "singlestat" => 6,
        "text" => 7,
        "heatmap" => 8,
        "alertlist" => 9,
        "dashlist" | "news" => 10,
        _ => DEFAULT_PANEL_SORT,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelDescriptor {
    pub module: String,
    pub base_url: String,
    pub name: String,
    pub id: String,
    pub info: serde_json::Value,
    pub hide_from_list: bool,
    pub sort: i32,
    pub skip_data_query: bool,
    pub state: PluginState,
}

impl From<&PanelPlugin> for PanelDescriptor {
    fn from(panel: &PanelPlugin) -> Self {
        Self {
            module: panel.module.clone(),
            base_url: panel.base_url.clone(),
            name: panel.name.clone(),
            id: panel.id.clone(),
            info: panel.info.clone(),
            hide_from_list: panel.hide_from_list,
            sort: panel_sort(&panel.id),
            skip_data_query: panel.skip_data_query,
            state: panel.state,
        }
    }
}

pub struct PanelCatalog {
    enable_alpha: bool,
}

impl PanelCatalog {
    pub fn new(enable_alpha: bool) -> Self {
        Self { enable_alpha }
    }

    /// Panel descriptors keyed by panel id. Preloaded panels append their
    /// module to `plugins_to_preload`.
    pub fn build(
        &self,
        panels: &[PanelPlugin],
        plugins_to_preload: &mut Vec<String>,
    ) -> BTreeMap<String, PanelDescriptor> {
        let mut out = BTreeMap::new();

        for panel in panels {
            if panel.state == PluginState::Alpha && !self.enable_alpha {
                continue;
            }

            if panel.preload {
                plugins_to_preload.push(panel.module.clone());
            }

            out.insert(panel.id.clone(), PanelDescriptor::from(panel));
        }

        out
    }
}
