use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::plugin_setting;

use super::{DataSourcePlugin, EnabledPlugins, PluginCatalog, PluginError, PluginRegistry, UpdateInfo};

/// Catalog backed by the installed-plugin registry plus per-org app settings.
///
/// Panels and data sources are enabled everywhere. An app is enabled for an
/// org when its `plugin_setting` row says so or, without a row, when the app
/// is auto-enabled.
#[derive(Clone)]
pub struct DbPluginCatalog {
    registry: Arc<PluginRegistry>,
    db: DatabaseConnection,
}

impl DbPluginCatalog {
    pub fn new(registry: Arc<PluginRegistry>, db: DatabaseConnection) -> Self {
        Self { registry, db }
    }

    async fn app_settings(&self, org_id: i64) -> Result<HashMap<String, bool>, PluginError> {
        if org_id == 0 {
            return Ok(HashMap::new());
        }

        let rows = plugin_setting::Entity::find()
            .filter(plugin_setting::Column::OrgId.eq(org_id))
            .all(&self.db)
            .await
            .map_err(PluginError::Db)?;

        Ok(rows.into_iter().map(|r| (r.plugin_id, r.enabled)).collect())
    }
}

#[async_trait]
impl PluginCatalog for DbPluginCatalog {
    async fn enabled_plugins(&self, org_id: i64) -> Result<EnabledPlugins, PluginError> {
        let settings = self.app_settings(org_id).await?;

        let apps = self
            .registry
            .apps()
            .iter()
            .filter(|app| settings.get(&app.id).copied().unwrap_or(app.auto_enabled))
            .cloned()
            .collect();

        let data_sources = self
            .registry
            .data_sources()
            .iter()
            .map(|ds| (ds.id.clone(), ds.clone()))
            .collect();

        Ok(EnabledPlugins {
            apps,
            panels: self.registry.panels().to_vec(),
            data_sources,
        })
    }

    fn built_in_data_sources(&self) -> Vec<DataSourcePlugin> {
        self.registry.built_in_data_sources().cloned().collect()
    }

    fn update_info(&self, current_version: &str) -> UpdateInfo {
        match self.registry.latest_version() {
            Some(latest) if !latest.is_empty() => UpdateInfo {
                latest_version: latest.to_string(),
                has_update: latest != current_version,
            },
            _ => UpdateInfo::default(),
        }
    }
}

/// Insert or update the enablement of `plugin_id` for `org_id`.
pub async fn set_app_enabled(
    db: &DatabaseConnection,
    org_id: i64,
    plugin_id: &str,
    enabled: bool,
) -> Result<plugin_setting::Model, PluginError> {
    let now = Utc::now().naive_utc();
    let existing = plugin_setting::Entity::find()
        .filter(plugin_setting::Column::OrgId.eq(org_id))
        .filter(plugin_setting::Column::PluginId.eq(plugin_id))
        .one(db)
        .await
        .map_err(PluginError::Db)?;

    let saved = match existing {
        Some(model) => {
            let mut active: plugin_setting::ActiveModel = model.into();
            active.enabled = Set(enabled);
            active.updated_at = Set(now);
            active.update(db).await
        }
        None => {
            plugin_setting::ActiveModel {
                id: Set(Uuid::now_v7()),
                org_id: Set(org_id),
                plugin_id: Set(plugin_id.to_string()),
                enabled: Set(enabled),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await
        }
    }
    .map_err(PluginError::Db)?;

    Ok(saved)
}
