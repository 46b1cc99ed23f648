use serde::Serialize;
use std::collections::BTreeMap;

use crate::crypto;
use crate::entity::data_source::{self, Access};
use crate::plugins::{DataSourcePlugin, EnabledPlugins};

use super::overrides::TypeOverrides;

/// A data source as the frontend sees it. Optional members are left out of
/// the JSON when unset; built-in entries carry only `type`, `name` and `meta`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDataSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub ds_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub meta: DataSourcePlugin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_data: Option<serde_json::Value>,
    /// Ready-to-send `Authorization` header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ResolvedDataSource {
    pub fn built_in(meta: &DataSourcePlugin) -> Self {
        Self {
            id: None,
            uid: None,
            ds_type: meta.id.clone(),
            name: meta.name.clone(),
            url: None,
            meta: meta.clone(),
            json_data: None,
            basic_auth: None,
            with_credentials: None,
            username: None,
            password: None,
            database: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDataSources {
    pub data_sources: BTreeMap<String, ResolvedDataSource>,
    /// Empty when no record is flagged default.
    pub default_data_source: String,
    /// Duplicates are kept.
    pub plugins_to_preload: Vec<String>,
}

pub fn proxy_url(id: i64) -> String {
    format!("/api/datasources/proxy/{id}")
}

/// Merges persisted records with plugin metadata. Never fails: records whose
/// type is not installed are logged and skipped, undecryptable credentials
/// are logged and emitted empty.
pub struct DataSourceResolver<'a> {
    master_key: &'a [u8; 32],
    overrides: &'a TypeOverrides,
}

impl<'a> DataSourceResolver<'a> {
    pub fn new(master_key: &'a [u8; 32], overrides: &'a TypeOverrides) -> Self {
        Self {
            master_key,
            overrides,
        }
    }

    pub fn resolve(
        &self,
        enabled: &EnabledPlugins,
        built_ins: &[DataSourcePlugin],
        records: &[data_source::Model],
    ) -> ResolvedDataSources {
        let mut out = ResolvedDataSources::default();

        for app in &enabled.apps {
            if app.preload {
                out.plugins_to_preload.push(app.module.clone());
            }
        }

        let mut defaults_seen = 0usize;

        for ds in records {
            let url = match ds.access {
                Access::Proxy => proxy_url(ds.id),
                Access::Direct => ds.url.clone(),
            };

            let Some(meta) = enabled.data_sources.get(&ds.ds_type) else {
                tracing::error!(
                    id = ds.id,
                    name = %ds.name,
                    ds_type = %ds.ds_type,
                    "could not find plugin definition for data source"
                );
                continue;
            };

            if meta.preload {
                out.plugins_to_preload.push(meta.module.clone());
            }

            let mut entry = ResolvedDataSource {
                id: Some(ds.id),
                uid: Some(ds.uid.clone()),
                ds_type: ds.ds_type.clone(),
                name: ds.name.clone(),
                url: Some(url),
                meta: meta.clone(),
                json_data: Some(parse_json_data(ds)),
                basic_auth: None,
                with_credentials: None,
                username: None,
                password: None,
                database: None,
            };

            let type_override = self.overrides.get(&ds.ds_type);

            if ds.access == Access::Direct {
                if ds.basic_auth {
                    let password = ds
                        .decrypted_basic_auth_password(self.master_key)
                        .unwrap_or_else(|e| {
                            tracing::error!(id = ds.id, error = %e, "failed to decrypt basic auth password");
                            String::new()
                        });
                    entry.basic_auth = Some(crypto::basic_auth_header(&ds.basic_auth_user, &password));
                }
                if ds.with_credentials {
                    entry.with_credentials = Some(true);
                }
                if let Some(o) = type_override {
                    o.apply_direct(ds, &mut entry, self.master_key);
                }
            }

            if let Some(o) = type_override {
                o.apply(ds, &mut entry);
            }

            if ds.is_default {
                defaults_seen += 1;
                out.default_data_source = ds.name.clone();
            }

            if out.data_sources.insert(ds.name.clone(), entry).is_some() {
                tracing::warn!(name = %ds.name, id = ds.id, "duplicate data source name, keeping the later record");
            }
        }

        if defaults_seen > 1 {
            tracing::warn!(
                count = defaults_seen,
                default = %out.default_data_source,
                "several data sources flagged default, using the last one"
            );
        }

        for meta in built_ins {
            out.data_sources
                .insert(meta.name.clone(), ResolvedDataSource::built_in(meta));
        }

        out
    }
}

/// The record's jsonData, or an empty object when absent or unparsable.
fn parse_json_data(ds: &data_source::Model) -> serde_json::Value {
    match ds.json_data.as_deref() {
        None | Some("") => serde_json::json!({}),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(id = ds.id, error = %e, "invalid jsonData, using an empty object");
            serde_json::json!({})
        }),
    }
}
