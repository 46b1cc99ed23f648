//! Per-type adjustments of resolved data sources.
//!
//! Each data-source type may register one [`TypeOverride`]. The resolver calls
//! `apply_direct` for direct-access records and `apply` for every record.

use std::collections::HashMap;

use crate::entity::data_source;

use super::resolver::ResolvedDataSource;

pub const DS_INFLUXDB_08: &str = "influxdb_08";
pub const DS_INFLUXDB: &str = "influxdb";
pub const DS_ES: &str = "elasticsearch";
pub const DS_PROMETHEUS: &str = "prometheus";

pub trait TypeOverride: Send + Sync {
    /// Direct access only: the browser needs the credentials itself.
    fn apply_direct(
        &self,
        _record: &data_source::Model,
        _entry: &mut ResolvedDataSource,
        _master_key: &[u8; 32],
    ) {
    }

    fn apply(&self, _record: &data_source::Model, _entry: &mut ResolvedDataSource) {}
}

pub struct TypeOverrides {
    by_type: HashMap<String, Box<dyn TypeOverride>>,
}

impl TypeOverrides {
    pub fn empty() -> Self {
        Self {
            by_type: HashMap::new(),
        }
    }

    /// Register `o` for `ds_type`, replacing any earlier one.
    pub fn register(&mut self, ds_type: impl Into<String>, o: Box<dyn TypeOverride>) -> &mut Self {
        self.by_type.insert(ds_type.into(), o);
        self
    }

    pub fn get(&self, ds_type: &str) -> Option<&dyn TypeOverride> {
        self.by_type.get(ds_type).map(|o| o.as_ref())
    }
}

impl Default for TypeOverrides {
    fn default() -> Self {
        let mut overrides = Self::empty();
        overrides
            .register(DS_INFLUXDB_08, Box::new(InfluxDb08))
            .register(DS_INFLUXDB, Box::new(InfluxDb))
            .register(DS_ES, Box::new(Elasticsearch))
            .register(DS_PROMETHEUS, Box::new(Prometheus));
        overrides
    }
}

fn password(record: &data_source::Model, master_key: &[u8; 32]) -> String {
    record.decrypted_password(master_key).unwrap_or_else(|e| {
        tracing::error!(id = record.id, error = %e, "failed to decrypt data source password");
        String::new()
    })
}

/// Legacy InfluxDB 0.8: database is addressed through the url.
struct InfluxDb08;

impl TypeOverride for InfluxDb08 {
    fn apply_direct(
        &self,
        record: &data_source::Model,
        entry: &mut ResolvedDataSource,
        master_key: &[u8; 32],
    ) {
        entry.username = Some(record.user.clone());
        entry.password = Some(password(record, master_key));
        entry.url = Some(format!("{}/db/{}", record.url, record.database));
    }
}

struct InfluxDb;

impl TypeOverride for InfluxDb {
    fn apply_direct(
        &self,
        record: &data_source::Model,
        entry: &mut ResolvedDataSource,
        master_key: &[u8; 32],
    ) {
        entry.username = Some(record.user.clone());
        entry.password = Some(password(record, master_key));
        entry.url = Some(record.url.clone());
    }

    fn apply(&self, record: &data_source::Model, entry: &mut ResolvedDataSource) {
        entry.database = Some(record.database.clone());
    }
}

struct Elasticsearch;

impl TypeOverride for Elasticsearch {
    fn apply(&self, record: &data_source::Model, entry: &mut ResolvedDataSource) {
        entry.database = Some(record.database.clone());
    }
}

/// Keeps the un-proxied url so the frontend can link to Prometheus' own UI.
struct Prometheus;

impl TypeOverride for Prometheus {
    fn apply(&self, record: &data_source::Model, entry: &mut ResolvedDataSource) {
        if let Some(obj) = entry.json_data.as_mut().and_then(|v| v.as_object_mut()) {
            obj.insert("directUrl".to_string(), record.url.clone().into());
        }
    }
}
