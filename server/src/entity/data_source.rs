use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::crypto::{self, CryptoError};

/// How the frontend reaches a data source.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Requests go through `/api/datasources/proxy/{id}`; credentials stay server side.
    #[sea_orm(string_value = "proxy")]
    Proxy,
    /// The browser talks to the backend itself.
    #[sea_orm(string_value = "direct")]
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "data_source")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    /// Unique within the org.
    pub name: String,
    pub ds_type: String,
    pub access: Access,
    pub url: String,
    pub database: String,
    pub user: String,
    pub basic_auth: bool,
    pub basic_auth_user: String,
    pub with_credentials: bool,
    pub is_default: bool,
    /// JSON text: type-specific, non-secret settings.
    pub json_data: Option<String>,
    /// AES-256-GCM encrypted base64 JSON object: `password`, `basicAuthPassword`.
    pub secure_json_data: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::data_source_permission::Entity")]
    DataSourcePermission,
}

impl Related<super::data_source_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSourcePermission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const SECURE_PASSWORD: &str = "password";
pub const SECURE_BASIC_AUTH_PASSWORD: &str = "basicAuthPassword";

impl Model {
    /// Decrypt one field of `secure_json_data`. Nothing is cached: every call
    /// decrypts the stored blob again.
    pub fn decrypt_secure_field(
        &self,
        master_key: &[u8; 32],
        field: &str,
    ) -> Result<Option<String>, CryptoError> {
        if self.secure_json_data.is_empty() {
            return Ok(None);
        }
        let secure = crypto::decrypt_json(&self.secure_json_data, master_key)?;
        Ok(secure
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    pub fn decrypted_password(&self, master_key: &[u8; 32]) -> Result<String, CryptoError> {
        Ok(self
            .decrypt_secure_field(master_key, SECURE_PASSWORD)?
            .unwrap_or_default())
    }

    pub fn decrypted_basic_auth_password(
        &self,
        master_key: &[u8; 32],
    ) -> Result<String, CryptoError> {
        Ok(self
            .decrypt_secure_field(master_key, SECURE_BASIC_AUTH_PASSWORD)?
            .unwrap_or_default())
    }
}
