//! Organization data sources: lookup, creation and resolution into the shape
//! the frontend consumes.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::crypto::{self, CryptoError};
use crate::entity::data_source::{self, Access, SECURE_BASIC_AUTH_PASSWORD, SECURE_PASSWORD};

pub mod overrides;
pub mod permissions;
pub mod resolver;

pub use overrides::{TypeOverride, TypeOverrides};
pub use permissions::{
    AssignmentPermissionFilter, DataSourcePermissionFilter, FilterOutcome, NoPermissionFilter,
    PermissionError, grant,
};
pub use resolver::{DataSourceResolver, ResolvedDataSource, ResolvedDataSources};

#[derive(Debug)]
pub enum DataSourceError {
    Db(sea_orm::DbErr),
    Crypto(CryptoError),
    InvalidJsonData(String),
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceError::Db(e) => write!(f, "Database error: {e}"),
            DataSourceError::Crypto(e) => write!(f, "{e}"),
            DataSourceError::InvalidJsonData(e) => write!(f, "Invalid jsonData: {e}"),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// All data sources of an org, ordered by id so that name collisions and
/// multiple default flags resolve the same way on every call.
pub async fn find_by_org(
    db: &DatabaseConnection,
    org_id: i64,
) -> Result<Vec<data_source::Model>, sea_orm::DbErr> {
    data_source::Entity::find()
        .filter(data_source::Column::OrgId.eq(org_id))
        .order_by_asc(data_source::Column::Id)
        .all(db)
        .await
}

/// Input for [`create`]. Secrets are given in clear text and encrypted on insert.
#[derive(Debug, Clone)]
pub struct NewDataSource {
    pub org_id: i64,
    pub name: String,
    pub ds_type: String,
    pub access: Access,
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub basic_auth_user: Option<String>,
    pub basic_auth_password: Option<String>,
    pub with_credentials: bool,
    pub is_default: bool,
    pub json_data: Option<serde_json::Value>,
}

impl NewDataSource {
    pub fn new(org_id: i64, name: impl Into<String>, ds_type: impl Into<String>) -> Self {
        Self {
            org_id,
            name: name.into(),
            ds_type: ds_type.into(),
            access: Access::Proxy,
            url: String::new(),
            database: String::new(),
            user: String::new(),
            password: None,
            basic_auth_user: None,
            basic_auth_password: None,
            with_credentials: false,
            is_default: false,
            json_data: None,
        }
    }
}

pub async fn create(
    db: &DatabaseConnection,
    master_key: &[u8; 32],
    input: NewDataSource,
) -> Result<data_source::Model, DataSourceError> {
    let mut secure = serde_json::Map::new();
    if let Some(password) = input.password {
        secure.insert(SECURE_PASSWORD.to_string(), password.into());
    }
    if let Some(password) = input.basic_auth_password {
        secure.insert(SECURE_BASIC_AUTH_PASSWORD.to_string(), password.into());
    }
    let secure_json_data = if secure.is_empty() {
        String::new()
    } else {
        crypto::encrypt_json(&serde_json::Value::Object(secure), master_key)
            .map_err(DataSourceError::Crypto)?
    };

    let json_data = match input.json_data {
        Some(value) if !value.is_object() => {
            return Err(DataSourceError::InvalidJsonData(
                "jsonData must be a JSON object".to_string(),
            ));
        }
        Some(value) => Some(value.to_string()),
        None => None,
    };

    let now = Utc::now().naive_utc();
    let model = data_source::ActiveModel {
        org_id: Set(input.org_id),
        uid: Set(new_uid()),
        name: Set(input.name),
        ds_type: Set(input.ds_type),
        access: Set(input.access),
        url: Set(input.url),
        database: Set(input.database),
        user: Set(input.user),
        basic_auth: Set(input.basic_auth_user.is_some()),
        basic_auth_user: Set(input.basic_auth_user.unwrap_or_default()),
        with_credentials: Set(input.with_credentials),
        is_default: Set(input.is_default),
        json_data: Set(json_data),
        secure_json_data: Set(secure_json_data),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(DataSourceError::Db)?;

    tracing::info!(
        id = model.id,
        org_id = model.org_id,
        name = %model.name,
        ds_type = %model.ds_type,
        "created data source"
    );

    Ok(model)
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()[..14].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_encrypts_secrets() {
        let db = setup().await;
        let key = [9u8; 32];

        let mut input = NewDataSource::new(1, "influx", "influxdb");
        input.access = Access::Direct;
        input.password = Some("s3cret".to_string());
        input.basic_auth_user = Some("alice".to_string());
        input.basic_auth_password = Some("b4sic".to_string());

        let model = create(&db, &key, input).await.unwrap();

        assert!(model.basic_auth);
        assert_eq!(model.uid.len(), 14);
        assert!(!model.secure_json_data.contains("s3cret"));
        assert_eq!(model.decrypted_password(&key).unwrap(), "s3cret");
        assert_eq!(model.decrypted_basic_auth_password(&key).unwrap(), "b4sic");
    }

    #[tokio::test]
    async fn create_rejects_non_object_json_data() {
        let db = setup().await;
        let mut input = NewDataSource::new(1, "prom", "prometheus");
        input.json_data = Some(serde_json::json!([1, 2]));

        let err = create(&db, &[0u8; 32], input).await.unwrap_err();
        assert!(matches!(err, DataSourceError::InvalidJsonData(_)));
    }

    #[tokio::test]
    async fn name_is_unique_per_org() {
        let db = setup().await;
        let key = [0u8; 32];
        create(&db, &key, NewDataSource::new(1, "prod", "prometheus"))
            .await
            .unwrap();

        let dup = create(&db, &key, NewDataSource::new(1, "prod", "prometheus")).await;
        assert!(dup.is_err(), "Duplicate name in one org should fail");

        create(&db, &key, NewDataSource::new(2, "prod", "prometheus"))
            .await
            .expect("Same name in another org is fine");
    }

    #[tokio::test]
    async fn find_by_org_is_scoped_and_ordered() {
        let db = setup().await;
        let key = [0u8; 32];
        for (org, name) in [(1, "b"), (2, "other"), (1, "a")] {
            create(&db, &key, NewDataSource::new(org, name, "prometheus"))
                .await
                .unwrap();
        }

        let found = find_by_org(&db, 1).await.unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(found[0].id < found[1].id);
    }
}
