use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashSet;
use uuid::Uuid;

use crate::context::RequestUser;
use crate::entity::{data_source, data_source_permission};

#[derive(Debug)]
pub enum PermissionError {
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionError::Db(e) => write!(f, "Permission lookup failed: {e}"),
        }
    }
}

impl std::error::Error for PermissionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The data sources the user may see.
    Filtered(Vec<data_source::Model>),
    /// No permission system is installed; use the input unchanged.
    Unavailable,
}

#[async_trait]
pub trait DataSourcePermissionFilter: Send + Sync {
    async fn filter(
        &self,
        user: &RequestUser,
        data_sources: &[data_source::Model],
    ) -> Result<FilterOutcome, PermissionError>;
}

pub struct NoPermissionFilter;

#[async_trait]
impl DataSourcePermissionFilter for NoPermissionFilter {
    async fn filter(
        &self,
        _user: &RequestUser,
        _data_sources: &[data_source::Model],
    ) -> Result<FilterOutcome, PermissionError> {
        Ok(FilterOutcome::Unavailable)
    }
}

/// Filters on `data_source_permission` rows. Data sources without rows are
/// open to the org; restricted ones are visible to listed users and server
/// admins only.
pub struct AssignmentPermissionFilter {
    db: DatabaseConnection,
}

impl AssignmentPermissionFilter {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DataSourcePermissionFilter for AssignmentPermissionFilter {
    async fn filter(
        &self,
        user: &RequestUser,
        data_sources: &[data_source::Model],
    ) -> Result<FilterOutcome, PermissionError> {
        if user.is_server_admin || data_sources.is_empty() {
            return Ok(FilterOutcome::Filtered(data_sources.to_vec()));
        }

        let ids: Vec<i64> = data_sources.iter().map(|d| d.id).collect();
        let rows = data_source_permission::Entity::find()
            .filter(data_source_permission::Column::DataSourceId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(PermissionError::Db)?;

        let restricted: HashSet<i64> = rows.iter().map(|r| r.data_source_id).collect();
        let granted: HashSet<i64> = rows
            .iter()
            .filter(|r| Some(r.user_id) == user.user_id)
            .map(|r| r.data_source_id)
            .collect();

        let visible: Vec<data_source::Model> = data_sources
            .iter()
            .filter(|d| !restricted.contains(&d.id) || granted.contains(&d.id))
            .cloned()
            .collect();

        tracing::debug!(
            org_id = user.org_id,
            total = data_sources.len(),
            visible = visible.len(),
            "filtered data sources by permission"
        );

        Ok(FilterOutcome::Filtered(visible))
    }
}

/// Restrict `data_source_id` to its granted users, adding `user_id` to them.
pub async fn grant(
    db: &DatabaseConnection,
    data_source_id: i64,
    user_id: Uuid,
) -> Result<data_source_permission::Model, PermissionError> {
    let row = data_source_permission::ActiveModel {
        id: Set(Uuid::now_v7()),
        data_source_id: Set(data_source_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .map_err(PermissionError::Db)?;

    tracing::info!(data_source_id, user_id = %user_id, "granted data source access");
    Ok(row)
}
