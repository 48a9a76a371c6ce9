//! Catalog repository: environments and resource types.
//!
//! The catalog is reference data for the request lifecycle. Lookups accept
//! either the UUID or the unique short name, mirroring the REST paths.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::catalog::{Environment, ResourceType};
use crate::types::{EnvironmentId, ResourceTypeId};

const ENVIRONMENT_COLUMNS: &str = "id, name, display_name, description, gcp_project_id, region, \
     requires_approval, is_active, created_at, updated_at";

const RESOURCE_TYPE_COLUMNS: &str =
    "id, name, display_name, description, module_path, config_schema, base_cost, is_active, created_at";

/// Read-only access to the environment and resource type catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepositoryTrait: Send + Sync {
    /// Find an environment by ID, active or not
    async fn find_environment(&self, id: EnvironmentId) -> Result<Option<Environment>, AppError>;

    /// Find an environment by ID string or name
    async fn find_environment_by_key(&self, key: &str) -> Result<Option<Environment>, AppError>;

    /// Active environments ordered by name
    async fn list_environments(&self) -> Result<Vec<Environment>, AppError>;

    /// Find a resource type by ID, active or not
    async fn find_resource_type(&self, id: ResourceTypeId)
        -> Result<Option<ResourceType>, AppError>;

    /// Find a resource type by ID string or name
    async fn find_resource_type_by_key(&self, key: &str)
        -> Result<Option<ResourceType>, AppError>;

    /// Active resource types ordered by name
    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, AppError>;
}

/// PostgreSQL implementation of [`CatalogRepositoryTrait`].
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepositoryTrait for PgCatalogRepository {
    async fn find_environment(&self, id: EnvironmentId) -> Result<Option<Environment>, AppError> {
        let query = format!("SELECT {} FROM environments WHERE id = $1", ENVIRONMENT_COLUMNS);
        let row = sqlx::query_as::<_, Environment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_environment_by_key(&self, key: &str) -> Result<Option<Environment>, AppError> {
        let query = format!(
            "SELECT {} FROM environments WHERE id::text = $1 OR name = $1",
            ENVIRONMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Environment>(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_environments(&self) -> Result<Vec<Environment>, AppError> {
        let query = format!(
            "SELECT {} FROM environments WHERE is_active ORDER BY name",
            ENVIRONMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Environment>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_resource_type(
        &self,
        id: ResourceTypeId,
    ) -> Result<Option<ResourceType>, AppError> {
        let query = format!(
            "SELECT {} FROM resource_types WHERE id = $1",
            RESOURCE_TYPE_COLUMNS
        );
        let row = sqlx::query_as::<_, ResourceType>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_resource_type_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ResourceType>, AppError> {
        let query = format!(
            "SELECT {} FROM resource_types WHERE id::text = $1 OR name = $1",
            RESOURCE_TYPE_COLUMNS
        );
        let row = sqlx::query_as::<_, ResourceType>(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, AppError> {
        let query = format!(
            "SELECT {} FROM resource_types WHERE is_active ORDER BY name",
            RESOURCE_TYPE_COLUMNS
        );
        let rows = sqlx::query_as::<_, ResourceType>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
