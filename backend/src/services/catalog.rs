use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::models::catalog::{Environment, ResourceType};
use crate::repositories::catalog::CatalogRepositoryTrait;

/// Read-only catalog queries. Lists return active entries only; lookups by
/// id or name return inactive entries too.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepositoryTrait>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepositoryTrait>) -> Self {
        Self { catalog }
    }

    pub async fn list_environments(&self) -> Result<Vec<Environment>, AppError> {
        self.catalog.list_environments().await
    }

    pub async fn get_environment(&self, key: &str) -> Result<Environment, AppError> {
        self.catalog
            .find_environment_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound("Environment not found".to_string()))
    }

    pub async fn list_resource_types(&self) -> Result<Vec<ResourceType>, AppError> {
        self.catalog.list_resource_types().await
    }

    pub async fn get_resource_type(&self, key: &str) -> Result<ResourceType, AppError> {
        self.catalog
            .find_resource_type_by_key(key)
            .await?
            .ok_or_else(|| AppError::NotFound("Resource type not found".to_string()))
    }

    pub async fn get_resource_type_schema(&self, key: &str) -> Result<Value, AppError> {
        Ok(self.get_resource_type(key).await?.config_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::catalog::MockCatalogRepositoryTrait;
    use crate::repositories::memory::InMemoryStore;

    #[tokio::test]
    async fn schema_lookup_by_name() {
        let service = CatalogService::new(Arc::new(InMemoryStore::with_default_catalog()));
        let schema = service.get_resource_type_schema("gke").await.unwrap();
        assert_eq!(
            schema["required"],
            serde_json::json!(["machine_type", "min_nodes", "max_nodes"])
        );
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let mut repo = MockCatalogRepositoryTrait::new();
        repo.expect_find_environment_by_key()
            .returning(|_| Ok(None));
        let service = CatalogService::new(Arc::new(repo));
        let err = service.get_environment("qa").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
