#![allow(dead_code)]

use portal_backend::{
    config::{Config, MEMORY_DATABASE_URL},
    models::{
        catalog::{Environment, ResourceType},
        identity::{Caller, UserRole},
        request::{CreateRequestPayload, ProvisionRequest},
    },
    repositories::{CatalogRepositoryTrait, InMemoryStore},
    state::{AppState, Repositories},
    types::UserId,
    utils::jwt::create_access_token,
};
use serde_json::{json, Value};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

pub fn test_config() -> Config {
    Config {
        database_url: MEMORY_DATABASE_URL.to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        seed_catalog: false,
        ..Config::default()
    }
}

/// Application state over a fresh in-memory store with the default catalog.
pub fn test_state() -> (AppState, InMemoryStore) {
    let store = InMemoryStore::with_default_catalog();
    let state = AppState::new(test_config(), Repositories::in_memory(store.clone()));
    (state, store)
}

pub fn caller(role: UserRole) -> Caller {
    Caller::new(UserId::new(), role)
        .with_client(Some("198.51.100.4".to_string()), Some("portal-tests".to_string()))
}

pub fn bearer_for(caller: &Caller) -> String {
    let token = create_access_token(
        caller.user_id,
        format!("{}@example.com", caller.role.as_str()),
        caller.role,
        TEST_JWT_SECRET,
        1,
    )
    .expect("issue token");
    format!("Bearer {}", token)
}

pub async fn environment(store: &InMemoryStore, name: &str) -> Environment {
    store
        .find_environment_by_key(name)
        .await
        .expect("catalog lookup")
        .unwrap_or_else(|| panic!("environment {name} seeded"))
}

pub async fn resource_type(store: &InMemoryStore, name: &str) -> ResourceType {
    store
        .find_resource_type_by_key(name)
        .await
        .expect("catalog lookup")
        .unwrap_or_else(|| panic!("resource type {name} seeded"))
}

pub fn gke_configuration() -> Value {
    json!({
        "machine_type": "e2-standard-4",
        "min_nodes": 1,
        "max_nodes": 3
    })
}

pub async fn gke_payload(store: &InMemoryStore, environment_name: &str) -> CreateRequestPayload {
    CreateRequestPayload {
        title: format!("GKE cluster in {environment_name}"),
        description: Some("integration test".to_string()),
        environment_id: environment(store, environment_name).await.id,
        resource_type_id: resource_type(store, "gke").await.id,
        configuration: gke_configuration(),
        priority: None,
    }
}

/// Creates a draft gke request owned by `owner` in the named environment.
pub async fn create_draft(
    state: &AppState,
    store: &InMemoryStore,
    owner: &Caller,
    environment_name: &str,
) -> ProvisionRequest {
    state
        .requests
        .create(owner, gke_payload(store, environment_name).await)
        .await
        .expect("create draft")
}
