use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::{
    error::AppError,
    models::catalog::{Environment, ResourceType},
    state::AppState,
};

pub async fn list_environments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Environment>>, AppError> {
    Ok(Json(state.catalog.list_environments().await?))
}

pub async fn get_environment(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Environment>, AppError> {
    Ok(Json(state.catalog.get_environment(&key).await?))
}

pub async fn list_resource_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceType>>, AppError> {
    Ok(Json(state.catalog.list_resource_types().await?))
}

pub async fn get_resource_type(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ResourceType>, AppError> {
    Ok(Json(state.catalog.get_resource_type(&key).await?))
}

pub async fn get_resource_type_schema(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.catalog.get_resource_type_schema(&key).await?))
}
