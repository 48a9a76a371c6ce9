use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    models::{
        identity::Caller,
        request::{
            CreateRequestPayload, DeleteRequestResponse, ProvisionRequest, RequestListQuery,
            UpdateRequestPayload,
        },
    },
    state::AppState,
    types::RequestId,
};

pub async fn list_requests(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<ProvisionRequest>>, AppError> {
    let requests = state.requests.list(&caller, query).await?;
    Ok(Json(requests))
}

pub async fn create_request(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<(StatusCode, Json<ProvisionRequest>), AppError> {
    let request = state.requests.create(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<RequestId>,
) -> Result<Json<ProvisionRequest>, AppError> {
    let request = state.requests.get(&caller, id).await?;
    Ok(Json(request))
}

pub async fn update_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<RequestId>,
    Json(payload): Json<UpdateRequestPayload>,
) -> Result<Json<ProvisionRequest>, AppError> {
    let request = state.requests.update(&caller, id, payload).await?;
    Ok(Json(request))
}

pub async fn submit_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<RequestId>,
) -> Result<Json<ProvisionRequest>, AppError> {
    let request = state.requests.submit(&caller, id).await?;
    Ok(Json(request))
}

pub async fn delete_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<RequestId>,
) -> Result<Json<DeleteRequestResponse>, AppError> {
    let outcome = state.requests.delete(&caller, id).await?;
    Ok(Json(DeleteRequestResponse::new(id, outcome)))
}
