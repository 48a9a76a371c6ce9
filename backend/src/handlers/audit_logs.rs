use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        audit_log::{AuditLog, AuditLogListQuery},
        identity::Caller,
    },
    state::AppState,
};

pub async fn list_audit_logs(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AuditLogListQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    Ok(Json(state.audit_logs.list(&caller, query).await?))
}
