use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::{
        approval::{Approval, ApprovalListQuery, DecisionOutcome, DecisionPayload},
        identity::Caller,
    },
    state::AppState,
    types::ApprovalId,
};

pub async fn list_approvals(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ApprovalListQuery>,
) -> Result<Json<Vec<Approval>>, AppError> {
    let approvals = state.approvals.list(&caller, query).await?;
    Ok(Json(approvals))
}

pub async fn get_approval(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApprovalId>,
) -> Result<Json<Approval>, AppError> {
    let approval = state.approvals.get(&caller, id).await?;
    Ok(Json(approval))
}

pub async fn approve(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApprovalId>,
    body: Bytes,
) -> Result<Json<Approval>, AppError> {
    decide(state, caller, id, DecisionOutcome::Approved, body).await
}

pub async fn reject(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApprovalId>,
    body: Bytes,
) -> Result<Json<Approval>, AppError> {
    decide(state, caller, id, DecisionOutcome::Rejected, body).await
}

// The comment body is optional; an empty POST decides without one.
async fn decide(
    state: AppState,
    caller: Caller,
    id: ApprovalId,
    outcome: DecisionOutcome,
    body: Bytes,
) -> Result<Json<Approval>, AppError> {
    let payload = parse_decision(&body)?;
    let approval = state
        .approvals
        .decide(&caller, id, outcome, payload)
        .await?;
    Ok(Json(approval))
}

fn parse_decision(body: &[u8]) -> Result<DecisionPayload, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DecisionPayload::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("Invalid decision body: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_no_comment() {
        assert!(parse_decision(b"").unwrap().comment.is_none());
        assert!(parse_decision(b"  \n").unwrap().comment.is_none());
    }

    #[test]
    fn comment_is_read_from_json() {
        let payload = parse_decision(br#"{"comment":"ok for Q3"}"#).unwrap();
        assert_eq!(payload.comment.as_deref(), Some("ok for Q3"));
        assert!(matches!(
            parse_decision(b"{not json").unwrap_err(),
            AppError::BadRequest(_)
        ));
    }
}
