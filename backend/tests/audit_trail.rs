use portal_backend::{
    config::Config,
    error::AppError,
    models::{
        approval::{DecisionOutcome, DecisionPayload},
        audit_log::AuditLogListQuery,
        identity::UserRole,
        request::UpdateRequestPayload,
    },
    repositories::{ApprovalRepositoryTrait, InMemoryStore},
    state::{AppState, Repositories},
};
use serde_json::json;
use uuid::Uuid;

mod support;
use support::{caller, create_draft, test_state};

fn query_for(resource_id: impl Into<Uuid>) -> AuditLogListQuery {
    AuditLogListQuery {
        resource_id: Some(resource_id.into()),
        ..AuditLogListQuery::default()
    }
}

#[tokio::test]
async fn every_mutation_leaves_an_entry() {
    let (state, store) = test_state();
    let owner = caller(UserRole::User);
    let approver = caller(UserRole::Approver);
    let admin = caller(UserRole::Admin);

    let draft = create_draft(&state, &store, &owner, "prod").await;
    state
        .requests
        .update(
            &owner,
            draft.id,
            UpdateRequestPayload {
                title: Some("Renamed".to_string()),
                ..UpdateRequestPayload::default()
            },
        )
        .await
        .unwrap();
    state.requests.submit(&owner, draft.id).await.unwrap();
    let approval = store
        .find_pending_for_request(draft.id)
        .await
        .unwrap()
        .unwrap();
    state
        .approvals
        .decide(
            &approver,
            approval.id,
            DecisionOutcome::Approved,
            DecisionPayload::default(),
        )
        .await
        .unwrap();

    let request_trail = state
        .audit_logs
        .list(&admin, query_for(draft.id))
        .await
        .unwrap();
    let actions: Vec<&str> = request_trail.iter().map(|log| log.action.as_str()).collect();
    assert_eq!(actions, vec!["submit", "update", "create"]);
    assert!(request_trail
        .iter()
        .all(|log| log.resource_type == "request" && log.user_id == Some(owner.user_id)));

    let submit = &request_trail[0];
    assert_eq!(
        submit.old_values.as_ref().map(|v| v.0.clone()),
        Some(json!({ "status": "draft" }))
    );
    let new_values = submit.new_values.as_ref().expect("new values").0.clone();
    assert_eq!(new_values["status"], json!("pending"));
    assert_eq!(new_values["approval_id"], json!(approval.id));
    assert_eq!(submit.ip_address.as_deref(), Some("198.51.100.4"));
    assert_eq!(submit.user_agent.as_deref(), Some("portal-tests"));

    let approval_trail = state
        .audit_logs
        .list(&admin, query_for(approval.id))
        .await
        .unwrap();
    assert_eq!(approval_trail.len(), 1);
    let decision = &approval_trail[0];
    assert_eq!(decision.action, "approve");
    assert_eq!(decision.resource_type, "approval");
    assert_eq!(decision.user_id, Some(approver.user_id));
    let new_values = decision.new_values.as_ref().expect("new values").0.clone();
    assert_eq!(new_values["status"], json!("approved"));
    assert_eq!(new_values["request_status"], json!("approved"));
}

#[tokio::test]
async fn cancel_and_delete_are_recorded() {
    let (state, store) = test_state();
    let owner = caller(UserRole::User);
    let admin = caller(UserRole::Admin);
    let submitted = create_draft(&state, &store, &owner, "staging").await;
    let draft = create_draft(&state, &store, &owner, "dev").await;
    state.requests.submit(&owner, submitted.id).await.unwrap();

    state.requests.delete(&owner, submitted.id).await.unwrap();
    state.requests.delete(&admin, draft.id).await.unwrap();

    let cancelled = state
        .audit_logs
        .list(&admin, query_for(submitted.id))
        .await
        .unwrap();
    assert_eq!(cancelled[0].action, "cancel");
    assert_eq!(
        cancelled[0].new_values.as_ref().map(|v| v.0.clone()),
        Some(json!({ "status": "cancelled" }))
    );

    let deleted = state
        .audit_logs
        .list(&admin, query_for(draft.id))
        .await
        .unwrap();
    assert_eq!(deleted[0].action, "delete");
    assert_eq!(deleted[0].user_id, Some(admin.user_id));
    assert!(deleted[0].old_values.is_some());
}

#[tokio::test]
async fn list_filters_by_action() {
    let (state, store) = test_state();
    let owner = caller(UserRole::User);
    let admin = caller(UserRole::Admin);
    create_draft(&state, &store, &owner, "dev").await;
    let second = create_draft(&state, &store, &owner, "dev").await;
    state.requests.submit(&owner, second.id).await.unwrap();

    let creates = state
        .audit_logs
        .list(
            &admin,
            AuditLogListQuery {
                action: Some("create".to_string()),
                ..AuditLogListQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(creates.len(), 2);
    assert!(creates.iter().all(|log| log.action == "create"));
}

#[tokio::test]
async fn only_admins_read_the_trail() {
    let (state, _store) = test_state();
    for role in [UserRole::User, UserRole::Approver] {
        let err = state
            .audit_logs
            .list(&caller(role), AuditLogListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}

#[tokio::test]
async fn every_configuration_records_mutations() {
    let store = InMemoryStore::with_default_catalog();
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("memory://".to_string()),
        "AUDIT_LOG_ENABLED" => Some("false".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::new(config, Repositories::in_memory(store.clone()));
    let owner = caller(UserRole::User);
    let admin = caller(UserRole::Admin);

    let draft = create_draft(&state, &store, &owner, "dev").await;
    state.requests.submit(&owner, draft.id).await.unwrap();

    let trail = state
        .audit_logs
        .list(&admin, query_for(draft.id))
        .await
        .unwrap();
    let actions: Vec<&str> = trail.iter().map(|log| log.action.as_str()).collect();
    assert_eq!(actions, vec!["submit", "create"]);
}
