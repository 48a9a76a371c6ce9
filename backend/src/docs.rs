#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    error::ErrorResponse,
    handlers::{auth::MeResponse, health::HealthResponse},
    models::{
        approval::{Approval, ApprovalListQuery, ApprovalStatus, DecisionOutcome, DecisionPayload},
        audit_log::{AuditLog, AuditLogListQuery},
        catalog::{Environment, ResourceType},
        identity::UserRole,
        request::{
            CreateRequestPayload, DeleteOutcome, DeleteRequestResponse, Priority,
            ProvisionRequest, RequestListQuery, RequestStatus, UpdateRequestPayload,
        },
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        me_doc,
        list_environments_doc,
        get_environment_doc,
        list_resource_types_doc,
        get_resource_type_doc,
        get_resource_type_schema_doc,
        list_requests_doc,
        create_request_doc,
        get_request_doc,
        update_request_doc,
        delete_request_doc,
        submit_request_doc,
        list_approvals_doc,
        get_approval_doc,
        approve_doc,
        reject_doc,
        list_audit_logs_doc
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            MeResponse,
            UserRole,
            // catalog
            Environment,
            ResourceType,
            // requests
            ProvisionRequest,
            RequestStatus,
            Priority,
            CreateRequestPayload,
            UpdateRequestPayload,
            DeleteOutcome,
            DeleteRequestResponse,
            // approvals
            Approval,
            ApprovalStatus,
            DecisionOutcome,
            DecisionPayload,
            // audit
            AuditLog
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "System", description = "Health and identity"),
        (name = "Catalog", description = "Environments and resource types"),
        (name = "Requests", description = "Provisioning request lifecycle"),
        (name = "Approvals", description = "Approver decisions"),
        (name = "Admin", description = "Audit trail")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = HealthResponse)),
    tag = "System",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Identity carried by the bearer token", body = MeResponse),
        (status = 401, body = ErrorResponse)
    ),
    tag = "System"
)]
fn me_doc() {}

#[utoipa::path(
    get,
    path = "/api/environments",
    responses((status = 200, description = "Active environments", body = [Environment])),
    tag = "Catalog"
)]
fn list_environments_doc() {}

#[utoipa::path(
    get,
    path = "/api/environments/{id}",
    params(("id" = String, Path, description = "Environment id or name")),
    responses(
        (status = 200, body = Environment),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Catalog"
)]
fn get_environment_doc() {}

#[utoipa::path(
    get,
    path = "/api/resource-types",
    responses((status = 200, description = "Active resource types", body = [ResourceType])),
    tag = "Catalog"
)]
fn list_resource_types_doc() {}

#[utoipa::path(
    get,
    path = "/api/resource-types/{id}",
    params(("id" = String, Path, description = "Resource type id or name")),
    responses(
        (status = 200, body = ResourceType),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Catalog"
)]
fn get_resource_type_doc() {}

#[utoipa::path(
    get,
    path = "/api/resource-types/{id}/schema",
    params(("id" = String, Path, description = "Resource type id or name")),
    responses(
        (status = 200, description = "JSON Schema for the configuration", body = serde_json::Value),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Catalog"
)]
fn get_resource_type_schema_doc() {}

#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestListQuery),
    responses((status = 200, body = [ProvisionRequest])),
    tag = "Requests"
)]
fn list_requests_doc() {}

#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, body = ProvisionRequest),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Requests"
)]
fn create_request_doc() {}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, body = ProvisionRequest),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Requests"
)]
fn get_request_doc() {}

#[utoipa::path(
    put,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    request_body = UpdateRequestPayload,
    responses(
        (status = 200, body = ProvisionRequest),
        (status = 400, description = "Not a draft or invalid input", body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Requests"
)]
fn update_request_doc() {}

#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Deleted or cancelled", body = DeleteRequestResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Requests"
)]
fn delete_request_doc() {}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/submit",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Now pending or approved", body = ProvisionRequest),
        (status = 400, description = "Wrong state or schema violation", body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Requests"
)]
fn submit_request_doc() {}

#[utoipa::path(
    get,
    path = "/api/approvals",
    params(ApprovalListQuery),
    responses(
        (status = 200, body = [Approval]),
        (status = 403, body = ErrorResponse)
    ),
    tag = "Approvals"
)]
fn list_approvals_doc() {}

#[utoipa::path(
    get,
    path = "/api/approvals/{id}",
    params(("id" = String, Path, description = "Approval id")),
    responses(
        (status = 200, body = Approval),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Approvals"
)]
fn get_approval_doc() {}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/approve",
    params(("id" = String, Path, description = "Approval id")),
    request_body(content = DecisionPayload, description = "Optional comment"),
    responses(
        (status = 200, body = Approval),
        (status = 400, description = "Approval already processed", body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Approvals"
)]
fn approve_doc() {}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/reject",
    params(("id" = String, Path, description = "Approval id")),
    request_body(content = DecisionPayload, description = "Optional comment"),
    responses(
        (status = 200, body = Approval),
        (status = 400, description = "Approval already processed", body = ErrorResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Approvals"
)]
fn reject_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(AuditLogListQuery),
    responses(
        (status = 200, body = [AuditLog]),
        (status = 403, body = ErrorResponse)
    ),
    tag = "Admin"
)]
fn list_audit_logs_doc() {}
