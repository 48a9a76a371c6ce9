use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware as auth_middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::health::health));

    // Any authenticated caller; role rules are enforced by the services.
    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/environments",
            get(handlers::catalog::list_environments),
        )
        .route(
            "/api/environments/{id}",
            get(handlers::catalog::get_environment),
        )
        .route(
            "/api/resource-types",
            get(handlers::catalog::list_resource_types),
        )
        .route(
            "/api/resource-types/{id}",
            get(handlers::catalog::get_resource_type),
        )
        .route(
            "/api/resource-types/{id}/schema",
            get(handlers::catalog::get_resource_type_schema),
        )
        .route(
            "/api/requests",
            get(handlers::requests::list_requests).post(handlers::requests::create_request),
        )
        .route(
            "/api/requests/{id}",
            get(handlers::requests::get_request)
                .put(handlers::requests::update_request)
                .delete(handlers::requests::delete_request),
        )
        .route(
            "/api/requests/{id}/submit",
            post(handlers::requests::submit_request),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let approver_routes = Router::new()
        .route("/api/approvals", get(handlers::approvals::list_approvals))
        .route(
            "/api/approvals/{id}",
            get(handlers::approvals::get_approval),
        )
        .route(
            "/api/approvals/{id}/approve",
            post(handlers::approvals::approve),
        )
        .route(
            "/api/approvals/{id}/reject",
            post(handlers::approvals::reject),
        )
        .route_layer(axum_middleware::from_fn(auth_middleware::require_approver))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/admin/audit-logs",
            get(handlers::audit_logs::list_audit_logs),
        )
        .route_layer(axum_middleware::from_fn(auth_middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(user_routes)
        .merge(approver_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(auth_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}
