use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::identity::{Caller, Identity},
    state::AppState,
    utils::jwt::{verify_access_token, Claims},
};

/// Verifies the bearer token and attaches `Claims` and `Identity` to the request.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(request.headers(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims.identity());
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Approver or admin only. Must run after [`auth`].
pub async fn require_approver(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = identity_of(&request)?;
    if !identity.role.is_reviewer() {
        return Err(AppError::Forbidden(
            "Approver or admin role required".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Admin only. Must run after [`auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = identity_of(&request)?;
    if !matches!(identity.role, crate::models::identity::UserRole::Admin) {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(next.run(request).await)
}

fn identity_of(request: &Request) -> Result<Identity, AppError> {
    request
        .extensions()
        .get::<Identity>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    verify_access_token(token, secret).map_err(|err| {
        tracing::debug!(error = %err, "Rejected access token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    if let Some(rest) = header.strip_prefix("Bearer ") {
        return Some(rest);
    }
    if let Some(rest) = header.strip_prefix("bearer ") {
        return Some(rest);
    }
    if let Some(space_idx) = header.find(' ') {
        let (scheme, rest) = header.split_at(space_idx);
        if scheme.eq_ignore_ascii_case("bearer") {
            return Some(rest.trim_start());
        }
    }
    None
}

fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let real_ip = || {
        parts
            .headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
    };
    let peer = || {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };
    forwarded.or_else(real_ip).or_else(peer)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(Caller::from_identity(identity).with_client(client_ip(parts), user_agent))
    }
}
