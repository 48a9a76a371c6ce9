use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::identity::UserRole,
    types::UserId,
    utils::jwt::Claims,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}
