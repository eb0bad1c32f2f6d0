//! Account endpoints: signup, login, profile, role

use axum::{extract::State, Extension, Json};
use greenchain_common::models::{MetadataUpdate, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{AuthenticatedUser, JsonBody};
use crate::error::ApiResult;
use crate::identity::SignUp;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// POST /signup
///
/// Public. Role defaults to `student`.
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> ApiResult<Json<Value>> {
    let role = match request.role.as_deref() {
        None | Some("") => Role::default(),
        Some(role) => role.parse::<Role>()?,
    };

    let user = state
        .identity
        .sign_up(SignUp {
            email: request.email,
            password: request.password,
            name: request.name,
            role,
        })
        .await?;

    Ok(Json(json!({ "user": user })))
}

/// POST /login
///
/// Public. Exchanges credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let session = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(json!(session)))
}

/// GET /me
pub async fn get_me(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// POST /update-role
///
/// Changes the caller's own role.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<UpdateRoleRequest>,
) -> ApiResult<Json<Value>> {
    let role = request.role.parse::<Role>()?;
    let updated = state
        .identity
        .update_metadata(
            &user.id,
            MetadataUpdate {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?;

    info!("User {} role set to {}", user.id, role.as_str());
    Ok(Json(json!({ "success": true, "user": updated })))
}
