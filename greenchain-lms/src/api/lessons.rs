//! Lesson endpoints: owner-scoped CRUD, browse and copy

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use greenchain_common::models::Lesson;
use serde_json::{json, Map, Value};

use super::{AuthenticatedUser, JsonBody};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn into_object(body: Value) -> ApiResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// POST /lessons
///
/// Returns the new id and the stored lesson.
pub async fn create_lesson(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Value>> {
    let body = into_object(body)?;
    let mut draft: Lesson = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid lesson: {}", e)))?;
    draft.validate()?;
    draft.is_curriculum_lesson = false;

    let lesson = state.lessons.create(&user.id, draft).await?;
    Ok(Json(json!({ "lessonId": lesson.id, "lesson": lesson })))
}

/// GET /lessons
pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Value>> {
    let lessons = state.lessons.list_owned(&user.id).await?;
    Ok(Json(json!({ "lessons": lessons })))
}

/// GET /lessons/:id
///
/// Any owner's lesson can be read by id.
pub async fn get_lesson(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let lesson = state.lessons.get(&user.id, &id).await?;
    Ok(Json(json!({ "lesson": lesson })))
}

/// PUT /lessons/:id
///
/// Only the owner can update.
pub async fn update_lesson(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Value>> {
    let patch = into_object(body)?;
    let lesson = state.lessons.update(&user.id, &id, patch).await?;
    Ok(Json(json!({ "success": true, "lesson": lesson })))
}

/// DELETE /lessons/:id
pub async fn delete_lesson(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.lessons.delete(&user.id, &id).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /browse/lessons
///
/// Every owner's lessons with `authorName` / `authorEmail`.
pub async fn browse_lessons(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let lessons = state.lessons.browse(state.identity.as_ref()).await?;
    Ok(Json(json!({ "lessons": lessons })))
}

/// POST /lessons/:id/add-to-dashboard
pub async fn add_to_dashboard(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let copy = state.lessons.copy_to_owner(&id, &user.id).await?;
    Ok(Json(json!({ "success": true, "lessonId": copy.id })))
}
