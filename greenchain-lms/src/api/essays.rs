//! Essay response endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AuthenticatedUser, JsonBody};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEssayRequest {
    pub lesson_id: String,
    pub question_number: i64,
    pub response: String,
}

/// POST /essay-responses
pub async fn submit_essay_response(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<SubmitEssayRequest>,
) -> ApiResult<Json<Value>> {
    let question_number = u32::try_from(request.question_number)
        .map_err(|_| ApiError::BadRequest("questionNumber must be 1 or greater".to_string()))?;

    let stored = state
        .responses
        .submit(&request.lesson_id, question_number, &user, &request.response)
        .await?;

    Ok(Json(json!({ "success": true, "responseId": stored.id })))
}

/// GET /essay-responses/:lessonId
///
/// `{responses: {"<questionNumber>": [...]}}`
pub async fn list_essay_responses(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let grouped = state.responses.list_by_lesson(&lesson_id).await?;
    Ok(Json(json!({ "responses": grouped })))
}
