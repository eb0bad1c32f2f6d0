//! Curriculum seeding endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InitQuery {
    pub force: Option<String>,
}

/// POST /init-curriculum[?force=true]
///
/// `skipped: true` when the caller was already seeded and `force` is not
/// `true`. `expectedLessonCount` is always the catalog length.
pub async fn init_curriculum(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<InitQuery>,
) -> ApiResult<Json<Value>> {
    let force = query.force.as_deref() == Some("true");
    let report = state.seeder.ensure_seeded(&user.id, force).await?;

    let message = if report.skipped {
        "Curriculum already initialized".to_string()
    } else {
        format!(
            "Successfully initialized {} curriculum lessons",
            report.lesson_count
        )
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "skipped": report.skipped,
        "lessonCount": report.lesson_count,
        "expectedLessonCount": report.expected_lesson_count,
        "removed": report.removed,
        "kept": report.kept,
    })))
}

/// POST /clear-curriculum-lessons
///
/// Deletes the caller's curriculum-flagged lessons only.
pub async fn clear_curriculum_lessons(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Value>> {
    let report = state.lessons.clear_curriculum(&user.id).await?;
    Ok(Json(json!({ "success": true, "deleted": report.removed })))
}
