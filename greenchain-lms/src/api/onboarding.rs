//! Onboarding quiz, recommendations and module views

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use greenchain_common::models::{CurriculumModule, QuizScores};
use serde_json::{json, Value};

use super::{AuthenticatedUser, JsonBody};
use crate::error::{ApiError, ApiResult};
use crate::services::is_lesson_recommended;
use crate::AppState;

/// POST /onboarding-quiz
///
/// Stores the scores, derives per-module tags and marks onboarding complete.
pub async fn submit_onboarding_quiz(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    JsonBody(scores): JsonBody<QuizScores>,
) -> ApiResult<Json<Value>> {
    let recommendations = state.recommendations.save(&user.id, scores).await?;
    Ok(Json(json!({ "success": true, "recommendations": recommendations })))
}

/// GET /recommendations
///
/// `{recommendations: null}` until the quiz has been taken.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Value>> {
    let result = state.recommendations.load(&user.id).await?;
    Ok(Json(json!({
        "recommendations": result.map(|r| r.recommendations)
    })))
}

/// GET /modules/:module/lessons
///
/// The caller's lessons in one module, each flagged `recommended`. The
/// module is given by key (`emergingTech`) or category name.
pub async fn module_lessons(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(module): Path<String>,
) -> ApiResult<Json<Value>> {
    let module = CurriculumModule::parse(&module)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown module '{}'", module)))?;

    let recommendations = state
        .recommendations
        .load(&user.id)
        .await?
        .map(|r| r.recommendations);

    let lessons: Vec<Value> = state
        .lessons
        .list_owned(&user.id)
        .await?
        .into_iter()
        .filter(|lesson| lesson.module() == Some(module))
        .map(|lesson| {
            let recommended = is_lesson_recommended(
                &lesson,
                recommendations.as_ref(),
                state.advanced_detection,
            );
            let mut value = json!(lesson);
            if let Value::Object(map) = &mut value {
                map.insert("recommended".to_string(), Value::Bool(recommended));
            }
            value
        })
        .collect();

    Ok(Json(json!({
        "module": module.key(),
        "category": module.category(),
        "recommendation": recommendations.map(|r| r.for_module(module)),
        "lessons": lessons,
    })))
}
