//! HTTP API handlers for greenchain-lms

pub mod account;
pub mod auth;
pub mod curriculum;
pub mod essays;
pub mod health;
pub mod lessons;
pub mod onboarding;

pub use account::{get_me, login, signup, update_role};
pub use auth::{auth_middleware, AuthenticatedUser};
pub use curriculum::{clear_curriculum_lessons, init_curriculum};
pub use essays::{list_essay_responses, submit_essay_response};
pub use health::health_routes;
pub use lessons::{
    add_to_dashboard, browse_lessons, create_lesson, delete_lesson, get_lesson, list_lessons,
    update_lesson,
};
pub use onboarding::{get_recommendations, module_lessons, submit_onboarding_quiz};

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

/// `Json` extractor whose rejections use the API's JSON error body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::PayloadTooLarge(rejection.body_text()))
            }
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}
