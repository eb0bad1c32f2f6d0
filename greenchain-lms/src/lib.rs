//! greenchain-lms library - GreenChain learning management backend
//!
//! Lessons, curriculum seeding, onboarding recommendations and essay
//! responses over a key-value store, served as a JSON HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use greenchain_common::models::AdvancedDetection;
use greenchain_common::KeyValueStore;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;

pub mod api;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod services;

pub use catalog::Catalog;
pub use error::{ApiError, ApiResult};
pub use identity::{IdentityProvider, SqliteIdentityProvider};

use services::{CurriculumSeeder, LessonStore, RecommendationService, ResponseCollector};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub lessons: LessonStore,
    pub seeder: Arc<CurriculumSeeder>,
    pub recommendations: RecommendationService,
    pub responses: ResponseCollector,
    /// How `advanced`-tagged modules classify lessons
    pub advanced_detection: AdvancedDetection,
    /// Path prefix every route is mounted under ("" = root)
    pub api_prefix: String,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wire the services over one store and identity provider
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        catalog: Arc<Catalog>,
    ) -> Self {
        let lessons = LessonStore::new(kv.clone());
        Self {
            seeder: Arc::new(CurriculumSeeder::new(kv.clone(), lessons.clone(), catalog)),
            recommendations: RecommendationService::new(kv.clone(), identity.clone()),
            responses: ResponseCollector::new(kv),
            lessons,
            identity,
            advanced_detection: AdvancedDetection::default(),
            api_prefix: String::new(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn with_advanced_detection(mut self, detection: AdvancedDetection) -> Self {
        self.advanced_detection = detection;
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Panics in handlers become the same JSON 500 as any other internal error
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// Build application router
///
/// Health, signup and login are public; everything else requires a bearer
/// token. All routes live under `state.api_prefix`.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/me", get(api::get_me))
        .route("/update-role", post(api::update_role))
        .route("/lessons", post(api::create_lesson).get(api::list_lessons))
        .route(
            "/lessons/:id",
            get(api::get_lesson)
                .put(api::update_lesson)
                .delete(api::delete_lesson),
        )
        .route("/lessons/:id/add-to-dashboard", post(api::add_to_dashboard))
        .route("/browse/lessons", get(api::browse_lessons))
        .route("/clear-curriculum-lessons", post(api::clear_curriculum_lessons))
        .route("/init-curriculum", post(api::init_curriculum))
        .route("/essay-responses", post(api::submit_essay_response))
        .route("/essay-responses/:lesson_id", get(api::list_essay_responses))
        .route("/onboarding-quiz", post(api::submit_onboarding_quiz))
        .route("/recommendations", get(api::get_recommendations))
        .route("/modules/:module/lessons", get(api::module_lessons))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/signup", post(api::signup))
        .route("/login", post(api::login))
        .merge(api::health_routes());

    let routes = Router::new().merge(protected).merge(public);

    // Router::nest rejects an empty prefix
    let app = if state.api_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&state.api_prefix, routes)
    };

    app.layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
