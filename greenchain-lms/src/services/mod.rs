//! Domain services over the key-value store

pub mod lesson_store;
pub mod recommendation;
pub mod responses;
pub mod seeder;

pub use lesson_store::{BrowsedLesson, ClearReport, LessonStore};
pub use recommendation::{derive_recommendations, is_lesson_recommended, RecommendationService};
pub use responses::ResponseCollector;
pub use seeder::{plan, CurriculumSeeder, SeedPlan, SeedReport, SeedState};
