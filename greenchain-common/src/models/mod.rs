//! Data model shared by the store and the HTTP layer
//!
//! Stored records are JSON values in the key-value store. The types here
//! normalize historical record shapes on read and write a single canonical
//! shape back.

pub mod lesson;
pub mod question;
pub mod recommendation;
pub mod response;
pub mod user;

pub use lesson::{Block, ContentBlock, Difficulty, Lesson, Section};
pub use question::{MultipleChoice, Question, QuestionKind};
pub use recommendation::{
    AdvancedDetection, CurriculumModule, QuizResult, QuizScores, RecommendationTag,
    Recommendations, ADVANCED_KEYWORDS,
};
pub use response::EssayResponse;
pub use user::{MetadataUpdate, Role, User, UserMetadata};
