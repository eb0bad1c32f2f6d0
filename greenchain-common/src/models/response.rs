use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One essay submission
///
/// Stored under `essay_response:{lessonId}:{questionNumber}:{id}`. Responses
/// are never edited; repeated submissions accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayResponse {
    pub id: String,
    pub lesson_id: String,
    /// 1-based position of the question at submission time
    pub question_number: u32,
    pub response: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub submitted_at: DateTime<Utc>,
}
