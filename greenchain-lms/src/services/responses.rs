//! Essay response collection
//!
//! Responses are keyed `essay_response:{lessonId}:{questionNumber}:{id}`.
//! They link to a question by its 1-based position at submission time, so
//! reordering a lesson's questions later leaves old responses attached to the
//! old position number.

use chrono::Utc;
use greenchain_common::models::{EssayResponse, User};
use greenchain_common::{Error, KeyValueStore, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

fn lesson_prefix(lesson_id: &str) -> String {
    format!("essay_response:{}:", lesson_id)
}

/// A lesson id must not reach into another lesson's key range
fn check_lesson_id(lesson_id: &str) -> Result<()> {
    if lesson_id.trim().is_empty() {
        return Err(Error::InvalidInput("lessonId is required".to_string()));
    }
    if lesson_id.contains(':') {
        return Err(Error::InvalidInput("lessonId must not contain ':'".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ResponseCollector {
    kv: Arc<dyn KeyValueStore>,
}

impl ResponseCollector {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Store a new response. Repeat submissions accumulate.
    pub async fn submit(
        &self,
        lesson_id: &str,
        question_number: u32,
        author: &User,
        text: &str,
    ) -> Result<EssayResponse> {
        check_lesson_id(lesson_id)?;
        if question_number == 0 {
            return Err(Error::InvalidInput(
                "questionNumber must be 1 or greater".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("response must not be empty".to_string()));
        }

        let response = EssayResponse {
            id: Uuid::new_v4().to_string(),
            lesson_id: lesson_id.to_string(),
            question_number,
            response: text.to_string(),
            user_id: author.id.clone(),
            user_name: author.display_name().to_string(),
            user_email: author.email.clone(),
            submitted_at: Utc::now(),
        };

        let key = format!(
            "{}{}:{}",
            lesson_prefix(lesson_id),
            question_number,
            response.id
        );
        self.kv.set(&key, serde_json::to_value(&response)?).await?;

        debug!(
            "Stored essay response {} for lesson {} question {}",
            response.id, lesson_id, question_number
        );
        Ok(response)
    }

    /// All responses for a lesson grouped by question number, each group
    /// ordered by submission time
    pub async fn list_by_lesson(
        &self,
        lesson_id: &str,
    ) -> Result<BTreeMap<u32, Vec<EssayResponse>>> {
        check_lesson_id(lesson_id)?;
        let mut grouped: BTreeMap<u32, Vec<EssayResponse>> = BTreeMap::new();

        for (key, value) in self.kv.get_by_prefix(&lesson_prefix(lesson_id)).await? {
            match serde_json::from_value::<EssayResponse>(value) {
                Ok(response) => grouped
                    .entry(response.question_number)
                    .or_default()
                    .push(response),
                Err(e) => warn!("Skipping unreadable essay response {}: {}", key, e),
            }
        }

        for group in grouped.values_mut() {
            group.sort_by_key(|r| r.submitted_at);
        }
        Ok(grouped)
    }
}
