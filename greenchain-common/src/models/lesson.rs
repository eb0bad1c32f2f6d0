//! Lesson records
//!
//! Stored under `lesson:{ownerId}:{lessonId}`. Older records name the owner
//! `userId` and the question list `quiz`; both are accepted on read. Fields
//! this type does not know about are preserved in [`Lesson::extra`] so a
//! read-modify-write never drops client data.

use super::question::Question;
use super::recommendation::{CurriculumModule, ADVANCED_KEYWORDS};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Heading plus rich-text body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub content: String,
}

/// One block of the structured lesson body used by curriculum lessons
///
/// Blocks of a type not listed in [`Block`], or too malformed to read as
/// one, are kept verbatim in [`ContentBlock::Other`] and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Known(Block),
    Other(Value),
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Known(Block::Paragraph {
            text: text.into(),
            extra: Map::new(),
        })
    }

    /// The block's `type` tag, if it has one
    pub fn block_type(&self) -> Option<&str> {
        match self {
            ContentBlock::Known(Block::Heading { .. }) => Some("heading"),
            ContentBlock::Known(Block::Paragraph { .. }) => Some("paragraph"),
            ContentBlock::Known(Block::List { .. }) => Some("list"),
            ContentBlock::Known(Block::InteractiveActivity { .. }) => Some("interactive-activity"),
            ContentBlock::Other(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

/// Block types the server understands. Missing payload fields read as
/// empty; fields beyond the modelled ones are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Block {
    Heading {
        #[serde(default)]
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Paragraph {
        #[serde(default)]
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    List {
        #[serde(default)]
        items: Vec<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    InteractiveActivity {
        #[serde(default)]
        component: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LessonRecord")]
pub struct Lesson {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentBlock>,
    pub questions: Vec<Question>,
    pub is_curriculum_lesson: bool,
    /// Set on copies: the lesson this one was copied from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_lesson_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_author_id: Option<String>,
    /// Set on copies: when the copy was added to the dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lesson {
    /// Reject lessons the API must not store
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("title is required".to_string()));
        }
        for (i, question) in self.questions.iter().enumerate() {
            question.validate().map_err(|e| match e {
                Error::InvalidInput(msg) => Error::InvalidInput(format!("question {}: {}", i + 1, msg)),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Curriculum module this lesson belongs to, by category
    pub fn module(&self) -> Option<CurriculumModule> {
        CurriculumModule::from_category(&self.category)
    }

    /// True when any [`ADVANCED_KEYWORDS`] entry occurs in the title or
    /// subtitle (case-insensitive substring)
    pub fn has_advanced_keyword(&self) -> bool {
        let title = self.title.to_lowercase();
        let subtitle = self.subtitle.as_deref().unwrap_or_default().to_lowercase();
        ADVANCED_KEYWORDS
            .iter()
            .any(|kw| title.contains(kw) || subtitle.contains(kw))
    }
}

/// Stored shape accepted on read
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    objectives: Vec<String>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    questions: Option<Vec<Question>>,
    #[serde(default)]
    quiz: Option<Vec<Question>>,
    #[serde(default)]
    is_curriculum_lesson: bool,
    #[serde(default)]
    original_lesson_id: Option<String>,
    #[serde(default)]
    original_author_id: Option<String>,
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<LessonRecord> for Lesson {
    fn from(record: LessonRecord) -> Self {
        let created_at = record.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Lesson {
            id: record.id,
            owner_id: record.owner_id.or(record.user_id).unwrap_or_default(),
            title: record.title,
            subtitle: record.subtitle,
            category: record.category,
            difficulty: record.difficulty,
            objectives: record.objectives,
            sections: record.sections,
            content: record.content,
            questions: record.questions.or(record.quiz).unwrap_or_default(),
            is_curriculum_lesson: record.is_curriculum_lesson,
            original_lesson_id: record.original_lesson_id,
            original_author_id: record.original_author_id,
            added_at: record.added_at,
            created_at,
            updated_at: record.updated_at.unwrap_or(created_at),
            extra: record.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_record_normalizes() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "userId": "u1",
            "title": "Circular Packaging",
            "category": "General Solutions",
            "quiz": [{"question": "Why?", "isEssay": true}],
            "createdAt": "2024-03-01T10:00:00Z",
            "coverImage": "https://example.test/c.png"
        }))
        .unwrap();

        assert_eq!(lesson.owner_id, "u1");
        assert_eq!(lesson.questions.len(), 1);
        assert!(lesson.questions[0].is_essay());
        assert_eq!(lesson.updated_at, lesson.created_at);
        assert_eq!(lesson.extra["coverImage"], "https://example.test/c.png");

        let written = serde_json::to_value(&lesson).unwrap();
        assert_eq!(written["ownerId"], "u1");
        assert!(written.get("userId").is_none());
        assert!(written.get("quiz").is_none());
        assert_eq!(written["questions"][0]["type"], "essay");
        assert_eq!(written["coverImage"], "https://example.test/c.png");
    }

    #[test]
    fn test_questions_wins_over_quiz() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "ownerId": "u1",
            "title": "T",
            "questions": [],
            "quiz": [{"question": "Old", "isEssay": true}]
        }))
        .unwrap();
        assert!(lesson.questions.is_empty());
    }

    #[test]
    fn test_unknown_content_block_written_back_verbatim() {
        let video = json!({"type": "video", "url": "https://example.test/v.mp4", "autoplay": false});
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "ownerId": "u1",
            "title": "T",
            "content": [
                {"type": "paragraph", "text": "Hello"},
                video.clone(),
                "stray string"
            ]
        }))
        .unwrap();

        assert_eq!(lesson.content[0].block_type(), Some("paragraph"));
        assert_eq!(lesson.content[1], ContentBlock::Other(video.clone()));
        assert_eq!(lesson.content[1].block_type(), Some("video"));

        let written = serde_json::to_value(&lesson).unwrap();
        assert_eq!(written["content"][1], video);
        assert_eq!(written["content"][2], "stray string");
    }

    #[test]
    fn test_extra_block_fields_preserved() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "ownerId": "u1",
            "title": "T",
            "content": [{"type": "heading", "text": "H", "level": 2}]
        }))
        .unwrap();
        assert_eq!(lesson.content[0].block_type(), Some("heading"));

        let written = serde_json::to_value(&lesson).unwrap();
        assert_eq!(
            written["content"][0],
            json!({"type": "heading", "text": "H", "level": 2})
        );
    }

    #[test]
    fn test_block_missing_payload_reads_as_empty() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "ownerId": "u1",
            "title": "T",
            "content": [{"type": "list"}, {"type": "paragraph"}]
        }))
        .unwrap();

        assert_eq!(
            lesson.content[0],
            ContentBlock::Known(Block::List {
                items: Vec::new(),
                extra: Map::new(),
            })
        );
        assert_eq!(lesson.content[1].block_type(), Some("paragraph"));
    }

    #[test]
    fn test_malformed_known_block_kept_as_is() {
        // Items that are not strings cannot be modelled; the block survives raw
        let odd = json!({"type": "list", "items": [1, {"x": 2}]});
        let lesson: Lesson = serde_json::from_value(json!({
            "id": "l1",
            "ownerId": "u1",
            "title": "T",
            "content": [odd.clone()]
        }))
        .unwrap();
        assert_eq!(lesson.content[0], ContentBlock::Other(odd.clone()));
        assert_eq!(serde_json::to_value(&lesson).unwrap()["content"][0], odd);
    }

    #[test]
    fn test_validate_requires_title() {
        let lesson: Lesson =
            serde_json::from_value(json!({"id": "l1", "ownerId": "u1", "title": "  "})).unwrap();
        assert!(matches!(lesson.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_advanced_keyword_detection() {
        let mut lesson: Lesson =
            serde_json::from_value(json!({"id": "l1", "ownerId": "u1", "title": "Basics"}))
                .unwrap();
        assert!(!lesson.has_advanced_keyword());

        // Body text is not consulted
        lesson.content = vec![ContentBlock::paragraph("Strategic integration")];
        assert!(!lesson.has_advanced_keyword());

        lesson.subtitle = Some("Predictive Analytics".to_string());
        assert!(lesson.has_advanced_keyword());
    }
}
