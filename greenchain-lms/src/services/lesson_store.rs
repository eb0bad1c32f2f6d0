//! Lesson persistence over the key-value store
//!
//! Keys:
//! - `lesson:{ownerId}:{lessonId}` holds the lesson record
//! - `user_lessons:{ownerId}` holds the owner's ordered lesson-id index
//!
//! Record and index are separate writes with no transaction between them.
//! Readers tolerate the two possible inconsistencies: index entries whose
//! record is missing are dropped, and orphaned records are still reachable
//! through the cross-owner scan.

use crate::identity::IdentityProvider;
use chrono::Utc;
use greenchain_common::models::Lesson;
use greenchain_common::{Error, KeyValueStore, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const LESSON_PREFIX: &str = "lesson:";

/// Patch keys that never overwrite stored values
const PROTECTED_FIELDS: [&str; 6] = [
    "id",
    "ownerId",
    "userId",
    "createdAt",
    "updatedAt",
    "isCurriculumLesson",
];

fn lesson_key(owner_id: &str, lesson_id: &str) -> String {
    format!("{}{}:{}", LESSON_PREFIX, owner_id, lesson_id)
}

fn index_key(owner_id: &str) -> String {
    format!("user_lessons:{}", owner_id)
}

/// Lesson annotated with its author for the browse view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsedLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub author_name: String,
    pub author_email: String,
}

/// Outcome of removing an owner's curriculum lessons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearReport {
    pub removed: usize,
    pub kept: usize,
}

#[derive(Clone)]
pub struct LessonStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LessonStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    // ========================================
    // Low-level record and index access
    // ========================================

    /// Write a lesson record under its owner-scoped key, without touching the index
    pub async fn write_record(&self, lesson: &Lesson) -> Result<()> {
        let value = serde_json::to_value(lesson)?;
        self.kv
            .set(&lesson_key(&lesson.owner_id, &lesson.id), value)
            .await
    }

    async fn read_record(&self, owner_id: &str, lesson_id: &str) -> Result<Option<Lesson>> {
        match self.kv.get(&lesson_key(owner_id, lesson_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// The owner's lesson-id index (empty when never written)
    pub async fn index(&self, owner_id: &str) -> Result<Vec<String>> {
        match self.kv.get(&index_key(owner_id)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_index(&self, owner_id: &str, ids: &[String]) -> Result<()> {
        self.kv
            .set(&index_key(owner_id), serde_json::to_value(ids)?)
            .await
    }

    /// Append `ids` to the owner's index in one write
    pub async fn append_to_index(&self, owner_id: &str, ids: &[String]) -> Result<()> {
        let mut index = self.index(owner_id).await?;
        index.extend(ids.iter().cloned());
        self.write_index(owner_id, &index).await
    }

    // ========================================
    // Operations
    // ========================================

    /// Persist `draft` as a new lesson owned by `owner_id`
    ///
    /// Assigns a fresh id and stamps both timestamps. The curriculum flag is
    /// taken from `draft` as given.
    pub async fn create(&self, owner_id: &str, mut draft: Lesson) -> Result<Lesson> {
        let now = Utc::now();
        draft.id = Uuid::new_v4().to_string();
        draft.owner_id = owner_id.to_string();
        draft.created_at = now;
        draft.updated_at = now;

        self.write_record(&draft).await?;
        self.append_to_index(owner_id, std::slice::from_ref(&draft.id))
            .await?;

        debug!("Created lesson {} for {}", draft.id, owner_id);
        Ok(draft)
    }

    /// Owner's lesson, falling back to any owner's lesson with that id
    pub async fn get(&self, owner_id: &str, lesson_id: &str) -> Result<Lesson> {
        if let Some(lesson) = self.read_record(owner_id, lesson_id).await? {
            return Ok(lesson);
        }

        self.find_any(lesson_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Lesson {}", lesson_id)))
    }

    /// Shallow-merge `patch` over the owner's lesson and bump `updatedAt`
    ///
    /// Identity fields in the patch are ignored and a legacy `quiz` key is
    /// read as `questions`. The merged lesson must still validate.
    pub async fn update(
        &self,
        owner_id: &str,
        lesson_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Lesson> {
        let existing = self
            .read_record(owner_id, lesson_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Lesson {}", lesson_id)))?;

        let Value::Object(mut merged) = serde_json::to_value(&existing)? else {
            return Err(Error::Internal(format!(
                "Lesson {} did not serialize to an object",
                lesson_id
            )));
        };

        for (key, value) in patch {
            if PROTECTED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            let key = if key == "quiz" {
                "questions".to_string()
            } else {
                key
            };
            merged.insert(key, value);
        }

        let mut lesson: Lesson = serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::InvalidInput(format!("Invalid lesson update: {}", e)))?;
        lesson.validate()?;
        lesson.updated_at = Utc::now();

        self.write_record(&lesson).await?;
        debug!("Updated lesson {} for {}", lesson_id, owner_id);
        Ok(lesson)
    }

    /// Remove the record and its index entry. Missing lessons are not an error.
    pub async fn delete(&self, owner_id: &str, lesson_id: &str) -> Result<()> {
        self.kv.delete(&lesson_key(owner_id, lesson_id)).await?;

        let index = self.index(owner_id).await?;
        let remaining: Vec<String> = index.iter().filter(|id| *id != lesson_id).cloned().collect();
        if remaining.len() != index.len() {
            self.write_index(owner_id, &remaining).await?;
        }
        Ok(())
    }

    /// Owner's lessons in index order
    ///
    /// Index entries whose record is missing or unreadable are skipped.
    pub async fn list_owned(&self, owner_id: &str) -> Result<Vec<Lesson>> {
        let index = self.index(owner_id).await?;
        let mut lessons = Vec::with_capacity(index.len());

        for id in &index {
            match self.read_record(owner_id, id).await {
                Ok(Some(lesson)) => lessons.push(lesson),
                Ok(None) => warn!("Index for {} references missing lesson {}", owner_id, id),
                Err(Error::Serialization(e)) => {
                    warn!("Skipping unreadable lesson {} for {}: {}", id, owner_id, e)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(lessons)
    }

    /// Every lesson of every owner, in key order
    pub async fn list_all(&self) -> Result<Vec<Lesson>> {
        let entries = self.kv.get_by_prefix(LESSON_PREFIX).await?;
        let mut lessons = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            match serde_json::from_value::<Lesson>(value) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => warn!("Skipping unreadable lesson record {}: {}", key, e),
            }
        }

        Ok(lessons)
    }

    async fn find_any(&self, lesson_id: &str) -> Result<Option<Lesson>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|lesson| lesson.id == lesson_id))
    }

    /// [`list_all`](Self::list_all) annotated with author name and email
    ///
    /// Each distinct author is resolved once. Unknown authors, and lookups
    /// that fail, show as "Anonymous".
    pub async fn browse(&self, identity: &dyn IdentityProvider) -> Result<Vec<BrowsedLesson>> {
        let lessons = self.list_all().await?;
        let mut authors: HashMap<String, (String, String)> = HashMap::new();

        for lesson in &lessons {
            if authors.contains_key(&lesson.owner_id) {
                continue;
            }
            let author = match identity.get_user(&lesson.owner_id).await {
                Ok(Some(user)) => (user.display_name().to_string(), user.email),
                Ok(None) => ("Anonymous".to_string(), String::new()),
                Err(e) => {
                    warn!("Author lookup failed for {}: {}", lesson.owner_id, e);
                    ("Anonymous".to_string(), String::new())
                }
            };
            authors.insert(lesson.owner_id.clone(), author);
        }

        Ok(lessons
            .into_iter()
            .map(|lesson| {
                let (author_name, author_email) =
                    authors.get(&lesson.owner_id).cloned().unwrap_or_default();
                BrowsedLesson {
                    lesson,
                    author_name,
                    author_email,
                }
            })
            .collect())
    }

    /// Copy any owner's lesson into `new_owner_id`'s dashboard
    ///
    /// The copy gets a fresh id and links back to its source. It is never a
    /// curriculum lesson, so a forced re-seed leaves it alone.
    pub async fn copy_to_owner(&self, lesson_id: &str, new_owner_id: &str) -> Result<Lesson> {
        let source = self
            .find_any(lesson_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Lesson {}", lesson_id)))?;

        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.owner_id = new_owner_id.to_string();
        copy.original_lesson_id = Some(source.id.clone());
        copy.original_author_id = Some(source.owner_id.clone());
        copy.added_at = Some(Utc::now());
        copy.is_curriculum_lesson = false;

        self.write_record(&copy).await?;
        self.append_to_index(new_owner_id, std::slice::from_ref(&copy.id))
            .await?;

        info!(
            "Copied lesson {} ({}) to {} as {}",
            source.id, source.owner_id, new_owner_id, copy.id
        );
        Ok(copy)
    }

    /// Delete the owner's curriculum-flagged lessons and rewrite the index
    ///
    /// Only `isCurriculumLesson` decides; a user lesson filed under a
    /// curriculum category is kept. Index entries without a record, or whose
    /// record cannot be read, are kept.
    pub async fn clear_curriculum(&self, owner_id: &str) -> Result<ClearReport> {
        let index = self.index(owner_id).await?;
        let mut kept = Vec::with_capacity(index.len());
        let mut removed = 0;

        for id in index {
            match self.read_record(owner_id, &id).await {
                Ok(Some(lesson)) if lesson.is_curriculum_lesson => {
                    self.kv.delete(&lesson_key(owner_id, &id)).await?;
                    debug!("Deleted curriculum lesson {} ({})", id, lesson.title);
                    removed += 1;
                }
                Ok(_) => kept.push(id),
                Err(Error::Serialization(e)) => {
                    warn!("Keeping unreadable lesson {} for {}: {}", id, owner_id, e);
                    kept.push(id);
                }
                Err(e) => return Err(e),
            }
        }

        self.write_index(owner_id, &kept).await?;
        info!(
            "Cleared {} curriculum lessons for {}, kept {}",
            removed,
            owner_id,
            kept.len()
        );

        Ok(ClearReport {
            removed,
            kept: kept.len(),
        })
    }
}
