//! Curriculum seeding
//!
//! Each user moves from `Uninitialized` to `Seeded` the first time their
//! dashboard asks for the curriculum. A forced run purges the previously
//! seeded lessons (by flag) and seeds the catalog again, leaving every other
//! lesson of the user untouched.

use super::lesson_store::LessonStore;
use crate::catalog::Catalog;
use chrono::{DateTime, Utc};
use greenchain_common::{KeyValueStore, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

fn state_key(user_id: &str) -> String {
    format!("curriculum_initialized:{}", user_id)
}

/// Persisted per-user seeding state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    Uninitialized,
    Seeded { at: DateTime<Utc>, count: usize },
}

/// What a seeding request should do given the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPlan {
    Skip,
    Seed { purge: bool },
}

/// Decide the work for one `ensure_seeded` call
pub fn plan(state: &SeedState, force: bool) -> SeedPlan {
    match (state, force) {
        (_, true) => SeedPlan::Seed { purge: true },
        (SeedState::Uninitialized, false) => SeedPlan::Seed { purge: false },
        (SeedState::Seeded { .. }, false) => SeedPlan::Skip,
    }
}

/// Stored shape of [`SeedState::Seeded`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedRecord {
    #[serde(default = "default_true")]
    initialized: bool,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    lesson_count: usize,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// Nothing was done because the user was already seeded
    pub skipped: bool,
    /// Lessons created by this run, or the recorded count when skipped
    pub lesson_count: usize,
    /// Curriculum lessons deleted by the force phase
    pub removed: usize,
    /// User lessons left in place
    pub kept: usize,
    /// Catalog length
    pub expected_lesson_count: usize,
}

pub struct CurriculumSeeder {
    kv: Arc<dyn KeyValueStore>,
    lessons: LessonStore,
    catalog: Arc<Catalog>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CurriculumSeeder {
    pub fn new(kv: Arc<dyn KeyValueStore>, lessons: LessonStore, catalog: Arc<Catalog>) -> Self {
        Self {
            kv,
            lessons,
            catalog,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn expected_lesson_count(&self) -> usize {
        self.catalog.len()
    }

    pub async fn load_state(&self, user_id: &str) -> Result<SeedState> {
        let Some(value) = self.kv.get(&state_key(user_id)).await? else {
            return Ok(SeedState::Uninitialized);
        };

        let record: SeedRecord = serde_json::from_value(value)?;
        if !record.initialized {
            return Ok(SeedState::Uninitialized);
        }
        Ok(SeedState::Seeded {
            at: record.timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            count: record.lesson_count,
        })
    }

    async fn save_state(&self, user_id: &str, at: DateTime<Utc>, count: usize) -> Result<()> {
        let record = SeedRecord {
            initialized: true,
            timestamp: Some(at),
            lesson_count: count,
        };
        self.kv
            .set(&state_key(user_id), serde_json::to_value(record)?)
            .await
    }

    /// Per-user lock serializing seeding runs within this process
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Seed the catalog for `user_id` unless already seeded (or `force`)
    ///
    /// A template that fails to store is logged and skipped; the report
    /// counts only lessons that landed.
    pub async fn ensure_seeded(&self, user_id: &str, force: bool) -> Result<SeedReport> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let state = self.load_state(user_id).await?;
        let expected = self.expected_lesson_count();

        let purge = match plan(&state, force) {
            SeedPlan::Skip => {
                let count = match state {
                    SeedState::Seeded { count, .. } => count,
                    SeedState::Uninitialized => 0,
                };
                info!("Curriculum already initialized for {}, skipping", user_id);
                return Ok(SeedReport {
                    skipped: true,
                    lesson_count: count,
                    removed: 0,
                    kept: 0,
                    expected_lesson_count: expected,
                });
            }
            SeedPlan::Seed { purge } => purge,
        };

        let (removed, kept) = if purge {
            info!("Force flag set, re-initializing curriculum for {}", user_id);
            let report = self.lessons.clear_curriculum(user_id).await?;
            (report.removed, report.kept)
        } else {
            (0, self.lessons.index(user_id).await?.len())
        };

        let mut created = Vec::with_capacity(expected);
        for template in &self.catalog.lessons {
            let now = Utc::now();
            let mut lesson = template.clone();
            lesson.id = Uuid::new_v4().to_string();
            lesson.owner_id = user_id.to_string();
            lesson.is_curriculum_lesson = true;
            lesson.created_at = now;
            lesson.updated_at = now;

            match self.lessons.write_record(&lesson).await {
                Ok(()) => created.push(lesson.id),
                Err(e) => error!("Failed to create curriculum lesson {:?}: {}", template.title, e),
            }
        }

        self.lessons.append_to_index(user_id, &created).await?;
        self.save_state(user_id, Utc::now(), created.len()).await?;

        info!(
            "Seeded {} of {} curriculum lessons for {}",
            created.len(),
            expected,
            user_id
        );

        Ok(SeedReport {
            skipped: false,
            lesson_count: created.len(),
            removed,
            kept,
            expected_lesson_count: expected,
        })
    }
}
