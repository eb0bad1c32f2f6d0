//! Built-in curriculum catalog
//!
//! A versioned, ordered list of lesson templates. Templates carry no `id` or
//! `ownerId`; those are assigned when a template is seeded for a user. The
//! catalog length is the `expectedLessonCount` reported to clients.

use greenchain_common::models::Lesson;
use greenchain_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

const BUILTIN_CATALOG: &str = include_str!("catalog/curriculum.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub version: u32,
    pub lessons: Vec<Lesson>,
}

impl Catalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Load an alternate catalog from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&content)
            .map_err(|e| Error::Config(format!("Catalog {}: {}", path.display(), e)))?;
        info!(
            "Loaded curriculum catalog v{} from {} ({} lessons)",
            catalog.version,
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// `path` when configured, otherwise the built-in catalog
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        for (i, template) in catalog.lessons.iter().enumerate() {
            template.validate().map_err(|e| {
                Error::InvalidInput(format!("catalog lesson {} ({:?}): {}", i, template.title, e))
            })?;
        }
        Ok(catalog)
    }

    /// `expectedLessonCount`
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}
