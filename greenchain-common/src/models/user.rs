//! Identity records

use super::recommendation::Recommendations;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Role::Creator),
            "student" => Ok(Role::Student),
            other => Err(Error::InvalidInput(format!(
                "role must be 'creator' or 'student', got '{}'",
                other
            ))),
        }
    }
}

/// Mutable profile data, stored as JSON in `users.metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMetadata {
    pub name: String,
    pub role: Role,
    pub onboarding_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendations>,
}

impl UserMetadata {
    /// Apply the fields present in `update`
    pub fn apply(&mut self, update: &MetadataUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(done) = update.onboarding_complete {
            self.onboarding_complete = done;
        }
        if let Some(recs) = update.recommendations {
            self.recommendations = Some(recs);
        }
    }
}

/// Partial metadata change; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub onboarding_complete: Option<bool>,
    pub recommendations: Option<Recommendations>,
}

/// User as exposed over the API (never carries credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub onboarding_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendations>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_parts(
        id: String,
        email: String,
        metadata: UserMetadata,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name: metadata.name,
            role: metadata.role,
            onboarding_complete: metadata.onboarding_complete,
            recommendations: metadata.recommendations,
            created_at,
        }
    }

    /// Name shown next to authored content
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Anonymous"
        } else {
            &self.name
        }
    }
}
