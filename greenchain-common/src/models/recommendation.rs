//! Onboarding quiz scores and per-module recommendation tags

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Words whose presence in a title or subtitle marks a lesson as advanced
pub const ADVANCED_KEYWORDS: [&str; 8] = [
    "advanced",
    "complex",
    "optimization",
    "strategic",
    "integration",
    "ai",
    "analytics",
    "predictive",
];

/// The three curriculum modules with a self-rating in the onboarding quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurriculumModule {
    ResponsibleSourcing,
    GeneralSolutions,
    EmergingTech,
}

impl CurriculumModule {
    pub const ALL: [CurriculumModule; 3] = [
        CurriculumModule::ResponsibleSourcing,
        CurriculumModule::GeneralSolutions,
        CurriculumModule::EmergingTech,
    ];

    /// Lesson category string that identifies the module
    pub fn category(self) -> &'static str {
        match self {
            CurriculumModule::ResponsibleSourcing => "Responsible Sourcing",
            CurriculumModule::GeneralSolutions => "General Solutions",
            CurriculumModule::EmergingTech => "Emerging Technology & AI Integration",
        }
    }

    /// Key used in quiz answers and recommendation maps
    pub fn key(self) -> &'static str {
        match self {
            CurriculumModule::ResponsibleSourcing => "responsibleSourcing",
            CurriculumModule::GeneralSolutions => "generalSolutions",
            CurriculumModule::EmergingTech => "emergingTech",
        }
    }

    pub fn from_category(category: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.category() == category)
    }

    /// Accepts either the module key or its category name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.key() == value || m.category() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationTag {
    /// Only advanced lessons are recommended
    Advanced,
    /// Every lesson in the module is recommended
    All,
}

/// How lessons are classified as advanced under an `advanced` tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancedDetection {
    /// Keyword match on title/subtitle
    #[default]
    Keywords,
    /// Stored `difficulty == advanced`, keywords when no difficulty is set
    Difficulty,
}

/// Self-ratings from the onboarding quiz, each 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScores {
    /// Collected for analytics only; does not influence recommendations
    pub overall_sustainability: u8,
    pub responsible_sourcing: u8,
    pub general_solutions: u8,
    pub emerging_tech: u8,
}

impl QuizScores {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("overallSustainability", self.overall_sustainability),
            ("responsibleSourcing", self.responsible_sourcing),
            ("generalSolutions", self.general_solutions),
            ("emergingTech", self.emerging_tech),
        ];
        for (name, score) in fields {
            if !(1..=5).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "{} must be between 1 and 5, got {}",
                    name, score
                )));
            }
        }
        Ok(())
    }

    pub fn for_module(&self, module: CurriculumModule) -> u8 {
        match module {
            CurriculumModule::ResponsibleSourcing => self.responsible_sourcing,
            CurriculumModule::GeneralSolutions => self.general_solutions,
            CurriculumModule::EmergingTech => self.emerging_tech,
        }
    }
}

/// Per-module recommendation map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub responsible_sourcing: RecommendationTag,
    pub general_solutions: RecommendationTag,
    pub emerging_tech: RecommendationTag,
}

impl Recommendations {
    pub fn for_module(&self, module: CurriculumModule) -> RecommendationTag {
        match module {
            CurriculumModule::ResponsibleSourcing => self.responsible_sourcing,
            CurriculumModule::GeneralSolutions => self.general_solutions,
            CurriculumModule::EmergingTech => self.emerging_tech,
        }
    }
}

/// Stored under `quiz_results:{userId}`; one live record per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub answers: QuizScores,
    pub recommendations: Recommendations,
    pub completed_at: DateTime<Utc>,
}
