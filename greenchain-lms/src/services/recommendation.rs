//! Onboarding-quiz recommendations
//!
//! A module self-rating of 4 or 5 tags the module `advanced` (only advanced
//! lessons are recommended); anything lower tags it `all`. The overall score
//! is stored but never consulted.

use crate::identity::IdentityProvider;
use chrono::Utc;
use greenchain_common::models::{
    AdvancedDetection, Difficulty, Lesson, MetadataUpdate, QuizResult, QuizScores,
    RecommendationTag, Recommendations,
};
use greenchain_common::{KeyValueStore, Result};
use std::sync::Arc;
use tracing::info;

/// Module score at or above which a module is tagged advanced
pub const ADVANCED_THRESHOLD: u8 = 4;

fn quiz_key(user_id: &str) -> String {
    format!("quiz_results:{}", user_id)
}

fn tag_for(score: u8) -> RecommendationTag {
    if score >= ADVANCED_THRESHOLD {
        RecommendationTag::Advanced
    } else {
        RecommendationTag::All
    }
}

/// Per-module threshold; modules never influence each other
pub fn derive_recommendations(scores: &QuizScores) -> Recommendations {
    Recommendations {
        responsible_sourcing: tag_for(scores.responsible_sourcing),
        general_solutions: tag_for(scores.general_solutions),
        emerging_tech: tag_for(scores.emerging_tech),
    }
}

fn is_advanced(lesson: &Lesson, detection: AdvancedDetection) -> bool {
    match (detection, lesson.difficulty) {
        (AdvancedDetection::Difficulty, Some(difficulty)) => difficulty == Difficulty::Advanced,
        _ => lesson.has_advanced_keyword(),
    }
}

/// Whether `lesson` should be flagged as recommended
pub fn is_lesson_recommended(
    lesson: &Lesson,
    recommendations: Option<&Recommendations>,
    detection: AdvancedDetection,
) -> bool {
    // No quiz taken: everything is recommended
    let Some(recommendations) = recommendations else {
        return true;
    };

    let Some(module) = lesson.module() else {
        return true;
    };

    match recommendations.for_module(module) {
        RecommendationTag::All => true,
        RecommendationTag::Advanced => is_advanced(lesson, detection),
    }
}

#[derive(Clone)]
pub struct RecommendationService {
    kv: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl RecommendationService {
    pub fn new(kv: Arc<dyn KeyValueStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { kv, identity }
    }

    /// Derive, store (last submission wins) and mark onboarding complete
    pub async fn save(&self, user_id: &str, scores: QuizScores) -> Result<Recommendations> {
        scores.validate()?;
        let recommendations = derive_recommendations(&scores);

        let result = QuizResult {
            answers: scores,
            recommendations,
            completed_at: Utc::now(),
        };
        self.kv
            .set(&quiz_key(user_id), serde_json::to_value(&result)?)
            .await?;

        self.identity
            .update_metadata(
                user_id,
                MetadataUpdate {
                    onboarding_complete: Some(true),
                    recommendations: Some(recommendations),
                    ..Default::default()
                },
            )
            .await?;

        info!("Saved onboarding quiz for {}: {:?}", user_id, recommendations);
        Ok(recommendations)
    }

    pub async fn load(&self, user_id: &str) -> Result<Option<QuizResult>> {
        match self.kv.get(&quiz_key(user_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenchain_common::models::CurriculumModule;
    use serde_json::json;

    fn scores(a: u8, b: u8, c: u8, overall: u8) -> QuizScores {
        QuizScores {
            overall_sustainability: overall,
            responsible_sourcing: a,
            general_solutions: b,
            emerging_tech: c,
        }
    }

    fn lesson(title: &str, subtitle: &str, category: &str) -> Lesson {
        serde_json::from_value(json!({
            "id": "l", "ownerId": "u",
            "title": title, "subtitle": subtitle, "category": category
        }))
        .unwrap()
    }

    #[test]
    fn test_threshold_is_per_module() {
        for s in 1..=5u8 {
            for other in 1..=5u8 {
                let recs = derive_recommendations(&scores(s, other, other, other));
                let expected = if s >= 4 {
                    RecommendationTag::Advanced
                } else {
                    RecommendationTag::All
                };
                assert_eq!(recs.responsible_sourcing, expected);
                assert_eq!(recs.general_solutions, tag_for(other));
                assert_eq!(recs.emerging_tech, tag_for(other));
            }
        }
    }

    #[test]
    fn test_overall_score_ignored() {
        assert_eq!(
            derive_recommendations(&scores(2, 4, 5, 1)),
            derive_recommendations(&scores(2, 4, 5, 5))
        );
    }

    #[test]
    fn test_no_record_fails_open() {
        let basic = lesson("Basics", "Intro", CurriculumModule::EmergingTech.category());
        assert!(is_lesson_recommended(&basic, None, AdvancedDetection::Keywords));
    }

    #[test]
    fn test_advanced_tag_uses_keywords() {
        let recs = derive_recommendations(&scores(5, 1, 1, 3));
        let category = CurriculumModule::ResponsibleSourcing.category();

        let basic = lesson("Supplier Codes of Conduct", "Setting expectations", category);
        let advanced = lesson("OECD Guidance", "Strategic due diligence", category);
        assert!(!is_lesson_recommended(&basic, Some(&recs), AdvancedDetection::Keywords));
        assert!(is_lesson_recommended(&advanced, Some(&recs), AdvancedDetection::Keywords));

        // Module tagged "all"
        let other = lesson("Basics", "Intro", CurriculumModule::GeneralSolutions.category());
        assert!(is_lesson_recommended(&other, Some(&recs), AdvancedDetection::Keywords));
    }

    #[test]
    fn test_unmapped_category_recommended() {
        let recs = derive_recommendations(&scores(5, 5, 5, 5));
        let custom = lesson("Basics", "Intro", "Personalized Modules & Report Updates");
        assert!(is_lesson_recommended(&custom, Some(&recs), AdvancedDetection::Keywords));
    }

    #[test]
    fn test_difficulty_detection() {
        let recs = derive_recommendations(&scores(1, 1, 5, 3));
        let category = CurriculumModule::EmergingTech.category();

        // Keyword "ai" in the title, but explicitly a beginner lesson
        let mut beginner = lesson("Key AI Tools", "Overview", category);
        beginner.difficulty = Some(Difficulty::Beginner);
        assert!(is_lesson_recommended(&beginner, Some(&recs), AdvancedDetection::Keywords));
        assert!(!is_lesson_recommended(&beginner, Some(&recs), AdvancedDetection::Difficulty));

        // No difficulty: falls back to keywords
        let untagged = lesson("Predictive Analytics", "", category);
        assert!(is_lesson_recommended(&untagged, Some(&recs), AdvancedDetection::Difficulty));
    }
}
