//! Recommendations and narrative summary
//!
//! Derived from the final score and stress level only; no other report field
//! influences the advice.

use serde::{Deserialize, Serialize};

use crate::types::StressLevel;

/// Maximum number of recommendations in a report
pub const MAX_RECOMMENDATIONS: usize = 6;

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl Recommendation {
    fn new(title: &str, description: &str, priority: Priority) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            priority,
        }
    }
}

/// Ordered recommendations for a final score and its level
pub fn recommendations(final_score: f64, level: StressLevel) -> Vec<Recommendation> {
    let mut list = vec![Recommendation::new(
        "Deep Breathing Exercise",
        "Practice 4-7-8 breathing: Inhale for 4 seconds, hold for 7, exhale for 8. Repeat 3-5 times.",
        Priority::High,
    )];

    if final_score >= 2.0 {
        list.push(Recommendation::new(
            "Improve Sleep Quality",
            "Aim for 7-9 hours of sleep. Create a consistent bedtime routine and avoid screens 1 hour before bed.",
            Priority::High,
        ));
    }

    if final_score >= 1.5 {
        list.push(Recommendation::new(
            "Stay Hydrated",
            "Drink 8-10 glasses of water daily. Dehydration can increase stress and affect cognitive function.",
            Priority::Medium,
        ));
    }

    list.push(Recommendation::new(
        "Take Regular Breaks",
        "Follow the 50-10 rule: 50 minutes of work, 10 minutes of break. Stand up, stretch, or take a short walk.",
        Priority::Medium,
    ));

    if matches!(level, StressLevel::Moderate | StressLevel::Severe) {
        list.push(Recommendation::new(
            "Consider Professional Help",
            "Your stress levels indicate you may benefit from speaking with a mental health professional.",
            Priority::High,
        ));
    }

    list.push(Recommendation::new(
        "Cognitive Training",
        "Engage in brain exercises like puzzles, memory games, or learn a new skill to improve cognitive performance.",
        Priority::Low,
    ));

    list.truncate(MAX_RECOMMENDATIONS);
    list
}

/// One-paragraph interpretation of a stress level
pub fn summary(level: StressLevel) -> &'static str {
    match level {
        StressLevel::Normal => {
            "Your stress levels appear to be within normal range. Continue maintaining healthy habits and monitor your well-being regularly."
        }
        StressLevel::Mild => {
            "You're experiencing mild stress. Focus on relaxation techniques and ensure adequate rest. These simple interventions can help prevent escalation."
        }
        StressLevel::Moderate => {
            "Your stress levels are moderately elevated. Implement the high-priority recommendations immediately and consider lifestyle adjustments to reduce stress sources."
        }
        StressLevel::Severe => {
            "Your stress levels are significantly elevated. We strongly recommend consulting with a healthcare professional or mental health specialist for personalized support and intervention."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::classify;
    use pretty_assertions::assert_eq;

    fn titles(score: f64) -> Vec<String> {
        recommendations(score, classify(score))
            .into_iter()
            .map(|r| r.title)
            .collect()
    }

    #[test]
    fn test_normal_gets_base_advice() {
        assert_eq!(
            titles(0.4),
            vec!["Deep Breathing Exercise", "Take Regular Breaks", "Cognitive Training"]
        );
    }

    #[test]
    fn test_mild_above_hydration_threshold() {
        assert_eq!(
            titles(1.58),
            vec![
                "Deep Breathing Exercise",
                "Stay Hydrated",
                "Take Regular Breaks",
                "Cognitive Training"
            ]
        );
    }

    #[test]
    fn test_severe_gets_everything() {
        let list = recommendations(2.8, StressLevel::Severe);
        assert_eq!(list.len(), MAX_RECOMMENDATIONS);
        assert_eq!(list[1].title, "Improve Sleep Quality");
        assert_eq!(list[4].title, "Consider Professional Help");
        assert_eq!(list[4].priority, Priority::High);
        assert_eq!(list[5].priority, Priority::Low);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn test_summary_per_level() {
        assert!(summary(StressLevel::Mild).starts_with("You're experiencing mild stress"));
        assert!(summary(StressLevel::Severe).contains("healthcare professional"));
    }
}
