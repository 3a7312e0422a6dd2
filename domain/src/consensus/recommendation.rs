//! Recommendation types for consensus decisions
//!
//! A [`Recommendation`] is one model's structured opinion about a single
//! decision point. It is immutable once received; only the consensus result
//! derived from a batch of recommendations outlives the computation.

use crate::core::source::SourceModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One advisory model's opinion about a decision point
///
/// # Example
///
/// ```
/// use specsmith_domain::consensus::Recommendation;
/// use specsmith_domain::core::source::SourceModel;
///
/// let rec = Recommendation::new(
///     SourceModel::ClaudeSonnet45,
///     "event_sourcing",
///     0.9,
///     "Audit trail requirements point at an append-only event log.",
/// )
/// .with_metric("maintainability", 82.0)
/// .with_metric("scalability", 74.0);
///
/// assert_eq!(rec.value, "event_sourcing");
/// assert_eq!(rec.confidence, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Which model produced this opinion
    pub source: SourceModel,
    /// The chosen option for the decision point
    pub value: String,
    /// Self-reported confidence (0.0 to 1.0, clamped on construction)
    pub confidence: f64,
    /// Free-text reasoning behind the choice
    pub rationale: String,
    /// Optional named numeric scores backing the choice
    /// (e.g. maintainability or scalability estimates)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub supporting_metrics: BTreeMap<String, f64>,
}

impl Recommendation {
    /// Create a new recommendation. Confidence is clamped to [0, 1].
    pub fn new(
        source: SourceModel,
        value: impl Into<String>,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            source,
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
            supporting_metrics: BTreeMap::new(),
        }
    }

    /// Attach a supporting metric (builder style).
    pub fn with_metric(mut self, name: impl Into<String>, score: f64) -> Self {
        self.supporting_metrics.insert(name.into(), score);
        self
    }
}

/// Technology categories resolved independently in a stack decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TechnologyCategory {
    Frontend,
    Backend,
    Database,
    Infrastructure,
}

impl TechnologyCategory {
    pub const ALL: [TechnologyCategory; 4] = [
        TechnologyCategory::Frontend,
        TechnologyCategory::Backend,
        TechnologyCategory::Database,
        TechnologyCategory::Infrastructure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechnologyCategory::Frontend => "frontend",
            TechnologyCategory::Backend => "backend",
            TechnologyCategory::Database => "database",
            TechnologyCategory::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for TechnologyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of decision a batch of recommendations addresses.
///
/// Single-choice decisions (e.g. an architecture pattern) expect exactly one
/// right answer, so a close runner-up is a warning sign; the closeness
/// threshold is tight (10%). Technology categories tolerate more ambiguity
/// (a runner-up framework is often a legitimate parallel choice), so the
/// threshold is looser (15%) and the resolution strategies differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// One winner expected (e.g. "architecture pattern")
    SingleChoice,
    /// One winner per technology category, resolved independently
    Category(TechnologyCategory),
}

impl DecisionKind {
    /// Human-readable label used in errors and logs.
    pub fn label(&self) -> String {
        match self {
            DecisionKind::SingleChoice => "single_choice".to_string(),
            DecisionKind::Category(category) => format!("category:{}", category),
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, DecisionKind::Category(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let high = Recommendation::new(SourceModel::Gpt5, "x", 1.4, "");
        assert_eq!(high.confidence, 1.0);
        let low = Recommendation::new(SourceModel::Gpt5, "x", -0.4, "");
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_metrics_builder() {
        let rec = Recommendation::new(SourceModel::Gemini3Pro, "microservices", 0.8, "scales")
            .with_metric("scalability", 90.0);
        assert_eq!(rec.supporting_metrics.get("scalability"), Some(&90.0));
    }

    #[test]
    fn test_decision_kind_labels() {
        assert_eq!(DecisionKind::SingleChoice.label(), "single_choice");
        assert_eq!(
            DecisionKind::Category(TechnologyCategory::Database).label(),
            "category:database"
        );
        assert!(DecisionKind::Category(TechnologyCategory::Frontend).is_category());
        assert!(!DecisionKind::SingleChoice.is_category());
    }
}
