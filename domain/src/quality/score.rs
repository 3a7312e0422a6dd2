//! Stage quality score types
//!
//! One [`StageQualityScore`] is produced per stage-completion attempt. A
//! project accumulates an append-only history of [`QualityRecord`]s per
//! stage; only the latest record counts toward gating, the rest feed the
//! quality trend.

use crate::core::stage::StageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical gate outcome controlling stage completion.
///
/// A stage can only be marked complete when its latest score is `Pass` or
/// `Excellence`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Block,
    Caution,
    Pass,
    Excellence,
}

impl GateDecision {
    /// Whether this decision allows the stage to complete.
    pub fn is_passing(&self) -> bool {
        matches!(self, GateDecision::Pass | GateDecision::Excellence)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Block => "block",
            GateDecision::Caution => "caution",
            GateDecision::Pass => "pass",
            GateDecision::Excellence => "excellence",
        }
    }
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Heuristic estimate of the time needed to lift a stage to threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementWindow {
    Hours,
    Days,
    Weeks,
}

impl ImprovementWindow {
    /// Derive a window from how far the overall score sits below the
    /// adjusted threshold.
    pub fn from_deficit(deficit: f64) -> Self {
        if deficit <= 5.0 {
            ImprovementWindow::Hours
        } else if deficit <= 15.0 {
            ImprovementWindow::Days
        } else {
            ImprovementWindow::Weeks
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImprovementWindow::Hours => "1-2 hours",
            ImprovementWindow::Days => "1-3 days",
            ImprovementWindow::Weeks => "1-2 weeks",
        }
    }
}

impl std::fmt::Display for ImprovementWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A secondary dimension that failed to clear its own dedicated threshold,
/// capping the gate at Caution regardless of the primary score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryShortfall {
    pub dimension: String,
    pub score: f64,
    pub required: f64,
}

/// Output of the quality scoring engine for one stage attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageQualityScore {
    pub stage: StageKind,
    /// Per-dimension scores, 0 to 100
    pub dimension_scores: BTreeMap<String, f64>,
    /// Weighted mean of the dimension scores, 0 to 100
    pub overall_score: f64,
    /// The stage's base threshold shifted by the complexity tier
    pub adjusted_threshold: f64,
    pub gate_decision: GateDecision,
    pub improvement_window: ImprovementWindow,
    /// Present when a required secondary dimension missed its bar
    pub secondary_shortfall: Option<SecondaryShortfall>,
}

impl StageQualityScore {
    pub fn dimension(&self, name: &str) -> Option<f64> {
        self.dimension_scores.get(name).copied()
    }

    /// Distance below the adjusted threshold (zero when at or above it).
    pub fn deficit(&self) -> f64 {
        (self.adjusted_threshold - self.overall_score).max(0.0)
    }

    pub fn is_passing(&self) -> bool {
        self.gate_decision.is_passing()
    }
}

/// One entry in a stage's append-only quality history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    pub stage: StageKind,
    pub overall_score: f64,
    pub gate_decision: GateDecision,
    pub recorded_at: DateTime<Utc>,
}

impl QualityRecord {
    /// Record a scoring attempt at the current time.
    pub fn from_score(score: &StageQualityScore) -> Self {
        Self::with_parts(score.stage, score.overall_score, score.gate_decision)
    }

    pub fn with_parts(stage: StageKind, overall_score: f64, gate_decision: GateDecision) -> Self {
        Self {
            stage,
            overall_score,
            gate_decision,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }
}

/// Direction of a stage's quality over its scoring history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTrend {
    Improving,
    Flat,
    Declining,
    /// Fewer than two recorded attempts
    Unknown,
}

impl QualityTrend {
    /// Flat scores within this distance count as noise, not movement.
    const FLAT_TOLERANCE: f64 = 1.0;

    /// Compare the latest attempt against the one before it.
    pub fn from_history(history: &[QualityRecord]) -> Self {
        let [.., previous, latest] = history else {
            return QualityTrend::Unknown;
        };
        let delta = latest.overall_score - previous.overall_score;
        if delta > Self::FLAT_TOLERANCE {
            QualityTrend::Improving
        } else if delta < -Self::FLAT_TOLERANCE {
            QualityTrend::Declining
        } else {
            QualityTrend::Flat
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, QualityTrend::Improving)
    }
}
