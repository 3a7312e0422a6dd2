//! Stage quality scoring
//!
//! Scores a stage's output against its dimension profile, adjusts the gate
//! threshold for project complexity, and bands the result into a gate
//! decision. Pure and deterministic: the same stage output and tier always
//! produce the identical score.
//!
//! Missing or wrong-shaped dimension inputs never raise; they extract to
//! zero and drive the gate toward Block, which is the useful failure mode
//! for a pipeline that has no schema enforcement between stages.

use crate::context::StageData;
use crate::core::stage::ComplexityTier;
use crate::quality::dimensions::{profile, DimensionSpec};
use crate::quality::policy::GateBands;
use crate::quality::score::{
    GateDecision, ImprovementWindow, SecondaryShortfall, StageQualityScore,
};
use std::collections::BTreeMap;

/// Fraction of a field signal's points granted for mere presence; the rest
/// scales with content size up to full credit.
const PRESENCE_CREDIT: f64 = 0.6;

/// Multi-dimensional stage quality scoring engine.
#[derive(Debug, Clone, Default)]
pub struct QualityEngine {
    bands: GateBands,
}

impl QualityEngine {
    pub fn new(bands: GateBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &GateBands {
        &self.bands
    }

    /// Score one stage-completion attempt.
    pub fn score_stage(&self, data: &StageData, tier: ComplexityTier) -> StageQualityScore {
        let profile = profile(data.stage());

        let mut dimension_scores = BTreeMap::new();
        let mut overall_score = 0.0;
        for dimension in profile.dimensions {
            let score = extract_dimension(data, dimension);
            overall_score += dimension.weight * score;
            dimension_scores.insert(dimension.name.to_string(), score);
        }

        let adjusted_threshold = profile.base_threshold + tier.threshold_adjustment();
        let mut gate_decision = self.bands.decide(overall_score, adjusted_threshold);

        // A failed secondary requirement caps the gate at Caution no matter
        // how strong the primary score is.
        let secondary_shortfall = profile.secondary.and_then(|req| {
            let score = dimension_scores.get(req.dimension).copied().unwrap_or(0.0);
            (score < req.min_score).then(|| SecondaryShortfall {
                dimension: req.dimension.to_string(),
                score,
                required: req.min_score,
            })
        });
        if secondary_shortfall.is_some() {
            gate_decision = gate_decision.min(GateDecision::Caution);
        }

        let deficit = (adjusted_threshold - overall_score).max(0.0);

        StageQualityScore {
            stage: data.stage(),
            dimension_scores,
            overall_score,
            adjusted_threshold,
            gate_decision,
            improvement_window: ImprovementWindow::from_deficit(deficit),
            secondary_shortfall,
        }
    }
}

/// Score one dimension from its field signals: presence earns most of a
/// signal's points, content size earns the rest.
fn extract_dimension(data: &StageData, dimension: &DimensionSpec) -> f64 {
    let mut earned = 0.0;
    for signal in dimension.signals {
        if !data.has_content(signal.path) {
            continue;
        }
        let richness =
            (data.content_size(signal.path) as f64 / signal.full_credit_size as f64).min(1.0);
        earned += signal.points * (PRESENCE_CREDIT + (1.0 - PRESENCE_CREDIT) * richness);
    }
    earned.clamp(0.0, 100.0)
}
