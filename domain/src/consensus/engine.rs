//! Consensus computation over independent recommendations
//!
//! The engine groups recommendations by value, tallies weighted and raw
//! votes, blends them into an agreement score, detects close alternatives
//! and conflicts, and names the resolution strategy that explains the
//! outcome. Pure computation: no I/O, no shared mutable state, safe to
//! call concurrently for independent decision points.
//!
//! Recommendations are processed in a canonical order (values
//! lexicographically, members by source id) so that permutations of the
//! input list produce bit-identical results.

use crate::consensus::recommendation::{DecisionKind, Recommendation, TechnologyCategory};
use crate::consensus::result::{CloseAlternative, ConflictFlag, ConsensusResult, StackAdvice};
use crate::consensus::strategy::{
    self, Dominance, ResolutionStrategy, StrategySignals, CATEGORY_RULES, SINGLE_CHOICE_RULES,
};
use crate::core::error::DomainError;
use crate::core::source::SourceModel;
use crate::scoring::SourceWeights;
use std::collections::BTreeMap;

/// Maximum population variance of values confined to [0, 1]; used to
/// normalize confidence variance into [0, 1].
const MAX_CONFIDENCE_VARIANCE: f64 = 0.25;

/// Agreement floor below which a result is only a default recommendation.
const NO_CONSENSUS_FLOOR: f64 = 0.40;

/// Relative gap thresholds under which a runner-up counts as close.
#[derive(Debug, Clone, Copy)]
pub struct ClosenessThresholds {
    pub single_choice: f64,
    pub category: f64,
}

impl Default for ClosenessThresholds {
    fn default() -> Self {
        Self {
            single_choice: 0.10,
            category: 0.15,
        }
    }
}

/// Weighted-vote consensus engine.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    weights: SourceWeights,
    closeness: ClosenessThresholds,
    /// Relative gap within which a non-winning group counts as a competing
    /// pattern.
    competing_margin: f64,
    /// Margin within which weighted and raw shares count as aligned when
    /// selecting a category strategy.
    alignment_margin: f64,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(SourceWeights::default())
    }
}

impl ConsensusEngine {
    pub fn new(weights: SourceWeights) -> Self {
        Self {
            weights,
            closeness: ClosenessThresholds::default(),
            competing_margin: 0.25,
            alignment_margin: 0.15,
        }
    }

    pub fn with_closeness(mut self, closeness: ClosenessThresholds) -> Self {
        self.closeness = closeness;
        self
    }

    pub fn with_competing_margin(mut self, margin: f64) -> Self {
        self.competing_margin = margin;
        self
    }

    pub fn weights(&self) -> &SourceWeights {
        &self.weights
    }

    /// Compute consensus for one decision point.
    ///
    /// Fails with [`DomainError::InsufficientData`] on an empty input. A
    /// single recommendation yields a degenerate result with strength 1.0
    /// and the `single_source` flag set.
    pub fn resolve(
        &self,
        recommendations: &[Recommendation],
        kind: DecisionKind,
    ) -> Result<ConsensusResult, DomainError> {
        match recommendations {
            [] => Err(DomainError::insufficient_data(kind.label())),
            [only] => Ok(self.degenerate(only, kind)),
            _ => Ok(self.resolve_contested(recommendations, kind)),
        }
    }

    /// Resolve a full technology-stack decision, one consensus per category.
    ///
    /// Categories are independent; a category present in the input with an
    /// empty recommendation list is a caller error.
    pub fn resolve_stack(
        &self,
        by_category: &BTreeMap<TechnologyCategory, Vec<Recommendation>>,
    ) -> Result<StackAdvice, DomainError> {
        if by_category.is_empty() {
            return Err(DomainError::insufficient_data("technology_stack"));
        }

        let mut advice = StackAdvice::new();
        for (category, recommendations) in by_category {
            let result = self.resolve(recommendations, DecisionKind::Category(*category))?;
            advice.insert(*category, result);
        }
        Ok(advice)
    }

    // ==================== Internals ====================

    fn degenerate(&self, only: &Recommendation, kind: DecisionKind) -> ConsensusResult {
        let weighted = self.weights.combined_weight(&only.source, only.confidence);
        let mut distribution = BTreeMap::new();
        distribution.insert(only.value.clone(), weighted);

        ConsensusResult {
            decision: kind,
            winning_value: only.value.clone(),
            weighted_vote_total: weighted,
            raw_vote_count: 1,
            supporting_sources: vec![only.source.clone()],
            consensus_strength: 1.0,
            confidence_level: only.confidence,
            resolution_strategy: ResolutionStrategy::SingleSourceOnly,
            close_alternative: None,
            conflict_flags: vec![],
            single_source: true,
            weighted_distribution: distribution,
        }
    }

    fn resolve_contested(
        &self,
        recommendations: &[Recommendation],
        kind: DecisionKind,
    ) -> ConsensusResult {
        let tallies = self.tally(recommendations);
        let total_weighted: f64 = tallies.iter().map(|t| t.weighted).sum();
        let total_raw = recommendations.len();

        // Winner: highest weighted votes. Tallies are value-ordered and
        // max_by keeps the last maximum, so exact ties deterministically
        // break toward the lexicographically last value.
        let winner_index = tallies
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.weighted.partial_cmp(&b.weighted).expect("finite votes"))
            .map(|(i, _)| i)
            .expect("at least one tally");
        let winner = &tallies[winner_index];

        let raw_share = winner.raw as f64 / total_raw as f64;
        let weighted_share = if total_weighted > 0.0 {
            winner.weighted / total_weighted
        } else {
            raw_share
        };
        let blend = 0.7 * weighted_share + 0.3 * raw_share;

        let (agreement, closeness, table) = match kind {
            DecisionKind::SingleChoice => (blend, self.closeness.single_choice, SINGLE_CHOICE_RULES),
            DecisionKind::Category(_) => (weighted_share, self.closeness.category, CATEGORY_RULES),
        };

        let close_alternative = self.close_alternative(&tallies, winner_index, closeness);

        let mean_confidence = mean(&confidences(&tallies));
        let signals = StrategySignals {
            agreement,
            mean_confidence,
            has_close_alternative: close_alternative.is_some(),
            dominance: Dominance::classify(weighted_share, raw_share, self.alignment_margin),
        };
        let resolution_strategy = strategy::select(table, &signals);

        let confidence_level = confidence_from_variance(&winner.confidences);
        let conflict_flags = self.conflict_flags(&tallies, winner_index, agreement);

        let weighted_distribution = tallies
            .iter()
            .map(|t| (t.value.clone(), t.weighted))
            .collect();

        ConsensusResult {
            decision: kind,
            winning_value: winner.value.clone(),
            weighted_vote_total: winner.weighted,
            raw_vote_count: winner.raw,
            supporting_sources: winner.sources.clone(),
            consensus_strength: agreement.clamp(0.0, 1.0),
            confidence_level,
            resolution_strategy,
            close_alternative,
            conflict_flags,
            single_source: false,
            weighted_distribution,
        }
    }

    /// Group recommendations by value in canonical order: values sorted
    /// lexicographically, group members sorted by source id then
    /// confidence, so any permutation of the input sums identically.
    fn tally(&self, recommendations: &[Recommendation]) -> Vec<Tally> {
        let mut groups: BTreeMap<&str, Vec<&Recommendation>> = BTreeMap::new();
        for rec in recommendations {
            groups.entry(rec.value.as_str()).or_default().push(rec);
        }

        groups
            .into_iter()
            .map(|(value, mut members)| {
                members.sort_by(|a, b| {
                    a.source.as_str().cmp(b.source.as_str()).then(
                        a.confidence
                            .partial_cmp(&b.confidence)
                            .expect("confidence is clamped"),
                    )
                });
                let weighted = members
                    .iter()
                    .map(|r| self.weights.combined_weight(&r.source, r.confidence))
                    .sum();
                Tally {
                    value: value.to_string(),
                    weighted,
                    raw: members.len(),
                    sources: members.iter().map(|r| r.source.clone()).collect(),
                    confidences: members.iter().map(|r| r.confidence).collect(),
                }
            })
            .collect()
    }

    fn close_alternative(
        &self,
        tallies: &[Tally],
        winner_index: usize,
        threshold: f64,
    ) -> Option<CloseAlternative> {
        let winner = &tallies[winner_index];
        let runner_up = tallies
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner_index)
            .max_by(|(_, a), (_, b)| a.weighted.partial_cmp(&b.weighted).expect("finite votes"))
            .map(|(_, t)| t)?;

        let gap_ratio = if winner.weighted > 0.0 {
            (winner.weighted - runner_up.weighted) / winner.weighted
        } else {
            0.0
        };

        (gap_ratio < threshold).then(|| CloseAlternative {
            value: runner_up.value.clone(),
            weighted_votes: runner_up.weighted,
            raw_votes: runner_up.raw,
            gap_ratio,
        })
    }

    fn conflict_flags(
        &self,
        tallies: &[Tally],
        winner_index: usize,
        agreement: f64,
    ) -> Vec<ConflictFlag> {
        let winner = &tallies[winner_index];
        let mut flags = Vec::new();

        if agreement < NO_CONSENSUS_FLOOR {
            flags.push(ConflictFlag::VeryLowConsensus);
        }

        if winner.weighted > 0.0 {
            let contenders: Vec<String> = tallies
                .iter()
                .enumerate()
                .filter(|(i, t)| {
                    *i != winner_index
                        && (winner.weighted - t.weighted) / winner.weighted
                            <= self.competing_margin
                })
                .map(|(_, t)| t.value.clone())
                .collect();
            if !contenders.is_empty() {
                let mut values = vec![winner.value.clone()];
                values.extend(contenders);
                flags.push(ConflictFlag::CompetingPattern { contenders: values });
            }
        }

        let participants: Vec<SourceModel> = tallies
            .iter()
            .flat_map(|t| t.sources.iter().cloned())
            .collect();
        if let Some(expert) = self.weights.strongest(&participants) {
            if !winner.sources.contains(expert) {
                let expert_choice = tallies
                    .iter()
                    .find(|t| t.sources.contains(expert))
                    .map(|t| t.value.clone())
                    .unwrap_or_default();
                flags.push(ConflictFlag::ExpertSourceDisagreement {
                    expert: expert.clone(),
                    expert_choice,
                });
            }
        }

        flags
    }
}

struct Tally {
    value: String,
    weighted: f64,
    raw: usize,
    sources: Vec<SourceModel>,
    confidences: Vec<f64>,
}

fn confidences(tallies: &[Tally]) -> Vec<f64> {
    tallies
        .iter()
        .flat_map(|t| t.confidences.iter().copied())
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Aggregate confidence: 1 minus the normalized population variance of the
/// supporting confidences. Higher disagreement among supporters means a
/// lower aggregate confidence.
fn confidence_from_variance(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let m = mean(confidences);
    let variance =
        confidences.iter().map(|c| (c - m).powi(2)).sum::<f64>() / confidences.len() as f64;
    (1.0 - variance / MAX_CONFIDENCE_VARIANCE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(source: SourceModel, value: &str, confidence: f64) -> Recommendation {
        Recommendation::new(source, value, confidence, "rationale")
    }

    fn custom(name: &str) -> SourceModel {
        SourceModel::Custom(name.to_string())
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let engine = ConsensusEngine::default();
        let err = engine.resolve(&[], DecisionKind::SingleChoice).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_single_source_is_degenerate() {
        let engine = ConsensusEngine::default();
        let result = engine
            .resolve(
                &[rec(SourceModel::Gpt52Codex, "event_sourcing", 0.9)],
                DecisionKind::SingleChoice,
            )
            .unwrap();

        assert_eq!(result.consensus_strength, 1.0);
        assert_eq!(
            result.resolution_strategy,
            ResolutionStrategy::SingleSourceOnly
        );
        assert!(result.single_source);
        assert_eq!(result.raw_vote_count, 1);
    }

    #[test]
    fn test_unanimous_three_way_agreement() {
        // Weights 1.0 / 1.0 / 0.9, all choosing the same value.
        let engine = ConsensusEngine::default();
        let recs = vec![
            rec(SourceModel::Gpt52Codex, "event_sourcing", 0.9),
            rec(SourceModel::ClaudeSonnet45, "event_sourcing", 0.85),
            rec(SourceModel::Gemini3Pro, "event_sourcing", 0.7),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();

        assert_eq!(result.winning_value, "event_sourcing");
        assert_eq!(result.consensus_strength, 1.0);
        assert_eq!(
            result.resolution_strategy,
            ResolutionStrategy::WeightedMajorityVote
        );
        assert!(result.conflict_flags.is_empty());
        assert!(result.close_alternative.is_none());
        assert!(!result.single_source);
        assert_eq!(result.supporting_sources.len(), 3);
    }

    #[test]
    fn test_two_against_one_moderate_consensus() {
        // X gets 1.8 weighted votes, Y gets 0.9: agreement lands in
        // [0.60, 0.80) with no close alternative (gap 50%).
        let engine = ConsensusEngine::new(
            SourceWeights::new(0.9)
                .with_weight(custom("a"), 0.9)
                .with_weight(custom("b"), 0.9)
                .with_weight(custom("c"), 0.9),
        );
        let recs = vec![
            rec(custom("a"), "x", 1.0),
            rec(custom("b"), "x", 1.0),
            rec(custom("c"), "y", 1.0),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();

        assert_eq!(result.winning_value, "x");
        assert!((result.consensus_strength - (0.7 * (2.0 / 3.0) + 0.3 * (2.0 / 3.0))).abs() < 1e-9);
        assert_eq!(
            result.resolution_strategy,
            ResolutionStrategy::ConfidenceWeightedConsensus
        );
        assert!(result.close_alternative.is_none());
    }

    #[test]
    fn test_close_alternative_straddles_threshold() {
        let weights = SourceWeights::new(1.0);
        let engine = ConsensusEngine::new(weights);

        // Gap (1.0 - 0.95) / 1.0 = 5% < 10%: close alternative present.
        let close = vec![rec(custom("a"), "x", 1.0), rec(custom("b"), "y", 0.95)];
        let result = engine.resolve(&close, DecisionKind::SingleChoice).unwrap();
        let alt = result.close_alternative.expect("runner-up within 10%");
        assert_eq!(alt.value, "y");
        assert!(alt.gap_ratio < 0.10);

        // Gap (1.0 - 0.85) / 1.0 = 15% >= 10%: no close alternative.
        let apart = vec![rec(custom("a"), "x", 1.0), rec(custom("b"), "y", 0.85)];
        let result = engine.resolve(&apart, DecisionKind::SingleChoice).unwrap();
        assert!(result.close_alternative.is_none());
    }

    #[test]
    fn test_category_decisions_use_looser_threshold() {
        let engine = ConsensusEngine::new(SourceWeights::new(1.0));
        // 12% gap: not close for single-choice, close for a category.
        let recs = vec![rec(custom("a"), "postgres", 1.0), rec(custom("b"), "mysql", 0.88)];

        let single = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();
        assert!(single.close_alternative.is_none());

        let category = engine
            .resolve(&recs, DecisionKind::Category(TechnologyCategory::Database))
            .unwrap();
        assert!(category.close_alternative.is_some());
    }

    #[test]
    fn test_competing_pattern_flag() {
        let engine = ConsensusEngine::new(SourceWeights::new(1.0));
        // Gap (1.0 - 0.8) / 1.0 = 20% <= 25%: competing pattern.
        let recs = vec![
            rec(custom("a"), "cqrs", 1.0),
            rec(custom("b"), "microservices", 0.8),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();

        let competing = result
            .conflict_flags
            .iter()
            .find_map(|f| match f {
                ConflictFlag::CompetingPattern { contenders } => Some(contenders.clone()),
                _ => None,
            })
            .expect("competing pattern flag");
        assert!(competing.contains(&"cqrs".to_string()));
        assert!(competing.contains(&"microservices".to_string()));
    }

    #[test]
    fn test_expert_disagreement_flag() {
        let weights = SourceWeights::new(0.6).with_weight(SourceModel::ClaudeSonnet45, 1.0);
        let engine = ConsensusEngine::new(weights);
        let recs = vec![
            rec(custom("a"), "x", 1.0),
            rec(custom("b"), "x", 1.0),
            rec(custom("c"), "x", 1.0),
            rec(SourceModel::ClaudeSonnet45, "y", 1.0),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();

        assert_eq!(result.winning_value, "x");
        assert!(result.has_expert_disagreement());
    }

    #[test]
    fn test_no_expert_flag_when_expert_supports_winner() {
        let weights = SourceWeights::new(0.6).with_weight(SourceModel::ClaudeSonnet45, 1.0);
        let engine = ConsensusEngine::new(weights);
        let recs = vec![
            rec(SourceModel::ClaudeSonnet45, "x", 1.0),
            rec(custom("b"), "x", 1.0),
            rec(custom("c"), "y", 1.0),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();
        assert!(!result.has_expert_disagreement());
    }

    #[test]
    fn test_very_low_consensus_flag() {
        let engine = ConsensusEngine::new(SourceWeights::new(1.0));
        // Four-way split: winner share 0.25 < 0.40.
        let recs = vec![
            rec(custom("a"), "w", 1.0),
            rec(custom("b"), "x", 1.0),
            rec(custom("c"), "y", 1.0),
            rec(custom("d"), "z", 1.0),
        ];
        let result = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();

        assert!(result
            .conflict_flags
            .contains(&ConflictFlag::VeryLowConsensus));
        assert_eq!(
            result.resolution_strategy,
            ResolutionStrategy::DefaultRecommendationDueToNoConsensus
        );
    }

    #[test]
    fn test_confidence_level_reflects_variance() {
        let engine = ConsensusEngine::new(SourceWeights::new(1.0));

        // Tight confidences: high aggregate confidence.
        let tight = vec![rec(custom("a"), "x", 0.9), rec(custom("b"), "x", 0.88)];
        let tight_result = engine.resolve(&tight, DecisionKind::SingleChoice).unwrap();

        // Scattered confidences: lower aggregate confidence.
        let scattered = vec![rec(custom("a"), "x", 1.0), rec(custom("b"), "x", 0.2)];
        let scattered_result = engine.resolve(&scattered, DecisionKind::SingleChoice).unwrap();

        assert!(tight_result.confidence_level > scattered_result.confidence_level);
    }

    #[test]
    fn test_resolve_stack_per_category() {
        let engine = ConsensusEngine::default();
        let mut by_category = BTreeMap::new();
        by_category.insert(
            TechnologyCategory::Backend,
            vec![
                rec(SourceModel::Gpt52Codex, "axum", 0.9),
                rec(SourceModel::ClaudeSonnet45, "axum", 0.85),
            ],
        );
        by_category.insert(
            TechnologyCategory::Database,
            vec![
                rec(SourceModel::Gpt52Codex, "postgres", 0.95),
                rec(SourceModel::ClaudeSonnet45, "sqlite", 0.9),
            ],
        );

        let advice = engine.resolve_stack(&by_category).unwrap();
        assert_eq!(advice.categories.len(), 2);
        assert_eq!(
            advice.get(TechnologyCategory::Backend).unwrap().winning_value,
            "axum"
        );

        let empty: BTreeMap<TechnologyCategory, Vec<Recommendation>> = BTreeMap::new();
        assert!(engine.resolve_stack(&empty).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_permutation_invariance() {
        let engine = ConsensusEngine::default();
        let recs = vec![
            rec(SourceModel::Gpt52Codex, "x", 0.9),
            rec(SourceModel::ClaudeSonnet45, "y", 0.8),
            rec(SourceModel::Gemini3Pro, "x", 0.7),
        ];
        let mut reversed = recs.clone();
        reversed.reverse();

        let a = engine.resolve(&recs, DecisionKind::SingleChoice).unwrap();
        let b = engine.resolve(&reversed, DecisionKind::SingleChoice).unwrap();
        assert_eq!(a, b);
    }
}
