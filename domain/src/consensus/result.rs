//! Consensus result types
//!
//! A [`ConsensusResult`] is created fresh per decision point per invocation
//! and never mutated after construction. The recommendations that produced
//! it are discarded by the caller; the result carries everything needed for
//! auditing the decision, including the full weighted vote distribution.

use crate::consensus::recommendation::{DecisionKind, TechnologyCategory};
use crate::consensus::strategy::ResolutionStrategy;
use crate::core::source::SourceModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A runner-up whose score gap from the winner is below the closeness
/// threshold (10% for single-choice decisions, 15% for categories).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseAlternative {
    pub value: String,
    pub weighted_votes: f64,
    pub raw_votes: usize,
    /// Relative gap from the winner: `(winner - runner_up) / winner`.
    pub gap_ratio: f64,
}

/// Structured warning attached to a consensus result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictFlag {
    /// Agreement fell below the no-consensus floor (0.40).
    VeryLowConsensus,
    /// Two or more value groups hold weighted votes within 25% of the
    /// winner: the decision has genuine competing patterns.
    CompetingPattern { contenders: Vec<String> },
    /// The single highest-weight source voted against the plurality winner.
    ExpertSourceDisagreement {
        expert: SourceModel,
        expert_choice: String,
    },
}

impl ConflictFlag {
    /// Human-readable warning text.
    pub fn message(&self) -> String {
        match self {
            ConflictFlag::VeryLowConsensus => {
                "very low consensus across sources; result is a default recommendation".to_string()
            }
            ConflictFlag::CompetingPattern { contenders } => {
                format!("competing patterns with near-equal support: {}", contenders.join(", "))
            }
            ConflictFlag::ExpertSourceDisagreement {
                expert,
                expert_choice,
            } => format!(
                "highest-weight source {} preferred '{}' over the winner",
                expert, expert_choice
            ),
        }
    }
}

impl std::fmt::Display for ConflictFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Output of the consensus engine for one decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// What kind of decision was resolved
    pub decision: DecisionKind,
    /// The winning option
    pub winning_value: String,
    /// Weighted votes behind the winner
    pub weighted_vote_total: f64,
    /// Raw (unweighted) votes behind the winner
    pub raw_vote_count: usize,
    /// Sources that voted for the winner, ordered by identifier
    pub supporting_sources: Vec<SourceModel>,
    /// Weighted agreement ratio in [0, 1]
    pub consensus_strength: f64,
    /// Aggregate confidence in [0, 1], derived from the variance of the
    /// supporting sources' self-reported confidences
    pub confidence_level: f64,
    /// How the winner was chosen
    pub resolution_strategy: ResolutionStrategy,
    /// Runner-up within the closeness threshold, if any
    pub close_alternative: Option<CloseAlternative>,
    /// Structured warnings
    pub conflict_flags: Vec<ConflictFlag>,
    /// True when only one recommendation was supplied. Callers must treat
    /// such a result differently from genuine multi-source agreement.
    pub single_source: bool,
    /// Full weighted vote tally per value, for audit
    pub weighted_distribution: BTreeMap<String, f64>,
}

impl ConsensusResult {
    /// Strong consensus: agreement at or above the 0.80 band.
    pub fn is_strong(&self) -> bool {
        self.consensus_strength >= 0.80
    }

    /// Whether any structured warning was raised.
    pub fn is_contested(&self) -> bool {
        !self.conflict_flags.is_empty() || self.close_alternative.is_some()
    }

    /// Whether the expert-disagreement flag is present.
    pub fn has_expert_disagreement(&self) -> bool {
        self.conflict_flags
            .iter()
            .any(|f| matches!(f, ConflictFlag::ExpertSourceDisagreement { .. }))
    }
}

/// Per-category consensus for a full technology-stack decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StackAdvice {
    pub categories: BTreeMap<TechnologyCategory, ConsensusResult>,
}

impl StackAdvice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: TechnologyCategory, result: ConsensusResult) {
        self.categories.insert(category, result);
    }

    pub fn get(&self, category: TechnologyCategory) -> Option<&ConsensusResult> {
        self.categories.get(&category)
    }

    /// Mean consensus strength across resolved categories.
    pub fn overall_strength(&self) -> f64 {
        if self.categories.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .categories
            .values()
            .map(|r| r.consensus_strength)
            .sum();
        sum / self.categories.len() as f64
    }

    /// Categories with warnings or close alternatives.
    pub fn contested_categories(&self) -> Vec<TechnologyCategory> {
        self.categories
            .iter()
            .filter(|(_, r)| r.is_contested())
            .map(|(c, _)| *c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(strength: f64) -> ConsensusResult {
        ConsensusResult {
            decision: DecisionKind::SingleChoice,
            winning_value: "event_sourcing".to_string(),
            weighted_vote_total: 1.8,
            raw_vote_count: 2,
            supporting_sources: vec![SourceModel::Gpt52Codex],
            consensus_strength: strength,
            confidence_level: 0.9,
            resolution_strategy: ResolutionStrategy::WeightedMajorityVote,
            close_alternative: None,
            conflict_flags: vec![],
            single_source: false,
            weighted_distribution: BTreeMap::new(),
        }
    }

    #[test]
    fn test_strength_predicates() {
        assert!(result(0.85).is_strong());
        assert!(!result(0.79).is_strong());
        assert!(!result(0.85).is_contested());
    }

    #[test]
    fn test_contested_with_flags() {
        let mut contested = result(0.3);
        contested.conflict_flags.push(ConflictFlag::VeryLowConsensus);
        assert!(contested.is_contested());
        assert!(!contested.has_expert_disagreement());

        contested
            .conflict_flags
            .push(ConflictFlag::ExpertSourceDisagreement {
                expert: SourceModel::ClaudeSonnet45,
                expert_choice: "layered_monolith".to_string(),
            });
        assert!(contested.has_expert_disagreement());
    }

    #[test]
    fn test_flag_messages() {
        let flag = ConflictFlag::CompetingPattern {
            contenders: vec!["cqrs".to_string(), "microservices".to_string()],
        };
        assert!(flag.message().contains("cqrs"));
        assert!(flag.message().contains("microservices"));
    }

    #[test]
    fn test_stack_advice_aggregates() {
        let mut advice = StackAdvice::new();
        advice.insert(TechnologyCategory::Frontend, result(0.9));
        advice.insert(TechnologyCategory::Backend, result(0.7));

        assert!((advice.overall_strength() - 0.8).abs() < 1e-12);
        assert!(advice.contested_categories().is_empty());
        assert!(advice.get(TechnologyCategory::Database).is_none());
    }
}
