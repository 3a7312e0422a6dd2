//! Resolution strategies and their selection tables
//!
//! A consensus result always names *how* its winner was chosen, for
//! transparency and audit. Strategy selection is a decision tree over
//! agreement strength, confidence, and closeness, implemented here as
//! ordered rule tables evaluated top-to-bottom, first match wins, so the
//! tables are testable independently of the tally math.
//!
//! Single-choice decisions and technology-category decisions use distinct
//! tables on purpose. Single-choice blends weighted and raw agreement into
//! one score; categories compare the weighted and raw shares directly and
//! branch on which one dominates, because a category runner-up is often a
//! legitimate parallel choice rather than a wrong answer.

use serde::{Deserialize, Serialize};

/// Named decision-tree outcome explaining how a winner was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    // Single-choice strategies
    WeightedMajorityVote,
    ExpertModelPriorityWithTradeOffAnalysis,
    ConfidenceWeightedConsensus,
    ConfidenceAdjustedMajority,
    ConservativeApproachWithAlternatives,
    DefaultRecommendationDueToNoConsensus,
    // Technology-category strategies
    StrongWeightedConsensus,
    ConfidenceWeightedSelectionWithAlternatives,
    MajorityVoteWithCloseAlternatives,
    ExpertModelPreference,
    PopularVoteWithLowerExpertConfidence,
    BalancedWeightedConsensus,
    // Degenerate input
    SingleSourceOnly,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::WeightedMajorityVote => "weighted_majority_vote",
            ResolutionStrategy::ExpertModelPriorityWithTradeOffAnalysis => {
                "expert_model_priority_with_trade_off_analysis"
            }
            ResolutionStrategy::ConfidenceWeightedConsensus => "confidence_weighted_consensus",
            ResolutionStrategy::ConfidenceAdjustedMajority => "confidence_adjusted_majority",
            ResolutionStrategy::ConservativeApproachWithAlternatives => {
                "conservative_approach_with_alternatives"
            }
            ResolutionStrategy::DefaultRecommendationDueToNoConsensus => {
                "default_recommendation_due_to_no_consensus"
            }
            ResolutionStrategy::StrongWeightedConsensus => "strong_weighted_consensus",
            ResolutionStrategy::ConfidenceWeightedSelectionWithAlternatives => {
                "confidence_weighted_selection_with_alternatives"
            }
            ResolutionStrategy::MajorityVoteWithCloseAlternatives => {
                "majority_vote_with_close_alternatives"
            }
            ResolutionStrategy::ExpertModelPreference => "expert_model_preference",
            ResolutionStrategy::PopularVoteWithLowerExpertConfidence => {
                "popular_vote_with_lower_expert_confidence"
            }
            ResolutionStrategy::BalancedWeightedConsensus => "balanced_weighted_consensus",
            ResolutionStrategy::SingleSourceOnly => "single_source_only",
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which of the two agreement shares leads, given the alignment margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// Weighted and raw shares agree within the margin
    Aligned,
    /// Weighted share exceeds raw share by more than the margin
    WeightedLeads,
    /// Raw share exceeds weighted share by more than the margin
    RawLeads,
}

impl Dominance {
    /// Classify the relationship between weighted and raw agreement shares.
    pub fn classify(weighted_share: f64, raw_share: f64, margin: f64) -> Self {
        let delta = weighted_share - raw_share;
        if delta.abs() <= margin {
            Dominance::Aligned
        } else if delta > 0.0 {
            Dominance::WeightedLeads
        } else {
            Dominance::RawLeads
        }
    }
}

/// Inputs to strategy selection, derived from the vote tallies.
#[derive(Debug, Clone, Copy)]
pub struct StrategySignals {
    /// Agreement score: the 70/30 blend for single-choice decisions,
    /// the weighted share for category decisions.
    pub agreement: f64,
    /// Mean self-reported confidence across all recommendations.
    pub mean_confidence: f64,
    /// Whether a close alternative was detected.
    pub has_close_alternative: bool,
    /// Weighted-vs-raw share relationship.
    pub dominance: Dominance,
}

/// One row of a strategy selection table.
///
/// `None` conditions always match; rows are evaluated in order and the
/// first full match wins.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRule {
    pub min_agreement: f64,
    pub requires_close_alternative: Option<bool>,
    pub min_mean_confidence: Option<f64>,
    pub max_mean_confidence: Option<f64>,
    pub dominance: Option<Dominance>,
    pub strategy: ResolutionStrategy,
}

impl StrategyRule {
    fn matches(&self, signals: &StrategySignals) -> bool {
        if signals.agreement < self.min_agreement {
            return false;
        }
        if let Some(required) = self.requires_close_alternative {
            if signals.has_close_alternative != required {
                return false;
            }
        }
        if let Some(min) = self.min_mean_confidence {
            if signals.mean_confidence < min {
                return false;
            }
        }
        if let Some(max) = self.max_mean_confidence {
            if signals.mean_confidence >= max {
                return false;
            }
        }
        if let Some(dominance) = self.dominance {
            if signals.dominance != dominance {
                return false;
            }
        }
        true
    }
}

const NO_CONDITIONS: StrategyRule = StrategyRule {
    min_agreement: 0.0,
    requires_close_alternative: None,
    min_mean_confidence: None,
    max_mean_confidence: None,
    dominance: None,
    strategy: ResolutionStrategy::DefaultRecommendationDueToNoConsensus,
};

/// Selection table for single-choice decisions (e.g. architecture pattern).
pub const SINGLE_CHOICE_RULES: &[StrategyRule] = &[
    StrategyRule {
        min_agreement: 0.80,
        strategy: ResolutionStrategy::WeightedMajorityVote,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.60,
        requires_close_alternative: Some(true),
        strategy: ResolutionStrategy::ExpertModelPriorityWithTradeOffAnalysis,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.60,
        strategy: ResolutionStrategy::ConfidenceWeightedConsensus,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.40,
        min_mean_confidence: Some(0.7),
        strategy: ResolutionStrategy::ConfidenceAdjustedMajority,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.40,
        strategy: ResolutionStrategy::ConservativeApproachWithAlternatives,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        strategy: ResolutionStrategy::DefaultRecommendationDueToNoConsensus,
        ..NO_CONDITIONS
    },
];

/// Selection table for technology-category decisions.
pub const CATEGORY_RULES: &[StrategyRule] = &[
    StrategyRule {
        min_agreement: 0.80,
        strategy: ResolutionStrategy::StrongWeightedConsensus,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        dominance: Some(Dominance::Aligned),
        requires_close_alternative: Some(true),
        strategy: ResolutionStrategy::MajorityVoteWithCloseAlternatives,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        dominance: Some(Dominance::Aligned),
        strategy: ResolutionStrategy::BalancedWeightedConsensus,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        dominance: Some(Dominance::WeightedLeads),
        strategy: ResolutionStrategy::ExpertModelPreference,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        dominance: Some(Dominance::RawLeads),
        max_mean_confidence: Some(0.7),
        strategy: ResolutionStrategy::PopularVoteWithLowerExpertConfidence,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        dominance: Some(Dominance::RawLeads),
        strategy: ResolutionStrategy::ConfidenceWeightedSelectionWithAlternatives,
        ..NO_CONDITIONS
    },
    StrategyRule {
        min_agreement: 0.0,
        strategy: ResolutionStrategy::BalancedWeightedConsensus,
        ..NO_CONDITIONS
    },
];

/// Walk a table top-to-bottom and return the first matching strategy.
pub fn select(rules: &[StrategyRule], signals: &StrategySignals) -> ResolutionStrategy {
    rules
        .iter()
        .find(|rule| rule.matches(signals))
        .map(|rule| rule.strategy)
        .unwrap_or(ResolutionStrategy::DefaultRecommendationDueToNoConsensus)
}
