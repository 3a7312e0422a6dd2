//! Property-based tests for the consensus engine
//!
//! These verify the engine's structural guarantees over synthetic vote
//! distributions: score bounds, the closeness invariant, monotonicity of
//! agreement in a winner's confidence, permutation invariance, and the
//! degenerate single-source case.

use proptest::prelude::*;
use specsmith_domain::{
    ConsensusEngine, DecisionKind, Recommendation, ResolutionStrategy, SourceModel,
};

fn arb_source() -> impl Strategy<Value = SourceModel> {
    prop_oneof![
        Just(SourceModel::Gpt52Codex),
        Just(SourceModel::ClaudeSonnet45),
        Just(SourceModel::Gemini3Pro),
        Just(SourceModel::Gpt5),
        "[a-z]{4,10}".prop_map(SourceModel::Custom),
    ]
}

fn arb_recommendation() -> impl Strategy<Value = Recommendation> {
    (
        arb_source(),
        prop_oneof![
            Just("event_sourcing"),
            Just("layered_monolith"),
            Just("microservices"),
            Just("cqrs"),
        ],
        0.0..=1.0f64,
    )
        .prop_map(|(source, value, confidence)| {
            Recommendation::new(source, value, confidence, "synthetic")
        })
}

fn arb_batch() -> impl Strategy<Value = Vec<Recommendation>> {
    prop::collection::vec(arb_recommendation(), 1..8)
}

proptest! {
    /// Scores stay inside their documented bounds for any valid input.
    #[test]
    fn consensus_scores_are_bounded(batch in arb_batch()) {
        let engine = ConsensusEngine::default();
        let result = engine.resolve(&batch, DecisionKind::SingleChoice).unwrap();

        prop_assert!((0.0..=1.0).contains(&result.consensus_strength));
        prop_assert!((0.0..=1.0).contains(&result.confidence_level));
        prop_assert!(result.weighted_vote_total >= 0.0);
        prop_assert!(result.raw_vote_count >= 1);
        prop_assert!(!result.supporting_sources.is_empty());
    }

    /// A close alternative is present exactly when the winner/runner-up
    /// gap, recomputed from the audited vote distribution, is under the
    /// single-choice threshold.
    #[test]
    fn close_alternative_iff_gap_below_threshold(batch in arb_batch()) {
        let engine = ConsensusEngine::default();
        let result = engine.resolve(&batch, DecisionKind::SingleChoice).unwrap();

        let winner_votes = result.weighted_distribution[&result.winning_value];
        let runner_up = result
            .weighted_distribution
            .iter()
            .filter(|(value, _)| **value != result.winning_value)
            .map(|(_, votes)| *votes)
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))));

        match runner_up {
            None => prop_assert!(result.close_alternative.is_none()),
            Some(runner_votes) => {
                let gap = if winner_votes > 0.0 {
                    (winner_votes - runner_votes) / winner_votes
                } else {
                    0.0
                };
                let expect_close = !result.single_source && gap < 0.10;
                prop_assert_eq!(result.close_alternative.is_some(), expect_close);
                if let Some(alt) = &result.close_alternative {
                    prop_assert!((alt.gap_ratio - gap).abs() < 1e-12);
                }
            }
        }
    }

    /// Raising a winning supporter's confidence never lowers agreement.
    #[test]
    fn agreement_is_monotone_in_winner_confidence(
        batch in prop::collection::vec(arb_recommendation(), 2..7),
        bump in 0.01..=0.5f64,
    ) {
        let engine = ConsensusEngine::default();
        let before = engine.resolve(&batch, DecisionKind::SingleChoice).unwrap();

        let supporter = batch
            .iter()
            .position(|r| r.value == before.winning_value)
            .expect("winner has a supporter");
        let mut boosted = batch.clone();
        boosted[supporter].confidence = (boosted[supporter].confidence + bump).min(1.0);

        let after = engine.resolve(&boosted, DecisionKind::SingleChoice).unwrap();
        prop_assert_eq!(&after.winning_value, &before.winning_value);
        prop_assert!(after.consensus_strength >= before.consensus_strength - 1e-9);
    }

    /// Any permutation of the input yields an identical result.
    #[test]
    fn consensus_is_permutation_invariant(batch in arb_batch(), rotation in 0usize..8) {
        let engine = ConsensusEngine::default();
        let baseline = engine.resolve(&batch, DecisionKind::SingleChoice).unwrap();

        let mut reversed = batch.clone();
        reversed.reverse();
        prop_assert_eq!(
            &engine.resolve(&reversed, DecisionKind::SingleChoice).unwrap(),
            &baseline
        );

        let mut rotated = batch.clone();
        rotated.rotate_left(rotation % batch.len().max(1));
        prop_assert_eq!(
            &engine.resolve(&rotated, DecisionKind::SingleChoice).unwrap(),
            &baseline
        );
    }

    /// Exactly one recommendation degenerates to a flagged single-source
    /// result with full strength.
    #[test]
    fn single_source_is_degenerate(rec in arb_recommendation()) {
        let engine = ConsensusEngine::default();
        let result = engine
            .resolve(std::slice::from_ref(&rec), DecisionKind::SingleChoice)
            .unwrap();

        prop_assert_eq!(result.consensus_strength, 1.0);
        prop_assert_eq!(result.resolution_strategy, ResolutionStrategy::SingleSourceOnly);
        prop_assert!(result.single_source);
    }
}
