//! Multi-source consensus domain
//!
//! Aggregates independent structured recommendations from several advisory
//! model backends into a single decision with conflict detection.
//!
//! # Core Concepts
//!
//! ## Weighted voting
//! Each recommendation pulls on its chosen value with
//! `source_weight x confidence`. Weighted agreement is blended with raw
//! (one-source-one-vote) agreement so that popularity cannot silently
//! override trusted expertise, nor the reverse.
//!
//! ## Resolution strategies
//! Every result names the decision-tree outcome that selected its winner
//! ([`ResolutionStrategy`]), so downstream consumers can audit *how* a
//! recommendation was reached, not just what it was.
//!
//! ## Conflict surface
//! Low agreement, competing patterns, and expert disagreement are data
//! ([`ConflictFlag`]), never errors: the pipeline decides what to do with
//! a contested decision.

pub mod engine;
pub mod recommendation;
pub mod result;
pub mod strategy;

// Re-export main types
pub use engine::{ClosenessThresholds, ConsensusEngine};
pub use recommendation::{DecisionKind, Recommendation, TechnologyCategory};
pub use result::{CloseAlternative, ConflictFlag, ConsensusResult, StackAdvice};
pub use strategy::{Dominance, ResolutionStrategy, StrategyRule, StrategySignals};
