//! Cross-stage consistency domain
//!
//! The pipeline has no schema enforcement between stages, so consistency
//! is checked semantically after the fact:
//!
//! - [`rule`]: the versioned catalog of directional stage-pair checks
//! - [`validator`]: evaluates catalog rules into [`ConsistencyReport`]s
//! - [`gaps`]: detects required upstream fields that are missing or empty
//! - [`improvement`]: turns scores and gaps into a phased action plan
//!
//! All of it is read-side: stage data is never mutated by validation.

pub mod gaps;
pub mod improvement;
pub mod rule;
pub mod validator;

// Re-export main types
pub use gaps::{detect_gaps, required_inputs, ContextGap, GapScan, GapSeverity, RequiredInput};
pub use improvement::{
    ActionPlan, Effort, ImprovementPlanner, ImprovementSuggestion, PlanPhase, Priority,
    SUCCESS_INDICATORS,
};
pub use rule::{CheckFn, CheckOutcome, ConsistencyRule, RuleCatalog};
pub use validator::{ConsistencyReport, ConsistencyValidator, QualityImpact};
