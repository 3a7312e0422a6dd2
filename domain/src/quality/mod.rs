//! Stage quality scoring domain
//!
//! Computes a multi-dimensional quality score for a single pipeline stage's
//! output and turns it into a gate decision. What gets measured is data
//! ([`dimensions`]), how scores band into decisions is policy
//! ([`policy::GateBands`]), and the engine itself stays generic.

pub mod dimensions;
pub mod engine;
pub mod policy;
pub mod score;

// Re-export main types
pub use dimensions::{profile, DimensionSpec, FieldSignal, SecondaryRequirement, StageProfile};
pub use engine::QualityEngine;
pub use policy::GateBands;
pub use score::{
    GateDecision, ImprovementWindow, QualityRecord, QualityTrend, SecondaryShortfall,
    StageQualityScore,
};
