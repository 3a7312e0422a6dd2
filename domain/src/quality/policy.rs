//! Gate banding policy
//!
//! The Block/Caution and Excellence boundaries around a stage's adjusted
//! threshold are policy constants, not architecture: deployments tune them
//! without touching the scoring engine.

use crate::quality::score::GateDecision;
use serde::{Deserialize, Serialize};

/// Banding around the adjusted threshold that turns a numeric overall
/// score into a [`GateDecision`].
///
/// With the default margins and an adjusted threshold `t`:
///
/// - `score < t - 15`  -> Block
/// - `score < t`       -> Caution
/// - `score < t + 10`  -> Pass
/// - otherwise         -> Excellence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateBands {
    /// Distance below the adjusted threshold at which Caution becomes Block.
    pub block_margin: f64,
    /// Distance above the adjusted threshold at which Pass becomes Excellence.
    pub excellence_margin: f64,
}

impl Default for GateBands {
    fn default() -> Self {
        Self {
            block_margin: 15.0,
            excellence_margin: 10.0,
        }
    }
}

impl GateBands {
    pub fn with_block_margin(mut self, margin: f64) -> Self {
        self.block_margin = margin;
        self
    }

    pub fn with_excellence_margin(mut self, margin: f64) -> Self {
        self.excellence_margin = margin;
        self
    }

    /// Band an overall score against an adjusted threshold.
    pub fn decide(&self, overall_score: f64, adjusted_threshold: f64) -> GateDecision {
        if overall_score < adjusted_threshold - self.block_margin {
            GateDecision::Block
        } else if overall_score < adjusted_threshold {
            GateDecision::Caution
        } else if overall_score < adjusted_threshold + self.excellence_margin {
            GateDecision::Pass
        } else {
            GateDecision::Excellence
        }
    }
}
