//! Pipeline stage and project complexity value objects
//!
//! The pipeline moves a project through five stages, each of which must
//! clear its quality gate before the next one starts. Stage identity is
//! also the key into the dimension profiles and the consistency rule
//! catalog.

use serde::{Deserialize, Serialize};

/// The five pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    IdeaRefinement,
    PrdGeneration,
    UxSpecification,
    TechnicalAnalysis,
    FinalCompilation,
}

impl StageKind {
    /// All stages in pipeline order.
    pub const ALL: [StageKind; 5] = [
        StageKind::IdeaRefinement,
        StageKind::PrdGeneration,
        StageKind::UxSpecification,
        StageKind::TechnicalAnalysis,
        StageKind::FinalCompilation,
    ];

    /// Get the string identifier for this stage
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::IdeaRefinement => "idea_refinement",
            StageKind::PrdGeneration => "prd_generation",
            StageKind::UxSpecification => "ux_specification",
            StageKind::TechnicalAnalysis => "technical_analysis",
            StageKind::FinalCompilation => "final_compilation",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn position(&self) -> usize {
        StageKind::ALL
            .iter()
            .position(|s| s == self)
            .expect("stage is in ALL")
    }

    /// Stages that come before this one in the pipeline.
    pub fn upstream(&self) -> &'static [StageKind] {
        &StageKind::ALL[..self.position()]
    }

    /// The next stage, if any.
    pub fn next(&self) -> Option<StageKind> {
        StageKind::ALL.get(self.position() + 1).copied()
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idea_refinement" => Ok(StageKind::IdeaRefinement),
            "prd_generation" => Ok(StageKind::PrdGeneration),
            "ux_specification" => Ok(StageKind::UxSpecification),
            "technical_analysis" => Ok(StageKind::TechnicalAnalysis),
            "final_compilation" => Ok(StageKind::FinalCompilation),
            other => Err(format!(
                "Unknown stage: {}. Valid: idea_refinement, prd_generation, \
                 ux_specification, technical_analysis, final_compilation",
                other
            )),
        }
    }
}

/// Project complexity classification.
///
/// Shifts every stage's quality threshold: simple projects get some slack,
/// enterprise projects are held to a stricter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    #[default]
    Standard,
    Enterprise,
}

impl ComplexityTier {
    /// Additive adjustment applied to a stage's base quality threshold.
    pub fn threshold_adjustment(&self) -> f64 {
        match self {
            ComplexityTier::Simple => -10.0,
            ComplexityTier::Standard => 0.0,
            ComplexityTier::Enterprise => 15.0,
        }
    }

    /// Get the string identifier for this tier
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Simple => "simple",
            ComplexityTier::Standard => "standard",
            ComplexityTier::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
