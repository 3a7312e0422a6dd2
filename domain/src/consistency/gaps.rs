//! Context gap detection
//!
//! Downstream stage generation declares the upstream fields it requires.
//! Gap detection scans the accumulated project context for declared inputs
//! that are absent or empty, scores their severity, and attaches templated
//! remediation guidance. Remediation templates are data: a new gap type is
//! a new registry entry, not a new code path.
//!
//! Only the declared inputs of stages already completed are scanned: a
//! stage the pipeline has not reached yet cannot be faulted for missing
//! fields.

use crate::context::ProjectContext;
use crate::core::stage::StageKind;
use serde::{Deserialize, Serialize};

/// How badly a missing field hurts downstream stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    /// Purely cosmetic
    Low,
    /// Degrades quality; generation proceeds with a default
    Medium,
    /// A downstream stage cannot proceed without it
    High,
}

impl GapSeverity {
    /// Weight used in the completeness score.
    pub fn weight(&self) -> f64 {
        match self {
            GapSeverity::High => 3.0,
            GapSeverity::Medium => 2.0,
            GapSeverity::Low => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GapSeverity::High => "high",
            GapSeverity::Medium => "medium",
            GapSeverity::Low => "low",
        }
    }
}

impl std::fmt::Display for GapSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field some downstream stage declares as a required input.
#[derive(Debug, Clone, Copy)]
pub struct RequiredInput {
    /// Dotted path within the declaring stage's document
    pub path: &'static str,
    /// The stage whose output should hold the field
    pub declared_by: StageKind,
    /// Downstream stages that consume it
    pub needed_by: &'static [StageKind],
    pub severity: GapSeverity,
    /// Remediation template surfaced when the field is missing
    pub remediation: &'static str,
}

/// A detected missing or empty required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextGap {
    /// Stage-qualified path, e.g. `idea_refinement.target_audience`
    pub field_path: String,
    pub declared_by: StageKind,
    pub severity: GapSeverity,
    pub dependent_stages: Vec<StageKind>,
    pub remediation: String,
    /// How much completing this field would raise the completeness score
    pub completeness_contribution: f64,
}

/// Outcome of a gap scan over the full project context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapScan {
    pub gaps: Vec<ContextGap>,
    /// Severity-weighted share of declared inputs that are present, in [0, 1]
    pub completeness_score: f64,
}

impl GapScan {
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Any gap a downstream stage cannot proceed without?
    pub fn has_blocking_gaps(&self) -> bool {
        self.gaps.iter().any(|g| g.severity == GapSeverity::High)
    }

    pub fn gaps_for(&self, stage: StageKind) -> impl Iterator<Item = &ContextGap> {
        self.gaps
            .iter()
            .filter(move |g| g.dependent_stages.contains(&stage))
    }
}

/// The registry of required inputs declared by downstream generation.
pub fn required_inputs() -> &'static [RequiredInput] {
    use GapSeverity::*;
    use StageKind::*;

    const INPUTS: &[RequiredInput] = &[
        // Declared by idea_refinement
        RequiredInput {
            path: "problem_statement",
            declared_by: IdeaRefinement,
            needed_by: &[PrdGeneration, FinalCompilation],
            severity: High,
            remediation: "Describe the core problem in two or three sentences, naming who is affected and when it hurts",
        },
        RequiredInput {
            path: "target_audience",
            declared_by: IdeaRefinement,
            needed_by: &[PrdGeneration, UxSpecification],
            severity: High,
            remediation: "Define the primary audience precisely enough that a requirement can be checked against it",
        },
        RequiredInput {
            path: "pain_points",
            declared_by: IdeaRefinement,
            needed_by: &[PrdGeneration, UxSpecification],
            severity: Medium,
            remediation: "List the concrete pain points the product removes, one per line",
        },
        RequiredInput {
            path: "value_proposition",
            declared_by: IdeaRefinement,
            needed_by: &[PrdGeneration, FinalCompilation],
            severity: Medium,
            remediation: "State in one sentence what users gain that they cannot get today",
        },
        RequiredInput {
            path: "market_size",
            declared_by: IdeaRefinement,
            needed_by: &[TechnicalAnalysis],
            severity: Low,
            remediation: "Add a rough market size estimate to anchor capacity planning",
        },
        RequiredInput {
            path: "revenue_model",
            declared_by: IdeaRefinement,
            needed_by: &[FinalCompilation],
            severity: Low,
            remediation: "Note how the product earns revenue, even tentatively",
        },
        // Declared by prd_generation
        RequiredInput {
            path: "functional_requirements",
            declared_by: PrdGeneration,
            needed_by: &[UxSpecification, TechnicalAnalysis, FinalCompilation],
            severity: High,
            remediation: "Enumerate the functional requirements; downstream stages generate from this list",
        },
        RequiredInput {
            path: "non_functional_requirements",
            declared_by: PrdGeneration,
            needed_by: &[TechnicalAnalysis],
            severity: High,
            remediation: "Capture performance, security, and reliability expectations as non-functional requirements",
        },
        RequiredInput {
            path: "acceptance_criteria",
            declared_by: PrdGeneration,
            needed_by: &[UxSpecification, FinalCompilation],
            severity: Medium,
            remediation: "Write at least one verifiable acceptance criterion per priority feature",
        },
        RequiredInput {
            path: "mvp_scope",
            declared_by: PrdGeneration,
            needed_by: &[TechnicalAnalysis],
            severity: Medium,
            remediation: "Draw the MVP boundary so milestones can be derived from it",
        },
        RequiredInput {
            path: "stakeholders",
            declared_by: PrdGeneration,
            needed_by: &[FinalCompilation],
            severity: Low,
            remediation: "Name the stakeholders who sign off on the compiled document",
        },
        // Declared by ux_specification
        RequiredInput {
            path: "user_flows",
            declared_by: UxSpecification,
            needed_by: &[TechnicalAnalysis, FinalCompilation],
            severity: High,
            remediation: "Document the primary user flows; component boundaries are derived from them",
        },
        RequiredInput {
            path: "accessibility_requirements",
            declared_by: UxSpecification,
            needed_by: &[TechnicalAnalysis],
            severity: Medium,
            remediation: "List the accessibility requirements the stack must satisfy",
        },
        RequiredInput {
            path: "screen_specifications",
            declared_by: UxSpecification,
            needed_by: &[FinalCompilation],
            severity: Medium,
            remediation: "Specify the screens referenced by the compiled document",
        },
        // Declared by technical_analysis
        RequiredInput {
            path: "architecture_pattern",
            declared_by: TechnicalAnalysis,
            needed_by: &[FinalCompilation],
            severity: High,
            remediation: "Record the chosen architecture pattern; the final document must state it",
        },
        RequiredInput {
            path: "technology_stack",
            declared_by: TechnicalAnalysis,
            needed_by: &[FinalCompilation],
            severity: High,
            remediation: "Record the resolved technology stack per category",
        },
        RequiredInput {
            path: "technical_risks",
            declared_by: TechnicalAnalysis,
            needed_by: &[FinalCompilation],
            severity: Medium,
            remediation: "Carry the open technical risks into the delivery checklist",
        },
    ];
    INPUTS
}

/// Scan the project context for missing declared inputs.
///
/// The completeness score is severity-weighted: it equals 1.0 when no gaps
/// are detected and strictly decreases as more declared fields go missing.
pub fn detect_gaps(context: &ProjectContext) -> GapScan {
    let mut total_weight = 0.0;
    let mut missing = Vec::new();

    for input in required_inputs() {
        let Some(stage_data) = context.stage(input.declared_by) else {
            continue;
        };
        total_weight += input.severity.weight();
        if !stage_data.has_content(input.path) {
            missing.push(input);
        }
    }

    if total_weight == 0.0 {
        return GapScan {
            gaps: Vec::new(),
            completeness_score: 1.0,
        };
    }

    let missing_weight: f64 = missing.iter().map(|i| i.severity.weight()).sum();
    let gaps = missing
        .into_iter()
        .map(|input| ContextGap {
            field_path: format!("{}.{}", input.declared_by, input.path),
            declared_by: input.declared_by,
            severity: input.severity,
            dependent_stages: input.needed_by.to_vec(),
            remediation: input.remediation.to_string(),
            completeness_contribution: input.severity.weight() / total_weight,
        })
        .collect();

    GapScan {
        gaps,
        completeness_score: 1.0 - missing_weight / total_weight,
    }
}
