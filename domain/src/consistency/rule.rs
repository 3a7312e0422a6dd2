//! Cross-stage consistency rule catalog
//!
//! A [`ConsistencyRule`] is a named, directional check between two stages:
//! some property of the upstream output must be reflected, compatible, or
//! non-contradictory downstream. The catalog is read-only configuration:
//! a fixed set of rule ids mapped to small pure check functions plus
//! metadata. Adding a stage-pair rule means adding an entry here, not a
//! new code path in the validator.
//!
//! Checks never mutate stage data. Missing upstream fields generally pass
//! (gap detection owns absence); a present field with the wrong shape is
//! a [`DomainError::MalformedStageData`].

use crate::context::StageData;
use crate::core::error::DomainError;
use crate::core::stage::StageKind;
use serde_json::Value;
use std::collections::BTreeSet;

/// Result of evaluating a single rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Signature of a rule's check function.
pub type CheckFn = fn(&StageData, &StageData) -> Result<CheckOutcome, DomainError>;

/// One named, directional consistency check between two stages.
pub struct ConsistencyRule {
    pub id: &'static str,
    pub upstream: StageKind,
    pub downstream: StageKind,
    /// Critical failures become validation errors; others become warnings.
    pub critical: bool,
    pub description: &'static str,
    /// Actionable guidance surfaced when the check fails.
    pub recommendation: &'static str,
    pub check: CheckFn,
}

impl std::fmt::Debug for ConsistencyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyRule")
            .field("id", &self.id)
            .field("upstream", &self.upstream)
            .field("downstream", &self.downstream)
            .field("critical", &self.critical)
            .finish()
    }
}

/// The versioned catalog of consistency rules.
pub struct RuleCatalog {
    rules: Vec<ConsistencyRule>,
}

impl RuleCatalog {
    /// The standard catalog: nine stage pairs, nineteen field-level checks.
    pub fn standard() -> Self {
        Self {
            rules: standard_rules(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose (upstream, downstream) pair matches exactly.
    pub fn rules_for(
        &self,
        upstream: StageKind,
        downstream: StageKind,
    ) -> impl Iterator<Item = &ConsistencyRule> {
        self.rules
            .iter()
            .filter(move |r| r.upstream == upstream && r.downstream == downstream)
    }

    /// Distinct stage pairs covered by the catalog.
    pub fn stage_pairs(&self) -> BTreeSet<(StageKind, StageKind)> {
        self.rules
            .iter()
            .map(|r| (r.upstream, r.downstream))
            .collect()
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ==================== Check helpers ====================

/// Flatten a field into comparable text. Strings pass through, lists join
/// their string items, numbers and booleans render; objects (and lists of
/// non-text items) are the wrong shape for a textual check.
fn field_text(data: &StageData, path: &str) -> Result<String, DomainError> {
    match data.lookup(path) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(items)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    Value::Number(n) => parts.push(n.to_string()),
                    _ => {
                        return Err(DomainError::malformed(
                            data.stage(),
                            path,
                            "expected a list of text items",
                        ));
                    }
                }
            }
            Ok(parts.join(" "))
        }
        Some(Value::Object(_)) => Err(DomainError::malformed(
            data.stage(),
            path,
            "expected text or a list of text items",
        )),
    }
}

/// Concatenate several fields' text.
fn combined_text(data: &StageData, paths: &[&str]) -> Result<String, DomainError> {
    let mut combined = String::new();
    for path in paths {
        let text = field_text(data, path)?;
        if !text.is_empty() {
            combined.push(' ');
            combined.push_str(&text);
        }
    }
    Ok(combined)
}

/// Significant lowercase keywords: alphanumeric runs longer than 3 chars.
fn keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_lowercase)
        .collect()
}

/// Share of `source` keywords found in `target`. An empty source yields
/// 1.0: nothing to carry through is full carry-through.
fn overlap_ratio(source: &str, target: &str) -> f64 {
    let source_words = keywords(source);
    if source_words.is_empty() {
        return 1.0;
    }
    let target_words = keywords(target);
    let hits = source_words.intersection(&target_words).count();
    hits as f64 / source_words.len() as f64
}

/// Keyword overlap check: upstream content must surface downstream.
fn semantic_overlap(
    upstream: &StageData,
    up_paths: &[&str],
    downstream: &StageData,
    down_paths: &[&str],
    min_overlap: f64,
) -> Result<CheckOutcome, DomainError> {
    let source = combined_text(upstream, up_paths)?;
    if keywords(&source).is_empty() {
        return Ok(CheckOutcome::pass("no upstream content to carry through"));
    }
    let target = combined_text(downstream, down_paths)?;
    let ratio = overlap_ratio(&source, &target);
    if ratio >= min_overlap {
        Ok(CheckOutcome::pass(format!(
            "{:.0}% of upstream terms reflected downstream",
            ratio * 100.0
        )))
    } else {
        Ok(CheckOutcome::fail(format!(
            "only {:.0}% of upstream terms from {} appear in {}",
            ratio * 100.0,
            up_paths.join("+"),
            down_paths.join("+")
        )))
    }
}

/// Presence propagation: upstream content demands downstream content.
fn presence_propagation(
    upstream: &StageData,
    up_path: &str,
    downstream: &StageData,
    down_path: &str,
) -> Result<CheckOutcome, DomainError> {
    if !upstream.has_content(up_path) {
        return Ok(CheckOutcome::pass(format!("{} not provided upstream", up_path)));
    }
    if downstream.has_content(down_path) {
        Ok(CheckOutcome::pass(format!("{} carried into {}", up_path, down_path)))
    } else {
        Ok(CheckOutcome::fail(format!(
            "{} is set upstream but {} is empty downstream",
            up_path, down_path
        )))
    }
}

/// Per-item coverage: each upstream list item should surface downstream;
/// the covered share must clear `min_coverage`.
fn item_coverage(
    upstream: &StageData,
    up_path: &str,
    downstream: &StageData,
    down_paths: &[&str],
    min_coverage: f64,
) -> Result<CheckOutcome, DomainError> {
    let Some(items) = upstream.checked_list(up_path)? else {
        return Ok(CheckOutcome::pass(format!("{} not provided upstream", up_path)));
    };
    let texts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
    if texts.is_empty() {
        return Ok(CheckOutcome::pass(format!("{} has no text items", up_path)));
    }

    let target = combined_text(downstream, down_paths)?;
    let covered = texts
        .iter()
        .filter(|item| overlap_ratio(item, &target) >= 0.5)
        .count();
    let coverage = covered as f64 / texts.len() as f64;
    if coverage >= min_coverage {
        Ok(CheckOutcome::pass(format!(
            "{}/{} items of {} covered downstream",
            covered,
            texts.len(),
            up_path
        )))
    } else {
        Ok(CheckOutcome::fail(format!(
            "only {}/{} items of {} are covered in {}",
            covered,
            texts.len(),
            up_path,
            down_paths.join("+")
        )))
    }
}

/// Numeric range compatibility: when both sides are present, they must be
/// within `max_ratio` of each other.
fn numeric_compat(
    upstream: &StageData,
    up_path: &str,
    downstream: &StageData,
    down_path: &str,
    max_ratio: f64,
) -> Result<CheckOutcome, DomainError> {
    let (Some(up), Some(down)) = (
        upstream.checked_number(up_path)?,
        downstream.checked_number(down_path)?,
    ) else {
        return Ok(CheckOutcome::pass("numeric fields not paired"));
    };
    if up <= 0.0 || down <= 0.0 {
        return Ok(CheckOutcome::pass("non-positive values skipped"));
    }
    let ratio = (up / down).max(down / up);
    if ratio <= max_ratio {
        Ok(CheckOutcome::pass(format!(
            "{} and {} within {:.0}x",
            up_path, down_path, max_ratio
        )))
    } else {
        Ok(CheckOutcome::fail(format!(
            "{} ({}) and {} ({}) diverge by {:.1}x",
            up_path, up, down_path, down, ratio
        )))
    }
}

// ==================== Rule check functions ====================
// One small pure function per rule id, in catalog order.

fn idea_prd_problem_coverage(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["problem_statement", "pain_points"],
        down,
        &["functional_requirements", "mvp_scope"],
        0.25,
    )
}

fn idea_prd_audience_carrythrough(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    // Direction matters: a PRD that names users with no upstream audience
    // definition is inventing requirements.
    if down.has_content("target_users") && !up.has_content("target_audience") {
        return Ok(CheckOutcome::fail(
            "PRD names target users but idea refinement defines no target audience",
        ));
    }
    semantic_overlap(
        up,
        &["target_audience"],
        down,
        &["target_users", "mvp_scope", "stakeholders"],
        0.20,
    )
}

fn idea_prd_value_alignment(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["value_proposition"],
        down,
        &["mvp_scope", "feature_priorities"],
        0.20,
    )
}

fn idea_ux_persona_flows(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    presence_propagation(up, "user_personas", down, "user_flows")
}

fn idea_ux_painpoint_flows(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["pain_points"],
        down,
        &["user_flows", "edge_case_flows"],
        0.15,
    )
}

fn idea_tech_scale_alignment(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    numeric_compat(up, "expected_users", down, "capacity_user_target", 10.0)
}

fn idea_tech_constraint_carrythrough(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["constraints"],
        down,
        &["architecture_rationale", "technical_risks"],
        0.15,
    )
}

fn idea_final_value_in_summary(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(up, &["value_proposition"], down, &["executive_summary"], 0.20)
}

fn prd_ux_priority_flow_coverage(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    item_coverage(
        up,
        "feature_priorities",
        down,
        &["user_flows", "screen_specifications"],
        0.60,
    )
}

fn prd_ux_acceptance_screens(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    presence_propagation(up, "acceptance_criteria", down, "screen_specifications")
}

fn prd_tech_nonfunctional_architecture(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["non_functional_requirements"],
        down,
        &["architecture_rationale", "scaling_strategy"],
        0.20,
    )
}

fn prd_tech_scope_milestones(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    presence_propagation(up, "mvp_scope", down, "milestones")
}

fn prd_tech_requirement_risks(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    presence_propagation(up, "non_functional_requirements", down, "technical_risks")
}

fn ux_tech_accessibility_consideration(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["accessibility_requirements"],
        down,
        &["stack_rationale", "architecture_rationale"],
        0.10,
    )
}

fn ux_tech_screen_component_balance(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    let screens = up.checked_list("screen_specifications")?.map(Vec::len);
    let components = down.checked_list("component_boundaries")?.map(Vec::len);
    let (Some(screens), Some(components)) = (screens, components) else {
        return Ok(CheckOutcome::pass("screens or components not provided"));
    };
    if components == 0 && screens > 0 {
        return Ok(CheckOutcome::fail(
            "screens are specified but no component boundaries exist",
        ));
    }
    Ok(CheckOutcome::pass(format!(
        "{} screens against {} components",
        screens, components
    )))
}

fn tech_final_architecture_stated(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["architecture_pattern"],
        down,
        &["stage_summaries", "sections"],
        0.50,
    )
}

fn tech_final_risk_carrythrough(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    presence_propagation(up, "technical_risks", down, "delivery_checklist")
}

fn prd_final_requirement_trace(
    up: &StageData,
    down: &StageData,
) -> Result<CheckOutcome, DomainError> {
    item_coverage(up, "functional_requirements", down, &["requirement_trace"], 0.50)
}

fn prd_final_scope_fidelity(up: &StageData, down: &StageData) -> Result<CheckOutcome, DomainError> {
    semantic_overlap(
        up,
        &["mvp_scope"],
        down,
        &["sections", "stage_summaries"],
        0.15,
    )
}

fn standard_rules() -> Vec<ConsistencyRule> {
    use StageKind::*;

    let rule = |id, upstream, downstream, critical, description, recommendation, check| {
        ConsistencyRule {
            id,
            upstream,
            downstream,
            critical,
            description,
            recommendation,
            check,
        }
    };

    vec![
        // idea_refinement -> prd_generation
        rule(
            "idea_prd_problem_coverage",
            IdeaRefinement,
            PrdGeneration,
            true,
            "PRD requirements must address the stated problem and pain points",
            "Revisit the functional requirements and tie each one back to a stated pain point",
            idea_prd_problem_coverage,
        ),
        rule(
            "idea_prd_audience_carrythrough",
            IdeaRefinement,
            PrdGeneration,
            true,
            "The PRD's audience must match the refined target audience",
            "Align the PRD's target users with the audience defined during idea refinement",
            idea_prd_audience_carrythrough,
        ),
        rule(
            "idea_prd_value_alignment",
            IdeaRefinement,
            PrdGeneration,
            false,
            "MVP scope and priorities should reflect the value proposition",
            "Reorder feature priorities so the core value proposition ships first",
            idea_prd_value_alignment,
        ),
        // idea_refinement -> ux_specification
        rule(
            "idea_ux_persona_flows",
            IdeaRefinement,
            UxSpecification,
            true,
            "Defined personas require user flows",
            "Add at least one user flow per persona defined in idea refinement",
            idea_ux_persona_flows,
        ),
        rule(
            "idea_ux_painpoint_flows",
            IdeaRefinement,
            UxSpecification,
            false,
            "Pain points should be visible in the flows that resolve them",
            "Walk each pain point through a flow or an edge-case flow",
            idea_ux_painpoint_flows,
        ),
        // idea_refinement -> technical_analysis
        rule(
            "idea_tech_scale_alignment",
            IdeaRefinement,
            TechnicalAnalysis,
            true,
            "Capacity targets must be in range of the expected user scale",
            "Reconcile the capacity plan with the user scale estimated during refinement",
            idea_tech_scale_alignment,
        ),
        rule(
            "idea_tech_constraint_carrythrough",
            IdeaRefinement,
            TechnicalAnalysis,
            false,
            "Stated constraints should appear in architecture rationale or risks",
            "Address each stated constraint in the architecture rationale or the risk list",
            idea_tech_constraint_carrythrough,
        ),
        // idea_refinement -> final_compilation
        rule(
            "idea_final_value_in_summary",
            IdeaRefinement,
            FinalCompilation,
            false,
            "The executive summary should restate the value proposition",
            "Open the executive summary with the refined value proposition",
            idea_final_value_in_summary,
        ),
        // prd_generation -> ux_specification
        rule(
            "prd_ux_priority_flow_coverage",
            PrdGeneration,
            UxSpecification,
            true,
            "Priority features need corresponding user flows",
            "Design a flow or screen for every priority feature in the PRD",
            prd_ux_priority_flow_coverage,
        ),
        rule(
            "prd_ux_acceptance_screens",
            PrdGeneration,
            UxSpecification,
            false,
            "Acceptance criteria imply screen specifications to verify against",
            "Specify the screens on which each acceptance criterion is checked",
            prd_ux_acceptance_screens,
        ),
        // prd_generation -> technical_analysis
        rule(
            "prd_tech_nonfunctional_architecture",
            PrdGeneration,
            TechnicalAnalysis,
            true,
            "Non-functional requirements must shape the architecture",
            "Explain in the architecture rationale how each non-functional requirement is met",
            prd_tech_nonfunctional_architecture,
        ),
        rule(
            "prd_tech_scope_milestones",
            PrdGeneration,
            TechnicalAnalysis,
            false,
            "An MVP scope needs delivery milestones",
            "Break the MVP scope into implementation milestones",
            prd_tech_scope_milestones,
        ),
        rule(
            "prd_tech_requirement_risks",
            PrdGeneration,
            TechnicalAnalysis,
            false,
            "Non-functional requirements usually carry technical risk",
            "List the technical risks implied by the non-functional requirements",
            prd_tech_requirement_risks,
        ),
        // ux_specification -> technical_analysis
        rule(
            "ux_tech_accessibility_consideration",
            UxSpecification,
            TechnicalAnalysis,
            true,
            "Accessibility requirements must inform the technology choice",
            "State how the chosen stack satisfies the accessibility requirements",
            ux_tech_accessibility_consideration,
        ),
        rule(
            "ux_tech_screen_component_balance",
            UxSpecification,
            TechnicalAnalysis,
            false,
            "Specified screens need component boundaries to live in",
            "Define component boundaries covering the specified screens",
            ux_tech_screen_component_balance,
        ),
        // technical_analysis -> final_compilation
        rule(
            "tech_final_architecture_stated",
            TechnicalAnalysis,
            FinalCompilation,
            true,
            "The final document must state the chosen architecture",
            "Carry the architecture pattern into the compiled document's summaries",
            tech_final_architecture_stated,
        ),
        rule(
            "tech_final_risk_carrythrough",
            TechnicalAnalysis,
            FinalCompilation,
            false,
            "Known risks belong on the delivery checklist",
            "Add each open technical risk to the delivery checklist",
            tech_final_risk_carrythrough,
        ),
        // prd_generation -> final_compilation
        rule(
            "prd_final_requirement_trace",
            PrdGeneration,
            FinalCompilation,
            true,
            "Functional requirements must be traceable in the final document",
            "Extend the requirement trace until it covers the functional requirements",
            prd_final_requirement_trace,
        ),
        rule(
            "prd_final_scope_fidelity",
            PrdGeneration,
            FinalCompilation,
            false,
            "The compiled document should stay faithful to the MVP scope",
            "Reconcile the compiled sections with the agreed MVP scope",
            prd_final_scope_fidelity,
        ),
    ]
}
