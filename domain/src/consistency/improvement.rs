//! Improvement suggestions and the phased action plan
//!
//! For every dimension sitting below its stage's excellence bar, a
//! templated [`ImprovementSuggestion`] is generated; detected context gaps
//! contribute fill-in suggestions as well. Suggestions are bucketed into
//! three ordered phases by effort, and the plan always carries the fixed
//! success-indicator checklist so callers have a deterministic definition
//! of done.
//!
//! Templates are data. Adding a dimension theme is a table entry, not a
//! branch.

use crate::consistency::gaps::{ContextGap, GapSeverity};
use crate::context::ProjectContext;
use crate::core::stage::StageKind;
use crate::quality::score::StageQualityScore;
use serde::{Deserialize, Serialize};

/// Urgency of a suggestion. Sorted before success probability inside a
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort key: lower ranks first.
    fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// How much work a suggestion demands; decides its action-plan phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// A ranked, actionable recommendation to raise one quality dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    pub stage: StageKind,
    /// The dimension (or stage-qualified field path, for gap fills) to raise
    pub dimension: String,
    pub priority: Priority,
    pub effort: Effort,
    /// Heuristic likelihood the suggestion works, in [0.60, 0.95]
    pub success_probability: f64,
    /// Expected lift of the targeted dimension, in [10, 30] percent
    pub estimated_impact_percent: f64,
    pub action: String,
}

/// One effort bucket of the action plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanPhase {
    pub name: &'static str,
    pub target_window: &'static str,
    pub suggestions: Vec<ImprovementSuggestion>,
}

/// Deterministic definition of "done" returned with every plan.
pub const SUCCESS_INDICATORS: [&str; 6] = [
    "Targeted dimensions improve by at least 10%",
    "All cross-stage consistency scores reach 85% or higher",
    "Context completeness reaches 90% or higher",
    "No high-severity context gaps remain",
    "Every completed stage meets its adjusted threshold",
    "Quality trend is positive across scoring attempts",
];

/// The phased improvement plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    /// Immediate / short-term / strategic, in order
    pub phases: Vec<PlanPhase>,
    pub success_indicators: Vec<String>,
}

impl ActionPlan {
    pub fn total_suggestions(&self) -> usize {
        self.phases.iter().map(|p| p.suggestions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_suggestions() == 0
    }
}

/// One dimension theme's template.
struct DimensionTemplate {
    matches: &'static [&'static str],
    action: &'static str,
    effort: Effort,
}

/// Six templates, one per common dimension theme. The last entry is the
/// catch-all for dimensions no other theme claims.
const TEMPLATES: [DimensionTemplate; 6] = [
    DimensionTemplate {
        matches: &["problem_clarity", "value_proposition"],
        action: "Sharpen the narrative: restate the problem and value in concrete, checkable terms",
        effort: Effort::Low,
    },
    DimensionTemplate {
        matches: &["target_audience", "user_flow_coverage", "interaction_detail"],
        action: "Ground the work in users: tighten audience definition and walk every flow end to end",
        effort: Effort::Medium,
    },
    DimensionTemplate {
        matches: &["accessibility"],
        action: "Run an accessibility pass: requirements, contrast audit, and keyboard coverage",
        effort: Effort::Medium,
    },
    DimensionTemplate {
        matches: &[
            "architectural_soundness",
            "technology_fit",
            "scalability_planning",
            "risk_assessment",
            "implementation_readiness",
        ],
        action: "Deepen the technical analysis: rationale, component boundaries, and risk mitigations",
        effort: Effort::High,
    },
    DimensionTemplate {
        matches: &["cross_stage_coherence", "traceability", "market_viability"],
        action: "Reconcile the document set: trace requirements and align terminology across stages",
        effort: Effort::Medium,
    },
    DimensionTemplate {
        matches: &[],
        action: "Fill out the missing or thin fields feeding this dimension",
        effort: Effort::Low,
    },
];

fn template_for(dimension: &str) -> &'static DimensionTemplate {
    TEMPLATES
        .iter()
        .find(|t| t.matches.contains(&dimension))
        .unwrap_or(TEMPLATES.last().expect("catch-all template"))
}

/// Builds phased improvement plans from scores and gaps.
#[derive(Debug, Clone)]
pub struct ImprovementPlanner {
    baseline_probability: f64,
    upstream_bonus: f64,
    probability_cap: f64,
    /// Distance above the adjusted threshold at which a dimension stops
    /// generating suggestions (the excellence bar).
    excellence_margin: f64,
}

impl Default for ImprovementPlanner {
    fn default() -> Self {
        Self {
            baseline_probability: 0.60,
            upstream_bonus: 0.05,
            probability_cap: 0.95,
            excellence_margin: 10.0,
        }
    }
}

impl ImprovementPlanner {
    pub fn with_excellence_margin(mut self, margin: f64) -> Self {
        self.excellence_margin = margin;
        self
    }

    /// Build the phased plan from stage scores and detected gaps.
    pub fn plan(
        &self,
        scores: &[StageQualityScore],
        gaps: &[ContextGap],
        context: &ProjectContext,
    ) -> ActionPlan {
        let mut suggestions = Vec::new();
        for score in scores {
            suggestions.extend(self.dimension_suggestions(score, context));
        }
        suggestions.extend(gaps.iter().map(|gap| self.gap_suggestion(gap, context)));

        let mut phases = vec![
            PlanPhase {
                name: "Phase 1: Immediate Actions",
                target_window: "1-2 hours",
                suggestions: Vec::new(),
            },
            PlanPhase {
                name: "Phase 2: Short-term Improvements",
                target_window: "1-3 days",
                suggestions: Vec::new(),
            },
            PlanPhase {
                name: "Phase 3: Strategic Enhancements",
                target_window: "1-2 weeks",
                suggestions: Vec::new(),
            },
        ];
        for suggestion in suggestions {
            let phase = match suggestion.effort {
                Effort::Low => 0,
                Effort::Medium => 1,
                Effort::High => 2,
            };
            phases[phase].suggestions.push(suggestion);
        }
        for phase in &mut phases {
            phase.suggestions.sort_by(|a, b| {
                a.priority.rank().cmp(&b.priority.rank()).then(
                    b.success_probability
                        .partial_cmp(&a.success_probability)
                        .expect("finite probabilities"),
                )
            });
        }

        ActionPlan {
            phases,
            success_indicators: SUCCESS_INDICATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Suggestions for every dimension below the stage's excellence bar.
    fn dimension_suggestions(
        &self,
        score: &StageQualityScore,
        context: &ProjectContext,
    ) -> Vec<ImprovementSuggestion> {
        let excellence_bar = score.adjusted_threshold + self.excellence_margin;
        let probability = self.success_probability(context.completed_upstream_of(score.stage));

        score
            .dimension_scores
            .iter()
            .filter(|(_, dim_score)| **dim_score < excellence_bar)
            .map(|(name, dim_score)| {
                let deficit = excellence_bar - dim_score;
                let template = template_for(name);
                ImprovementSuggestion {
                    stage: score.stage,
                    dimension: name.clone(),
                    priority: priority_from_deficit(deficit),
                    effort: template.effort,
                    success_probability: probability,
                    estimated_impact_percent: impact_from_deficit(deficit),
                    action: template.action.to_string(),
                }
            })
            .collect()
    }

    /// A gap converts into a low-effort fill-in suggestion.
    fn gap_suggestion(&self, gap: &ContextGap, context: &ProjectContext) -> ImprovementSuggestion {
        let priority = match gap.severity {
            GapSeverity::High => Priority::Critical,
            GapSeverity::Medium => Priority::High,
            GapSeverity::Low => Priority::Medium,
        };
        ImprovementSuggestion {
            stage: gap.declared_by,
            dimension: gap.field_path.clone(),
            priority,
            effort: Effort::Low,
            success_probability: self.success_probability(context.completed_count()),
            estimated_impact_percent: 10.0 + 20.0 * (gap.completeness_contribution.min(1.0)),
            action: gap.remediation.clone(),
        }
    }

    fn success_probability(&self, supporting_stages: usize) -> f64 {
        (self.baseline_probability + self.upstream_bonus * supporting_stages as f64)
            .min(self.probability_cap)
    }
}

/// Deficit bands map to priority: the further below the bar, the hotter.
fn priority_from_deficit(deficit: f64) -> Priority {
    if deficit > 30.0 {
        Priority::Critical
    } else if deficit > 15.0 {
        Priority::High
    } else if deficit > 5.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Impact scales with deficit, clamped into [10, 30] percent.
fn impact_from_deficit(deficit: f64) -> f64 {
    10.0 + 20.0 * (deficit / 50.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ProjectId, StageData};
    use crate::quality::score::{GateDecision, ImprovementWindow};
    use std::collections::BTreeMap;

    fn score_with(stage: StageKind, dims: &[(&str, f64)], threshold: f64) -> StageQualityScore {
        let dimension_scores: BTreeMap<String, f64> =
            dims.iter().map(|(n, s)| (n.to_string(), *s)).collect();
        let overall = dims.iter().map(|(_, s)| s).sum::<f64>() / dims.len() as f64;
        StageQualityScore {
            stage,
            dimension_scores,
            overall_score: overall,
            adjusted_threshold: threshold,
            gate_decision: GateDecision::Caution,
            improvement_window: ImprovementWindow::Days,
            secondary_shortfall: None,
        }
    }

    fn empty_context() -> ProjectContext {
        ProjectContext::new(ProjectId::new("p-1"))
    }

    #[test]
    fn test_dimensions_below_excellence_generate_suggestions() {
        let planner = ImprovementPlanner::default();
        let score = score_with(
            StageKind::IdeaRefinement,
            &[("problem_clarity", 95.0), ("target_audience", 40.0)],
            75.0,
        );
        let plan = planner.plan(&[score], &[], &empty_context());

        // Excellence bar is 85: 95 is above it, 40 is far below.
        assert_eq!(plan.total_suggestions(), 1);
        let suggestion = &plan.phases[1].suggestions[0];
        assert_eq!(suggestion.dimension, "target_audience");
        assert_eq!(suggestion.priority, Priority::Critical);
        assert_eq!(suggestion.effort, Effort::Medium);
    }

    #[test]
    fn test_probability_grows_with_completed_upstream() {
        let planner = ImprovementPlanner::default();
        let score = score_with(StageKind::TechnicalAnalysis, &[("technology_fit", 50.0)], 85.0);

        let bare = planner.plan(&[score.clone()], &[], &empty_context());
        let mut ctx = empty_context();
        ctx.insert_stage(StageData::new(StageKind::IdeaRefinement));
        ctx.insert_stage(StageData::new(StageKind::PrdGeneration));
        ctx.insert_stage(StageData::new(StageKind::UxSpecification));
        let supported = planner.plan(&[score], &[], &ctx);

        let p0 = bare.phases[2].suggestions[0].success_probability;
        let p3 = supported.phases[2].suggestions[0].success_probability;
        assert_eq!(p0, 0.60);
        assert!((p3 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_probability_is_capped() {
        let planner = ImprovementPlanner::default();
        assert_eq!(planner.success_probability(20), 0.95);
    }

    #[test]
    fn test_impact_stays_in_band() {
        assert_eq!(impact_from_deficit(0.0), 10.0);
        assert_eq!(impact_from_deficit(50.0), 30.0);
        assert_eq!(impact_from_deficit(500.0), 30.0);
        let mid = impact_from_deficit(25.0);
        assert!(mid > 10.0 && mid < 30.0);
    }

    #[test]
    fn test_gaps_become_immediate_fill_ins() {
        let planner = ImprovementPlanner::default();
        let gap = ContextGap {
            field_path: "idea_refinement.target_audience".to_string(),
            declared_by: StageKind::IdeaRefinement,
            severity: GapSeverity::High,
            dependent_stages: vec![StageKind::PrdGeneration],
            remediation: "Define the primary audience".to_string(),
            completeness_contribution: 0.25,
        };
        let plan = planner.plan(&[], &[gap], &empty_context());

        assert_eq!(plan.phases[0].suggestions.len(), 1);
        let suggestion = &plan.phases[0].suggestions[0];
        assert_eq!(suggestion.priority, Priority::Critical);
        assert_eq!(suggestion.effort, Effort::Low);
        assert_eq!(suggestion.action, "Define the primary audience");
    }

    #[test]
    fn test_phase_ordering_by_priority_then_probability() {
        let planner = ImprovementPlanner::default();
        // Two medium-effort dimensions with different deficits on the same
        // phase: the deeper deficit (higher priority) sorts first.
        let score = score_with(
            StageKind::UxSpecification,
            &[("interaction_detail", 80.0), ("user_flow_coverage", 40.0)],
            85.0,
        );
        let plan = planner.plan(&[score], &[], &empty_context());

        let phase = &plan.phases[1];
        assert_eq!(phase.suggestions.len(), 2);
        assert_eq!(phase.suggestions[0].dimension, "user_flow_coverage");
        assert_eq!(phase.suggestions[1].dimension, "interaction_detail");
    }

    #[test]
    fn test_success_indicators_always_present() {
        let planner = ImprovementPlanner::default();
        let plan = planner.plan(&[], &[], &empty_context());
        assert!(plan.is_empty());
        assert_eq!(plan.success_indicators.len(), 6);
        assert!(plan
            .success_indicators
            .iter()
            .any(|s| s.contains("high-severity")));
    }

    #[test]
    fn test_catch_all_template() {
        let template = template_for("some_future_dimension");
        assert_eq!(template.effort, Effort::Low);
    }
}
