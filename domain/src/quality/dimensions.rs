//! Per-stage dimension profiles
//!
//! What "quality" means differs per stage, so each stage carries a profile:
//! its dimensions, their weights (summing to 1.0), the base gate threshold,
//! and an optional secondary requirement that must clear its own bar.
//!
//! Dimension extraction is declarative. Each dimension lists the fields
//! that feed it as [`FieldSignal`]s: presence of a field earns most of the
//! signal's points, and the rest scale with how substantial the content is
//! (word count for text, item count for lists). Adding a field to a
//! dimension is a data change here, not a code change in the engine.

use crate::core::stage::StageKind;

/// One field's contribution to a dimension score.
#[derive(Debug, Clone, Copy)]
pub struct FieldSignal {
    /// Dotted path into the stage document
    pub path: &'static str,
    /// Maximum points this field contributes (signals per dimension sum to 100)
    pub points: f64,
    /// Content size (words or items) at which the field earns full points
    pub full_credit_size: usize,
}

/// A named quality dimension with its weight and contributing fields.
#[derive(Debug, Clone, Copy)]
pub struct DimensionSpec {
    pub name: &'static str,
    /// Share of the overall score; weights per stage sum to 1.0
    pub weight: f64,
    pub signals: &'static [FieldSignal],
}

/// A dimension that must separately clear its own threshold for the stage
/// to gate as Pass or better.
#[derive(Debug, Clone, Copy)]
pub struct SecondaryRequirement {
    pub dimension: &'static str,
    pub min_score: f64,
}

/// Everything the scoring engine needs to know about one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageProfile {
    pub stage: StageKind,
    pub base_threshold: f64,
    pub dimensions: &'static [DimensionSpec],
    pub secondary: Option<SecondaryRequirement>,
}

const fn signal(path: &'static str, points: f64, full_credit_size: usize) -> FieldSignal {
    FieldSignal {
        path,
        points,
        full_credit_size,
    }
}

static IDEA_REFINEMENT: StageProfile = StageProfile {
    stage: StageKind::IdeaRefinement,
    base_threshold: 75.0,
    dimensions: &[
        DimensionSpec {
            name: "problem_clarity",
            weight: 0.30,
            signals: &[
                signal("problem_statement", 60.0, 80),
                signal("pain_points", 40.0, 4),
            ],
        },
        DimensionSpec {
            name: "target_audience",
            weight: 0.25,
            signals: &[
                signal("target_audience", 70.0, 40),
                signal("user_personas", 30.0, 2),
            ],
        },
        DimensionSpec {
            name: "value_proposition",
            weight: 0.25,
            signals: &[
                signal("value_proposition", 70.0, 50),
                signal("differentiators", 30.0, 3),
            ],
        },
        DimensionSpec {
            name: "market_viability",
            weight: 0.20,
            signals: &[
                signal("market_size", 40.0, 20),
                signal("competitors", 30.0, 3),
                signal("revenue_model", 30.0, 25),
            ],
        },
    ],
    secondary: None,
};

static PRD_GENERATION: StageProfile = StageProfile {
    stage: StageKind::PrdGeneration,
    base_threshold: 80.0,
    dimensions: &[
        DimensionSpec {
            name: "requirements_completeness",
            weight: 0.30,
            signals: &[
                signal("functional_requirements", 60.0, 8),
                signal("non_functional_requirements", 40.0, 4),
            ],
        },
        DimensionSpec {
            name: "feature_prioritization",
            weight: 0.20,
            signals: &[
                signal("feature_priorities", 60.0, 5),
                signal("mvp_scope", 40.0, 40),
            ],
        },
        DimensionSpec {
            name: "acceptance_criteria",
            weight: 0.20,
            signals: &[signal("acceptance_criteria", 100.0, 6)],
        },
        DimensionSpec {
            name: "scope_definition",
            weight: 0.15,
            signals: &[
                signal("in_scope", 50.0, 4),
                signal("out_of_scope", 50.0, 3),
            ],
        },
        DimensionSpec {
            name: "stakeholder_alignment",
            weight: 0.15,
            signals: &[
                signal("stakeholders", 50.0, 3),
                signal("approval_notes", 50.0, 30),
            ],
        },
    ],
    secondary: None,
};

static UX_SPECIFICATION: StageProfile = StageProfile {
    stage: StageKind::UxSpecification,
    base_threshold: 85.0,
    dimensions: &[
        DimensionSpec {
            name: "user_flow_coverage",
            weight: 0.30,
            signals: &[
                signal("user_flows", 70.0, 5),
                signal("edge_case_flows", 30.0, 3),
            ],
        },
        DimensionSpec {
            name: "interaction_detail",
            weight: 0.25,
            signals: &[
                signal("screen_specifications", 60.0, 6),
                signal("interaction_notes", 40.0, 60),
            ],
        },
        DimensionSpec {
            name: "accessibility",
            weight: 0.25,
            signals: &[
                signal("accessibility_requirements", 70.0, 5),
                signal("contrast_audit", 30.0, 20),
            ],
        },
        DimensionSpec {
            name: "visual_consistency",
            weight: 0.20,
            signals: &[
                signal("design_tokens", 50.0, 6),
                signal("component_inventory", 50.0, 8),
            ],
        },
    ],
    secondary: Some(SecondaryRequirement {
        dimension: "accessibility",
        min_score: 90.0,
    }),
};

static TECHNICAL_ANALYSIS: StageProfile = StageProfile {
    stage: StageKind::TechnicalAnalysis,
    base_threshold: 85.0,
    dimensions: &[
        DimensionSpec {
            name: "architectural_soundness",
            weight: 0.30,
            signals: &[
                signal("architecture_pattern", 40.0, 3),
                signal("architecture_rationale", 30.0, 60),
                signal("component_boundaries", 30.0, 4),
            ],
        },
        DimensionSpec {
            name: "technology_fit",
            weight: 0.20,
            signals: &[
                signal("technology_stack", 60.0, 4),
                signal("stack_rationale", 40.0, 50),
            ],
        },
        DimensionSpec {
            name: "scalability_planning",
            weight: 0.20,
            signals: &[
                signal("scaling_strategy", 60.0, 50),
                signal("capacity_estimates", 40.0, 20),
            ],
        },
        DimensionSpec {
            name: "risk_assessment",
            weight: 0.15,
            signals: &[
                signal("technical_risks", 60.0, 4),
                signal("mitigations", 40.0, 4),
            ],
        },
        DimensionSpec {
            name: "implementation_readiness",
            weight: 0.15,
            signals: &[
                signal("milestones", 60.0, 4),
                signal("team_skill_fit", 40.0, 30),
            ],
        },
    ],
    secondary: Some(SecondaryRequirement {
        dimension: "architectural_soundness",
        min_score: 90.0,
    }),
};

static FINAL_COMPILATION: StageProfile = StageProfile {
    stage: StageKind::FinalCompilation,
    base_threshold: 85.0,
    dimensions: &[
        DimensionSpec {
            name: "document_completeness",
            weight: 0.30,
            signals: &[signal("sections", 60.0, 8), signal("appendices", 40.0, 3)],
        },
        DimensionSpec {
            name: "cross_stage_coherence",
            weight: 0.30,
            signals: &[
                signal("stage_summaries", 60.0, 5),
                signal("terminology_glossary", 40.0, 10),
            ],
        },
        DimensionSpec {
            name: "traceability",
            weight: 0.20,
            signals: &[
                signal("requirement_trace", 60.0, 8),
                signal("decision_log", 40.0, 5),
            ],
        },
        DimensionSpec {
            name: "delivery_readiness",
            weight: 0.20,
            signals: &[
                signal("delivery_checklist", 60.0, 6),
                signal("handoff_notes", 40.0, 40),
            ],
        },
    ],
    secondary: None,
};

/// Look up the fixed profile for a stage.
pub fn profile(stage: StageKind) -> &'static StageProfile {
    match stage {
        StageKind::IdeaRefinement => &IDEA_REFINEMENT,
        StageKind::PrdGeneration => &PRD_GENERATION,
        StageKind::UxSpecification => &UX_SPECIFICATION,
        StageKind::TechnicalAnalysis => &TECHNICAL_ANALYSIS,
        StageKind::FinalCompilation => &FINAL_COMPILATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_per_stage() {
        for stage in StageKind::ALL {
            let p = profile(stage);
            let total: f64 = p.dimensions.iter().map(|d| d.weight).sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "{} weights sum to {}",
                stage,
                total
            );
        }
    }

    #[test]
    fn test_signal_points_sum_to_hundred_per_dimension() {
        for stage in StageKind::ALL {
            for dim in profile(stage).dimensions {
                let total: f64 = dim.signals.iter().map(|s| s.points).sum();
                assert!(
                    (total - 100.0).abs() < 1e-9,
                    "{}/{} points sum to {}",
                    stage,
                    dim.name,
                    total
                );
            }
        }
    }

    #[test]
    fn test_thresholds_escalate_through_pipeline() {
        let thresholds: Vec<f64> = StageKind::ALL
            .iter()
            .map(|s| profile(*s).base_threshold)
            .collect();
        assert_eq!(thresholds, vec![75.0, 80.0, 85.0, 85.0, 85.0]);
    }

    #[test]
    fn test_secondary_requirements() {
        assert!(profile(StageKind::IdeaRefinement).secondary.is_none());
        let ux = profile(StageKind::UxSpecification).secondary.unwrap();
        assert_eq!(ux.dimension, "accessibility");
        assert_eq!(ux.min_score, 90.0);
        let ta = profile(StageKind::TechnicalAnalysis).secondary.unwrap();
        assert_eq!(ta.dimension, "architectural_soundness");
    }

    #[test]
    fn test_secondary_names_an_existing_dimension() {
        for stage in StageKind::ALL {
            let p = profile(stage);
            if let Some(secondary) = p.secondary {
                assert!(
                    p.dimensions.iter().any(|d| d.name == secondary.dimension),
                    "{} secondary names unknown dimension",
                    stage
                );
            }
        }
    }

    #[test]
    fn test_dimension_counts() {
        for stage in StageKind::ALL {
            let count = profile(stage).dimensions.len();
            assert!((4..=5).contains(&count), "{} has {} dimensions", stage, count);
        }
    }
}
