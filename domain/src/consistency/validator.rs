//! Cross-stage consistency validation
//!
//! Evaluates every catalog rule matching a stage pair and aggregates the
//! outcomes into a [`ConsistencyReport`]. Validation is a pure read-side
//! check: stage data is never mutated.
//!
//! An unknown stage pair returns an empty-but-valid report; absence of
//! rules is not evidence of inconsistency.

use crate::consistency::rule::RuleCatalog;
use crate::context::{ProjectContext, StageData};
use crate::core::error::DomainError;
use crate::core::stage::StageKind;
use serde::{Deserialize, Serialize};

/// How much a consistency failure is expected to hurt overall quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityImpact {
    Critical,
    Moderate,
    Minor,
    Neutral,
}

/// Aggregate of all rule evaluations for one stage pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub upstream: StageKind,
    pub downstream: StageKind,
    pub is_consistent: bool,
    /// Passed checks over total checks, in [0, 1]; 1.0 when no rules match.
    pub consistency_score: f64,
    /// Hard failures from critical rules
    pub errors: Vec<String>,
    /// Soft issues from non-critical rules
    pub warnings: Vec<String>,
    /// Actionable guidance drawn from the failed rules
    pub recommendations: Vec<String>,
    pub quality_impact: QualityImpact,
    pub checks_evaluated: usize,
}

impl ConsistencyReport {
    /// Empty-but-valid report for a pair with no catalog rules.
    fn empty(upstream: StageKind, downstream: StageKind) -> Self {
        Self {
            upstream,
            downstream,
            is_consistent: true,
            consistency_score: 1.0,
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            quality_impact: QualityImpact::Neutral,
            checks_evaluated: 0,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Evaluates the consistency rule catalog over stage pairs.
pub struct ConsistencyValidator {
    catalog: RuleCatalog,
    /// Minimum score at which a pair counts as consistent.
    consistency_floor: f64,
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new(RuleCatalog::standard())
    }
}

impl ConsistencyValidator {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            consistency_floor: 0.85,
        }
    }

    pub fn with_consistency_floor(mut self, floor: f64) -> Self {
        self.consistency_floor = floor;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Validate one (upstream, downstream) pair of stage outputs.
    pub fn validate(
        &self,
        upstream: &StageData,
        downstream: &StageData,
    ) -> Result<ConsistencyReport, DomainError> {
        let rules: Vec<_> = self
            .catalog
            .rules_for(upstream.stage(), downstream.stage())
            .collect();
        if rules.is_empty() {
            return Ok(ConsistencyReport::empty(upstream.stage(), downstream.stage()));
        }

        let mut passed = 0usize;
        let mut critical_failures = 0usize;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        for rule in &rules {
            let outcome = (rule.check)(upstream, downstream)?;
            if outcome.passed {
                passed += 1;
                continue;
            }
            let message = format!("{}: {}", rule.id, outcome.detail);
            if rule.critical {
                critical_failures += 1;
                errors.push(message);
            } else {
                warnings.push(message);
            }
            recommendations.push(rule.recommendation.to_string());
        }

        let consistency_score = passed as f64 / rules.len() as f64;
        let is_consistent = consistency_score >= self.consistency_floor;
        let quality_impact = if critical_failures > 0 {
            QualityImpact::Critical
        } else if !is_consistent {
            QualityImpact::Moderate
        } else if !warnings.is_empty() {
            QualityImpact::Minor
        } else {
            QualityImpact::Neutral
        };

        Ok(ConsistencyReport {
            upstream: upstream.stage(),
            downstream: downstream.stage(),
            is_consistent,
            consistency_score,
            errors,
            warnings,
            recommendations,
            quality_impact,
            checks_evaluated: rules.len(),
        })
    }

    /// Validate `downstream` against every completed upstream stage that
    /// shares catalog rules with it.
    pub fn validate_against_upstream(
        &self,
        context: &ProjectContext,
        downstream: &StageData,
    ) -> Result<Vec<ConsistencyReport>, DomainError> {
        let mut reports = Vec::new();
        for upstream_kind in downstream.stage().upstream() {
            let Some(upstream) = context.stage(*upstream_kind) else {
                continue;
            };
            let report = self.validate(upstream, downstream)?;
            if report.checks_evaluated > 0 {
                reports.push(report);
            }
        }
        Ok(reports)
    }
}
