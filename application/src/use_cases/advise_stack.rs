//! Advise Stack use case
//!
//! Resolves a full advisory session outside a stage boundary: the
//! architecture pattern (single-choice) and the technology stack (one
//! consensus per category). Useful when the caller wants the advice before
//! committing anything to the technical-analysis document.
//!
//! Pure sequencing over the consensus engine; no ports involved.

use specsmith_domain::{
    ConsensusEngine, ConsensusResult, DecisionKind, DomainError, ProjectId, Recommendation,
    StackAdvice, TechnologyCategory,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Input for the AdviseStack use case
#[derive(Debug, Clone)]
pub struct AdviseStackInput {
    pub project: ProjectId,
    /// Opinions on the architecture pattern
    pub architecture: Vec<Recommendation>,
    /// Opinions per technology category
    pub stack: BTreeMap<TechnologyCategory, Vec<Recommendation>>,
}

impl AdviseStackInput {
    pub fn new(project: impl Into<ProjectId>, architecture: Vec<Recommendation>) -> Self {
        Self {
            project: project.into(),
            architecture,
            stack: BTreeMap::new(),
        }
    }

    pub fn with_category(
        mut self,
        category: TechnologyCategory,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        self.stack.insert(category, recommendations);
        self
    }
}

/// Output of a full advisory session.
#[derive(Debug, Clone)]
pub struct AdviseStackOutput {
    pub architecture: ConsensusResult,
    /// Empty when no category recommendations were supplied
    pub stack: StackAdvice,
}

/// Use case resolving architecture and stack consensus in one pass.
pub struct AdviseStackUseCase {
    consensus: ConsensusEngine,
}

impl Default for AdviseStackUseCase {
    fn default() -> Self {
        Self::new(ConsensusEngine::default())
    }
}

impl AdviseStackUseCase {
    pub fn new(consensus: ConsensusEngine) -> Self {
        Self { consensus }
    }

    pub fn execute(&self, input: AdviseStackInput) -> Result<AdviseStackOutput, DomainError> {
        info!(
            project = %input.project,
            sources = input.architecture.len(),
            categories = input.stack.len(),
            "Running advisory session"
        );

        let architecture = self
            .consensus
            .resolve(&input.architecture, DecisionKind::SingleChoice)?;
        if architecture.is_contested() {
            warn!(
                winner = %architecture.winning_value,
                flags = architecture.conflict_flags.len(),
                "Architecture decision is contested"
            );
        }

        let stack = if input.stack.is_empty() {
            StackAdvice::new()
        } else {
            self.consensus.resolve_stack(&input.stack)?
        };

        Ok(AdviseStackOutput {
            architecture,
            stack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsmith_domain::SourceModel;

    fn rec(source: SourceModel, value: &str, confidence: f64) -> Recommendation {
        Recommendation::new(source, value, confidence, "because")
    }

    #[test]
    fn test_full_advisory_session() {
        let use_case = AdviseStackUseCase::default();
        let input = AdviseStackInput::new(
            "p-1",
            vec![
                rec(SourceModel::Gpt52Codex, "event_sourcing", 0.9),
                rec(SourceModel::ClaudeSonnet45, "event_sourcing", 0.8),
            ],
        )
        .with_category(
            TechnologyCategory::Backend,
            vec![
                rec(SourceModel::Gpt52Codex, "axum", 0.9),
                rec(SourceModel::Gemini3Pro, "actix", 0.6),
            ],
        );

        let output = use_case.execute(input).unwrap();
        assert_eq!(output.architecture.winning_value, "event_sourcing");
        assert_eq!(
            output
                .stack
                .get(TechnologyCategory::Backend)
                .unwrap()
                .winning_value,
            "axum"
        );
    }

    #[test]
    fn test_empty_architecture_is_an_error() {
        let use_case = AdviseStackUseCase::default();
        let err = use_case
            .execute(AdviseStackInput::new("p-1", vec![]))
            .unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_stack_is_optional() {
        let use_case = AdviseStackUseCase::default();
        let output = use_case
            .execute(AdviseStackInput::new(
                "p-1",
                vec![rec(SourceModel::Gpt5, "layered_monolith", 0.7)],
            ))
            .unwrap();
        assert!(output.stack.categories.is_empty());
        assert!(output.architecture.single_source);
    }
}
