//! Complete Stage use case
//!
//! The pipeline orchestration contract: what must hold before a stage is
//! considered complete. Every stage boundary gets a quality score and a
//! gate check; the technical-analysis boundary additionally resolves the
//! advisory consensus decisions, and the technical-analysis and
//! final-compilation boundaries run cross-stage validation and gap
//! detection against the accumulated context.
//!
//! The use case never persists anything: it loads through the
//! [`StageStore`] port, computes, and hands the structured outcome back to
//! the caller to act on.

use crate::ports::stage_store::{StageStore, StageStoreError};
use specsmith_domain::{
    detect_gaps, ActionPlan, ComplexityTier, ConsensusEngine, ConsensusResult, ConsistencyReport,
    ConsistencyValidator, DecisionKind, DomainError, GapScan, ImprovementPlanner, ProjectId,
    QualityEngine, QualityRecord, QualityTrend, Recommendation, StackAdvice, StageKind,
    StageQualityScore, TechnologyCategory,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while completing a stage
#[derive(Error, Debug)]
pub enum CompleteStageError {
    #[error("Stage document not found: {project}/{stage}")]
    StageNotFound { project: ProjectId, stage: StageKind },

    #[error("Store error: {0}")]
    Store(#[from] StageStoreError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Input for the CompleteStage use case
#[derive(Debug, Clone)]
pub struct CompleteStageInput {
    pub project: ProjectId,
    pub stage: StageKind,
    pub tier: ComplexityTier,
    /// Advisory opinions on the architecture pattern, gathered by the
    /// caller from the model backends. Consumed at technical analysis.
    pub architecture_recommendations: Vec<Recommendation>,
    /// Advisory opinions per technology category. Consumed at technical
    /// analysis.
    pub stack_recommendations: BTreeMap<TechnologyCategory, Vec<Recommendation>>,
}

impl CompleteStageInput {
    pub fn new(project: impl Into<ProjectId>, stage: StageKind) -> Self {
        Self {
            project: project.into(),
            stage,
            tier: ComplexityTier::default(),
            architecture_recommendations: Vec::new(),
            stack_recommendations: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, tier: ComplexityTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_architecture_recommendations(mut self, recs: Vec<Recommendation>) -> Self {
        self.architecture_recommendations = recs;
        self
    }

    pub fn with_stack_recommendations(
        mut self,
        recs: BTreeMap<TechnologyCategory, Vec<Recommendation>>,
    ) -> Self {
        self.stack_recommendations = recs;
        self
    }
}

/// Everything the caller needs to decide what happens next at a stage
/// boundary. `completed` is the contract: true only when the gate decision
/// is Pass or Excellence.
#[derive(Debug, Clone)]
pub struct StageCompletionOutcome {
    pub stage: StageKind,
    pub quality: StageQualityScore,
    pub completed: bool,
    pub quality_trend: QualityTrend,
    pub architecture_consensus: Option<ConsensusResult>,
    pub stack_advice: Option<StackAdvice>,
    pub consistency_reports: Vec<ConsistencyReport>,
    pub gap_scan: Option<GapScan>,
    /// Present whenever the stage did not complete
    pub improvement_plan: Option<ActionPlan>,
}

/// Use case sequencing the engines at a stage boundary.
pub struct CompleteStageUseCase<S: StageStore> {
    store: Arc<S>,
    quality: QualityEngine,
    consensus: ConsensusEngine,
    validator: ConsistencyValidator,
    planner: ImprovementPlanner,
}

impl<S: StageStore> CompleteStageUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            quality: QualityEngine::default(),
            consensus: ConsensusEngine::default(),
            validator: ConsistencyValidator::default(),
            planner: ImprovementPlanner::default(),
        }
    }

    /// Build with engines derived from loaded configuration.
    pub fn from_config(store: Arc<S>, config: &crate::config::EngineConfig) -> Self {
        Self {
            store,
            quality: config.quality_engine(),
            consensus: config.consensus_engine(),
            validator: config.consistency_validator(),
            planner: ImprovementPlanner::default()
                .with_excellence_margin(config.gates.excellence_margin),
        }
    }

    /// Execute the stage-completion check.
    pub async fn execute(
        &self,
        input: CompleteStageInput,
    ) -> Result<StageCompletionOutcome, CompleteStageError> {
        info!(project = %input.project, stage = %input.stage, tier = %input.tier, "Evaluating stage completion");

        let data = self
            .store
            .load_stage(&input.project, input.stage)
            .await?
            .ok_or_else(|| CompleteStageError::StageNotFound {
                project: input.project.clone(),
                stage: input.stage,
            })?;

        // Quality gate at every boundary.
        let quality = self.quality.score_stage(&data, input.tier);
        debug!(
            overall = quality.overall_score,
            threshold = quality.adjusted_threshold,
            gate = %quality.gate_decision,
            "Stage quality computed"
        );

        let mut history = self
            .store
            .quality_history(&input.project, input.stage)
            .await?;
        history.push(QualityRecord::from_score(&quality));
        let quality_trend = QualityTrend::from_history(&history);

        // Advisory consensus at the technical-analysis boundary.
        let (architecture_consensus, stack_advice) = if input.stage == StageKind::TechnicalAnalysis
        {
            (
                self.architecture_consensus(&input)?,
                self.stack_advice(&input)?,
            )
        } else {
            (None, None)
        };

        // Cross-stage validation at the analysis and compilation boundaries.
        let context = self.store.load_context(&input.project).await?;
        let (consistency_reports, gap_scan) = if matches!(
            input.stage,
            StageKind::TechnicalAnalysis | StageKind::FinalCompilation
        ) {
            let reports = self.validator.validate_against_upstream(&context, &data)?;
            for report in &reports {
                if !report.is_consistent {
                    warn!(
                        upstream = %report.upstream,
                        downstream = %report.downstream,
                        score = report.consistency_score,
                        "Cross-stage inconsistency detected"
                    );
                }
            }
            let scan_context = context.clone().with_stage(data.clone());
            let scan = detect_gaps(&scan_context);
            if scan.has_blocking_gaps() {
                warn!(gaps = scan.gaps.len(), "High-severity context gaps present");
            }
            (reports, Some(scan))
        } else {
            (Vec::new(), None)
        };

        // The completion contract: the gate decision, nothing else.
        let completed = quality.is_passing();
        let improvement_plan = if completed {
            info!(stage = %input.stage, gate = %quality.gate_decision, "Stage cleared its gate");
            None
        } else {
            warn!(
                stage = %input.stage,
                gate = %quality.gate_decision,
                window = %quality.improvement_window,
                "Stage blocked below its gate"
            );
            let gaps = gap_scan.as_ref().map(|s| s.gaps.as_slice()).unwrap_or(&[]);
            Some(
                self.planner
                    .plan(std::slice::from_ref(&quality), gaps, &context),
            )
        };

        Ok(StageCompletionOutcome {
            stage: input.stage,
            quality,
            completed,
            quality_trend,
            architecture_consensus,
            stack_advice,
            consistency_reports,
            gap_scan,
            improvement_plan,
        })
    }

    fn architecture_consensus(
        &self,
        input: &CompleteStageInput,
    ) -> Result<Option<ConsensusResult>, DomainError> {
        if input.architecture_recommendations.is_empty() {
            debug!("No architecture recommendations supplied; skipping consensus");
            return Ok(None);
        }
        let result = self
            .consensus
            .resolve(&input.architecture_recommendations, DecisionKind::SingleChoice)?;
        info!(
            winner = %result.winning_value,
            strength = result.consensus_strength,
            strategy = %result.resolution_strategy,
            "Architecture consensus resolved"
        );
        for flag in &result.conflict_flags {
            warn!(flag = %flag, "Consensus conflict");
        }
        Ok(Some(result))
    }

    fn stack_advice(&self, input: &CompleteStageInput) -> Result<Option<StackAdvice>, DomainError> {
        if input.stack_recommendations.is_empty() {
            return Ok(None);
        }
        let advice = self.consensus.resolve_stack(&input.stack_recommendations)?;
        info!(
            categories = advice.categories.len(),
            strength = advice.overall_strength(),
            "Technology stack consensus resolved"
        );
        Ok(Some(advice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsmith_domain::{GateDecision, ProjectContext, SourceModel, StageData};
    use serde_json::json;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("specsmith_application=debug")
            .with_test_writer()
            .try_init();
    }

    /// In-memory stage store for tests.
    #[derive(Default)]
    struct InMemoryStageStore {
        stages: RwLock<BTreeMap<(ProjectId, StageKind), StageData>>,
        history: RwLock<BTreeMap<(ProjectId, StageKind), Vec<QualityRecord>>>,
    }

    impl InMemoryStageStore {
        async fn put_stage(&self, project: &ProjectId, data: StageData) {
            self.stages
                .write()
                .await
                .insert((project.clone(), data.stage()), data);
        }

        async fn push_history(&self, project: &ProjectId, record: QualityRecord) {
            self.history
                .write()
                .await
                .entry((project.clone(), record.stage))
                .or_default()
                .push(record);
        }
    }

    #[async_trait::async_trait]
    impl StageStore for InMemoryStageStore {
        async fn load_stage(
            &self,
            project: &ProjectId,
            stage: StageKind,
        ) -> Result<Option<StageData>, StageStoreError> {
            Ok(self
                .stages
                .read()
                .await
                .get(&(project.clone(), stage))
                .cloned())
        }

        async fn load_context(
            &self,
            project: &ProjectId,
        ) -> Result<ProjectContext, StageStoreError> {
            let mut context = ProjectContext::new(project.clone());
            for ((p, _), data) in self.stages.read().await.iter() {
                if p == project {
                    context.insert_stage(data.clone());
                }
            }
            Ok(context)
        }

        async fn quality_history(
            &self,
            project: &ProjectId,
            stage: StageKind,
        ) -> Result<Vec<QualityRecord>, StageStoreError> {
            Ok(self
                .history
                .read()
                .await
                .get(&(project.clone(), stage))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn rich_idea() -> StageData {
        StageData::new(StageKind::IdeaRefinement)
            .with_field("problem_statement", json!(words(80)))
            .with_field("pain_points", json!(["a", "b", "c", "d"]))
            .with_field("target_audience", json!(words(40)))
            .with_field("user_personas", json!(["builder", "reviewer"]))
            .with_field("value_proposition", json!(words(50)))
            .with_field("differentiators", json!(["x", "y", "z"]))
            .with_field("market_size", json!(words(20)))
            .with_field("competitors", json!(["p", "q", "r"]))
            .with_field("revenue_model", json!(words(25)))
    }

    fn advisors() -> Vec<Recommendation> {
        vec![
            Recommendation::new(SourceModel::Gpt52Codex, "event_sourcing", 0.9, "audit trail"),
            Recommendation::new(SourceModel::ClaudeSonnet45, "event_sourcing", 0.85, "fits"),
            Recommendation::new(SourceModel::Gemini3Pro, "event_sourcing", 0.7, "agree"),
        ]
    }

    #[tokio::test]
    async fn test_passing_stage_completes() {
        init_tracing();
        let store = Arc::new(InMemoryStageStore::default());
        let project = ProjectId::new("p-1");
        store.put_stage(&project, rich_idea()).await;

        let use_case = CompleteStageUseCase::new(Arc::clone(&store));
        let outcome = use_case
            .execute(CompleteStageInput::new(project, StageKind::IdeaRefinement))
            .await
            .unwrap();

        assert!(outcome.completed);
        assert_eq!(outcome.quality.gate_decision, GateDecision::Excellence);
        assert!(outcome.improvement_plan.is_none());
        assert!(outcome.architecture_consensus.is_none());
        assert!(outcome.consistency_reports.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_stage_gets_a_plan() {
        init_tracing();
        let store = Arc::new(InMemoryStageStore::default());
        let project = ProjectId::new("p-1");
        store
            .put_stage(&project, StageData::new(StageKind::IdeaRefinement))
            .await;

        let use_case = CompleteStageUseCase::new(Arc::clone(&store));
        let outcome = use_case
            .execute(CompleteStageInput::new(project, StageKind::IdeaRefinement))
            .await
            .unwrap();

        assert!(!outcome.completed);
        assert_eq!(outcome.quality.gate_decision, GateDecision::Block);
        let plan = outcome.improvement_plan.expect("blocked stage needs a plan");
        assert!(plan.total_suggestions() > 0);
    }

    #[tokio::test]
    async fn test_missing_stage_document_errors() {
        init_tracing();
        let store = Arc::new(InMemoryStageStore::default());
        let use_case = CompleteStageUseCase::new(store);

        let err = use_case
            .execute(CompleteStageInput::new("p-1", StageKind::PrdGeneration))
            .await
            .unwrap_err();
        assert!(matches!(err, CompleteStageError::StageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_technical_analysis_runs_consensus_and_validation() {
        init_tracing();
        let store = Arc::new(InMemoryStageStore::default());
        let project = ProjectId::new("p-1");
        store.put_stage(&project, rich_idea()).await;

        let tech = StageData::new(StageKind::TechnicalAnalysis)
            .with_field("architecture_pattern", json!("event sourcing ledger"))
            .with_field("architecture_rationale", json!(words(60)))
            .with_field("component_boundaries", json!(["api", "engine", "store", "ui"]))
            .with_field("technology_stack", json!(["rust", "axum", "postgres", "redis"]))
            .with_field("stack_rationale", json!(words(50)))
            .with_field("scaling_strategy", json!(words(50)))
            .with_field("capacity_estimates", json!(words(20)))
            .with_field("technical_risks", json!(["r1", "r2", "r3", "r4"]))
            .with_field("mitigations", json!(["m1", "m2", "m3", "m4"]))
            .with_field("milestones", json!(["m1", "m2", "m3", "m4"]))
            .with_field("team_skill_fit", json!(words(30)));
        store.put_stage(&project, tech).await;

        let mut stack = BTreeMap::new();
        stack.insert(
            TechnologyCategory::Database,
            vec![
                Recommendation::new(SourceModel::Gpt52Codex, "postgres", 0.9, "relational"),
                Recommendation::new(SourceModel::ClaudeSonnet45, "postgres", 0.9, "agree"),
            ],
        );

        let use_case = CompleteStageUseCase::new(Arc::clone(&store));
        let input = CompleteStageInput::new(project, StageKind::TechnicalAnalysis)
            .with_architecture_recommendations(advisors())
            .with_stack_recommendations(stack);
        let outcome = use_case.execute(input).await.unwrap();

        let consensus = outcome.architecture_consensus.expect("consensus ran");
        assert_eq!(consensus.winning_value, "event_sourcing");
        assert_eq!(consensus.consensus_strength, 1.0);

        let advice = outcome.stack_advice.expect("stack advice ran");
        assert_eq!(
            advice.get(TechnologyCategory::Database).unwrap().winning_value,
            "postgres"
        );

        // idea -> technical_analysis rules were evaluated.
        assert!(!outcome.consistency_reports.is_empty());
        assert!(outcome.gap_scan.is_some());
    }

    #[tokio::test]
    async fn test_quality_trend_uses_store_history() {
        init_tracing();
        let store = Arc::new(InMemoryStageStore::default());
        let project = ProjectId::new("p-1");
        store.put_stage(&project, rich_idea()).await;
        // Prior attempt well below what the rich document scores now.
        store
            .push_history(
                &project,
                QualityRecord::with_parts(StageKind::IdeaRefinement, 40.0, GateDecision::Block),
            )
            .await;

        let use_case = CompleteStageUseCase::new(Arc::clone(&store));
        let outcome = use_case
            .execute(CompleteStageInput::new(project, StageKind::IdeaRefinement))
            .await
            .unwrap();

        assert_eq!(outcome.quality_trend, QualityTrend::Improving);
    }
}
