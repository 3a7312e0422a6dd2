//! Stage store port
//!
//! Defines the interface to the document store that owns stage outputs and
//! the append-only quality history. The engine only ever reads through
//! this port; persisting consensus results, quality scores, and validation
//! outputs is the caller's business.

use async_trait::async_trait;
use specsmith_domain::{ProjectContext, ProjectId, QualityRecord, StageData, StageKind};
use thiserror::Error;

/// Errors that can occur during stage store operations
#[derive(Error, Debug)]
pub enum StageStoreError {
    #[error("Stage document not found: {project}/{stage}")]
    NotFound { project: ProjectId, stage: StageKind },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),
}

/// Read-only access to persisted pipeline state
///
/// Implementations (adapters) live in the infrastructure layer; the
/// orchestration use cases depend only on this trait.
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Load one stage's document, if it exists.
    async fn load_stage(
        &self,
        project: &ProjectId,
        stage: StageKind,
    ) -> Result<Option<StageData>, StageStoreError>;

    /// Load the accumulated context of all completed stages.
    async fn load_context(&self, project: &ProjectId) -> Result<ProjectContext, StageStoreError>;

    /// Load the append-only quality history for a stage, oldest first.
    async fn quality_history(
        &self,
        project: &ProjectId,
        stage: StageKind,
    ) -> Result<Vec<QualityRecord>, StageStoreError>;
}
