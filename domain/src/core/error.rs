//! Domain error types

use crate::core::stage::StageKind;
use thiserror::Error;

/// Domain-level errors
///
/// The engine raises only for caller-contract violations. Everything else
/// (low consensus, missing dimension data, unknown stage pairs) is surfaced
/// as data in the result types so computation stays total over its inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No recommendations supplied for decision '{decision}'")]
    InsufficientData { decision: String },

    #[error("Malformed stage data in {stage}: field '{field}' {reason}")]
    MalformedStageData {
        stage: StageKind,
        field: String,
        reason: String,
    },
}

impl DomainError {
    /// Build an [`DomainError::InsufficientData`] for a named decision point.
    pub fn insufficient_data(decision: impl Into<String>) -> Self {
        DomainError::InsufficientData {
            decision: decision.into(),
        }
    }

    /// Build a [`DomainError::MalformedStageData`] naming the offending field.
    pub fn malformed(stage: StageKind, field: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::MalformedStageData {
            stage,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error represents missing input data
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, DomainError::InsufficientData { .. })
    }

    /// Check if this error represents a stage-data shape violation
    pub fn is_malformed(&self) -> bool {
        matches!(self, DomainError::MalformedStageData { .. })
    }
}
