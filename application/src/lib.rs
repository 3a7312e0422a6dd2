//! Application layer for specsmith
//!
//! This crate contains the pipeline orchestration contracts, port
//! definitions, and engine configuration. It depends only on the domain
//! layer: the HTTP surface, the document store, and the model-backend
//! transports all live elsewhere and meet this crate at its ports.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use ports::{StageStore, StageStoreError};
pub use use_cases::{
    AdviseStackInput, AdviseStackOutput, AdviseStackUseCase, CompleteStageError,
    CompleteStageInput, CompleteStageUseCase, StageCompletionOutcome,
};
