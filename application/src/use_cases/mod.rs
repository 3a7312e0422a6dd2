//! Use cases: the orchestration contracts over the domain engines.

pub mod advise_stack;
pub mod complete_stage;

pub use advise_stack::{AdviseStackInput, AdviseStackOutput, AdviseStackUseCase};
pub use complete_stage::{
    CompleteStageError, CompleteStageInput, CompleteStageUseCase, StageCompletionOutcome,
};
