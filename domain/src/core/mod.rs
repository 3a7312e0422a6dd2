//! Core domain concepts shared across all subdomains.
//!
//! - [`source::SourceModel`]: advisory model identities (Claude, GPT, Gemini, etc.)
//! - [`stage::StageKind`]: the five pipeline stages and their ordering
//! - [`stage::ComplexityTier`]: project complexity classification
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod source;
pub mod stage;
