//! Scoring primitives: source trust weights and vote combination
//!
//! A recommendation's pull on a decision is its source's configured trust
//! weight multiplied by the source's self-reported confidence. Weights are
//! process-wide read-only configuration, loaded once and shared freely.
//!
//! Unknown sources fail closed to a conservative default weight rather
//! than erroring: a new model joining the advisory pool must never break
//! consensus computation.
//!
//! # Example
//!
//! ```
//! use specsmith_domain::scoring::SourceWeights;
//! use specsmith_domain::core::source::SourceModel;
//!
//! let weights = SourceWeights::default();
//! assert_eq!(weights.weight(&SourceModel::Gpt52Codex), 1.0);
//!
//! // Unknown sources degrade to the default weight, never an error.
//! let novel = SourceModel::Custom("llama-5-local".into());
//! assert_eq!(weights.weight(&novel), 0.85);
//! assert_eq!(weights.combined_weight(&novel, 0.8), 0.85 * 0.8);
//! ```

use crate::core::source::SourceModel;
use std::collections::HashMap;

/// Conservative weight applied to sources with no configured entry.
pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.85;

/// Read-only trust weight table keyed by source identity.
#[derive(Debug, Clone)]
pub struct SourceWeights {
    weights: HashMap<SourceModel, f64>,
    default_weight: f64,
}

impl Default for SourceWeights {
    /// The standard advisory pool weighting: two flagship sources at full
    /// trust, one slightly behind, everything else at the default.
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_WEIGHT)
            .with_weight(SourceModel::Gpt52Codex, 1.0)
            .with_weight(SourceModel::ClaudeSonnet45, 1.0)
            .with_weight(SourceModel::Gemini3Pro, 0.9)
    }
}

impl SourceWeights {
    /// Create an empty table with the given fallback weight.
    pub fn new(default_weight: f64) -> Self {
        Self {
            weights: HashMap::new(),
            default_weight: default_weight.clamp(0.0, 1.0),
        }
    }

    /// Set a source's weight (builder style). Clamped to [0, 1].
    pub fn with_weight(mut self, source: SourceModel, weight: f64) -> Self {
        self.weights.insert(source, weight.clamp(0.0, 1.0));
        self
    }

    /// The fallback weight for unconfigured sources.
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Look up a source's trust weight, falling back to the default.
    pub fn weight(&self, source: &SourceModel) -> f64 {
        self.weights
            .get(source)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// A recommendation's pull on a decision: trust weight x confidence.
    pub fn combined_weight(&self, source: &SourceModel, confidence: f64) -> f64 {
        self.weight(source) * confidence.clamp(0.0, 1.0)
    }

    /// Among `sources`, the one with the single highest configured weight,
    /// if that maximum is unique.
    pub fn strongest<'a>(&self, sources: &'a [SourceModel]) -> Option<&'a SourceModel> {
        let max = sources
            .iter()
            .map(|s| self.weight(s))
            .fold(f64::NEG_INFINITY, f64::max);
        let mut at_max = sources.iter().filter(|s| self.weight(s) == max);
        let first = at_max.next()?;
        match at_max.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}
