//! Engine configuration with multi-source merging
//!
//! All policy constants of the engine (source trust weights, gate bands,
//! closeness thresholds, the consistency floor) are configuration, loaded
//! once at process start and handed to the engines as read-only tables.
//! Sources merge in order: built-in defaults, then an optional TOML file,
//! then `SPECSMITH_*` environment variables.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use specsmith_domain::consensus::engine::ClosenessThresholds;
use specsmith_domain::{
    ConsensusEngine, ConsistencyValidator, GateBands, QualityEngine, RuleCatalog, SourceModel,
    SourceWeights,
};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while assembling the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load engine configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Source trust weight configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Fallback weight for sources without an override
    pub default_weight: f64,
    /// Per-source overrides keyed by model identifier
    pub overrides: BTreeMap<String, f64>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert("gpt-5.2-codex".to_string(), 1.0);
        overrides.insert("claude-sonnet-4.5".to_string(), 1.0);
        overrides.insert("gemini-3-pro-preview".to_string(), 0.9);
        Self {
            default_weight: 0.85,
            overrides,
        }
    }
}

/// Gate banding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub block_margin: f64,
    pub excellence_margin: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            block_margin: 15.0,
            excellence_margin: 10.0,
        }
    }
}

/// Close-alternative thresholds per decision kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosenessConfig {
    pub single_choice: f64,
    pub category: f64,
}

impl Default for ClosenessConfig {
    fn default() -> Self {
        Self {
            single_choice: 0.10,
            category: 0.15,
        }
    }
}

/// Cross-stage validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Minimum consistency score at which a stage pair counts as consistent
    pub consistency_floor: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            consistency_floor: 0.85,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: WeightsConfig,
    pub gates: GateConfig,
    pub closeness: ClosenessConfig,
    pub consistency: ConsistencyConfig,
}

impl EngineConfig {
    /// Merge defaults, an optional TOML file, and `SPECSMITH_*` env vars.
    ///
    /// Nested keys use double underscores in the environment, e.g.
    /// `SPECSMITH_GATES__BLOCK_MARGIN=20`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("SPECSMITH_").split("__"))
            .extract()?;
        Ok(config)
    }

    // ==================== Engine factories ====================

    /// Build the read-only source weight table.
    pub fn source_weights(&self) -> SourceWeights {
        let mut weights = SourceWeights::new(self.weights.default_weight);
        for (source, weight) in &self.weights.overrides {
            let source: SourceModel = source.parse().expect("source parsing is infallible");
            weights = weights.with_weight(source, *weight);
        }
        weights
    }

    pub fn gate_bands(&self) -> GateBands {
        GateBands::default()
            .with_block_margin(self.gates.block_margin)
            .with_excellence_margin(self.gates.excellence_margin)
    }

    pub fn closeness_thresholds(&self) -> ClosenessThresholds {
        ClosenessThresholds {
            single_choice: self.closeness.single_choice,
            category: self.closeness.category,
        }
    }

    pub fn consensus_engine(&self) -> ConsensusEngine {
        ConsensusEngine::new(self.source_weights()).with_closeness(self.closeness_thresholds())
    }

    pub fn quality_engine(&self) -> QualityEngine {
        QualityEngine::new(self.gate_bands())
    }

    pub fn consistency_validator(&self) -> ConsistencyValidator {
        ConsistencyValidator::new(RuleCatalog::standard())
            .with_consistency_floor(self.consistency.consistency_floor)
    }
}
