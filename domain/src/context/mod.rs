//! Project context: accumulated stage outputs and quality history
//!
//! Stages exchange structured documents with no schema enforcement between
//! them, so [`StageData`] wraps a JSON object and offers two families of
//! accessors:
//!
//! - **Lenient** (`text`, `list`, `number`, `has_content`): absent or
//!   wrong-shaped fields read as empty. Used by quality scoring, where a
//!   missing dimension input means a zero score, never an error.
//! - **Checked** (`checked_text`, `checked_list`, `checked_number`):
//!   a present field with the wrong shape is a caller-contract violation
//!   ([`DomainError::MalformedStageData`]). Used by consistency checks.
//!
//! [`ProjectContext`] aggregates the completed stages plus the append-only
//! quality history that feeds trend computation.
//!
//! # Example
//!
//! ```
//! use specsmith_domain::context::StageData;
//! use specsmith_domain::core::stage::StageKind;
//! use serde_json::json;
//!
//! let idea = StageData::new(StageKind::IdeaRefinement)
//!     .with_field("problem_statement", json!("Teams lose track of decisions"))
//!     .with_field("pain_points", json!(["no audit trail", "slow reviews"]));
//!
//! assert!(idea.has_content("problem_statement"));
//! assert_eq!(idea.list("pain_points").map(|l| l.len()), Some(2));
//! assert!(!idea.has_content("target_audience"));
//! ```

use crate::core::error::DomainError;
use crate::core::stage::StageKind;
use crate::quality::score::{QualityRecord, QualityTrend};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Identifies a project across the pipeline (Value Object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One pipeline stage's structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageData {
    stage: StageKind,
    fields: Map<String, Value>,
}

impl StageData {
    /// Create an empty document for a stage.
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            fields: Map::new(),
        }
    }

    /// Build a document from a JSON value, which must be an object.
    pub fn from_value(stage: StageKind, value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(fields) => Ok(Self { stage, fields }),
            other => Err(DomainError::malformed(
                stage,
                "<root>",
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
        }
    }

    /// Set a top-level field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The stage this document belongs to.
    pub fn stage(&self) -> StageKind {
        self.stage
    }

    /// Raw field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Resolve a dotted path (e.g. `"market.size_estimate"`).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    // ==================== Lenient accessors ====================

    /// Text content at `path`, if present and a string.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// List content at `path`, if present and an array.
    pub fn list(&self, path: &str) -> Option<&Vec<Value>> {
        self.lookup(path).and_then(Value::as_array)
    }

    /// Numeric content at `path`, if present and a number.
    pub fn number(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(Value::as_f64)
    }

    /// Whether `path` holds non-empty content.
    pub fn has_content(&self, path: &str) -> bool {
        match self.lookup(path) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Number(_)) | Some(Value::Bool(_)) => true,
        }
    }

    /// How much content sits at `path`: words for text, items for lists,
    /// 1 for scalars, 0 for anything absent or empty.
    pub fn content_size(&self, path: &str) -> usize {
        match self.lookup(path) {
            Some(Value::String(s)) => s.split_whitespace().count(),
            Some(Value::Array(items)) => items.len(),
            Some(Value::Number(_)) | Some(Value::Bool(_)) => 1,
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    // ==================== Checked accessors ====================

    /// Text at `path`; a present non-string value is malformed data.
    pub fn checked_text(&self, path: &str) -> Result<Option<&str>, DomainError> {
        match self.lookup(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(DomainError::malformed(
                self.stage,
                path,
                format!("expected text, got {}", json_kind(other)),
            )),
        }
    }

    /// List at `path`; a present non-array value is malformed data.
    pub fn checked_list(&self, path: &str) -> Result<Option<&Vec<Value>>, DomainError> {
        match self.lookup(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(DomainError::malformed(
                self.stage,
                path,
                format!("expected a list, got {}", json_kind(other)),
            )),
        }
    }

    /// Number at `path`; a present non-numeric value is malformed data.
    pub fn checked_number(&self, path: &str) -> Result<Option<f64>, DomainError> {
        match self.lookup(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(DomainError::malformed(
                self.stage,
                path,
                format!("expected a number, got {}", json_kind(other)),
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Accumulated outputs of all completed stages plus quality history.
///
/// Stage documents are owned by the out-of-scope document store; this type
/// is the read-side aggregate the validation engine works over. Quality
/// history is append-only: every scoring attempt is recorded, but only the
/// latest record gates a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    project: ProjectId,
    stages: BTreeMap<StageKind, StageData>,
    history: BTreeMap<StageKind, Vec<QualityRecord>>,
}

impl ProjectContext {
    pub fn new(project: ProjectId) -> Self {
        Self {
            project,
            stages: BTreeMap::new(),
            history: BTreeMap::new(),
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Insert (or replace) a completed stage's output.
    pub fn insert_stage(&mut self, data: StageData) {
        self.stages.insert(data.stage(), data);
    }

    /// Builder-style variant of [`insert_stage`](Self::insert_stage).
    pub fn with_stage(mut self, data: StageData) -> Self {
        self.insert_stage(data);
        self
    }

    pub fn stage(&self, stage: StageKind) -> Option<&StageData> {
        self.stages.get(&stage)
    }

    pub fn has_stage(&self, stage: StageKind) -> bool {
        self.stages.contains_key(&stage)
    }

    /// Completed stages in pipeline order.
    pub fn completed_stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.stages.keys().copied()
    }

    pub fn completed_count(&self) -> usize {
        self.stages.len()
    }

    /// How many of `stage`'s upstream stages are completed.
    pub fn completed_upstream_of(&self, stage: StageKind) -> usize {
        stage
            .upstream()
            .iter()
            .filter(|s| self.has_stage(**s))
            .count()
    }

    // ==================== Quality history ====================

    /// Append a scoring attempt to the stage's history.
    pub fn record_quality(&mut self, record: QualityRecord) {
        self.history.entry(record.stage).or_default().push(record);
    }

    pub fn quality_history(&self, stage: StageKind) -> &[QualityRecord] {
        self.history.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest_quality(&self, stage: StageKind) -> Option<&QualityRecord> {
        self.quality_history(stage).last()
    }

    /// Quality trend for a stage from its append-only history.
    pub fn quality_trend(&self, stage: StageKind) -> QualityTrend {
        QualityTrend::from_history(self.quality_history(stage))
    }
}
