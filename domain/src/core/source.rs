//! Source model value object representing an advisory LLM backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Advisory model identities (Value Object)
///
/// Each decision point in the pipeline gathers structured opinions from
/// several independent model backends. `SourceModel` identifies which
/// backend produced a [`Recommendation`](crate::consensus::Recommendation).
///
/// Unknown identities are preserved via `Custom`, never rejected: new
/// backends must be able to join the advisory pool without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceModel {
    // Claude models
    ClaudeOpus45,
    ClaudeSonnet45,
    ClaudeHaiku45,
    // GPT models
    Gpt52Codex,
    Gpt52,
    Gpt5,
    // Gemini models
    Gemini3Pro,
    // Custom
    Custom(String),
}

impl SourceModel {
    /// Get the string identifier for this source
    pub fn as_str(&self) -> &str {
        match self {
            SourceModel::ClaudeOpus45 => "claude-opus-4.5",
            SourceModel::ClaudeSonnet45 => "claude-sonnet-4.5",
            SourceModel::ClaudeHaiku45 => "claude-haiku-4.5",
            SourceModel::Gpt52Codex => "gpt-5.2-codex",
            SourceModel::Gpt52 => "gpt-5.2",
            SourceModel::Gpt5 => "gpt-5",
            SourceModel::Gemini3Pro => "gemini-3-pro-preview",
            SourceModel::Custom(s) => s,
        }
    }

    /// Get a short display name (e.g., "claude-sonnet-4.5" -> "claude")
    pub fn short_name(&self) -> &str {
        self.as_str().split(['-', '_']).next().unwrap_or(self.as_str())
    }

    /// The default advisory pool for a consensus session
    pub fn default_advisors() -> Vec<SourceModel> {
        vec![
            SourceModel::Gpt52Codex,
            SourceModel::ClaudeSonnet45,
            SourceModel::Gemini3Pro,
        ]
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        matches!(
            self,
            SourceModel::ClaudeOpus45 | SourceModel::ClaudeSonnet45 | SourceModel::ClaudeHaiku45
        )
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        matches!(
            self,
            SourceModel::Gpt52Codex | SourceModel::Gpt52 | SourceModel::Gpt5
        )
    }

    /// Check if this is a Gemini model
    pub fn is_gemini(&self) -> bool {
        matches!(self, SourceModel::Gemini3Pro)
    }
}

impl std::fmt::Display for SourceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceModel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-opus-4.5" => SourceModel::ClaudeOpus45,
            "claude-sonnet-4.5" => SourceModel::ClaudeSonnet45,
            "claude-haiku-4.5" => SourceModel::ClaudeHaiku45,
            "gpt-5.2-codex" => SourceModel::Gpt52Codex,
            "gpt-5.2" => SourceModel::Gpt52,
            "gpt-5" => SourceModel::Gpt5,
            "gemini-3-pro-preview" => SourceModel::Gemini3Pro,
            other => SourceModel::Custom(other.to_string()),
        })
    }
}

impl Serialize for SourceModel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().expect("SourceModel parsing is infallible"))
    }
}
