//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::{Deserialize, Serialize};

/// Coarse quality label of an answer.
///
/// `Honest` is a deliberate refusal (out-of-domain, nothing relevant found),
/// `Error` an infrastructure failure.
///
/// # Example
/// ```
/// use answer_engine::Confidence;
/// assert_eq!(serde_json::to_string(&Confidence::Honest).unwrap(), "\"honest\"");
/// assert!(Confidence::High > Confidence::Medium);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Error,
    Honest,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Error => "error",
            Confidence::Honest => "honest",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// One contributing source of an answer.
///
/// # Example
/// ```
/// use answer_engine::SourceRef;
/// let s = SourceRef {
///     source: "ArG".into(),
///     chunk_id: "012".into(),
///     relevance_percent: "90.0%".into(),
/// };
/// let json = serde_json::to_value(&s).unwrap();
/// assert_eq!(json["chunkId"], "012");
/// assert_eq!(json["relevancePercent"], "90.0%");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub source: String,
    pub chunk_id: String,
    pub relevance_percent: String,
}

/// Final answer of one question/answer cycle.
///
/// Error and refusal paths use the same shape with empty `sources`.
///
/// # Example
/// ```
/// use answer_engine::{AnswerResult, Confidence};
/// let a = AnswerResult::bare("Keine Frage erhalten.", Confidence::Error);
/// assert!(a.sources.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub confidence: Confidence,
}

impl AnswerResult {
    /// Answer without sources (refusals, errors).
    pub fn bare(answer: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            confidence,
        }
    }
}

/// Diagnostic snapshot of the collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `healthy` when the index is connected, `unhealthy` otherwise.
    pub status: String,
    pub embedder_loaded: bool,
    pub index_connected: bool,
    pub document_count: u64,
    pub generative_reachable: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.index_connected
    }
}
