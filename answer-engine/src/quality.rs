//! Answer-quality monitor: one JSONL entry per answered question, plus
//! a summary report and improvement hints over the collected entries.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rag_store::RetrievedPassage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api_types::{AnswerResult, Confidence};

/// Best distance recorded when nothing was retrieved.
pub const NO_RESULT_DISTANCE: f32 = 99.0;

static NUMBERS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());
static LEGAL_TERMS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(artikel|absatz|bestimmt|regelt|darf|muss)\b").ok());

/// One logged question/answer cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityEntry {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub question_length: usize,
    pub num_results: usize,
    pub best_distance: f32,
    pub avg_distance: f32,
    pub answer_length: usize,
    pub confidence: Confidence,
    pub sources_count: usize,
    pub has_specific_numbers: bool,
    pub has_legal_terms: bool,
    pub full_answer: String,
    pub sources: Vec<String>,
}

impl QualityEntry {
    /// Builds an entry from the retrieved passages and the final result.
    pub fn new(question: &str, retrieved: &[RetrievedPassage], result: &AnswerResult) -> Self {
        let distances: Vec<f32> = retrieved.iter().map(|p| p.distance).collect();
        let best = distances
            .iter()
            .copied()
            .min_by(f32::total_cmp)
            .unwrap_or(NO_RESULT_DISTANCE);
        let avg = if distances.is_empty() {
            NO_RESULT_DISTANCE
        } else {
            distances.iter().sum::<f32>() / distances.len() as f32
        };
        let answer = &result.answer;

        Self {
            timestamp: Utc::now(),
            question: question.to_string(),
            question_length: question.chars().count(),
            num_results: retrieved.len(),
            best_distance: best,
            avg_distance: avg,
            answer_length: answer.chars().count(),
            confidence: result.confidence,
            sources_count: result.sources.len(),
            has_specific_numbers: NUMBERS.as_ref().is_some_and(|re| re.is_match(answer)),
            has_legal_terms: LEGAL_TERMS.as_ref().is_some_and(|re| re.is_match(answer)),
            full_answer: answer.clone(),
            sources: result.sources.iter().map(|s| s.source.clone()).collect(),
        }
    }
}

/// Append-only JSONL log.
#[derive(Debug)]
pub struct QualityLog {
    path: PathBuf,
    write: Mutex<()>,
}

impl QualityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry, creating parent directories as needed.
    pub async fn record(&self, entry: &QualityEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        f.write_all(line.as_bytes()).await?;
        f.flush().await?;
        debug!(path = %self.path.display(), "quality entry written");
        Ok(())
    }

    /// Reads all entries. A missing file is an empty log; broken lines are
    /// skipped.
    pub async fn load(&self) -> std::io::Result<Vec<QualityEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut out = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QualityEntry>(line) {
                Ok(e) => out.push(e),
                Err(e) => warn!(line = i + 1, error = %e, "skipping broken quality entry"),
            }
        }
        Ok(out)
    }
}

/// Count and share of one confidence tier.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierShare {
    pub confidence: Confidence,
    pub count: usize,
    pub percent: f32,
}

/// Distance statistics over entries that retrieved something.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceStats {
    pub average: f32,
    pub best: f32,
    pub worst: f32,
}

/// Short view of a weak answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    pub question: String,
    pub confidence: Confidence,
    pub best_distance: f32,
}

/// Summary over the log.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub total: usize,
    pub confidence: Vec<TierShare>,
    pub distances: Option<DistanceStats>,
    pub with_numbers: usize,
    pub with_numbers_percent: f32,
    pub with_legal_terms: usize,
    pub with_legal_terms_percent: f32,
    pub recent_issues: Vec<QualityIssue>,
    pub suggestions: Vec<String>,
}

/// Builds the report. Distance statistics ignore entries without results.
pub fn analyze(entries: &[QualityEntry]) -> QualityReport {
    let total = entries.len();
    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f32 * 100.0 / total as f32
        }
    };

    let confidence = [
        Confidence::High,
        Confidence::Medium,
        Confidence::Low,
        Confidence::Honest,
        Confidence::Error,
    ]
    .into_iter()
    .map(|c| {
        let count = entries.iter().filter(|e| e.confidence == c).count();
        TierShare {
            confidence: c,
            count,
            percent: pct(count),
        }
    })
    .filter(|t| t.count > 0)
    .collect();

    let ds: Vec<f32> = entries
        .iter()
        .map(|e| e.best_distance)
        .filter(|d| *d < 90.0)
        .collect();
    let distances = (!ds.is_empty()).then(|| DistanceStats {
        average: ds.iter().sum::<f32>() / ds.len() as f32,
        best: ds.iter().copied().fold(f32::INFINITY, f32::min),
        worst: ds.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    });

    let with_numbers = entries.iter().filter(|e| e.has_specific_numbers).count();
    let with_legal_terms = entries.iter().filter(|e| e.has_legal_terms).count();

    let recent_issues = entries
        .iter()
        .skip(total.saturating_sub(5))
        .filter(|e| matches!(e.confidence, Confidence::Low | Confidence::Honest))
        .take(2)
        .map(|e| QualityIssue {
            question: e.question.clone(),
            confidence: e.confidence,
            best_distance: e.best_distance,
        })
        .collect();

    let mut report = QualityReport {
        total,
        confidence,
        distances,
        with_numbers,
        with_numbers_percent: pct(with_numbers),
        with_legal_terms,
        with_legal_terms_percent: pct(with_legal_terms),
        recent_issues,
        suggestions: Vec::new(),
    };
    report.suggestions = suggestions(entries);
    report
}

/// Improvement hints for the collected entries.
pub fn suggestions(entries: &[QualityEntry]) -> Vec<String> {
    if entries.len() < 3 {
        return vec!["Collect more test data for analysis".to_string()];
    }
    let n = entries.len() as f32;
    let mut out = Vec::new();

    let avg_best = entries.iter().map(|e| e.best_distance).sum::<f32>() / n;
    if avg_best > 1.5 {
        out.push(
            "High average distance - check the embedding model and chunking strategy".to_string(),
        );
    }
    let high = entries
        .iter()
        .filter(|e| e.confidence == Confidence::High)
        .count() as f32;
    if high / n < 0.3 {
        out.push("Few high-confidence answers - consider adjusting the thresholds".to_string());
    }
    let legal = entries.iter().filter(|e| e.has_legal_terms).count() as f32;
    if legal / n < 0.5 {
        out.push("Few answers use legal terms - improve content extraction".to_string());
    }
    if out.is_empty() {
        out.push("Quality looks good - continue monitoring".to_string());
    }
    out
}
