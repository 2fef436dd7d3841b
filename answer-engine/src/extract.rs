//! Content extractor: statute passage text → a few clean, relevant sentences.
//!
//! Pipeline per passage: drop noise lines → expand abbreviations → strip
//! inline citation/revision noise → split into sentences → reject fragments
//! → score → keep the best. Never fails; the worst case is an empty list.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use rag_store::RetrievedPassage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::area::{DomainCatalog, LegalArea};
use crate::error::EngineError;
use crate::keywords::Tokens;

/// Lines starting with one of these are page furniture or revision notes.
const NOISE_LINE_PREFIXES: &[&str] = &[
    "---", "Seite", "BBl", "AS ", "SR ", "Fassung", "Eingefügt", "Aufgehoben",
];

/// Sentences containing one of these are citation remnants or cut text.
const FRAGMENT_MARKERS: &[&str] = &[
    "BBl", "AS ", "März 1998", "Aug. 2000", "Fassung gemäss", "in Kraft seit", "---", "Seite",
    "Ziff.", "822.11", "SR ",
];

/// Words that may legitimately follow a suspended hyphen (`Zivil- und`).
const HYPHEN_CONTINUATIONS: &[&str] = &["und", "oder", "bis", "sowie", "beziehungsweise"];

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Art.", "Artikel"),
    ("Abs.", "Absatz"),
    ("Bst.", "Buchstabe"),
    ("lit.", "Buchstabe"),
    ("z.B.", "zum Beispiel"),
    ("bzw.", "beziehungsweise"),
    ("usw.", "und so weiter"),
    ("vgl.", "vergleiche"),
    ("d.h.", "das heisst"),
    ("Nr.", "Nummer"),
    ("ca.", "circa"),
];

static INLINE_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bBBl\s+\d{4}\s+\d+(\s*[-–]\s*\d+)?",
        r"\bAS\s+\d{4}\s+\d+(\s*[-–]\s*\d+)?",
        r"\bSR\s+\d+(\.\d+)*",
        r"\(?(Fassung gemäss|Eingefügt durch|Aufgehoben durch)[^.)]*[.)]?",
        r"[Ii]n Kraft seit[^.]*\.",
        r"Seite\s+\d+(\s+von\s+\d+)?",
        r"-{3,}",
        r"[¹²³⁴⁵⁶⁷⁸⁹⁰]+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

static SUSPENDED_HYPHEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\p{L}-\s+(\p{Ll}+)").ok());

/// Strictness of the extractor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractTier {
    #[default]
    Lenient,
    Strict,
}

impl ExtractTier {
    /// Minimum sentence length in characters.
    pub fn min_chars(self) -> usize {
        match self {
            ExtractTier::Lenient => 25,
            ExtractTier::Strict => 50,
        }
    }

    pub fn min_score(self) -> u32 {
        match self {
            ExtractTier::Lenient => 2,
            ExtractTier::Strict => 10,
        }
    }

    pub fn top_n(self) -> usize {
        match self {
            ExtractTier::Lenient => 4,
            ExtractTier::Strict => 3,
        }
    }
}

impl FromStr for ExtractTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(EngineError::Config(format!("unknown extract tier '{other}'"))),
        }
    }
}

/// A candidate sentence with its relevance score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoredSentence {
    pub text: String,
    pub score: u32,
}

/// Removes boilerplate and collapses whitespace.
pub fn clean_passage(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !NOISE_LINE_PREFIXES.iter().any(|p| l.starts_with(p)))
        .collect();
    let mut text = kept.join(" ");

    for (abbr, full) in ABBREVIATIONS {
        text = text.replace(abbr, full);
    }
    for re in INLINE_NOISE.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    match WHITESPACE.as_ref() {
        Some(ws) => ws.replace_all(&text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Splits on `.`, `!` or `?` followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|n| n.is_whitespace());
        if boundary {
            let s = current.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

/// Whether a sentence is too short, cut off or citation noise.
pub fn is_fragment(sentence: &str, min_chars: usize) -> bool {
    let s = sentence.trim();
    if s.chars().count() < min_chars {
        return true;
    }
    if FRAGMENT_MARKERS.iter().any(|m| s.contains(m)) {
        return true;
    }
    if s.chars().next().is_some_and(char::is_lowercase) {
        return true;
    }
    if !s.ends_with(['.', '!', '?']) {
        return true;
    }
    let letters = s.chars().filter(|c| c.is_alphabetic()).count();
    if letters * 2 < s.chars().count() {
        return true;
    }
    if let Some(re) = SUSPENDED_HYPHEN.as_ref() {
        let broken = re.captures_iter(s).any(|cap| {
            cap.get(1)
                .is_some_and(|w| !HYPHEN_CONTINUATIONS.contains(&w.as_str()))
        });
        if broken {
            return true;
        }
    }
    false
}

/// Question words worth matching: at least 4 characters, not stop-words,
/// first occurrence only.
pub fn question_terms(question: &str, catalog: &DomainCatalog) -> Vec<String> {
    let mut seen = HashSet::new();
    Tokens::new(question)
        .words()
        .iter()
        .filter(|w| w.chars().count() >= 4)
        .filter(|w| !catalog.stop_words.iter().any(|s| s == *w))
        .filter(|w| seen.insert(w.to_string()))
        .cloned()
        .collect()
}

/// +3 per question term, +2 per domain keyword, +1 once for a normative verb.
pub fn score_sentence(
    sentence: &str,
    terms: &[String],
    vocabulary: &[&str],
    normative_verbs: &[String],
) -> u32 {
    let tokens = Tokens::new(sentence);
    let overlap = tokens.count_matches(terms) as u32;
    let domain = tokens.count_matches(vocabulary) as u32;
    let normative = tokens
        .words()
        .iter()
        .any(|w| normative_verbs.iter().any(|v| v == w));
    overlap * 3 + domain * 2 + u32::from(normative)
}

/// Extracts the top sentences for `question` from `passages`.
///
/// Passages are read in the given order; equal scores keep that order.
/// Identical sentences are counted once.
pub fn extract_sentences(
    question: &str,
    passages: &[RetrievedPassage],
    catalog: &DomainCatalog,
    area: LegalArea,
    tier: ExtractTier,
) -> Vec<ScoredSentence> {
    let terms = question_terms(question, catalog);
    let vocabulary = catalog.vocabulary(area);
    let mut seen = HashSet::new();
    let mut scored = Vec::new();
    let mut rejected = 0usize;

    for p in passages {
        for sentence in split_sentences(&clean_passage(&p.text)) {
            if is_fragment(&sentence, tier.min_chars()) {
                rejected += 1;
                continue;
            }
            if !seen.insert(sentence.clone()) {
                continue;
            }
            let score = score_sentence(&sentence, &terms, &vocabulary, &catalog.normative_verbs);
            if score >= tier.min_score() {
                scored.push(ScoredSentence {
                    text: sentence,
                    score,
                });
            }
        }
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(tier.top_n());
    debug!(
        %area,
        ?tier,
        kept = scored.len(),
        rejected,
        top_score = scored.first().map(|s| s.score),
        "sentences extracted"
    );
    scored
}
