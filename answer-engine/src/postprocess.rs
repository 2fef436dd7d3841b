//! Clean-up and acceptance of raw model output.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum length (characters) of an accepted answer.
pub const MIN_ANSWER_CHARS: usize = 20;

/// Outputs starting like this restate the prompt instead of answering.
const PROMPT_ECHOES: &[&str] = &["Frage:", "Kontext:", "Rechtlicher Kontext:", "Du bist"];

/// Role labels models put in front of the answer.
const ROLE_PREFIXES: &[&str] = &[
    "antwort (2-3 sätze):",
    "antwort:",
    "assistant:",
    "assistent:",
    "ai:",
    "rechtsexperte:",
];

static PREAMBLES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(gerne|natürlich|selbstverständlich|sicher)\b[^.!:\n]*[.!:]\s*",
        r"(?i)^als rechtsexperte[^,:\n]*[,:]\s*",
        r"(?i)^(basierend auf|gemäss|gemäß|laut) (dem|den) (gegebenen |rechtlichen |obigen )?kontext[^,:\n]*[,:]\s*",
        r"(?i)^hier (ist|sind) [^:\n]*:\s*",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static BLANK_LINES: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n\s*\n+").ok());

static PARAGRAPH_SIGN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"§§?\s*").ok());

static PARAGRAPH_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bParagra(ph|f)(en)?\b").ok());

/// Strips role labels and preambles, collapses blank lines, keeps the first
/// paragraph and rewrites German citation markers (`§ 15`) to the Swiss
/// convention (`Art. 15`).
pub fn clean_generated(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    // Labels and preambles can be stacked ("Antwort: Gerne! ...").
    loop {
        let before = text.len();
        let lower = text.to_lowercase();
        if let Some(p) = ROLE_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
            text = text[p.len()..].trim_start().to_string();
        }
        for re in PREAMBLES.iter() {
            text = re.replace(&text, "").trim_start().to_string();
        }
        if text.len() == before {
            break;
        }
    }

    if let Some(re) = BLANK_LINES.as_ref() {
        text = re.replace_all(&text, "\n\n").into_owned();
    }
    let first = text.split("\n\n").next().unwrap_or_default();
    let mut text = first.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(re) = PARAGRAPH_SIGN.as_ref() {
        text = re.replace_all(&text, "Art. ").into_owned();
    }
    if let Some(re) = PARAGRAPH_WORD.as_ref() {
        text = re.replace_all(&text, "Artikel").into_owned();
    }
    capitalize_first(&text)
}

/// Cleaned answer if it is long enough and not an echo of the prompt.
pub fn accept(raw: &str) -> Option<String> {
    let text = clean_generated(raw);
    let long_enough = text.chars().count() >= MIN_ANSWER_CHARS;
    let echo = PROMPT_ECHOES.iter().any(|p| text.starts_with(p));
    (long_enough && !echo).then_some(text)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
