//! Prompt builder: question plus a compact, bounded statute context.

use crate::extract::ScoredSentence;

/// Role and task given to the generative model.
pub const SYSTEM_LINE: &str = "Du bist ein Rechtsexperte für die Schweiz. \
Beantworte die Frage kurz und verständlich auf Deutsch.";

/// Builds the generation prompt.
///
/// At most `max_sentences` extracted sentences (in ranking order) form the
/// context, which is cut to `max_chars` bytes on a char boundary.
///
/// # Example
/// ```
/// # use answer_engine::prompt::build_prompt;
/// let prompt = build_prompt("Was ist die Ruhezeit?", &[], 2, 800);
/// assert!(prompt.contains("Frage: Was ist die Ruhezeit?"));
/// assert!(prompt.ends_with("Antwort (2-3 Sätze):"));
/// ```
pub fn build_prompt(
    question: &str,
    sentences: &[ScoredSentence],
    max_sentences: usize,
    max_chars: usize,
) -> String {
    let context = sentences
        .iter()
        .take(max_sentences)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let context = safe_truncate(&context, max_chars);

    format!(
        "{SYSTEM_LINE}\n\nFrage: {}\n\nRechtlicher Kontext: {}\n\nAntwort (2-3 Sätze):",
        question.trim(),
        context
    )
}

/// Cuts `s` to at most `max` bytes without splitting a character.
pub fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}
