//! Deterministic template answers and the source suffix.

use crate::api_types::SourceRef;
use crate::area::{DomainCatalog, LegalArea};
use crate::extract::ScoredSentence;
use crate::keywords::Tokens;
use crate::messages::SOURCES_LABEL;

/// Longest excerpt of an extracted sentence quoted in a template answer.
pub const EXCERPT_CHARS: usize = 200;

const GENERAL_LEAD: &str = "Gemäss dem Schweizer Recht:";
const GENERAL_LAW: &str = "Schweizer Recht";

/// Builds the fallback answer for `question`.
///
/// 1. a topic template of the area whose keywords match, followed by the
///    best sentence when there is one;
/// 2. otherwise the area lead with the best sentence;
/// 3. otherwise the generic "consult the statute" answer.
pub fn template_answer(
    catalog: &DomainCatalog,
    area: LegalArea,
    question: &str,
    best: Option<&ScoredSentence>,
) -> String {
    let tokens = Tokens::new(question);
    let excerpt = best.map(|s| truncate_chars(&s.text, EXCERPT_CHARS));

    let topic = catalog.topic_templates.iter().find(|t| {
        t.area == area
            && tokens.matches_any(&t.when_any)
            && (t.and_any.is_empty() || tokens.matches_any(&t.and_any))
    });
    let profile = catalog.profile(area);

    match (topic, excerpt) {
        (Some(t), Some(ex)) => format!("{} Im Gesetzestext heisst es: {ex}", t.text),
        (Some(t), None) => t.text.clone(),
        (None, Some(ex)) => {
            let lead = profile.map_or(GENERAL_LEAD, |p| p.lead.as_str());
            format!("{lead} {ex} {}", catalog.lead_closing)
        }
        (None, None) => {
            let law = profile.map_or(GENERAL_LAW, |p| p.law_name.as_str());
            catalog.generic_template.replace("{law}", law)
        }
    }
}

/// Appends `"\n\nQuellen: A, B"` naming the distinct statutes of `sources`
/// in list order, so the suffix never names a source the list leaves out.
pub fn with_sources_suffix(answer: &str, sources: &[SourceRef]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for r in sources {
        let s = r.source.as_str();
        if !names.contains(&s) {
            names.push(s);
        }
    }
    format!("{answer}\n\n{SOURCES_LABEL}: {}", names.join(", "))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
