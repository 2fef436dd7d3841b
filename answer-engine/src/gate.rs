//! Relevance gate: decides whether a question is in-domain before any
//! filtering, extraction or generation work is spent on it.

use tracing::debug;

use crate::area::DomainCatalog;
use crate::keywords::Tokens;

/// Gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    /// Nothing was retrieved.
    NoPassages,
    /// An out-of-domain term occurs in the question.
    OutOfDomain,
    /// No in-domain term and the best passage is too far away.
    TooDistant,
}

impl GateVerdict {
    pub fn passed(self) -> bool {
        self == GateVerdict::Pass
    }
}

/// Applies the gate.
///
/// `best_distance` is `None` when the index returned zero passages, which
/// rejects unconditionally.
pub fn check_relevance(
    catalog: &DomainCatalog,
    question: &str,
    best_distance: Option<f32>,
    max_distance: f32,
) -> GateVerdict {
    let Some(best) = best_distance else {
        return GateVerdict::NoPassages;
    };
    let tokens = Tokens::new(question);

    let verdict = if tokens.matches_any(&catalog.out_of_domain) {
        GateVerdict::OutOfDomain
    } else if !catalog.in_domain_terms().any(|k| tokens.matches(k)) && best > max_distance {
        GateVerdict::TooDistant
    } else {
        GateVerdict::Pass
    };
    debug!(?verdict, best_distance = best, max_distance, "relevance gate");
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::LegalArea;

    fn check(q: &str, best: Option<f32>) -> GateVerdict {
        check_relevance(&DomainCatalog::builtin(), q, best, 1.5)
    }

    #[test]
    fn zero_passages_always_reject() {
        assert_eq!(
            check("Was ist die tägliche Ruhezeit?", None),
            GateVerdict::NoPassages
        );
    }

    #[test]
    fn legal_questions_with_everyday_words_pass() {
        let c = DomainCatalog::builtin();
        for (q, area) in [
            ("Zahlt die Krankenkasse das Rezept für Physiotherapie?", LegalArea::InsuranceLaw),
            ("Darf mein Arbeitgeber mich am Arbeitsplatz filmen?", LegalArea::LaborLaw),
            ("Darf der Arbeitgeber meinen Computer überwachen?", LegalArea::LaborLaw),
            ("Darf der Arbeitgeber mein Handy kontrollieren?", LegalArea::LaborLaw),
        ] {
            assert_eq!(c.classify(q), area, "{q}");
            assert_eq!(check(q, Some(0.3)), GateVerdict::Pass, "{q}");
        }
    }

    #[test]
    fn out_of_domain_terms_reject_even_when_close() {
        assert_eq!(
            check("Welches ist dein Lieblingsfussballverein?", Some(0.2)),
            GateVerdict::OutOfDomain
        );
        assert_eq!(
            check("Darf ich bei der Arbeit Coca Cola trinken?", Some(0.5)),
            GateVerdict::OutOfDomain
        );
    }

    #[test]
    fn legal_terms_pass_regardless_of_distance() {
        assert_eq!(check("Was ist die tägliche Ruhezeit?", Some(3.0)), GateVerdict::Pass);
    }

    #[test]
    fn unknown_terms_pass_only_when_close() {
        assert_eq!(check("Wie ist das geregelt?", Some(1.2)), GateVerdict::Pass);
        assert_eq!(check("Wie ist das geregelt?", Some(1.6)), GateVerdict::TooDistant);
        // The ceiling itself still passes.
        assert_eq!(check("Wie ist das geregelt?", Some(1.5)), GateVerdict::Pass);
    }

    #[test]
    fn area_keywords_count_as_in_domain() {
        assert_eq!(check("Zahlt die Krankenkasse?", Some(2.5)), GateVerdict::Pass);
    }
}
