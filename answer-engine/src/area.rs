//! Legal areas and the keyword/template catalog driving classification,
//! gating, extraction and fallback phrasing.
//!
//! The built-in catalog can be replaced by a JSON file with the same shape
//! (see [`DomainCatalog::load`]).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::keywords::Tokens;

/// Subject area of a question.
///
/// Declaration order is the tie-break order of the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegalArea {
    LaborLaw,
    InsuranceLaw,
    CriminalLaw,
    CivilLaw,
    FamilyLaw,
    TrafficLaw,
    DataProtectionLaw,
    General,
}

impl LegalArea {
    /// Classifiable areas in tie-break order (without `General`).
    pub const SPECIFIC: [LegalArea; 7] = [
        LegalArea::LaborLaw,
        LegalArea::InsuranceLaw,
        LegalArea::CriminalLaw,
        LegalArea::CivilLaw,
        LegalArea::FamilyLaw,
        LegalArea::TrafficLaw,
        LegalArea::DataProtectionLaw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LegalArea::LaborLaw => "labor-law",
            LegalArea::InsuranceLaw => "insurance-law",
            LegalArea::CriminalLaw => "criminal-law",
            LegalArea::CivilLaw => "civil-law",
            LegalArea::FamilyLaw => "family-law",
            LegalArea::TrafficLaw => "traffic-law",
            LegalArea::DataProtectionLaw => "data-protection-law",
            LegalArea::General => "general",
        }
    }
}

impl std::fmt::Display for LegalArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords, preferred sources and phrasing of one area.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaProfile {
    pub area: LegalArea,
    /// Strong indicators (weight `primary_weight`).
    pub primary: Vec<String>,
    /// Weak indicators (weight `secondary_weight`).
    pub secondary: Vec<String>,
    /// Statute abbreviations whose passages get the filter bonus.
    pub preferred_sources: Vec<String>,
    /// Opening of a fallback answer built around an extracted sentence.
    pub lead: String,
    /// Name of the body of law, used in the generic fallback.
    pub law_name: String,
}

/// Canned answer for a recurring question, selected by keyword match.
///
/// Matches when the question contains any of `when_any` and, if
/// `and_any` is non-empty, also any of `and_any`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopicTemplate {
    pub area: LegalArea,
    pub when_any: Vec<String>,
    #[serde(default)]
    pub and_any: Vec<String>,
    pub text: String,
}

/// All tunable vocabulary of the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainCatalog {
    pub primary_weight: u32,
    pub secondary_weight: u32,
    /// Minimum score for a specific area; below it the question is `General`.
    pub activation: u32,
    pub areas: Vec<AreaProfile>,
    /// In-domain terms checked by the relevance gate (besides area keywords).
    pub legal_keywords: Vec<String>,
    /// Terms that make a question out-of-domain.
    pub out_of_domain: Vec<String>,
    /// Modal/obligation verbs marking normative sentences.
    pub normative_verbs: Vec<String>,
    /// Question words ignored when scoring sentence overlap.
    pub stop_words: Vec<String>,
    /// Ordered; the first match wins.
    pub topic_templates: Vec<TopicTemplate>,
    /// Appended after the extracted sentence of an area lead.
    pub lead_closing: String,
    /// Generic answer; `{law}` is replaced by the area's `law_name`.
    pub generic_template: String,
}

impl DomainCatalog {
    /// Reads a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns [`EngineError::Catalog`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Catalog(format!("{}: {e}", path.display())))?;
        let cat: DomainCatalog = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Catalog(format!("{}: {e}", path.display())))?;
        cat.validate()?;
        info!(path = %path.display(), areas = cat.areas.len(), "domain catalog loaded");
        Ok(cat)
    }

    /// Built-in catalog, or the file at `path` when given.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.primary_weight == 0 || self.activation == 0 {
            return Err(EngineError::Catalog(
                "weights and activation must be > 0".into(),
            ));
        }
        if self.areas.iter().any(|a| a.area == LegalArea::General) {
            return Err(EngineError::Catalog(
                "`general` is the fallback area and has no profile".into(),
            ));
        }
        Ok(())
    }

    pub fn profile(&self, area: LegalArea) -> Option<&AreaProfile> {
        self.areas.iter().find(|p| p.area == area)
    }

    /// Keywords used to score sentences for `area`. `General` uses the
    /// in-domain list of the gate.
    pub fn vocabulary(&self, area: LegalArea) -> Vec<&str> {
        match self.profile(area) {
            Some(p) => p
                .primary
                .iter()
                .chain(p.secondary.iter())
                .map(String::as_str)
                .collect(),
            None => self.legal_keywords.iter().map(String::as_str).collect(),
        }
    }

    /// Picks exactly one area for a question.
    ///
    /// Each area scores `primary_weight` per primary match plus
    /// `secondary_weight` per secondary match. The best area wins if it
    /// reaches `activation`; ties go to the area declared first in
    /// [`LegalArea`].
    pub fn classify(&self, question: &str) -> LegalArea {
        let tokens = Tokens::new(question);
        let mut best = (LegalArea::General, 0u32);

        for area in LegalArea::SPECIFIC {
            let Some(p) = self.profile(area) else { continue };
            let score = self.primary_weight * tokens.count_matches(&p.primary) as u32
                + self.secondary_weight * tokens.count_matches(&p.secondary) as u32;
            if score > best.1 {
                best = (area, score);
            }
        }

        let area = if best.1 >= self.activation {
            best.0
        } else {
            LegalArea::General
        };
        debug!(%area, score = best.1, "question classified");
        area
    }

    /// Whether the passage source is one of the area's preferred statutes.
    ///
    /// Compares the tokens of `source` (split on non-alphanumerics) with the
    /// abbreviations, ignoring case, so `822.11_ArG` counts as `ArG`.
    pub fn is_preferred_source(&self, area: LegalArea, source: &str) -> bool {
        let Some(p) = self.profile(area) else {
            return false;
        };
        let lower = source.to_lowercase();
        let parts: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect();
        p.preferred_sources
            .iter()
            .any(|pref| parts.contains(&pref.to_lowercase().as_str()))
    }

    /// All in-domain terms: the gate list plus every area keyword.
    pub fn in_domain_terms(&self) -> impl Iterator<Item = &str> {
        self.legal_keywords.iter().map(String::as_str).chain(
            self.areas
                .iter()
                .flat_map(|a| a.primary.iter().chain(a.secondary.iter()))
                .map(String::as_str),
        )
    }

    /// Built-in catalog for Swiss and German statutes.
    pub fn builtin() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        fn profile(
            area: LegalArea,
            primary: &[&str],
            secondary: &[&str],
            preferred: &[&str],
            lead: &str,
            law_name: &str,
        ) -> AreaProfile {
            AreaProfile {
                area,
                primary: words(primary),
                secondary: words(secondary),
                preferred_sources: words(preferred),
                lead: lead.into(),
                law_name: law_name.into(),
            }
        }
        fn topic(area: LegalArea, when_any: &[&str], and_any: &[&str], text: &str) -> TopicTemplate {
            TopicTemplate {
                area,
                when_any: words(when_any),
                and_any: words(and_any),
                text: text.into(),
            }
        }

        let areas = vec![
            profile(
                LegalArea::LaborLaw,
                &[
                    "arbeitszeit", "arbeitsrecht", "ruhezeit", "nachtarbeit", "überstunden",
                    "arbeitnehmer", "arbeitgeber", "arbeitsvertrag", "kündigung", "ferien",
                    "sonntagsarbeit", "schichtarbeit", "lohn",
                ],
                &[
                    "arbeit", "pause", "urlaub", "gehalt", "schicht", "stunden", "probezeit",
                    "zeugnis", "betrieb", "nacht",
                ],
                &["ArG", "ArGV1", "ArGV", "OR"],
                "Gemäss dem Schweizer Arbeitsrecht:",
                "Schweizer Arbeitsrecht",
            ),
            profile(
                LegalArea::InsuranceLaw,
                &[
                    "versicherung", "krankenkasse", "unfallversicherung", "ahv", "rente",
                    "invalidenversicherung", "prämie", "franchise", "taggeld",
                ],
                &["unfall", "krankheit", "leistung", "selbstbehalt", "police", "versichert"],
                &["VVG", "KVG", "UVG", "AHVG", "IVG"],
                "Gemäss dem Schweizer Versicherungsrecht:",
                "Schweizer Versicherungsrecht",
            ),
            profile(
                LegalArea::CriminalLaw,
                &[
                    "strafe", "straftat", "strafrecht", "diebstahl", "betrug", "körperverletzung",
                    "strafbar", "anzeige", "freiheitsstrafe",
                ],
                &["polizei", "gericht", "busse", "täter", "opfer", "verhaftung"],
                &["StGB", "StPO", "JStG"],
                "Gemäss dem Schweizer Strafrecht:",
                "Schweizer Strafrecht",
            ),
            profile(
                LegalArea::CivilLaw,
                &[
                    "mietvertrag", "miete", "kaufvertrag", "schadenersatz", "haftung", "eigentum",
                    "obligation", "vertragsrecht", "mietzins",
                ],
                &["vertrag", "vermieter", "mieter", "kauf", "mangel", "frist", "zins"],
                &["OR", "ZGB"],
                "Gemäss dem Schweizer Zivil- und Obligationenrecht:",
                "Schweizer Zivil- und Obligationenrecht",
            ),
            profile(
                LegalArea::FamilyLaw,
                &[
                    "scheidung", "ehe", "eheschliessung", "ehevertrag", "unterhalt", "sorgerecht",
                    "erbrecht", "erbe", "adoption", "kindesunterhalt", "güterrecht",
                ],
                &["kind", "kinder", "ehepartner", "familie", "testament", "vormund"],
                &["ZGB"],
                "Gemäss dem Schweizer Familien- und Erbrecht:",
                "Schweizer Familien- und Erbrecht",
            ),
            profile(
                LegalArea::TrafficLaw,
                &[
                    "strassenverkehr", "verkehrsregel", "führerausweis", "geschwindigkeit",
                    "parkieren", "alkohol am steuer", "verkehrsunfall", "radar",
                ],
                &["auto", "fahrzeug", "velo", "strasse", "fahren", "parkplatz", "tempo"],
                &["SVG", "VRV", "VZV"],
                "Gemäss dem Schweizer Strassenverkehrsrecht:",
                "Schweizer Strassenverkehrsrecht",
            ),
            profile(
                LegalArea::DataProtectionLaw,
                &[
                    "datenschutz", "personendaten", "datenbearbeitung", "auskunftsrecht",
                    "datensicherheit", "überwachung",
                ],
                &["daten", "privatsphäre", "einwilligung", "video", "speicherung", "löschung"],
                &["DSG", "DSV"],
                "Gemäss dem Schweizer Datenschutzrecht:",
                "Schweizer Datenschutzrecht",
            ),
        ];

        let topic_templates = vec![
            topic(
                LegalArea::LaborLaw,
                &["ruhezeit", "ruhe", "pause"],
                &["nachtarbeit", "nacht"],
                "Bei Nachtarbeit in der Schweiz gelten besondere Ruhezeiten. Zwischen zwei \
                 Arbeitsperioden müssen mindestens 11 zusammenhängende Stunden Ruhe liegen. \
                 Zusätzlich haben Nachtarbeiter Anspruch auf verlängerte Erholungszeiten.",
            ),
            topic(
                LegalArea::LaborLaw,
                &["ruhezeit"],
                &[],
                "Die tägliche Ruhezeit beträgt in der Schweiz mindestens 11 zusammenhängende \
                 Stunden. Diese Zeit darf nur in Ausnahmefällen verkürzt werden.",
            ),
            topic(
                LegalArea::LaborLaw,
                &["nachtarbeit", "nachts", "nacht"],
                &["stunden", "lange", "dauer"],
                "Nachtarbeit in der Schweiz darf grundsätzlich 9 Stunden täglich nicht \
                 überschreiten. Bei vorübergehender Nachtarbeit sind unter bestimmten \
                 Bedingungen bis zu 10 Stunden möglich.",
            ),
            topic(
                LegalArea::LaborLaw,
                &["nachtarbeit"],
                &[],
                "Nachtarbeit ist in der Schweiz grundsätzlich beschränkt und erfordert die \
                 Zustimmung des Arbeitnehmers. Es gelten besondere Schutzbestimmungen und \
                 Zuschläge.",
            ),
        ];

        Self {
            primary_weight: 10,
            secondary_weight: 3,
            activation: 7,
            areas,
            legal_keywords: words(&[
                "arbeitszeit", "arbeitsrecht", "gesetz", "recht", "vertrag", "arbeit", "lohn",
                "gehalt", "urlaub", "kündigung", "pause", "ruhezeit", "nachtarbeit",
                "überstunden", "schicht", "arbeitgeber", "arbeitnehmer", "legal", "erlaubt",
                "verboten", "bestimmung", "regelung", "artikel", "pflicht", "anspruch",
            ]),
            out_of_domain: words(&[
                "redbull", "coca cola", "pepsi", "fussball", "lieblings", "videospiel", "musik",
                "kochen", "wetter",
            ]),
            normative_verbs: words(&[
                "darf", "dürfen", "muss", "müssen", "kann", "können", "wird", "haben", "gelten",
                "gilt", "ist", "sind", "berechtigt", "verpflichtet", "bestimmt", "regelt",
                "vorgesehen",
            ]),
            stop_words: words(&[
                "wann", "warum", "welche", "welcher", "welches", "wieviel", "wieviele", "viele",
                "eine", "einen", "einem", "einer", "eines", "oder", "aber", "auch", "noch",
                "nicht", "kein", "keine", "mein", "meine", "meinen", "dein", "deine", "ihre",
                "ihrer", "sich", "sein", "seine", "dass", "diese", "dieser", "dieses", "wird",
                "werden", "darf", "muss", "kann", "haben", "habe", "gibt", "für", "über", "unter",
                "nach", "beim", "schweiz", "schweizer", "bitte",
            ]),
            topic_templates,
            lead_closing: "Diese Bestimmungen sind verbindlich einzuhalten.".into(),
            generic_template: "Zu Ihrer Frage finden sich spezifische Regelungen im {law}. Für \
                               eine detaillierte Auskunft empfehle ich Ihnen, die entsprechenden \
                               Gesetzesartikel zu konsultieren."
                .into(),
        }
    }
}

impl Default for DomainCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat() -> DomainCatalog {
        DomainCatalog::builtin()
    }

    #[test]
    fn classifies_labor_questions() {
        assert_eq!(cat().classify("Was ist die tägliche Ruhezeit?"), LegalArea::LaborLaw);
        assert_eq!(
            cat().classify("Wie viele Überstunden darf mein Arbeitgeber verlangen?"),
            LegalArea::LaborLaw
        );
    }

    #[test]
    fn classifies_other_areas() {
        assert_eq!(cat().classify("Wann zahlt die Krankenkasse?"), LegalArea::InsuranceLaw);
        assert_eq!(cat().classify("Ist Diebstahl strafbar?"), LegalArea::CriminalLaw);
        assert_eq!(
            cat().classify("Wer bekommt das Sorgerecht nach der Scheidung?"),
            LegalArea::FamilyLaw
        );
        assert_eq!(
            cat().classify("Was regelt das DSG bei Personendaten?"),
            LegalArea::DataProtectionLaw
        );
    }

    #[test]
    fn weak_signals_stay_general() {
        // Two secondary hits (6) stay below the activation of 7.
        assert_eq!(cat().classify("Mein Kind und die Familie"), LegalArea::General);
        assert_eq!(cat().classify("Hallo, wie geht es?"), LegalArea::General);
    }

    #[test]
    fn ties_go_to_the_first_declared_area() {
        let mut c = cat();
        for p in &mut c.areas {
            p.primary = vec!["gemeinsam".into()];
            p.secondary.clear();
        }
        assert_eq!(c.classify("gemeinsam"), LegalArea::LaborLaw);

        // Removing the earlier profile hands the tie to the next one.
        c.areas.retain(|p| p.area != LegalArea::LaborLaw);
        assert_eq!(c.classify("gemeinsam"), LegalArea::InsuranceLaw);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = cat();
        let q = "Kündigung während der Probezeit wegen Krankheit";
        let first = c.classify(q);
        for _ in 0..10 {
            assert_eq!(c.classify(q), first);
        }
    }

    #[test]
    fn preferred_sources_match_statute_tokens() {
        let c = cat();
        assert!(c.is_preferred_source(LegalArea::LaborLaw, "ArG"));
        assert!(c.is_preferred_source(LegalArea::LaborLaw, "822.11_arg"));
        assert!(!c.is_preferred_source(LegalArea::LaborLaw, "Argentinien"));
        assert!(!c.is_preferred_source(LegalArea::General, "ArG"));
    }

    #[test]
    fn catalog_round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut c = cat();
        c.activation = 20;
        std::fs::write(&path, serde_json::to_string(&c).unwrap()).unwrap();

        let loaded = DomainCatalog::load(&path).unwrap();
        assert_eq!(loaded.activation, 20);
        // One primary hit (10) no longer activates an area.
        assert_eq!(loaded.classify("Was ist die Ruhezeit?"), LegalArea::General);
    }

    #[test]
    fn short_words_do_not_trigger_family_law() {
        assert_eq!(cat().classify("Ist das eher erlaubt?"), LegalArea::General);
        assert_eq!(cat().classify("Was gilt bei der Ehe?"), LegalArea::FamilyLaw);
        assert_eq!(cat().classify("Brauchen wir einen Ehevertrag?"), LegalArea::FamilyLaw);
    }

    #[test]
    fn no_legal_keyword_contains_an_off_topic_stem() {
        let c = cat();
        let legal = c
            .areas
            .iter()
            .flat_map(|p| p.primary.iter().chain(&p.secondary))
            .chain(&c.legal_keywords);
        for kw in legal {
            let t = Tokens::new(kw);
            for off in &c.out_of_domain {
                assert!(!t.matches(off), "{kw:?} trips off-topic stem {off:?}");
            }
        }
    }

    #[test]
    fn rejects_general_profile() {
        let mut c = cat();
        c.areas[0].area = LegalArea::General;
        assert!(matches!(c.validate(), Err(EngineError::Catalog(_))));
    }
}
