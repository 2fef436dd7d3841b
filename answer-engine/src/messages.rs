//! Fixed user-facing texts. Internal error details never reach the caller.

use crate::error::IndexFailure;

pub const EMPTY_QUESTION: &str = "Keine Frage erhalten.";

pub const EMBEDDER_UNAVAILABLE: &str =
    "Entschuldigung, es gab ein technisches Problem. Bitte versuchen Sie es erneut.";

pub const INDEX_NOT_CONNECTED: &str =
    "Die Datenbank ist momentan nicht verfügbar. Bitte versuchen Sie es später erneut.";

pub const INDEX_EMPTY: &str =
    "Die Datenbank ist leer. Bitte wenden Sie sich an den Administrator.";

pub const INDEX_COLLECTION: &str = "Datenbankfehler. Bitte versuchen Sie es später erneut.";

pub const INDEX_QUERY: &str = "Suchfehler. Bitte versuchen Sie es erneut.";

pub const NO_DOCUMENTS: &str = "Zu Ihrer Frage wurden keine relevanten Dokumente gefunden.";

pub const OUT_OF_DOMAIN: &str = "Entschuldigung, ich kann nur Fragen zum Schweizer Arbeitsrecht \
und verwandten Gesetzen beantworten. Könnten Sie eine entsprechende Frage stellen?";

pub const LOW_GROUNDING: &str = "Zu Ihrer spezifischen Frage konnte ich keine ausreichend \
relevanten Informationen finden. Versuchen Sie eine allgemeinere Formulierung oder eine \
andere Frage zum Arbeitsrecht.";

pub const UNEXPECTED: &str =
    "Es ist ein unerwarteter Fehler aufgetreten. Bitte versuchen Sie es erneut.";

/// Label introducing the source list appended to every synthesized answer.
pub const SOURCES_LABEL: &str = "Quellen";

/// Message for an index stage failure.
pub fn for_index_failure(f: IndexFailure) -> &'static str {
    match f {
        IndexFailure::NotConnected => INDEX_NOT_CONNECTED,
        IndexFailure::CollectionMissing => INDEX_COLLECTION,
        IndexFailure::EmptyCollection => INDEX_EMPTY,
        IndexFailure::QueryFailed => INDEX_QUERY,
    }
}
