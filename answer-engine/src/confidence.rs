//! Confidence tiers and per-source relevance.

use std::collections::HashSet;

use rag_store::RetrievedPassage;

use crate::api_types::{Confidence, SourceRef};

/// Best distance below which a generated answer is `high`.
pub const HIGH_BELOW: f32 = 1.0;
/// Best distance below which any answer is at least `medium`.
pub const MEDIUM_BELOW: f32 = 1.2;

/// At most this many sources are listed per answer.
pub const MAX_SOURCES: usize = 3;

/// Tier of a successfully produced answer.
///
/// Smaller distances never yield a lower tier; a generated answer never
/// scores below a template answer at the same distance.
pub fn score_confidence(generated: bool, best_distance: f32) -> Confidence {
    if generated && best_distance < HIGH_BELOW {
        Confidence::High
    } else if best_distance < MEDIUM_BELOW {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Inverse-distance relevance in percent, clipped to `[65, 95]`.
pub fn relevance_percent(distance: f32) -> f32 {
    ((1.0 - distance / 4.0) * 100.0).clamp(65.0, 95.0)
}

/// Source list of an answer: ascending distance, unique by
/// `(source, chunkId)`, at most [`MAX_SOURCES`].
pub fn source_refs(passages: &[RetrievedPassage]) -> Vec<SourceRef> {
    let mut sorted: Vec<&RetrievedPassage> = passages.iter().collect();
    sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|p| seen.insert(&p.metadata))
        .take(MAX_SOURCES)
        .map(|p| SourceRef {
            source: p.metadata.source.clone(),
            chunk_id: p.metadata.chunk_id.clone(),
            relevance_percent: format!("{:.1}%", relevance_percent(p.distance)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_distance_and_generation() {
        assert_eq!(score_confidence(true, 0.4), Confidence::High);
        assert_eq!(score_confidence(false, 0.4), Confidence::Medium);
        assert_eq!(score_confidence(true, 1.1), Confidence::Medium);
        assert_eq!(score_confidence(true, 1.4), Confidence::Low);
    }

    #[test]
    fn smaller_distance_never_scores_lower() {
        let ds: Vec<f32> = (0..=80).map(|i| i as f32 * 0.05).collect();
        for generated in [true, false] {
            for w in ds.windows(2) {
                assert!(score_confidence(generated, w[0]) >= score_confidence(generated, w[1]));
            }
        }
        for d in ds {
            assert!(score_confidence(true, d) >= score_confidence(false, d));
        }
    }

    #[test]
    fn relevance_is_clipped() {
        assert_eq!(relevance_percent(0.0), 95.0);
        assert_eq!(relevance_percent(4.0), 65.0);
        assert!((relevance_percent(0.8) - 80.0).abs() < 1e-4);
    }

    #[test]
    fn sources_are_unique_sorted_and_capped() {
        let ps = vec![
            RetrievedPassage::new("a", 0.9, "OR", "7"),
            RetrievedPassage::new("b", 0.2, "ArG", "15"),
            RetrievedPassage::new("c", 0.3, "ArG", "15"),
            RetrievedPassage::new("d", 0.4, "ArG", "16"),
            RetrievedPassage::new("e", 1.0, "ZGB", "1"),
        ];
        let refs = source_refs(&ps);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].source, "ArG");
        assert_eq!(refs[0].chunk_id, "15");
        assert_eq!(refs[0].relevance_percent, "95.0%");
        assert_eq!(refs[1].chunk_id, "16");
        assert_eq!(refs[2].source, "OR");
        assert_eq!(refs[2].relevance_percent, "77.5%");
    }
}
