//! Result filter with a threshold that adapts to the best match.

use rag_store::RetrievedPassage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::area::{DomainCatalog, LegalArea};

/// Threshold tiers of the result filter.
///
/// With `b` the best distance: `b < tight_below` → `tight`,
/// `b < medium_below` → `medium`, otherwise `loose`. Passages from a
/// preferred statute of the detected area get `source_bonus` on top.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterPolicy {
    pub tight_below: f32,
    pub medium_below: f32,
    pub tight: f32,
    pub medium: f32,
    pub loose: f32,
    pub source_bonus: f32,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            tight_below: 0.6,
            medium_below: 1.0,
            tight: 1.2,
            medium: 1.5,
            loose: 1.8,
            source_bonus: 0.2,
        }
    }
}

impl FilterPolicy {
    /// Base threshold for a best distance.
    pub fn base_threshold(&self, best: f32) -> f32 {
        if best < self.tight_below {
            self.tight
        } else if best < self.medium_below {
            self.medium
        } else {
            self.loose
        }
    }

    /// Threshold a single passage is held to.
    pub fn threshold_for(
        &self,
        base: f32,
        catalog: &DomainCatalog,
        area: LegalArea,
        passage: &RetrievedPassage,
    ) -> f32 {
        if catalog.is_preferred_source(area, &passage.metadata.source) {
            base + self.source_bonus
        } else {
            base
        }
    }
}

/// Passages split by the filter.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Ascending by distance.
    pub kept: Vec<RetrievedPassage>,
    pub discarded: Vec<RetrievedPassage>,
    pub base_threshold: f32,
}

impl FilterOutcome {
    pub fn best_kept(&self) -> Option<f32> {
        self.kept.first().map(|p| p.distance)
    }
}

/// Keeps passages with `distance < threshold`.
pub fn filter_passages(
    passages: &[RetrievedPassage],
    policy: &FilterPolicy,
    catalog: &DomainCatalog,
    area: LegalArea,
) -> FilterOutcome {
    let best = passages
        .iter()
        .map(|p| p.distance)
        .min_by(f32::total_cmp)
        .unwrap_or(f32::INFINITY);
    let base = policy.base_threshold(best);

    let (mut kept, discarded): (Vec<_>, Vec<_>) = passages
        .iter()
        .cloned()
        .partition(|p| p.distance < policy.threshold_for(base, catalog, area, p));
    kept.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    debug!(
        best_distance = best,
        base_threshold = base,
        kept = kept.len(),
        discarded = discarded.len(),
        "result filter"
    );
    FilterOutcome {
        kept,
        discarded,
        base_threshold: base,
    }
}
