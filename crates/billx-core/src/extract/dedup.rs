//! Fuzzy duplicate suppression for line items.

use tracing::trace;

use super::numbers::normalize_text;
use super::similarity::token_set_ratio;
use crate::models::bill::LineItem;
use crate::models::config::ExtractionConfig;

/// Duplicate-detection key of an accepted item.
#[derive(Debug, Clone)]
struct Signature {
    name: String,
    amount: f64,
}

/// Outcome of one deduplication pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    /// Items kept, in input order.
    pub kept: Vec<LineItem>,
    /// Items discarded as near-duplicates of an earlier item.
    pub dropped: Vec<LineItem>,
}

/// Collapses near-duplicate items, keeping the first occurrence.
///
/// An item duplicates an earlier accepted one when their normalized names
/// score at least `similarity_threshold` on token-set similarity and their
/// amounts differ by at most `max(amount_tolerance_abs,
/// amount_tolerance_ratio * amount)`. Every item is compared with every
/// accepted signature.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    similarity_threshold: f64,
    amount_tolerance_abs: f64,
    amount_tolerance_ratio: f64,
}

impl Deduplicator {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            amount_tolerance_abs: config.amount_tolerance_abs,
            amount_tolerance_ratio: config.amount_tolerance_ratio,
        }
    }

    /// Remove near-duplicates.
    pub fn dedup(&self, items: Vec<LineItem>) -> Vec<LineItem> {
        self.dedup_with_outcome(items).kept
    }

    /// Remove near-duplicates and report which items were dropped.
    pub fn dedup_with_outcome(&self, items: Vec<LineItem>) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();
        let mut seen: Vec<Signature> = Vec::new();

        for item in items {
            let name = normalize_text(&item.item_name);
            let amount = item.item_amount;

            if seen.iter().any(|sig| self.matches(sig, &name, amount)) {
                trace!("Dropping duplicate item '{}' ({:.2})", item.item_name, amount);
                outcome.dropped.push(item);
            } else {
                seen.push(Signature { name, amount });
                outcome.kept.push(item);
            }
        }

        outcome
    }

    fn matches(&self, sig: &Signature, name: &str, amount: f64) -> bool {
        let tolerance = self
            .amount_tolerance_abs
            .max(self.amount_tolerance_ratio * amount);

        (amount - sig.amount).abs() <= tolerance
            && token_set_ratio(name, &sig.name) >= self.similarity_threshold
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
