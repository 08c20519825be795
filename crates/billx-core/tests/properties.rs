//! Property-based tests for the extraction pipeline.

use billx_core::extract::numbers::sum_money;
use billx_core::extract::similarity::token_set_ratio;
use billx_core::extract::{Deduplicator, RowClusterer};
use billx_core::{BillExtractor, LineItem, PageTokens, Token};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "Paracetamol", "Syringe", "Room", "Rent", "Gloves", "Saline", "X-Ray", "Total", "Qty",
    "25.00", "10", "2.50", "1,200.00", "500", "Rs", "₹90", "Amount",
];

fn token_strategy() -> impl Strategy<Value = Token> {
    (
        0i32..1200,
        0i32..1500,
        4i32..40,
        20i32..200,
        prop::sample::select(WORDS),
    )
        .prop_map(|(x1, y1, height, width, text)| Token::new(x1, y1, x1 + width, y1 + height, text))
}

fn item_strategy() -> impl Strategy<Value = LineItem> {
    (
        prop::sample::select(&["Syringe 5ml", "syringe 5 ml", "Gloves", "gloves pair", "Saline", "Ward"][..]),
        0u32..5000,
    )
        .prop_map(|(name, cents)| {
            let amount = f64::from(cents) / 100.0;
            LineItem {
                item_name: name.to_string(),
                item_amount: amount,
                item_rate: amount,
                item_quantity: 1.0,
            }
        })
}

proptest! {
    /// Every token lands in exactly one row.
    #[test]
    fn rows_partition_tokens(
        tokens in prop::collection::vec(token_strategy(), 0..60),
        tolerance in 0.0f64..30.0,
    ) {
        let rows = RowClusterer::new(tolerance).cluster(&tokens);

        let total: usize = rows.iter().map(|r| r.len()).sum();
        prop_assert_eq!(total, tokens.len());

        for token in &tokens {
            let hits = rows
                .iter()
                .flat_map(|r| r.tokens().iter())
                .filter(|t| std::ptr::eq(**t, token))
                .count();
            prop_assert_eq!(hits, 1);
        }

        prop_assert!(rows.iter().all(|r| !r.is_empty()));
    }

    /// Deduplicating an already deduplicated list changes nothing.
    #[test]
    fn dedup_is_idempotent(items in prop::collection::vec(item_strategy(), 0..30)) {
        let dedup = Deduplicator::default();
        let once = dedup.dedup(items);
        let twice = dedup.dedup(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Deduplication keeps a subsequence of its input.
    #[test]
    fn dedup_keeps_first_occurrences(items in prop::collection::vec(item_strategy(), 1..30)) {
        let outcome = Deduplicator::default().dedup_with_outcome(items.clone());
        prop_assert_eq!(outcome.kept.len() + outcome.dropped.len(), items.len());
        prop_assert_eq!(&outcome.kept[0], &items[0]);
    }

    /// The document totals agree with the surviving items.
    #[test]
    fn document_totals_reconcile(
        pages in prop::collection::vec(prop::collection::vec(token_strategy(), 0..40), 0..4),
    ) {
        let pages: Vec<PageTokens> = pages
            .into_iter()
            .enumerate()
            .map(|(i, tokens)| PageTokens::new(i as u32 + 1, tokens))
            .collect();

        let extractor = BillExtractor::default();
        let result = extractor.extract_document(&pages);

        let all: Vec<LineItem> = result.page_items().cloned().collect();
        let survivors = extractor.deduplicate(all.clone());

        prop_assert_eq!(result.total_item_count, survivors.len());
        prop_assert!(result.total_item_count <= all.len());
        prop_assert_eq!(
            result.reconciled_amount,
            sum_money(survivors.iter().map(|i| i.item_amount))
        );
        prop_assert_eq!(result.pagewise_line_items.len(), pages.len());
    }

    /// A single page reconciles to the sum of its own items.
    #[test]
    fn single_page_reconciles_to_page_items(tokens in prop::collection::vec(token_strategy(), 0..50)) {
        let result = BillExtractor::default().extract_document(&[PageTokens::new(1, tokens)]);

        let page_items = &result.pagewise_line_items[0].bill_items;
        prop_assert_eq!(result.total_item_count, page_items.len());
        prop_assert_eq!(
            result.reconciled_amount,
            sum_money(page_items.iter().map(|i| i.item_amount))
        );
    }

    /// Similarity is symmetric and bounded.
    #[test]
    fn similarity_symmetric_and_bounded(a in "[a-z0-9 ]{0,24}", b in "[a-z0-9 ]{0,24}") {
        let ab = token_set_ratio(&a, &b);
        let ba = token_set_ratio(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert!((0.0..=100.0).contains(&ab));
    }

    /// Word order never changes similarity.
    #[test]
    fn similarity_ignores_word_order(words in prop::collection::vec("[a-z]{1,6}", 1..5)) {
        let forward = words.join(" ");
        let reversed = words.iter().rev().cloned().collect::<Vec<_>>().join(" ");
        prop_assert!((token_set_ratio(&forward, &reversed) - 100.0).abs() < 1e-9);
    }
}
