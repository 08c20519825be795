//! Bill extraction pipeline.
//!
//! Per page: cluster tokens into rows, classify the page, parse each row into
//! a candidate item, deduplicate at page scope. Across the document: the
//! pages' items are concatenated and deduplicated again, then summed.

mod classify;
mod dedup;
pub mod numbers;
mod patterns;
mod row_item;
mod rows;
pub mod similarity;
mod totals;

pub use classify::PageClassifier;
pub use dedup::{DedupOutcome, Deduplicator};
pub use row_item::{RowItemParser, RowRejection};
pub use rows::{Row, RowClusterer};
pub use totals::TotalsScanner;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::models::bill::{DocumentResult, LineItem, PageResult, PageTotals, PageType};
use crate::models::config::BillxConfig;
use crate::models::token::{PageTokens, Token};
use numbers::sum_money;

/// A row that produced no item, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Left-to-right row text.
    pub text: String,
    pub reason: RowRejection,
}

/// Diagnostics for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTrace {
    pub page_no: String,
    pub row_count: usize,
    pub rejected_rows: Vec<RejectedRow>,
    /// Items dropped by page-scope deduplication.
    pub duplicates: Vec<LineItem>,
}

/// Diagnostics for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub pages: Vec<PageTrace>,
    /// Items dropped by document-scope deduplication.
    pub document_duplicates: Vec<LineItem>,
}

impl ExtractionTrace {
    /// Total number of rejected rows across pages.
    pub fn rejected_row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rejected_rows.len()).sum()
    }
}

/// Extracts bill line items from recognized tokens.
///
/// Configuration is fixed at construction.
#[derive(Debug, Clone)]
pub struct BillExtractor {
    clusterer: RowClusterer,
    classifier: PageClassifier,
    parser: RowItemParser,
    totals: TotalsScanner,
    dedup: Deduplicator,
    parallel_pages: bool,
}

impl BillExtractor {
    /// Create an extractor from configuration.
    pub fn new(config: &BillxConfig) -> Self {
        let keywords = config.keywords.clone().normalized();
        let clusterer = RowClusterer::new(config.extraction.y_tolerance);

        Self {
            clusterer,
            classifier: PageClassifier::new(&keywords),
            parser: RowItemParser::new(&config.extraction, &keywords),
            totals: TotalsScanner::new(clusterer, &keywords),
            dedup: Deduplicator::new(&config.extraction),
            parallel_pages: config.extraction.parallel_pages,
        }
    }

    /// Group tokens into visual rows.
    pub fn cluster_rows<'a>(&self, tokens: &'a [Token]) -> Vec<Row<'a>> {
        self.clusterer.cluster(tokens)
    }

    /// Classify a page from its full token set.
    pub fn classify_page(&self, tokens: &[Token]) -> PageType {
        self.classifier.classify(tokens)
    }

    /// Parse one row into an item.
    pub fn parse_row(&self, row: &Row<'_>) -> Option<LineItem> {
        self.parser.parse_row(row)
    }

    /// Scan a page for keyword-tagged totals. Not used for reconciliation.
    pub fn extract_totals(&self, tokens: &[Token]) -> PageTotals {
        self.totals.scan(tokens)
    }

    /// Remove near-duplicate items.
    pub fn deduplicate(&self, items: Vec<LineItem>) -> Vec<LineItem> {
        self.dedup.dedup(items)
    }

    /// Extract all items from a single page.
    pub fn extract_page(&self, page: &PageTokens) -> PageResult {
        self.process_page(page, false).0
    }

    /// Extract structured data from an entire document.
    pub fn extract_document(&self, pages: &[PageTokens]) -> DocumentResult {
        self.run_document(pages, false).0
    }

    /// Same as [`extract_document`](Self::extract_document), additionally
    /// reporting rejected rows and dropped duplicates.
    pub fn extract_document_traced(
        &self,
        pages: &[PageTokens],
    ) -> (DocumentResult, ExtractionTrace) {
        self.run_document(pages, true)
    }

    fn run_document(
        &self,
        pages: &[PageTokens],
        collect_trace: bool,
    ) -> (DocumentResult, ExtractionTrace) {
        let processed = self.map_pages(pages, |page| self.process_page(page, collect_trace));

        let mut trace = ExtractionTrace::default();
        let mut pagewise_line_items = Vec::with_capacity(processed.len());
        let mut all_items = Vec::new();

        for (page_result, page_trace) in processed {
            all_items.extend(page_result.bill_items.iter().cloned());
            pagewise_line_items.push(page_result);
            if let Some(page_trace) = page_trace {
                trace.pages.push(page_trace);
            }
        }

        let outcome = self.dedup.dedup_with_outcome(all_items);
        let reconciled_amount = sum_money(outcome.kept.iter().map(|item| item.item_amount));

        info!(
            "Extracted {} items ({} dropped across pages) from {} pages, reconciled amount {:.2}",
            outcome.kept.len(),
            outcome.dropped.len(),
            pages.len(),
            reconciled_amount
        );

        if collect_trace {
            trace.document_duplicates = outcome.dropped;
        }

        let result = DocumentResult {
            pagewise_line_items,
            total_item_count: outcome.kept.len(),
            reconciled_amount,
        };

        (result, trace)
    }

    fn process_page(&self, page: &PageTokens, collect_trace: bool) -> (PageResult, Option<PageTrace>) {
        let page_no = page.page_no.to_string();
        let rows = self.cluster_rows(&page.tokens);
        let page_type = self.classifier.classify(&page.tokens);

        let mut items = Vec::new();
        let mut rejected_rows = Vec::new();

        for row in &rows {
            match self.parser.evaluate_row(row) {
                Ok(item) => items.push(item),
                Err(reason) => {
                    let text = row.text();
                    trace!("Page {}: rejected row '{}' ({})", page_no, text, reason);
                    if collect_trace {
                        rejected_rows.push(RejectedRow { text, reason });
                    }
                }
            }
        }

        let candidates = items.len();
        let outcome = self.dedup.dedup_with_outcome(items);

        debug!(
            "Page {} ({}): {} tokens, {} rows, {} candidates, {} items after dedup",
            page_no,
            page_type,
            page.tokens.len(),
            rows.len(),
            candidates,
            outcome.kept.len()
        );

        let page_trace = collect_trace.then(|| PageTrace {
            page_no: page_no.clone(),
            row_count: rows.len(),
            rejected_rows,
            duplicates: outcome.dropped,
        });

        let result = PageResult {
            page_no,
            page_type,
            bill_items: outcome.kept,
        };

        (result, page_trace)
    }

    /// Apply `f` to every page, in parallel when enabled. Output order
    /// follows input order.
    fn map_pages<T, F>(&self, pages: &[PageTokens], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&PageTokens) -> T + Sync + Send,
    {
        if self.parallel_pages && pages.len() > 1 {
            return par_map(pages, f);
        }

        pages.iter().map(f).collect()
    }
}

#[cfg(feature = "parallel")]
fn par_map<T, F>(pages: &[PageTokens], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&PageTokens) -> T + Sync + Send,
{
    use rayon::prelude::*;
    pages.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn par_map<T, F>(pages: &[PageTokens], f: F) -> Vec<T>
where
    F: Fn(&PageTokens) -> T,
{
    pages.iter().map(f).collect()
}

impl Default for BillExtractor {
    fn default() -> Self {
        Self::new(&BillxConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a page from rows of words; each row sits 40px below the last.
    fn page(page_no: u32, rows: &[&[&str]]) -> PageTokens {
        let mut tokens = Vec::new();
        for (r, words) in rows.iter().enumerate() {
            let y = 50 + r as i32 * 40;
            let mut x = 20;
            for word in words.iter() {
                let width = 10 * word.chars().count() as i32;
                tokens.push(Token::new(x, y, x + width, y + 12, *word));
                x += width + 30;
            }
        }
        PageTokens::new(page_no, tokens)
    }

    fn item(name: &str, quantity: f64, rate: f64, amount: f64) -> LineItem {
        LineItem {
            item_name: name.to_string(),
            item_amount: amount,
            item_rate: rate,
            item_quantity: quantity,
        }
    }

    #[test]
    fn test_extract_page() {
        let page = page(
            1,
            &[
                &["Item", "Description", "Qty", "Rate", "Amount"],
                &["Consultation Fee", "500.00"],
                &["Syringe", "10", "25.00"],
                &["Syringe", "10", "25.00"],
            ],
        );

        let result = BillExtractor::default().extract_page(&page);
        assert_eq!(result.page_no, "1");
        assert_eq!(result.page_type, PageType::BillDetail);
        assert_eq!(
            result.bill_items,
            vec![
                item("Consultation Fee", 1.0, 500.0, 500.0),
                item("Syringe", 10.0, 2.5, 25.0),
            ]
        );
    }

    #[test]
    fn test_cluster_rows_uses_configured_tolerance() {
        let tokens = vec![
            Token::new(10, 100, 80, 112, "Saline"),
            Token::new(300, 105, 350, 117, "90.00"),
        ];

        assert_eq!(BillExtractor::default().cluster_rows(&tokens).len(), 1);

        let mut config = BillxConfig::default();
        config.extraction.y_tolerance = 2.0;
        let rows = BillExtractor::new(&config).cluster_rows(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text(), "90.00");
    }

    #[test]
    fn test_extract_document_dedups_across_pages() {
        let pages = vec![
            page(1, &[&["Room Rent", "2", "3000.00"], &["Paracetamol", "25.00"]]),
            page(2, &[&["PARACETAMOL.", "25.30"], &["Grand Total", "3025.00"]]),
        ];

        let result = BillExtractor::default().extract_document(&pages);

        assert_eq!(result.pagewise_line_items.len(), 2);
        assert_eq!(result.pagewise_line_items[0].bill_items.len(), 2);
        assert_eq!(result.pagewise_line_items[1].page_type, PageType::FinalBill);
        // page 2 keeps its own copy of paracetamol plus the total row
        assert_eq!(result.pagewise_line_items[1].bill_items.len(), 2);
        // document scope drops the repeated paracetamol
        assert_eq!(result.total_item_count, 3);
        assert_eq!(result.reconciled_amount, 6050.0);
    }

    #[test]
    fn test_empty_document() {
        let result = BillExtractor::default().extract_document(&[]);
        assert_eq!(result, DocumentResult::default());

        let result = BillExtractor::default().extract_document(&[PageTokens::new(1, vec![])]);
        assert_eq!(result.total_item_count, 0);
        assert_eq!(result.reconciled_amount, 0.0);
        assert_eq!(result.pagewise_line_items[0].page_type, PageType::BillDetail);
    }

    #[test]
    fn test_traced_matches_default() {
        let pages = vec![page(
            3,
            &[
                &["Item", "Qty", "Amount"],
                &["Dr.", "Visit"],
                &["Gloves", "40.00"],
                &["Gloves", "40.00"],
            ],
        )];

        let extractor = BillExtractor::default();
        let (traced, trace) = extractor.extract_document_traced(&pages);
        assert_eq!(traced, extractor.extract_document(&pages));

        let page_trace = &trace.pages[0];
        assert_eq!(page_trace.page_no, "3");
        assert_eq!(page_trace.row_count, 4);
        assert_eq!(
            page_trace.rejected_rows,
            vec![
                RejectedRow {
                    text: "Item Qty Amount".to_string(),
                    reason: RowRejection::Header,
                },
                RejectedRow {
                    text: "Dr. Visit".to_string(),
                    reason: RowRejection::NoNumbers,
                },
            ]
        );
        assert_eq!(page_trace.duplicates, vec![item("Gloves", 1.0, 40.0, 40.0)]);
        assert_eq!(trace.rejected_row_count(), 2);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let pages: Vec<PageTokens> = (1..=6)
            .map(|n| page(n, &[&["Ward Charges", "1500.00"], &["Nursing", "3", "900.00"]]))
            .collect();

        let mut config = BillxConfig::default();
        config.extraction.parallel_pages = false;
        let sequential = BillExtractor::new(&config).extract_document(&pages);
        let parallel = BillExtractor::default().extract_document(&pages);

        assert_eq!(sequential, parallel);
        assert_eq!(
            parallel
                .pagewise_line_items
                .iter()
                .map(|p| p.page_no.as_str())
                .collect::<Vec<_>>(),
            vec!["1", "2", "3", "4", "5", "6"]
        );
        assert_eq!(parallel.total_item_count, 2);
        assert_eq!(parallel.reconciled_amount, 2400.0);
    }

    #[test]
    fn test_totals_not_used_for_reconciliation() {
        let page = page(1, &[&["X-Ray", "650.00"], &["Net", "Amount", "9999.00"]]);
        let extractor = BillExtractor::default();

        assert_eq!(extractor.extract_totals(&page.tokens).net_amount, Some(9999.0));

        let result = extractor.extract_document(&[page]);
        // the net amount row itself parses as an item named "Net Amount"
        assert_eq!(result.reconciled_amount, 650.0 + 9999.0);
    }

    #[test]
    fn test_custom_keywords_apply() {
        let mut config = BillxConfig::default();
        config.keywords.pharmacy = vec!["Chemist".to_string()];
        let extractor = BillExtractor::new(&config);

        let page = page(1, &[&["City", "Chemist"], &["Tablet", "Dolo", "30.00"]]);
        assert_eq!(extractor.classify_page(&page.tokens), PageType::Pharmacy);
    }
}
