//! Keyword-tagged page totals.

use super::numbers::extract_number;
use super::rows::{RowClusterer, join_texts};
use crate::models::bill::PageTotals;
use crate::models::config::{KeywordConfig, contains_any};
use crate::models::token::Token;

/// Which total a row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TotalKind {
    NetAmount,
    SubTotal,
    GrandTotal,
}

/// Scans a page for subtotal, net amount and grand total figures.
#[derive(Debug, Clone)]
pub struct TotalsScanner {
    clusterer: RowClusterer,
    net_amount: Vec<String>,
    sub_total: Vec<String>,
    grand_total: Vec<String>,
}

impl TotalsScanner {
    pub fn new(clusterer: RowClusterer, keywords: &KeywordConfig) -> Self {
        Self {
            clusterer,
            net_amount: keywords.net_amount.clone(),
            sub_total: keywords.sub_total.clone(),
            grand_total: keywords.grand_total.clone(),
        }
    }

    /// Scan a page's tokens. Rows are re-clustered from scratch.
    ///
    /// Each row contributes to at most one field, checked in the order net
    /// amount, subtotal, grand total; its rightmost figure is taken. A later
    /// row overwrites an earlier one for the same field.
    pub fn scan(&self, tokens: &[Token]) -> PageTotals {
        let mut totals = PageTotals::default();

        for row in self.clusterer.cluster(tokens) {
            let sorted = row.sorted_by_x();
            let text = join_texts(&sorted).to_lowercase();

            let Some(kind) = self.kind_of(&text) else {
                continue;
            };

            let Some(value) = sorted.iter().filter_map(|t| extract_number(&t.text)).last() else {
                continue;
            };

            match kind {
                TotalKind::NetAmount => totals.net_amount = Some(value),
                TotalKind::SubTotal => totals.sub_total = Some(value),
                TotalKind::GrandTotal => totals.grand_total = Some(value),
            }
        }

        totals
    }

    fn kind_of(&self, text: &str) -> Option<TotalKind> {
        if contains_any(text, &self.net_amount) {
            Some(TotalKind::NetAmount)
        } else if contains_any(text, &self.sub_total) {
            Some(TotalKind::SubTotal)
        } else if contains_any(text, &self.grand_total) {
            Some(TotalKind::GrandTotal)
        } else {
            None
        }
    }
}

impl Default for TotalsScanner {
    fn default() -> Self {
        Self::new(RowClusterer::default(), &KeywordConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(y: i32, words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(10 + i as i32 * 100, y, 90 + i as i32 * 100, y + 12, *w))
            .collect()
    }

    #[test]
    fn test_scan_all_totals() {
        let mut tokens = row(100, &["Sub", "Total", "1,000.00"]);
        tokens.extend(row(140, &["Net", "Amount", "950.00"]));
        tokens.extend(row(180, &["Grand", "Total", "Rs", "1,121.00"]));

        assert_eq!(
            TotalsScanner::default().scan(&tokens),
            PageTotals {
                sub_total: Some(1000.0),
                net_amount: Some(950.0),
                grand_total: Some(1121.0),
            }
        );
    }

    #[test]
    fn test_first_matching_kind_wins() {
        // "total amount" (net) and "grand total" on one row: only net is set
        let tokens = row(100, &["Grand", "Total", "Amount", "500.00"]);
        assert_eq!(
            TotalsScanner::default().scan(&tokens),
            PageTotals {
                net_amount: Some(500.0),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_rightmost_figure_taken() {
        let tokens = row(100, &["Subtotal", "12", "340.50"]);
        assert_eq!(TotalsScanner::default().scan(&tokens).sub_total, Some(340.5));
    }

    #[test]
    fn test_keyword_without_figure_ignored() {
        let tokens = row(100, &["Grand", "Total"]);
        assert!(TotalsScanner::default().scan(&tokens).is_empty());
        assert!(TotalsScanner::default().scan(&[]).is_empty());
    }

    #[test]
    fn test_later_row_overwrites() {
        let mut tokens = row(100, &["Net", "Amt", "100.00"]);
        tokens.extend(row(200, &["Net", "Amt", "120.00"]));
        assert_eq!(TotalsScanner::default().scan(&tokens).net_amount, Some(120.0));
    }
}
