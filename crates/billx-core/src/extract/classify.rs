//! Page classification from keyword content.

use crate::models::bill::PageType;
use crate::models::config::{KeywordConfig, contains_any};
use crate::models::token::Token;

/// Labels a page as pharmacy, final bill or bill detail.
///
/// Matching is substring-based over all token texts joined with spaces, so a
/// keyword may straddle two unrelated tokens.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    pharmacy: Vec<String>,
    final_bill: Vec<String>,
}

impl PageClassifier {
    pub fn new(keywords: &KeywordConfig) -> Self {
        Self {
            pharmacy: keywords.pharmacy.clone(),
            final_bill: keywords.final_bill.clone(),
        }
    }

    /// Classify a page's full token set. Pharmacy keywords win over totals
    /// keywords.
    pub fn classify(&self, tokens: &[Token]) -> PageType {
        let text = tokens
            .iter()
            .map(|t| t.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        if contains_any(&text, &self.pharmacy) {
            PageType::Pharmacy
        } else if contains_any(&text, &self.final_bill) {
            PageType::FinalBill
        } else {
            PageType::BillDetail
        }
    }
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(i as i32 * 60, 10, i as i32 * 60 + 50, 22, *w))
            .collect()
    }

    #[test]
    fn test_pharmacy_beats_totals() {
        let tokens = page(&["Dolo", "Tablet", "10", "Grand", "Total", "250.00"]);
        assert_eq!(PageClassifier::default().classify(&tokens), PageType::Pharmacy);
    }

    #[test]
    fn test_final_bill() {
        let tokens = page(&["Net", "Amt", "1200.00"]);
        assert_eq!(PageClassifier::default().classify(&tokens), PageType::FinalBill);
    }

    #[test]
    fn test_default_is_bill_detail() {
        let tokens = page(&["Room", "Rent", "3000.00"]);
        assert_eq!(PageClassifier::default().classify(&tokens), PageType::BillDetail);
        assert_eq!(PageClassifier::default().classify(&[]), PageType::BillDetail);
    }

    #[test]
    fn test_keyword_straddles_tokens() {
        // "cabinet amt" contains "net amt"
        let tokens = page(&["Cabinet", "Amt"]);
        assert_eq!(PageClassifier::default().classify(&tokens), PageType::FinalBill);

        // the joining space breaks "pharmacy"
        let tokens = page(&["Pharma", "cy"]);
        assert_eq!(PageClassifier::default().classify(&tokens), PageType::BillDetail);
    }
}
