//! Bill data models produced by the extraction pipeline.

use serde::{Deserialize, Serialize};

/// One reconstructed bill line.
///
/// Money fields are rounded to 2 decimals when the item is created and never
/// revisited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description.
    pub item_name: String,

    /// Line amount (rightmost figure on the row).
    pub item_amount: f64,

    /// Unit rate.
    pub item_rate: f64,

    /// Quantity (1.0 when not inferable).
    pub item_quantity: f64,
}

/// Coarse classification of a page's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    /// Pharmacy / medicine listing.
    #[serde(rename = "Pharmacy")]
    Pharmacy,
    /// Summary page carrying totals.
    #[serde(rename = "Final Bill")]
    FinalBill,
    /// Itemized detail page.
    #[serde(rename = "Bill Detail")]
    BillDetail,
}

impl PageType {
    /// Human-readable label, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Pharmacy => "Pharmacy",
            PageType::FinalBill => "Final Bill",
            PageType::BillDetail => "Bill Detail",
        }
    }
}

impl Default for PageType {
    fn default() -> Self {
        Self::BillDetail
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction result for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Page number as a string.
    pub page_no: String,

    /// Page classification.
    pub page_type: PageType,

    /// Items accepted on this page, deduplicated at page scope.
    pub bill_items: Vec<LineItem>,
}

/// Extraction result for a whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Per-page results in page order.
    pub pagewise_line_items: Vec<PageResult>,

    /// Number of items left after document-scope deduplication.
    pub total_item_count: usize,

    /// Sum of the surviving items' amounts, rounded to 2 decimals.
    pub reconciled_amount: f64,
}

impl DocumentResult {
    /// Iterate over every page's items in page order.
    pub fn page_items(&self) -> impl Iterator<Item = &LineItem> {
        self.pagewise_line_items
            .iter()
            .flat_map(|page| page.bill_items.iter())
    }
}

/// Keyword-tagged totals found on a page.
///
/// These are informational only; reconciliation never consults them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
}

impl PageTotals {
    /// True when no total was found.
    pub fn is_empty(&self) -> bool {
        self.sub_total.is_none() && self.net_amount.is_none() && self.grand_total.is_none()
    }
}

/// Generative-model token accounting. Always zero: no model is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Response envelope wrapping a document result for API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub is_success: bool,
    pub token_usage: TokenUsage,
    pub data: DocumentResult,
}

impl ExtractionResponse {
    /// Wrap a successful extraction.
    pub fn success(data: DocumentResult) -> Self {
        Self {
            is_success: true,
            token_usage: TokenUsage::default(),
            data,
        }
    }
}
