//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{BillxError, ConfigError};

/// Main configuration for the billx pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillxConfig {
    /// Numeric thresholds for clustering, parsing and deduplication.
    pub extraction: ExtractionConfig,

    /// Keyword tables driving row skipping, page classification and totals.
    pub keywords: KeywordConfig,
}

impl Default for BillxConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            keywords: KeywordConfig::default(),
        }
    }
}

/// Extraction thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum vertical distance (pixels) between a token center and the
    /// running row center for the token to join the row.
    pub y_tolerance: f64,

    /// Minimum token-set similarity (0 - 100) for two names to match.
    pub similarity_threshold: f64,

    /// Absolute amount tolerance for duplicates.
    pub amount_tolerance_abs: f64,

    /// Relative amount tolerance for duplicates (fraction of the amount).
    pub amount_tolerance_ratio: f64,

    /// Minimum length of a cleaned item name.
    pub min_name_len: usize,

    /// Upper bound for reading the second figure of a two-number row as a
    /// quantity.
    pub quantity_max: f64,

    /// Process pages in parallel.
    pub parallel_pages: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 12.0,
            similarity_threshold: 90.0,
            amount_tolerance_abs: 1.0,
            amount_tolerance_ratio: 0.01,
            min_name_len: 2,
            quantity_max: 100.0,
            parallel_pages: true,
        }
    }
}

/// Ordered lowercase substring tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Header / label words. A row containing one is skipped unless it also
    /// holds a run of two or more digits.
    pub skip: Vec<String>,

    /// Words marking a pharmacy page. Checked before `final_bill`.
    pub pharmacy: Vec<String>,

    /// Words marking a final bill (totals) page.
    pub final_bill: Vec<String>,

    /// Row labels for the net amount.
    pub net_amount: Vec<String>,

    /// Row labels for the subtotal.
    pub sub_total: Vec<String>,

    /// Row labels for the grand total.
    pub grand_total: Vec<String>,
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            skip: strings(&[
                "item",
                "description",
                "particular",
                "qty",
                "quantity",
                "rate",
                "amount",
                "total",
                "subtotal",
                "sub-total",
                "net amount",
                "grand total",
                "page",
                "sl no",
                "s.no",
                "sr no",
                "date",
                "bill no",
                "invoice",
            ]),
            pharmacy: strings(&["pharmacy", "medicine", "tablet", "capsule"]),
            final_bill: strings(&["total", "net amt", "net amount", "grand total"]),
            net_amount: strings(&["net amount", "net amt", "total amount"]),
            sub_total: strings(&["subtotal", "sub total", "sub-total"]),
            grand_total: strings(&["grand total"]),
        }
    }
}

impl KeywordConfig {
    /// Lowercase every entry so matching against lowercased text works.
    pub fn normalized(mut self) -> Self {
        for table in [
            &mut self.skip,
            &mut self.pharmacy,
            &mut self.final_bill,
            &mut self.net_amount,
            &mut self.sub_total,
            &mut self.grand_total,
        ] {
            for word in table.iter_mut() {
                *word = word.to_lowercase();
            }
        }
        self
    }
}

/// True if `text` contains any of the keywords as a substring.
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| text.contains(kw.as_str()))
}

impl BillxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, BillxError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), BillxError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.extraction;
        if !e.y_tolerance.is_finite() || e.y_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.y_tolerance".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&e.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.similarity_threshold".to_string(),
                reason: "must be between 0 and 100".to_string(),
            });
        }
        if e.amount_tolerance_abs < 0.0 || e.amount_tolerance_ratio < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.amount_tolerance".to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let k = &self.keywords;
        for (name, table) in [
            ("skip", &k.skip),
            ("pharmacy", &k.pharmacy),
            ("final_bill", &k.final_bill),
            ("net_amount", &k.net_amount),
            ("sub_total", &k.sub_total),
            ("grand_total", &k.grand_total),
        ] {
            if table.iter().any(|word| word.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("keywords.{}", name),
                    reason: "keywords must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
