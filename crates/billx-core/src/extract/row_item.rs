//! Conversion of a single row into a bill line item.
//!
//! Column roles are inferred right to left: the rightmost figure is the
//! amount, the next one the rate, the third the quantity. With exactly two
//! figures the second is read as a quantity when it is a small integer and
//! as a rate otherwise; the missing field is derived by division.

use serde::{Deserialize, Serialize};

use super::numbers::{clean_item_name, extract_number, round_money};
use super::patterns::DIGIT_RUN;
use super::rows::{Row, join_texts};
use crate::models::bill::LineItem;
use crate::models::config::{ExtractionConfig, KeywordConfig, contains_any};

/// Why a row produced no line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRejection {
    /// The row holds no tokens.
    Empty,
    /// Header or label row: a skip keyword without a run of 2+ digits.
    Header,
    /// No token yields a number.
    NoNumbers,
    /// The cleaned name is shorter than the configured minimum.
    NameTooShort,
}

impl RowRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowRejection::Empty => "empty row",
            RowRejection::Header => "header row",
            RowRejection::NoNumbers => "no numeric tokens",
            RowRejection::NameTooShort => "name too short",
        }
    }
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A figure found on the row and where it sits horizontally.
#[derive(Debug, Clone, Copy)]
struct Figure {
    value: f64,
    x: i32,
}

/// Unrounded column roles.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Roles {
    amount: f64,
    rate: f64,
    quantity: f64,
}

/// Parses rows into line items.
#[derive(Debug, Clone)]
pub struct RowItemParser {
    skip: Vec<String>,
    min_name_len: usize,
    quantity_max: f64,
}

impl RowItemParser {
    pub fn new(config: &ExtractionConfig, keywords: &KeywordConfig) -> Self {
        Self {
            skip: keywords.skip.clone(),
            min_name_len: config.min_name_len,
            quantity_max: config.quantity_max,
        }
    }

    /// Parse a row, silently dropping rows that are not items.
    pub fn parse_row(&self, row: &Row<'_>) -> Option<LineItem> {
        self.evaluate_row(row).ok()
    }

    /// Parse a row, reporting why it was rejected.
    pub fn evaluate_row(&self, row: &Row<'_>) -> Result<LineItem, RowRejection> {
        if row.is_empty() {
            return Err(RowRejection::Empty);
        }

        let sorted = row.sorted_by_x();
        let row_text = join_texts(&sorted);

        if contains_any(&row_text.to_lowercase(), &self.skip) && !DIGIT_RUN.is_match(&row_text) {
            return Err(RowRejection::Header);
        }

        let mut figures = Vec::new();
        let mut name_parts = Vec::new();

        for token in &sorted {
            match extract_number(&token.text) {
                Some(value) => figures.push(Figure { value, x: token.x1 }),
                None => name_parts.push(token.text.as_str()),
            }
        }

        // Rightmost first; stable for equal x.
        figures.sort_by(|a, b| b.x.cmp(&a.x));
        let roles = self.assign_roles(&figures).ok_or(RowRejection::NoNumbers)?;

        let mut name = name_parts.join(" ").trim().to_string();
        if name.is_empty() {
            let take = sorted.len().saturating_sub(figures.len()).max(1);
            name = join_texts(&sorted[..take]).trim().to_string();
        }
        let name = clean_item_name(&name);

        if name.chars().count() < self.min_name_len {
            return Err(RowRejection::NameTooShort);
        }

        let item_amount = round_money(roles.amount);
        Ok(LineItem {
            item_name: name,
            item_amount,
            item_rate: if roles.rate != 0.0 {
                round_money(roles.rate)
            } else {
                item_amount
            },
            item_quantity: if roles.quantity != 0.0 {
                round_money(roles.quantity)
            } else {
                1.0
            },
        })
    }

    /// Assign amount / rate / quantity from figures sorted right to left.
    fn assign_roles(&self, figures: &[Figure]) -> Option<Roles> {
        let (first, rest) = figures.split_first()?;
        let amount = first.value;

        let roles = match rest {
            [] => Roles {
                amount,
                rate: amount,
                quantity: 1.0,
            },
            [second] => {
                let value = second.value;
                if value <= self.quantity_max && value.fract() == 0.0 {
                    Roles {
                        amount,
                        rate: if value > 0.0 { amount / value } else { amount },
                        quantity: value,
                    }
                } else {
                    Roles {
                        amount,
                        rate: value,
                        quantity: if value > 0.0 { amount / value } else { 1.0 },
                    }
                }
            }
            [rate, quantity, ..] => Roles {
                amount,
                rate: rate.value,
                quantity: quantity.value,
            },
        };

        Some(roles)
    }
}

impl Default for RowItemParser {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default(), &KeywordConfig::default())
    }
}
