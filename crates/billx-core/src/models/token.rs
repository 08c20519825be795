//! Positioned text fragments produced by an external recognition step.

use serde::{Deserialize, Serialize};

use crate::error::{BillxError, InputError};

/// A recognized text fragment with its axis-aligned bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Left edge in pixels.
    pub x1: i32,

    /// Top edge in pixels.
    pub y1: i32,

    /// Right edge in pixels.
    pub x2: i32,

    /// Bottom edge in pixels.
    pub y2: i32,

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0), if the engine reported one.
    #[serde(default, alias = "conf", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Token {
    /// Create a token without a confidence score.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, text: impl Into<String>) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            text: text.into(),
            confidence: None,
        }
    }

    /// Vertical center of the box.
    pub fn center_y(&self) -> f64 {
        (f64::from(self.y1) + f64::from(self.y2)) / 2.0
    }
}

/// The token set recognized on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    /// 1-based page number.
    pub page_no: u32,

    /// Tokens in recognition order.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl PageTokens {
    pub fn new(page_no: u32, tokens: Vec<Token>) -> Self {
        Self { page_no, tokens }
    }
}

/// Parse a token document: a JSON array of `{page_no, tokens}` objects.
pub fn parse_token_document(json: &str) -> Result<Vec<PageTokens>, BillxError> {
    let pages: Vec<PageTokens> =
        serde_json::from_str(json).map_err(|e| InputError::Parse(e.to_string()))?;

    if let Some(page) = pages.iter().find(|p| p.page_no == 0) {
        return Err(InputError::InvalidPageNumber(page.page_no).into());
    }

    Ok(pages)
}

/// Load a token document from disk.
pub fn load_token_document(path: &std::path::Path) -> Result<Vec<PageTokens>, BillxError> {
    let content = std::fs::read_to_string(path)?;
    parse_token_document(&content)
}
