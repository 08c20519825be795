//! Core library for bill line-item extraction.
//!
//! This crate provides:
//! - Token and bill data models (serde-compatible)
//! - Row clustering of positioned OCR tokens
//! - Page classification and line-item column inference
//! - Fuzzy duplicate suppression and document reconciliation

pub mod error;
pub mod extract;
pub mod models;

pub use error::{BillxError, Result};
pub use extract::{BillExtractor, ExtractionTrace, RowRejection};
pub use models::bill::{
    DocumentResult, ExtractionResponse, LineItem, PageResult, PageTotals, PageType, TokenUsage,
};
pub use models::config::BillxConfig;
pub use models::token::{PageTokens, Token, load_token_document, parse_token_document};
