//! Common regex patterns for bill extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Integer or decimal with up to 2 places, anywhere in the text
    pub static ref NUMBER: Regex = Regex::new(
        r"(\d+(?:\.\d{1,2})?)"
    ).unwrap();

    // Two or more consecutive digits: marks a header-looking row as data
    pub static ref DIGIT_RUN: Regex = Regex::new(
        r"\d{2,}"
    ).unwrap();

    // A single decimal digit of any script
    pub static ref DIGIT: Regex = Regex::new(
        r"^\d$"
    ).unwrap();

    // Anything that is neither a word character nor whitespace
    pub static ref NON_WORD: Regex = Regex::new(
        r"[^\w\s]"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();
}

/// Currency markers stripped before number extraction.
pub const CURRENCY_MARKERS: &[&str] = &["₹", "Rs"];

/// Thousands separator stripped before number extraction.
pub const THOUSANDS_SEPARATOR: char = ',';
