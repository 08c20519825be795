//! Number extraction, money rounding and text normalization.

use std::borrow::Cow;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::patterns::{
    CURRENCY_MARKERS, DIGIT, NON_WORD, NUMBER, THOUSANDS_SEPARATOR, WHITESPACE,
};

/// Ties go to the even digit, applied to the exact binary value.
const MONEY_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

/// Extract the first number from a token's text.
///
/// Currency markers and thousands separators are removed first; the search
/// is unanchored, so `"500mg"` yields 500 and `"12.345"` yields 12.34.
/// Digits from any script count, e.g. `"٥٠٠"` yields 500.
pub fn extract_number(text: &str) -> Option<f64> {
    let mut cleaned = text.replace(THOUSANDS_SEPARATOR, "");
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    let caps = NUMBER.captures(cleaned.trim())?;
    ascii_digits(&caps[1]).parse::<f64>().ok()
}

/// Rewrite decimal digits of any script as ASCII digits.
fn ascii_digits(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .map(|c| match digit_value(c) {
                Some(d) if !c.is_ascii() => char::from(b'0' + d),
                _ => c,
            })
            .collect(),
    )
}

/// Value of a decimal digit character.
///
/// Decimal digits are encoded in runs of ten starting at zero, and adjacent
/// runs chain, so the value is the distance from the start of the run mod 10.
fn digit_value(c: char) -> Option<u8> {
    if !is_digit(c) {
        return None;
    }

    let mut steps = 0u32;
    let mut cp = u32::from(c);
    while let Some(prev) = cp.checked_sub(1).and_then(char::from_u32) {
        if !is_digit(prev) {
            break;
        }
        steps += 1;
        cp -= 1;
    }

    u8::try_from(steps % 10).ok()
}

fn is_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Round a money value to 2 decimals, ties to even on the exact binary value.
pub fn round_money(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, MONEY_ROUNDING))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Sum money values, then round to 2 decimals.
///
/// The sum is accumulated exactly and brought back to the nearest `f64`
/// before rounding, so `0.1 + 0.025` rounds as `0.125`.
pub fn sum_money<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let total: Decimal = values
        .into_iter()
        .filter_map(Decimal::from_f64_retain)
        .sum();

    round_money(total.to_f64().unwrap_or_default())
}

/// Normalize text for fuzzy comparison: lowercase, drop punctuation,
/// collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Clean an item name: trim and collapse runs of whitespace.
pub fn clean_item_name(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
