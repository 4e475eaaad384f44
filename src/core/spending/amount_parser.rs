// Parses human-entered GP amounts like "250m" or "1.5b".
//
// Pure function, no Discord types. The command layer hands us the raw text
// and decides how to tell the user when it's rejected.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Invalid amount format: {0:?}")]
    InvalidFormat(String),
}

/// Magnitude suffix -> number of decimal places it shifts by.
fn suffix_digits(suffix: char) -> Option<u32> {
    match suffix {
        'k' => Some(3),
        'm' => Some(6),
        'b' => Some(9),
        _ => None,
    }
}

/// Parse an amount, optionally suffixed with `k`, `m` or `b`.
///
/// Suffixed amounts accept a decimal number ("1.5b") and are truncated toward
/// zero after scaling. Unsuffixed amounts must be a plain integer.
pub fn parse_amount(text: &str) -> Result<u64, AmountError> {
    let normalized = text.trim().to_lowercase();
    let invalid = || AmountError::InvalidFormat(text.to_string());

    let last = normalized.chars().last().ok_or_else(invalid)?;

    match suffix_digits(last) {
        Some(digits) => {
            let number = normalized[..normalized.len() - last.len_utf8()].trim_end();
            scale_decimal(number, digits).ok_or_else(invalid)
        }
        None => normalized.parse::<u64>().map_err(|_| invalid()),
    }
}

/// `number * 10^digits`, truncated, in integer arithmetic.
///
/// Accepts digits with at most one decimal point and an optional leading `+`.
/// Returns `None` for anything else or on overflow.
fn scale_decimal(number: &str, digits: u32) -> Option<u64> {
    let number = number.strip_prefix('+').unwrap_or(number);
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    // Keep only the places the suffix covers; the rest is truncated.
    let kept = &fraction[..fraction.len().min(digits as usize)];
    let padding = digits - kept.len() as u32;
    let fraction: u64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };

    whole
        .checked_mul(10u64.pow(digits))?
        .checked_add(fraction * 10u64.pow(padding))
}
