use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// 數字字串允許的字元，其餘一律視為格式錯誤
const NUMBER_CHARS: &[char] = &['+', '-', '.', 'e', 'E'];

/// 價格前綴
const PRICE_PREFIX: &str = "$";
/// 千分位分隔字元
const GROUP_SEPARATOR: char = ' ';

/// Parses a decimal value from a given string.
///
/// Only surrounding whitespace is tolerated. Thousands separators, quotes or
/// anything else inside the number make it an error. Scientific notation
/// (`6.7e4`) is accepted as well.
///
/// # Example
///
/// ```
/// let decimal_value = parse_decimal(" 67234.90 ").unwrap();
/// ```
pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Failed to parse '{}' as Decimal because it is empty", s));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || NUMBER_CHARS.contains(&c))
    {
        return Err(anyhow!("Failed to parse '{}' as Decimal because it is not a number", s));
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", trimmed, why))
}

/// Inserts `separator` between every group of three digits, counting from the right.
///
/// `digits` must be plain ASCII digits without sign.
pub fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }

    grouped
}

/// Formats an amount for the board: whole units, space-grouped, `$` prefixed.
///
/// Midpoints round away from zero, so `0.5` becomes `$1`.
///
/// ```
/// assert_eq!(format_price(dec!(67234.9)), "$67 235");
/// ```
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().trunc().normalize().to_string();

    format!(
        "{}{}{}",
        PRICE_PREFIX,
        sign,
        group_thousands(&digits, GROUP_SEPARATOR)
    )
}
