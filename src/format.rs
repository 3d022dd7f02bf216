//! Amount formatting for display.
//!
//! Amounts are rounded to two decimals (half away from zero), trailing
//! zeros are dropped, and the integer part is grouped the Indian way:
//! the last three digits, then groups of two (`12,34,567.5`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount with Indian digit grouping.
///
/// ```rust
/// use nova_budget::format::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(12_345_675, 1)), "12,34,567.5");
/// ```
#[inline]
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    if fraction.is_empty() {
        format!("{sign}{}", group_digits(integer))
    } else {
        format!("{sign}{}.{fraction}", group_digits(integer))
    }
}

/// Formats a net amount with an explicit direction: `+Rs. 1,200`,
/// `-Rs. 50`, or `Rs. 0`.
#[inline]
#[must_use]
pub fn format_signed(amount: Decimal, currency: &str) -> String {
    let magnitude = format_amount(amount.abs());
    if amount.is_zero() || magnitude == "0" {
        format!("{currency} 0")
    } else if amount.is_sign_negative() {
        format!("-{currency} {magnitude}")
    } else {
        format!("+{currency} {magnitude}")
    }
}

/// Inserts separators into a run of ASCII digits.
fn group_digits(integer: &str) -> String {
    if integer.len() <= 3 {
        return integer.to_owned();
    }
    let (mut head, tail) = integer.split_at(integer.len() - 3);
    let mut groups = vec![tail];
    while head.len() > 2 {
        let (rest, pair) = head.split_at(head.len() - 2);
        groups.push(pair);
        head = rest;
    }
    groups.push(head);
    groups.reverse();
    groups.join(",")
}
