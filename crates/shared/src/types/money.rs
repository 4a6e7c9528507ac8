//! Rupee amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the system is a `rust_decimal::Decimal` in rupees.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to the nearest whole rupee, halves rounding up.
///
/// Invoice totals are always whole rupees; paise never reach the printed bill.
#[must_use]
pub fn round_to_rupee(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with the Indian digit grouping (`₹12,34,567.50`).
///
/// The last three digits form one group and every earlier group has two digits.
/// Paise are omitted when the amount is a whole number of rupees.
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, paise) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 2);
    let len = whole.len();
    for (i, ch) in whole.chars().enumerate() {
        let remaining = len - i;
        if i > 0 && (remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0)) {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if paise == "00" {
        format!("{sign}₹{grouped}")
    } else {
        format!("{sign}₹{grouped}.{paise}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(5900.4), dec!(5900))]
    #[case(dec!(5900.5), dec!(5901))]
    #[case(dec!(0.5), dec!(1))]
    #[case(dec!(0), dec!(0))]
    #[case(dec!(1234.49), dec!(1234))]
    fn test_round_to_rupee(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_to_rupee(input), expected);
    }

    #[rstest]
    #[case(dec!(0), "₹0")]
    #[case(dec!(999), "₹999")]
    #[case(dec!(1000), "₹1,000")]
    #[case(dec!(123456), "₹1,23,456")]
    #[case(dec!(12345678.5), "₹1,23,45,678.50")]
    #[case(dec!(-5000), "-₹5,000")]
    fn test_format_inr(#[case] input: Decimal, #[case] expected: &str) {
        assert_eq!(format_inr(input), expected);
    }
}
