//! Rupee amounts in words, grouped by crore, lakh, thousand and hundred.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sitebook_shared::types::round_to_rupee;

/// Upper bound (exclusive) of amounts that can be spelled out.
pub const WORDS_LIMIT: u64 = 1_000_000_000;

/// Returned for amounts at or above [`WORDS_LIMIT`].
pub const WORDS_OVERFLOW: &str = "Amount too large";

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Spells out a whole rupee amount, e.g. `150000` -> `"One Lakh Fifty Thousand"`.
///
/// Zero is `"Zero"`. Amounts of one hundred crore or more return [`WORDS_OVERFLOW`].
#[must_use]
pub fn amount_to_words(amount: u64) -> String {
    if amount >= WORDS_LIMIT {
        return WORDS_OVERFLOW.to_string();
    }
    if amount == 0 {
        return "Zero".to_string();
    }

    let groups = [
        (amount / 10_000_000, "Crore"),
        ((amount / 100_000) % 100, "Lakh"),
        ((amount / 1_000) % 100, "Thousand"),
        ((amount / 100) % 10, "Hundred"),
    ];

    let mut parts: Vec<String> = groups
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{} {unit}", two_digits(*n)))
        .collect();

    let rest = amount % 100;
    if rest > 0 {
        parts.push(two_digits(rest));
    }

    parts.join(" ")
}

/// The printed "amount in words" line for a rupee amount.
///
/// The amount is rounded to whole rupees first.
#[must_use]
pub fn rupees_in_words(amount: Decimal) -> String {
    let rounded = round_to_rupee(amount.abs());
    let Some(whole) = rounded.to_u64() else {
        return WORDS_OVERFLOW.to_string();
    };
    let words = amount_to_words(whole);
    if words == WORDS_OVERFLOW {
        return words;
    }
    if amount.is_sign_negative() && whole > 0 {
        format!("Minus Rupees {words} Only")
    } else {
        format!("Rupees {words} Only")
    }
}

fn two_digits(n: u64) -> String {
    let n = usize::try_from(n % 100).unwrap_or_default();
    if n < 20 {
        return ONES[n].to_string();
    }
    let (tens, ones) = (TENS[n / 10], ONES[n % 10]);
    if ones.is_empty() {
        tens.to_string()
    } else {
        format!("{tens} {ones}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(0, "Zero")]
    #[case(7, "Seven")]
    #[case(19, "Nineteen")]
    #[case(40, "Forty")]
    #[case(99, "Ninety Nine")]
    #[case(100, "One Hundred")]
    #[case(105, "One Hundred Five")]
    #[case(5_900, "Five Thousand Nine Hundred")]
    #[case(12_345, "Twelve Thousand Three Hundred Forty Five")]
    #[case(100_000, "One Lakh")]
    #[case(150_000, "One Lakh Fifty Thousand")]
    #[case(2_500_050, "Twenty Five Lakh Fifty")]
    #[case(10_000_000, "One Crore")]
    #[case(999_999_999, "Ninety Nine Crore Ninety Nine Lakh Ninety Nine Thousand Nine Hundred Ninety Nine")]
    fn test_amount_to_words(#[case] amount: u64, #[case] expected: &str) {
        assert_eq!(amount_to_words(amount), expected);
    }

    #[rstest]
    #[case(1_000_000_000)]
    #[case(u64::MAX)]
    fn test_amount_to_words_overflow(#[case] amount: u64) {
        assert_eq!(amount_to_words(amount), WORDS_OVERFLOW);
    }

    #[test]
    fn test_rupees_in_words_rounds() {
        assert_eq!(rupees_in_words(dec!(5899.50)), "Rupees Five Thousand Nine Hundred Only");
        assert_eq!(rupees_in_words(dec!(0)), "Rupees Zero Only");
        assert_eq!(rupees_in_words(dec!(-250)), "Minus Rupees Two Hundred Fifty Only");
    }
}
