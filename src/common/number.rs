//! Locale-flexible decimal parsing.
//!
//! Source documents write decimals either with a point or with a comma
//! ("12.5" or "12,5"). Both are accepted; anything else that does not
//! parse to a finite number is left to the caller to store as text.

/// Parse a decimal number accepting `.` or `,` as the decimal separator.
///
/// Surrounding whitespace is ignored. Returns `None` for blank input, for
/// values that are not numbers, and for non-finite results (`NaN`,
/// infinities), which a ledger cell cannot hold.
///
/// # Examples
///
/// ```
/// use sheet_ledger::common::parse_decimal;
///
/// assert_eq!(parse_decimal("12,5"), Some(12.5));
/// assert_eq!(parse_decimal(" 12.5 "), Some(12.5));
/// assert_eq!(parse_decimal("N/A"), None);
/// ```
pub fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace(',', ".");
    fast_float2::parse::<f64, _>(normalized.as_bytes())
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn comma_and_point_agree() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal("7"), Some(7.0));
        assert_eq!(parse_decimal("-0,25"), Some(-0.25));
    }

    #[test]
    fn rejects_text_and_blank() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("N/A"), None);
        assert_eq!(parse_decimal("12 kg"), None);
        assert_eq!(parse_decimal("1,234.5"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    proptest! {
        #[test]
        fn separator_choice_does_not_change_value(whole in 0u32..1_000_000, frac in 0u32..1000) {
            let dotted = format!("{}.{:03}", whole, frac);
            let commaed = format!("{},{:03}", whole, frac);
            let a = parse_decimal(&dotted);
            prop_assert!(a.is_some());
            prop_assert_eq!(a, parse_decimal(&commaed));
        }
    }
}
