//! Currency display formatting.
//!
//! The profile's currency preference drives how amounts render everywhere in
//! the client. Formatting is display-only; amounts stay plain numbers on the
//! wire.

/// Formats an amount with the symbol for the given ISO 4217 code.
///
/// Known codes render with their symbol (`$1,234.56`); anything else falls
/// back to `CODE 1,234.56`.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let formatted = group_thousands(amount.abs());
    match symbol_for(currency) {
        Some(symbol) => format!("{sign}{symbol}{formatted}"),
        None => format!("{sign}{} {formatted}", currency.to_uppercase()),
    }
}

fn symbol_for(currency: &str) -> Option<&'static str> {
    match currency.to_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        "INR" => Some("\u{20b9}"),
        "JPY" => Some("\u{a5}"),
        "BRL" => Some("R$"),
        _ => None,
    }
}

/// Renders a non-negative amount with two decimals and comma-grouped digits.
fn group_thousands(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    format!("{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: known currencies use their symbol, unknown codes fall back.
    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_amount(80.0, "EUR"), "\u{20ac}80.00");
        assert_eq!(format_amount(1_000_000.0, "usd"), "$1,000,000.00");
        assert_eq!(format_amount(42.0, "CHF"), "CHF 42.00");
    }

    /// Test: negative amounts keep the sign ahead of the grouped digits.
    #[test]
    fn test_negative_amount() {
        assert_eq!(format_amount(-1234.56, "USD"), "-$1,234.56");
    }
}
