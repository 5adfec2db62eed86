//! Cell coercion.
//!
//! Turns raw cell text into a typed [`Datum`] through an ordered fallback
//! chain:
//!
//! 1. empty text is the unknown datum
//! 2. a registered currency prefix followed by a locale decimal is a
//!    currency value; a currency prefix followed by anything else is a
//!    plain string
//! 3. scientific notation is a decimal value
//! 4. a parseable temporal form is a date/time/datetime value
//! 5. a locale integer is an integer value
//! 6. a locale decimal is a decimal value
//! 7. everything else is a string
//!
//! The scientific-notation rule runs before the locale parses on purpose:
//! a locale whose group separator is `.` would otherwise mis-read forms
//! like `1.5e10`.

use crate::datum::Datum;
use crate::julian::Julian;
use crate::numfmt::NumericFormat;

/// Currency prefixes registered out of the box.
pub const DEFAULT_CURRENCY_SYMBOLS: [&str; 6] = ["$", "\u{a3}", "\u{a5}", "\u{20ac}", "\u{a4}", "\u{20a9}"];

/// Coercion context: numeric conventions, the currency registry, and
/// whether temporal parsing is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct DatumCoercer {
    format: NumericFormat,
    currency_symbols: Vec<String>,
    parse_temporal: bool,
}

impl Default for DatumCoercer {
    fn default() -> Self {
        Self {
            format: NumericFormat::default(),
            currency_symbols: DEFAULT_CURRENCY_SYMBOLS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            parse_temporal: true,
        }
    }
}

impl DatumCoercer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: NumericFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_temporal(mut self, parse_temporal: bool) -> Self {
        self.parse_temporal = parse_temporal;
        self
    }

    pub fn format(&self) -> &NumericFormat {
        &self.format
    }

    /// Registers an additional currency symbol. Already-registered
    /// symbols are left alone.
    pub fn register_currency(&mut self, symbol: &str) {
        if !self.is_currency_symbol(symbol) {
            self.currency_symbols.push(symbol.to_string());
        }
    }

    pub fn is_currency_symbol(&self, symbol: &str) -> bool {
        self.currency_symbols.iter().any(|s| s == symbol)
    }

    /// Coerces raw cell text into a datum.
    pub fn coerce(&self, raw: &str) -> Datum {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Datum::Unknown;
        }

        if let Some(symbol) = self.currency_prefix(trimmed) {
            let amount = &trimmed[symbol.len()..];
            return match self.format.parse_decimal(amount) {
                Ok(value) => Datum::Currency {
                    value,
                    symbol: symbol.to_string(),
                    original: Some(raw.to_string()),
                },
                Err(_) => Datum::String {
                    text: raw.to_string(),
                },
            };
        }

        if is_scientific(trimmed) {
            if let Ok(value) = trimmed.parse::<f64>() {
                return Datum::Decimal {
                    value,
                    original: Some(raw.to_string()),
                };
            }
        }

        if self.parse_temporal {
            if let Ok(julian) = Julian::parse(trimmed) {
                return Datum::from_julian(&julian, raw);
            }
        }

        if let Ok(value) = self.format.parse_integer(trimmed) {
            return Datum::Integer {
                value,
                original: Some(raw.to_string()),
            };
        }
        if let Ok(value) = self.format.parse_decimal(trimmed) {
            return Datum::Decimal {
                value,
                original: Some(raw.to_string()),
            };
        }

        Datum::String {
            text: raw.to_string(),
        }
    }

    fn currency_prefix<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.currency_symbols
            .iter()
            .find(|symbol| text.starts_with(symbol.as_str()))
            .map(String::as_str)
    }
}

/// `[+-]? digits (.digits)? [eE] [+-]? digits`, nothing else.
fn is_scientific(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mantissa_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == mantissa_start {
        return false;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let frac_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    }
    if !matches!(bytes.get(i), Some(b'e' | b'E')) {
        return false;
    }
    i += 1;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    let exp_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i > exp_start && i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::DatumType;

    fn coerced_type(raw: &str) -> DatumType {
        DatumCoercer::default().coerce(raw).datum_type()
    }

    #[test]
    fn empty_is_unknown() {
        assert_eq!(coerced_type(""), DatumType::Unknown);
        assert_eq!(coerced_type("   "), DatumType::Unknown);
    }

    #[test]
    fn ordered_fallback_chain() {
        assert_eq!(coerced_type("1e10"), DatumType::Decimal);
        assert_eq!(coerced_type("42"), DatumType::Integer);
        assert_eq!(coerced_type("42.5"), DatumType::Decimal);
        assert_eq!(coerced_type("$42.50"), DatumType::Currency);
        assert_eq!(coerced_type("2023-01-15"), DatumType::Date);
        assert_eq!(coerced_type("10:30:15"), DatumType::Time);
        assert_eq!(coerced_type("2023-01-15 10:30"), DatumType::DateTime);
        assert_eq!(coerced_type("hello"), DatumType::String);
    }

    #[test]
    fn currency_payload_and_original() {
        let datum = DatumCoercer::default().coerce("$42.50");
        assert_eq!(datum.numeric_value(), Some(42.5));
        assert_eq!(datum.currency_symbol(), Some("$"));
        assert_eq!(datum.original(), Some("$42.50"));
    }

    #[test]
    fn currency_prefix_with_bad_amount_is_string() {
        assert_eq!(coerced_type("$price"), DatumType::String);
    }

    #[test]
    fn euro_symbol_recognized() {
        let datum = DatumCoercer::default().coerce("\u{20ac}9.99");
        assert_eq!(datum.datum_type(), DatumType::Currency);
        assert_eq!(datum.currency_symbol(), Some("\u{20ac}"));
    }

    #[test]
    fn registered_symbol_takes_effect() {
        let mut coercer = DatumCoercer::default();
        assert_eq!(coercer.coerce("CHF10").datum_type(), DatumType::String);
        coercer.register_currency("CHF");
        assert_eq!(coercer.coerce("CHF10").datum_type(), DatumType::Currency);
    }

    #[test]
    fn scientific_beats_locale_parse() {
        // With '.' as the group separator, "1.5e3" must still be decimal.
        let coercer = DatumCoercer::default().with_format(
            NumericFormat::default()
                .with_decimal_separator(',')
                .with_group_separator(Some('.')),
        );
        let datum = coercer.coerce("1.5e3");
        assert_eq!(datum.datum_type(), DatumType::Decimal);
        assert_eq!(datum.numeric_value(), Some(1500.0));
    }

    #[test]
    fn temporal_can_be_disabled() {
        let coercer = DatumCoercer::default().with_temporal(false);
        assert_eq!(coercer.coerce("2023-01-15").datum_type(), DatumType::String);
    }

    #[test]
    fn grouped_integer() {
        let datum = DatumCoercer::default().coerce("1,234");
        assert_eq!(datum.datum_type(), DatumType::Integer);
        assert_eq!(datum.numeric_value(), Some(1234.0));
        assert_eq!(datum.original(), Some("1,234"));
    }

    #[test]
    fn negative_number_is_not_a_date() {
        assert_eq!(coerced_type("-42"), DatumType::Integer);
        assert_eq!(coerced_type("-42.5"), DatumType::Decimal);
    }

    #[test]
    fn scientific_shape_checks() {
        assert!(is_scientific("1e10"));
        assert!(is_scientific("-1.5E+3"));
        assert!(!is_scientific("e10"));
        assert!(!is_scientific("1e"));
        assert!(!is_scientific("1.e3"));
        assert!(!is_scientific("1e10x"));
    }
}
