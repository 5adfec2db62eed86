//! Locale-aware numeric parsing and formatting.
//!
//! A [`NumericFormat`] describes how numbers are written in the active
//! locale: the decimal separator, an optional digit group separator, and
//! the number of decimal places used for currency amounts. The same value
//! drives both the parse and the format direction so a database loaded
//! with one convention is written back with the same convention.

use serde::{Deserialize, Serialize};

use crate::error::NumericError;

/// Numeric parse/format conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericFormat {
    decimal_separator: char,
    group_separator: Option<char>,
    currency_decimal_places: u8,
}

impl Default for NumericFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: Some(','),
            currency_decimal_places: 2,
        }
    }
}

impl NumericFormat {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decimal_separator(mut self, sep: char) -> Self {
        self.decimal_separator = sep;
        self
    }

    #[must_use]
    pub fn with_group_separator(mut self, sep: Option<char>) -> Self {
        self.group_separator = sep;
        self
    }

    #[must_use]
    pub fn with_currency_decimal_places(mut self, places: u8) -> Self {
        self.currency_decimal_places = places;
        self
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn group_separator(&self) -> Option<char> {
        self.group_separator
    }

    /// Parses an integer. The decimal separator is prohibited; group
    /// separators are accepted between digits.
    pub fn parse_integer(&self, text: &str) -> Result<i64, NumericError> {
        let trimmed = text.trim();
        if trimmed.contains(self.decimal_separator) {
            return Err(NumericError::NotInteger(text.to_string()));
        }
        let digits = self
            .strip_grouping(trimmed)
            .ok_or_else(|| NumericError::NotInteger(text.to_string()))?;
        digits
            .parse::<i64>()
            .map_err(|_| NumericError::NotInteger(text.to_string()))
    }

    /// Parses a decimal number. No exponent notation; that is recognized
    /// separately, before the locale parse is attempted.
    pub fn parse_decimal(&self, text: &str) -> Result<f64, NumericError> {
        let trimmed = text.trim();
        let err = || NumericError::NotDecimal(text.to_string());
        let mut parts = trimmed.splitn(2, self.decimal_separator);
        let int_part = parts.next().unwrap_or("");
        let frac_part = parts.next();

        let mut canonical = self.strip_grouping(int_part).ok_or_else(err)?;
        if let Some(frac) = frac_part {
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(err());
            }
            canonical.push('.');
            canonical.push_str(frac);
        }
        canonical.parse::<f64>().map_err(|_| err())
    }

    /// Formats an integer with digit grouping.
    pub fn format_integer(&self, value: i64) -> String {
        let raw = value.abs().to_string();
        let grouped = self.group_digits(&raw);
        if value < 0 { format!("-{grouped}") } else { grouped }
    }

    /// Formats a decimal number, shortest form.
    pub fn format_decimal(&self, value: f64) -> String {
        self.relocalize(&format!("{value}"))
    }

    /// Formats a currency amount with the configured decimal places.
    pub fn format_currency(&self, symbol: &str, value: f64) -> String {
        let places = usize::from(self.currency_decimal_places);
        format!("{symbol}{}", self.relocalize(&format!("{value:.places$}")))
    }

    /// Removes group separators, validating that each one sits between
    /// digits. Returns `None` when the remaining text is not sign+digits.
    fn strip_grouping(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let chars: Vec<char> = text.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            if Some(c) == self.group_separator {
                let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
                let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if !prev_digit || !next_digit {
                    return None;
                }
                continue;
            }
            out.push(c);
        }
        let rest = out.strip_prefix(['+', '-']).unwrap_or(&out);
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(out)
    }

    /// Rewrites a canonical `-?digits(.digits)?` rendering into the active
    /// locale: grouped integer part, locale decimal separator.
    fn relocalize(&self, canonical: &str) -> String {
        let (sign, rest) = match canonical.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", canonical),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rest, None),
        };
        let mut out = String::new();
        out.push_str(sign);
        out.push_str(&self.group_digits(int_part));
        if let Some(frac) = frac_part {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out
    }

    fn group_digits(&self, digits: &str) -> String {
        let Some(sep) = self.group_separator else {
            return digits.to_string();
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return digits.to_string();
        }
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        let offset = digits.len() % 3;
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && i % 3 == offset {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        let fmt = NumericFormat::default();
        assert_eq!(fmt.parse_integer("42"), Ok(42));
        assert_eq!(fmt.parse_integer("-7"), Ok(-7));
    }

    #[test]
    fn parses_grouped_integer() {
        let fmt = NumericFormat::default();
        assert_eq!(fmt.parse_integer("1,234,567"), Ok(1_234_567));
    }

    #[test]
    fn integer_rejects_decimal_separator() {
        let fmt = NumericFormat::default();
        assert!(fmt.parse_integer("42.5").is_err());
    }

    #[test]
    fn integer_rejects_misplaced_group_separator() {
        let fmt = NumericFormat::default();
        assert!(fmt.parse_integer(",123").is_err());
        assert!(fmt.parse_integer("123,").is_err());
    }

    #[test]
    fn parses_decimal() {
        let fmt = NumericFormat::default();
        assert_eq!(fmt.parse_decimal("42.5"), Ok(42.5));
        assert_eq!(fmt.parse_decimal("1,234.25"), Ok(1234.25));
        assert!(fmt.parse_decimal("abc").is_err());
        assert!(fmt.parse_decimal("1e10").is_err());
    }

    #[test]
    fn european_convention() {
        let fmt = NumericFormat::default()
            .with_decimal_separator(',')
            .with_group_separator(Some('.'));
        assert_eq!(fmt.parse_decimal("1.234,5"), Ok(1234.5));
        assert_eq!(fmt.format_decimal(1234.5), "1.234,5");
    }

    #[test]
    fn formats_round_trip() {
        let fmt = NumericFormat::default();
        assert_eq!(fmt.format_integer(1_234_567), "1,234,567");
        assert_eq!(fmt.format_integer(-42), "-42");
        assert_eq!(fmt.format_decimal(42.5), "42.5");
        assert_eq!(fmt.format_currency("$", 42.5), "$42.50");
    }
}
