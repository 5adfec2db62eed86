//! Typed cell values.
//!
//! Every cell holds a [`Datum`]: a tagged value carrying its parsed
//! payload and, for values produced by coercion, the original text the
//! payload was parsed from. Formatting prefers the original text, so a
//! loaded file writes back byte-identically; any operation that changes
//! the payload drops the original form.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::julian::Julian;
use crate::numfmt::NumericFormat;

/// The eight datum types with their persisted ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatumType {
    Unknown,
    String,
    Integer,
    Decimal,
    Currency,
    DateTime,
    Date,
    Time,
}

impl DatumType {
    /// The persisted type id.
    pub fn id(self) -> i8 {
        match self {
            Self::Unknown => -1,
            Self::String => 0,
            Self::Integer => 1,
            Self::Decimal => 2,
            Self::Currency => 3,
            Self::DateTime => 4,
            Self::Date => 5,
            Self::Time => 6,
        }
    }

    pub fn from_id(id: i8) -> Option<Self> {
        match id {
            -1 => Some(Self::Unknown),
            0 => Some(Self::String),
            1 => Some(Self::Integer),
            2 => Some(Self::Decimal),
            3 => Some(Self::Currency),
            4 => Some(Self::DateTime),
            5 => Some(Self::Date),
            6 => Some(Self::Time),
            _ => None,
        }
    }

    /// True for every type with a numeric payload (id > 0).
    pub fn is_numeric(self) -> bool {
        self.id() > 0
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::Date | Self::Time)
    }

    /// Column type promotion when a value of type `observed` is added to
    /// a column currently of type `self`.
    ///
    /// UNKNOWN and INTEGER widen to whatever is observed; DECIMAL widens
    /// to anything except INTEGER; CURRENCY narrows only to STRING; every
    /// other column type is unchanged.
    #[must_use]
    pub fn promote(self, observed: Self) -> Self {
        match self {
            Self::Unknown | Self::Integer => observed,
            Self::Decimal => {
                if observed == Self::Integer {
                    Self::Decimal
                } else {
                    observed
                }
            }
            Self::Currency => {
                if observed == Self::String {
                    Self::String
                } else {
                    Self::Currency
                }
            }
            _ => self,
        }
    }

    /// The dominant type of a pair, used when combining values rather
    /// than observing them in sequence.
    #[must_use]
    pub fn dominant(a: Self, b: Self) -> Self {
        if a == Self::Unknown {
            return b;
        }
        if b == Self::Unknown {
            return a;
        }
        if a == Self::String || b == Self::String {
            return Self::String;
        }
        if a == Self::Currency || b == Self::Currency {
            return Self::Currency;
        }
        if a == Self::DateTime || b == Self::DateTime {
            return Self::DateTime;
        }
        if a.is_temporal() || b.is_temporal() {
            if (a, b) == (Self::Date, Self::Integer) || (a, b) == (Self::Integer, Self::Date) {
                return Self::Date;
            }
            return Self::DateTime;
        }
        if a.id() >= b.id() { a } else { b }
    }
}

/// A typed cell value.
///
/// `original` is the source text the value was coerced from, when there
/// was one. It is what formatting emits; constructors that compute a new
/// payload leave it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Datum {
    Unknown,
    String {
        text: String,
    },
    Integer {
        value: i64,
        original: Option<String>,
    },
    Decimal {
        value: f64,
        original: Option<String>,
    },
    Currency {
        value: f64,
        symbol: String,
        original: Option<String>,
    },
    DateTime {
        julian_date: f64,
        original: Option<String>,
    },
    Date {
        julian_day: i64,
        original: Option<String>,
    },
    Time {
        julian_time: f64,
        original: Option<String>,
    },
}

impl Datum {
    /// Wraps a parsed temporal value, picking the datum kind from the
    /// components it carries.
    pub fn from_julian(julian: &Julian, original: impl Into<String>) -> Self {
        let original = Some(original.into());
        if julian.has_date() && julian.has_time() {
            Self::DateTime {
                julian_date: julian.julian_date(),
                original,
            }
        } else if julian.has_date() {
            Self::Date {
                julian_day: julian.julian_day(),
                original,
            }
        } else {
            Self::Time {
                julian_time: julian.julian_time(),
                original,
            }
        }
    }

    pub fn datum_type(&self) -> DatumType {
        match self {
            Self::Unknown => DatumType::Unknown,
            Self::String { .. } => DatumType::String,
            Self::Integer { .. } => DatumType::Integer,
            Self::Decimal { .. } => DatumType::Decimal,
            Self::Currency { .. } => DatumType::Currency,
            Self::DateTime { .. } => DatumType::DateTime,
            Self::Date { .. } => DatumType::Date,
            Self::Time { .. } => DatumType::Time,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.datum_type().is_numeric()
    }

    /// The numeric payload, when there is one. Temporal kinds yield their
    /// Julian quantity.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Self::Unknown | Self::String { .. } => None,
            Self::Integer { value, .. } => Some(*value as f64),
            Self::Decimal { value, .. } | Self::Currency { value, .. } => Some(*value),
            Self::DateTime { julian_date, .. } => Some(*julian_date),
            Self::Date { julian_day, .. } => Some(*julian_day as f64),
            Self::Time { julian_time, .. } => Some(*julian_time),
        }
    }

    pub fn original(&self) -> Option<&str> {
        match self {
            Self::Unknown | Self::String { .. } => None,
            Self::Integer { original, .. }
            | Self::Decimal { original, .. }
            | Self::Currency { original, .. }
            | Self::DateTime { original, .. }
            | Self::Date { original, .. }
            | Self::Time { original, .. } => original.as_deref(),
        }
    }

    pub fn currency_symbol(&self) -> Option<&str> {
        match self {
            Self::Currency { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// The textual form of the cell: the original text when the value
    /// still carries one, otherwise a rendering of the payload.
    pub fn text(&self, format: &NumericFormat) -> String {
        if let Some(original) = self.original() {
            return original.to_string();
        }
        match self {
            Self::Unknown => String::new(),
            Self::String { text } => text.clone(),
            Self::Integer { value, .. } => format.format_integer(*value),
            Self::Decimal { value, .. } => format.format_decimal(*value),
            Self::Currency { value, symbol, .. } => format.format_currency(symbol, *value),
            Self::DateTime { julian_date, .. } => {
                Julian::from_julian_date(*julian_date).to_string()
            }
            Self::Date { julian_day, .. } => Julian::from_julian_day(*julian_day).to_string(),
            Self::Time { julian_time, .. } => Julian::from_julian_time(*julian_time).to_string(),
        }
    }

    /// A copy with the numeric payload advanced by `amount` and the
    /// original form dropped. Non-numeric kinds are returned unchanged.
    #[must_use]
    pub fn advanced(&self, amount: f64) -> Self {
        self.recomputed(|value| value + amount)
    }

    /// A copy with the numeric payload scaled by `factor` and the
    /// original form dropped. Non-numeric kinds are returned unchanged.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        self.recomputed(|value| value * factor)
    }

    fn recomputed(&self, op: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Unknown | Self::String { .. } => self.clone(),
            Self::Integer { value, .. } => {
                let result = op(*value as f64);
                if result.fract() == 0.0 {
                    Self::Integer {
                        value: result as i64,
                        original: None,
                    }
                } else {
                    Self::Decimal {
                        value: result,
                        original: None,
                    }
                }
            }
            Self::Decimal { value, .. } => Self::Decimal {
                value: op(*value),
                original: None,
            },
            Self::Currency { value, symbol, .. } => Self::Currency {
                value: op(*value),
                symbol: symbol.clone(),
                original: None,
            },
            Self::DateTime { julian_date, .. } => Self::DateTime {
                julian_date: op(*julian_date),
                original: None,
            },
            Self::Date { julian_day, .. } => Self::Date {
                julian_day: op(*julian_day as f64) as i64,
                original: None,
            },
            Self::Time { julian_time, .. } => Self::Time {
                julian_time: op(*julian_time),
                original: None,
            },
        }
    }

    /// Ordering used for sorting: numeric pairs by payload, anything
    /// else lexically by textual form.
    pub fn compare(&self, other: &Self, format: &NumericFormat) -> Ordering {
        match (self.numeric_value(), other.numeric_value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => self.text(format).cmp(&other.text(format)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_id_round_trip() {
        for ty in [
            DatumType::Unknown,
            DatumType::String,
            DatumType::Integer,
            DatumType::Decimal,
            DatumType::Currency,
            DatumType::DateTime,
            DatumType::Date,
            DatumType::Time,
        ] {
            assert_eq!(DatumType::from_id(ty.id()), Some(ty));
        }
        assert_eq!(DatumType::from_id(7), None);
    }

    #[test]
    fn numeric_predicate() {
        assert!(!DatumType::Unknown.is_numeric());
        assert!(!DatumType::String.is_numeric());
        assert!(DatumType::Integer.is_numeric());
        assert!(DatumType::Time.is_numeric());
    }

    #[test]
    fn promotion_lattice() {
        use DatumType as T;
        assert_eq!(T::Unknown.promote(T::Integer), T::Integer);
        assert_eq!(T::Integer.promote(T::Decimal), T::Decimal);
        assert_eq!(T::Integer.promote(T::String), T::String);
        assert_eq!(T::Decimal.promote(T::Integer), T::Decimal);
        assert_eq!(T::Decimal.promote(T::String), T::String);
        assert_eq!(T::Currency.promote(T::Integer), T::Currency);
        assert_eq!(T::Currency.promote(T::String), T::String);
        assert_eq!(T::String.promote(T::Integer), T::String);
        assert_eq!(T::Date.promote(T::Integer), T::Date);
    }

    #[test]
    fn dominant_table() {
        use DatumType as T;
        assert_eq!(T::dominant(T::Unknown, T::Date), T::Date);
        assert_eq!(T::dominant(T::String, T::Integer), T::String);
        assert_eq!(T::dominant(T::Currency, T::Decimal), T::Currency);
        assert_eq!(T::dominant(T::Date, T::Integer), T::Date);
        assert_eq!(T::dominant(T::Date, T::Time), T::DateTime);
        assert_eq!(T::dominant(T::DateTime, T::Date), T::DateTime);
        assert_eq!(T::dominant(T::Integer, T::Decimal), T::Decimal);
    }

    #[test]
    fn text_prefers_original() {
        let fmt = NumericFormat::default();
        let datum = Datum::Decimal {
            value: 42.5,
            original: Some("042.50".to_string()),
        };
        assert_eq!(datum.text(&fmt), "042.50");
    }

    #[test]
    fn mutation_drops_original() {
        let fmt = NumericFormat::default();
        let datum = Datum::Integer {
            value: 41,
            original: Some("041".to_string()),
        };
        let advanced = datum.advanced(1.0);
        assert_eq!(advanced.original(), None);
        assert_eq!(advanced.text(&fmt), "42");
    }

    #[test]
    fn integer_mutation_can_widen() {
        let datum = Datum::Integer {
            value: 5,
            original: None,
        };
        assert_eq!(datum.scaled(0.5).datum_type(), DatumType::Decimal);
        assert_eq!(datum.scaled(2.0).datum_type(), DatumType::Integer);
    }

    #[test]
    fn comparison_is_numeric_when_possible() {
        let fmt = NumericFormat::default();
        let a = Datum::Integer {
            value: 9,
            original: None,
        };
        let b = Datum::Decimal {
            value: 10.0,
            original: None,
        };
        assert_eq!(a.compare(&b, &fmt), Ordering::Less);

        let s = Datum::String {
            text: "10".to_string(),
        };
        let t = Datum::String {
            text: "9".to_string(),
        };
        // Lexical: "10" < "9".
        assert_eq!(s.compare(&t, &fmt), Ordering::Less);
    }
}
