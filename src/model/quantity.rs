//! Quantity values with units

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;

/// A numeric value paired with a unit string
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    /// Numeric value
    pub value: Decimal,
    /// Unit: a UCUM code or a calendar duration word
    pub unit: String,
}

/// Calendar duration words normalized to their UCUM codes.
static WORD_TO_UCUM: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    for (word, code) in [
        ("year", "a"),
        ("years", "a"),
        ("month", "mo"),
        ("months", "mo"),
        ("week", "wk"),
        ("weeks", "wk"),
        ("day", "d"),
        ("days", "d"),
        ("hour", "h"),
        ("hours", "h"),
        ("minute", "min"),
        ("minutes", "min"),
        ("second", "s"),
        ("seconds", "s"),
        ("millisecond", "ms"),
        ("milliseconds", "ms"),
    ] {
        m.insert(word, code);
    }
    m
});

/// Milliseconds per definite-duration unit. Years and months vary in length
/// and are deliberately absent; they only compare against themselves.
static MS_PER_UNIT: Lazy<FxHashMap<&'static str, i64>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("ms", 1);
    m.insert("s", 1_000);
    m.insert("min", 60_000);
    m.insert("h", 3_600_000);
    m.insert("d", 86_400_000);
    m.insert("wk", 604_800_000);
    m
});

impl Quantity {
    /// Build a quantity.
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Quantity {
            value,
            unit: unit.into(),
        }
    }

    fn normalized_unit(&self) -> &str {
        WORD_TO_UCUM
            .get(self.unit.as_str())
            .copied()
            .unwrap_or(self.unit.as_str())
    }

    /// Unit-aware comparison. Equal units compare numerically; definite
    /// durations convert through milliseconds; any other unit pair has no
    /// verdict (`None`).
    pub fn compare(&self, other: &Quantity) -> Option<Ordering> {
        let a_unit = self.normalized_unit();
        let b_unit = other.normalized_unit();
        if a_unit == b_unit {
            return self.value.partial_cmp(&other.value);
        }
        let a_ms = MS_PER_UNIT.get(a_unit)?;
        let b_ms = MS_PER_UNIT.get(b_unit)?;
        (self.value * Decimal::from(*a_ms)).partial_cmp(&(other.value * Decimal::from(*b_ms)))
    }

    /// Equivalence: comparable and equal.
    pub fn equivalent(&self, other: &Quantity) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_unit_compares_numerically() {
        let a = Quantity::new(Decimal::from(5), "mg");
        let b = Quantity::new(Decimal::from(7), "mg");
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn calendar_words_normalize_to_ucum() {
        let a = Quantity::new(Decimal::from(1), "week");
        let b = Quantity::new(Decimal::from(7), "d");
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn incommensurable_units_have_no_verdict() {
        let a = Quantity::new(Decimal::from(5), "mg");
        let b = Quantity::new(Decimal::from(5), "wk");
        assert_eq!(a.compare(&b), None);
    }

    #[test]
    fn variable_length_units_only_match_themselves() {
        let a = Quantity::new(Decimal::from(1), "year");
        let b = Quantity::new(Decimal::from(12), "mo");
        assert_eq!(a.compare(&b), None);
        let c = Quantity::new(Decimal::from(1), "a");
        assert_eq!(a.compare(&c), Some(Ordering::Equal));
    }
}
