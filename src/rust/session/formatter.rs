use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::provider::RawPrediction;

pub const POSITIVE_SYMBOL: &str = "😊";
pub const NEGATIVE_SYMBOL: &str = "😔";
pub const NEUTRAL_SYMBOL: &str = "😐";

lazy_static! {
    static ref DEFAULT_SYMBOLS: SymbolTable = SymbolTable::new(NEGATIVE_SYMBOL)
        .with_symbol("POSITIVE", POSITIVE_SYMBOL)
        .with_symbol("NEGATIVE", NEGATIVE_SYMBOL)
        .with_symbol("NEUTRAL", NEUTRAL_SYMBOL);
}

/// A presentation-ready classification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResult {
    /// The predicted label, unchanged from the model
    pub label: String,
    /// Symbol derived from the label
    pub symbol: String,
    /// Confidence as a whole percentage in `[0, 100]`
    pub percent: u8,
}

impl fmt::Display for FormattedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}%", self.label, self.symbol, self.percent)
    }
}

/// Total mapping from labels to display symbols.
///
/// Lookups are ASCII case-insensitive. Labels without an explicit entry map to
/// the fallback symbol, so every label has a defined symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, String>,
    fallback: String,
}

impl SymbolTable {
    /// Creates an empty table that maps every label to `fallback`
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            symbols: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Adds or replaces the symbol for `label`
    pub fn with_symbol(mut self, label: impl AsRef<str>, symbol: impl Into<String>) -> Self {
        self.symbols
            .insert(label.as_ref().to_ascii_uppercase(), symbol.into());
        self
    }

    pub fn symbol_for(&self, label: &str) -> &str {
        self.symbols
            .get(&label.to_ascii_uppercase())
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Returns true when `symbol` can be produced by this table
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.fallback == symbol || self.symbols.values().any(|s| s == symbol)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        DEFAULT_SYMBOLS.clone()
    }
}

/// Maps raw predictions to [`FormattedResult`]s. Pure and infallible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFormatter {
    symbols: SymbolTable,
}

impl ResultFormatter {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Formats a raw prediction
    ///
    /// # Example
    /// ```
    /// use sentiment_session::{RawPrediction, ResultFormatter};
    ///
    /// let formatted = ResultFormatter::default().format(&RawPrediction::new("POSITIVE", 0.957));
    /// assert_eq!(formatted.percent, 96);
    /// assert_eq!(formatted.to_string(), "POSITIVE 😊 96%");
    /// ```
    pub fn format(&self, raw: &RawPrediction) -> FormattedResult {
        FormattedResult {
            label: raw.label.clone(),
            symbol: self.symbols.symbol_for(&raw.label).to_string(),
            percent: to_percent(raw.score),
        }
    }
}

/// Rounds half-up to a whole percentage, clamped to `[0, 100]`. NaN maps to 0.
pub(crate) fn to_percent(score: f32) -> u8 {
    let scaled = (f64::from(score) * 100.0).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rounds_half_up() {
        let formatted = ResultFormatter::default().format(&RawPrediction::new("POSITIVE", 0.957));
        assert_eq!(
            formatted,
            FormattedResult {
                label: "POSITIVE".into(),
                symbol: POSITIVE_SYMBOL.into(),
                percent: 96,
            }
        );
    }

    #[test]
    fn test_negative_midpoint() {
        let formatted = ResultFormatter::default().format(&RawPrediction::new("NEGATIVE", 0.5));
        assert_eq!(formatted.percent, 50);
        assert_eq!(formatted.symbol, NEGATIVE_SYMBOL);
    }

    #[test]
    fn test_percent_bounds() {
        assert_eq!(to_percent(0.0), 0);
        assert_eq!(to_percent(1.0), 100);
        assert_eq!(to_percent(0.006), 1);
        assert_eq!(to_percent(0.125), 13);
        assert_eq!(to_percent(1.7), 100);
        assert_eq!(to_percent(-0.3), 0);
        assert_eq!(to_percent(f32::NAN), 0);
        assert_eq!(to_percent(f32::INFINITY), 100);
    }

    #[test]
    fn test_unknown_label_uses_fallback() {
        let formatter = ResultFormatter::default();
        let formatted = formatter.format(&RawPrediction::new("LABEL_7", 0.42));
        assert_eq!(formatted.symbol, formatter.symbols().fallback());
        assert_eq!(formatted.percent, 42);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = SymbolTable::default();
        assert_eq!(table.symbol_for("positive"), POSITIVE_SYMBOL);
        assert_eq!(table.symbol_for("Neutral"), NEUTRAL_SYMBOL);
    }

    #[test]
    fn test_custom_table() {
        let table = SymbolTable::new("?")
            .with_symbol("joy", "🎉")
            .with_symbol("anger", "😠");
        let formatter = ResultFormatter::new(table);
        assert_eq!(formatter.format(&RawPrediction::new("JOY", 0.8)).symbol, "🎉");
        assert_eq!(formatter.format(&RawPrediction::new("fear", 0.8)).symbol, "?");
        assert!(formatter.symbols().contains_symbol("😠"));
        assert!(!formatter.symbols().contains_symbol("😊"));
    }

    #[test]
    fn test_display_matches_reference_output() {
        let formatted = ResultFormatter::default().format(&RawPrediction::new("NEGATIVE", 0.994));
        assert_eq!(formatted.to_string(), "NEGATIVE 😔 99%");
    }
}
