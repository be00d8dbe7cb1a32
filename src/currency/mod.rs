//! Money formatting with locale-specific digit grouping.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-known symbol for the code, falling back to the code itself.
    pub fn symbol(&self) -> String {
        match self.0.as_str() {
            "INR" => "₹".into(),
            "USD" => "$".into(),
            "EUR" => "€".into(),
            "GBP" => "£".into(),
            "JPY" => "¥".into(),
            other => format!("{} ", other),
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("INR")
    }
}

/// How integer digits are grouped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DigitGrouping {
    /// 1,234,567
    Western,
    /// 12,34,567
    Indian,
}

impl DigitGrouping {
    pub fn for_locale(locale: &str) -> Self {
        if locale.ends_with("-IN") {
            DigitGrouping::Indian
        } else {
            DigitGrouping::Western
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegativeStyle {
    Sign,
    Parentheses,
}

/// Renders amounts as `₹39,600`-style strings.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyFormatter {
    pub symbol: String,
    pub grouping: DigitGrouping,
    pub fraction_digits: usize,
    pub negative_style: NegativeStyle,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self {
            symbol: CurrencyCode::default().symbol(),
            grouping: DigitGrouping::Indian,
            fraction_digits: 0,
            negative_style: NegativeStyle::Sign,
        }
    }
}

impl CurrencyFormatter {
    pub fn new(code: &CurrencyCode, locale: &str) -> Self {
        Self {
            symbol: code.symbol(),
            grouping: DigitGrouping::for_locale(locale),
            ..Self::default()
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_fraction_digits(mut self, digits: usize) -> Self {
        self.fraction_digits = digits;
        self
    }

    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{}—", self.symbol);
        }
        let fixed = format!("{:.*}", self.fraction_digits, amount.abs());
        let (integer, fraction) = match fixed.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (fixed.as_str(), None),
        };
        let mut body = format!("{}{}", self.symbol, group_digits(integer, self.grouping));
        if let Some(fraction) = fraction {
            body.push('.');
            body.push_str(fraction);
        }
        let is_negative = amount < 0.0 && fixed.chars().any(|ch| ch.is_ascii_digit() && ch != '0');
        match (is_negative, self.negative_style) {
            (false, _) => body,
            (true, NegativeStyle::Sign) => format!("-{}", body),
            (true, NegativeStyle::Parentheses) => format!("({})", body),
        }
    }
}

fn group_digits(digits: &str, grouping: DigitGrouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let group = match grouping {
        DigitGrouping::Western => 3,
        DigitGrouping::Indian => 2,
    };
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}
