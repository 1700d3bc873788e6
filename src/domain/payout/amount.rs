//! Numeric tokens found in payout announcements

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Currency glyph used by the payout bot
pub const CURRENCY_GLYPH: char = '⏣';

static CURRENCY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\d.]+)([kKmMbB]?)").expect("currency token pattern is valid")
});

static PLAIN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d.]+)").expect("plain token pattern is valid"));

/// Scale suffix attached to a magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    None,
    Thousand,
    Million,
    Billion,
}

impl Scale {
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.to_ascii_uppercase().as_str() {
            "K" => Scale::Thousand,
            "M" => Scale::Million,
            "B" => Scale::Billion,
            _ => Scale::None,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Scale::None => 1.0,
            Scale::Thousand => 1_000.0,
            Scale::Million => 1_000_000.0,
            Scale::Billion => 1_000_000_000.0,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Scale::None => "",
            Scale::Thousand => "K",
            Scale::Million => "M",
            Scale::Billion => "B",
        }
    }
}

/// A decimal magnitude with an optional scale suffix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericToken {
    pub magnitude: f64,
    pub scale: Scale,
}

impl NumericToken {
    /// Reads the token at the start of `text`.
    ///
    /// Returns `None` when no literal is present or when the literal does not
    /// convert (`1.2.3`, a lone `.`).
    fn lex(text: &str, pattern: &Regex) -> Option<Self> {
        let caps = pattern.captures(text)?;
        let literal = caps.get(1)?.as_str();
        let scale = caps
            .get(2)
            .map(|m| Scale::from_suffix(m.as_str()))
            .unwrap_or(Scale::None);

        match literal.parse::<f64>() {
            Ok(magnitude) => Some(Self { magnitude, scale }),
            Err(e) => {
                tracing::debug!("cannot convert '{}' to a number: {}", literal, e);
                None
            }
        }
    }

    pub fn value(&self) -> f64 {
        self.magnitude * self.scale.multiplier()
    }
}

/// Parses `⏣ 5`, `⏣ 1.5M`, `2,500k` and similar into a plain magnitude.
pub fn parse_currency_value(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let text = raw.replace(CURRENCY_GLYPH, "").replace(',', "");
    let token = NumericToken::lex(text.trim(), &CURRENCY_TOKEN);
    if token.is_none() {
        tracing::debug!("no currency value in '{}'", raw);
    }
    token.map(|t| t.value())
}

/// Parses a leading plain number, e.g. the `2` of `2 users got the payout`.
pub fn parse_plain_count(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let text = raw.replace(',', "");
    NumericToken::lex(text.trim(), &PLAIN_TOKEN).map(|t| t.value())
}
