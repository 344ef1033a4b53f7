//! Style identifier canonicalization.
//!
//! Sales, returns and catalog exports spell the same style differently:
//! mixed case, stray padding, and numeric codes that a spreadsheet saved as
//! `123.0`. Every join in the pipeline goes through [`normalize_style_key`].

/// A raw style identifier as it can appear in an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleValue<'a> {
    Null,
    Text(&'a str),
    Number(f64),
}

impl<'a> From<&'a str> for StyleValue<'a> {
    fn from(s: &'a str) -> Self {
        StyleValue::Text(s)
    }
}

impl<'a> From<&'a String> for StyleValue<'a> {
    fn from(s: &'a String) -> Self {
        StyleValue::Text(s.as_str())
    }
}

impl<'a> From<Option<&'a str>> for StyleValue<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(StyleValue::Null, StyleValue::Text)
    }
}

impl From<f64> for StyleValue<'_> {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<i64> for StyleValue<'_> {
    fn from(n: i64) -> Self {
        StyleValue::Number(n as f64)
    }
}

/// Normalize a raw style identifier into the join key.
///
/// Null becomes the empty string. Whole numbers lose their fractional part
/// (`"123.0"`, `123` and `"123"` all become `"123"`), then the result is
/// lowercased. Normalizing a normalized key returns it unchanged.
pub fn normalize_style_key<'a, V: Into<StyleValue<'a>>>(value: V) -> String {
    match value.into() {
        StyleValue::Null => String::new(),
        StyleValue::Number(n) => integral_text(n).unwrap_or_else(|| n.to_string().to_lowercase()),
        StyleValue::Text(s) => {
            let s = s.trim();
            let s = match s.parse::<f64>() {
                Ok(n) => integral_text(n).unwrap_or_else(|| s.to_string()),
                Err(_) => s.to_string(),
            };
            s.to_lowercase()
        }
    }
}

// Integer text for finite whole numbers that fit an i64 exactly.
fn integral_text(n: f64) -> Option<String> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(format!("{}", n as i64))
    } else {
        None
    }
}
