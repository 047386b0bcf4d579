//! Cell values and the browser-compatible coercions the dashboard relies on
//!
//! Datasets arrive as JSON, so a cell is one of the four JSON scalars. The
//! helpers here reproduce `String(v)`, `Number(v)` and truthiness exactly as
//! the dashboard front end evaluates them, since bucket keys and filter
//! comparisons depend on those conversions.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Largest integer magnitude that `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single cell of a tabular dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns true for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// The value as a number, only if it already is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// `String(value)`
    pub fn to_js_string(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_js_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// `Number(value)`
    pub fn to_js_number(&self) -> f64 {
        match self {
            CellValue::Null => 0.0,
            CellValue::Bool(true) => 1.0,
            CellValue::Bool(false) => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_js_number(s),
        }
    }

    /// Truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
        }
    }

    /// Total ordering used when sorting axis values.
    ///
    /// Numbers and booleans compare numerically, text compares by code point.
    /// Mixed number/text pairs have no native ordering that is transitive, so
    /// numeric values sort ahead of text in that case.
    pub fn axis_cmp(&self, other: &CellValue) -> Ordering {
        match (self.sort_class(), other.sort_class()) {
            (0, 0) => self.to_js_number().total_cmp(&other.to_js_number()),
            (1, 1) => self.to_js_string().cmp(&other.to_js_string()),
            (a, b) => a.cmp(&b),
        }
    }

    fn sort_class(&self) -> u8 {
        match self {
            CellValue::Number(_) | CellValue::Bool(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Null => 2,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
            serde_json::Value::String(s) => CellValue::Text(s),
            nested => CellValue::Text(nested.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) => serialize_number(*n, serializer),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Serialize a number the way `JSON.stringify` would: integral values without
/// a fractional part, non-finite values as `null`.
pub fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !n.is_finite() {
        serializer.serialize_unit()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

/// `String(n)` for a number
pub fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // JS always signs the exponent
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// `Number(s)` for a string
pub fn parse_js_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust accepts "inf"/"nan" spellings that JS rejects
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_of_numbers() {
        assert_eq!(format_js_number(10.0), "10");
        assert_eq!(format_js_number(-2.5), "-2.5");
        assert_eq!(format_js_number(0.1), "0.1");
        assert_eq!(format_js_number(2020.0), "2020");
        assert_eq!(format_js_number(1e21), "1e+21");
        assert_eq!(format_js_number(1.5e-7), "1.5e-7");
        assert_eq!(format_js_number(f64::NAN), "NaN");
        assert_eq!(format_js_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_js_number_coercion() {
        assert_eq!(parse_js_number(" 12 "), 12.0);
        assert_eq!(parse_js_number(""), 0.0);
        assert_eq!(parse_js_number("1e3"), 1000.0);
        assert_eq!(parse_js_number("0x10"), 16.0);
        assert!(parse_js_number("abc").is_nan());
        assert!(parse_js_number("inf").is_nan());
        assert!(parse_js_number("12px").is_nan());
        assert_eq!(CellValue::Bool(true).to_js_number(), 1.0);
        assert_eq!(CellValue::Null.to_js_number(), 0.0);
    }

    #[test]
    fn test_truthiness() {
        assert!(!CellValue::Number(0.0).is_truthy());
        assert!(!CellValue::Number(f64::NAN).is_truthy());
        assert!(!CellValue::Text(String::new()).is_truthy());
        assert!(!CellValue::Bool(false).is_truthy());
        assert!(CellValue::Text("0".into()).is_truthy());
        assert!(CellValue::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_json_decoding() {
        let value: CellValue = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(value, CellValue::Text("[1,2]".into()));

        let value: CellValue = serde_json::from_str("null").unwrap();
        assert!(value.is_null());

        let value: CellValue = serde_json::from_str("3").unwrap();
        assert_eq!(value.as_number(), Some(3.0));
    }

    #[test]
    fn test_integral_numbers_serialize_without_fraction() {
        let json = serde_json::to_string(&CellValue::Number(15.0)).unwrap();
        assert_eq!(json, "15");
        let json = serde_json::to_string(&CellValue::Number(f64::NAN)).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_axis_ordering() {
        let a = CellValue::Text("2020".into());
        let b = CellValue::Text("2021".into());
        assert_eq!(a.axis_cmp(&b), Ordering::Less);
        assert_eq!(CellValue::Number(9.0).axis_cmp(&CellValue::Number(10.0)), Ordering::Less);
        assert_eq!(CellValue::Number(99.0).axis_cmp(&CellValue::Text("1".into())), Ordering::Less);
    }
}
