//! Runtime values and the coercion rules shared by every evaluation path.
//!
//! A [`Value`] is either a number or a string. Operators pick the view they
//! need through [`Value::as_number`] / [`Value::as_string`]; neither view
//! ever fails.

use std::fmt;

/// A dynamically typed runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
}

impl Value {
    /// The empty string, which is what unbound names evaluate to.
    pub fn empty() -> Value {
        Value::Str(String::new())
    }

    pub fn from_bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    /// Numeric view. Strings that do not parse as a float become `0`.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Str(s) => parse_number(s).unwrap_or(0.0),
        }
    }

    /// String view. Numbers use the shortest `%g` representation.
    pub fn as_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Re-type a string that looks numeric as a number.
    ///
    /// Used for values coming out of (or going into) spreadsheet cells so
    /// that `"5"` round trips as the number `5`.
    pub fn from_cell_text(text: &str) -> Value {
        match parse_number(text) {
            Some(n) => Value::Number(n),
            None => Value::Str(text.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Parse a whole string as a float literal.
pub fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Format a number the way `%g` does with the shortest round-trip digits.
///
/// Decimal exponents below -4 or at/above 6 switch to scientific notation
/// with at least two exponent digits (`1e+06`, `1.5e-07`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // `{:e}` yields the shortest digits that round trip, e.g. "1.5e-7".
    let sci = format!("{:e}", n);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_strings_round_trip() {
        for s in ["5", "9.99", "0.5", "-3", "123456", "0.0001"] {
            let v = Value::from_cell_text(s);
            assert!(matches!(v, Value::Number(_)), "{} should be numeric", s);
            assert_eq!(v.as_string(), s);
        }
    }

    #[test]
    fn test_canonical_form_of_numeric_strings() {
        assert_eq!(Value::from_cell_text("5.0").as_string(), "5");
        assert_eq!(Value::from_cell_text("007").as_string(), "7");
        assert_eq!(Value::from_cell_text("1e3").as_string(), "1000");
    }

    #[test]
    fn test_non_numeric_strings_are_zero() {
        for s in ["", "abc", "12abc", " 5", "A1", "--1"] {
            assert_eq!(Value::from(s).as_number(), 0.0, "{:?}", s);
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-0.5).is_truthy());
    }

    #[test]
    fn test_format_number_exponent_switch() {
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1e6), "1e+06");
        assert_eq!(format_number(1234567.0), "1.234567e+06");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(1.5e-7), "1.5e-07");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn test_format_number_special_values() {
        assert_eq!(format_number(f64::INFINITY), "+Inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(0.0), "0");
    }
}
