use std::fmt::{Display, Formatter};

/// A PDF number, which can be integer or real.
///
/// The specification does not require particular bit widths, so `i64` and `f64` were chosen,
/// respectively.
///
/// NB that values with a decimal dot will be parsed as [`Number::Real`], even if they have no 
/// decimal part.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Number {
    Int(i64),
    Real(f64)
}

impl Number {
    /// Parses a numeric token (`17`, `-3`, `+.5`, `4.`).
    pub fn parse(tk: &[u8]) -> Option<Number> {
        let s = std::str::from_utf8(tk).ok()?;
        if !s.bytes().all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.')) {
            return None;
        }
        if s.contains('.') {
            match s.parse::<f64>() {
                Ok(val) => Some(Number::Real(val)),
                Err(_) if s.len() > 1 && s.trim_start_matches(['+', '-']) == "." => Some(Number::Real(0.)),
                Err(_) => None
            }
        } else {
            s.parse::<i64>().ok().map(Number::Int)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(x) => x as f64,
            Number::Real(x) => x
        }
    }
}

impl Display for Number {
    /// Reals always contain a decimal point so that they are read back as reals. Non-finite 
    /// values, which have no PDF representation, are written as `0.0`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Number::Int(x) => write!(f, "{x}"),
            Number::Real(x) if !x.is_finite() => f.write_str("0.0"),
            Number::Real(x) => {
                let s = x.to_string();
                if s.contains('.') {
                    f.write_str(&s)
                } else {
                    write!(f, "{s}.0")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Number::parse(b"123"), Some(Number::Int(123)));
        assert_eq!(Number::parse(b"+17"), Some(Number::Int(17)));
        assert_eq!(Number::parse(b"-98"), Some(Number::Int(-98)));
        assert_eq!(Number::parse(b"0"), Some(Number::Int(0)));
        assert_eq!(Number::parse(b"34.5"), Some(Number::Real(34.5)));
        assert_eq!(Number::parse(b"-3.62"), Some(Number::Real(-3.62)));
        assert_eq!(Number::parse(b"+123.6"), Some(Number::Real(123.6)));
        assert_eq!(Number::parse(b"4."), Some(Number::Real(4.)));
        assert_eq!(Number::parse(b"-.002"), Some(Number::Real(-0.002)));
        assert_eq!(Number::parse(b"0.0"), Some(Number::Real(0.)));
        assert_eq!(Number::parse(b"-."), Some(Number::Real(0.)));
        assert_eq!(Number::parse(b"1.2.3"), None);
        assert_eq!(Number::parse(b"12a"), None);
        assert_eq!(Number::parse(b"--5"), None);
        assert_eq!(Number::parse(b"99999999999999999999"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Int(-5).to_string(), "-5");
        assert_eq!(Number::Real(-1.).to_string(), "-1.0");
        assert_eq!(Number::Real(0.25).to_string(), "0.25");
        assert_eq!(Number::Real(1e20).to_string(), "100000000000000000000.0");
        assert_eq!(Number::Real(0.0000000000000001).to_string(), "0.0000000000000001");
        assert_eq!(Number::Real(f64::NAN).to_string(), "0.0");
    }
}
