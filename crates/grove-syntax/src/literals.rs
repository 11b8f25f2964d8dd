use std::ops::Range;

use grove_core::SmolStr;

use crate::raw::RawKind;

/// The value of a numeric literal.
///
/// Arbitrary precision values keep their (underscore free) digits rather than
/// being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i32),
    Long(i64),
    BigInteger { radix: u32, digits: SmolStr },
    Float(f32),
    Double(f64),
    BigDecimal(SmolStr),
}

impl LiteralValue {
    /// Fully qualified name of the runtime type the literal evaluates to.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Int(_) => "int",
            LiteralValue::Long(_) => "long",
            LiteralValue::BigInteger { .. } => "java.math.BigInteger",
            LiteralValue::Float(_) => "float",
            LiteralValue::Double(_) => "double",
            LiteralValue::BigDecimal(_) => "java.math.BigDecimal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
    /// Byte range within the provided literal text (not file offsets).
    pub span: Range<usize>,
}

fn err(message: impl Into<String>, span: Range<usize>) -> LiteralError {
    LiteralError {
        message: message.into(),
        span,
    }
}

/// Evaluate a numeric literal of the given raw kind.
pub fn parse_number(kind: RawKind, text: &str) -> Result<LiteralValue, LiteralError> {
    match kind {
        RawKind::NumInt | RawKind::NumLong | RawKind::NumBigInt => parse_integer(text),
        RawKind::NumFloat | RawKind::NumDouble | RawKind::NumBigDecimal => parse_decimal(text),
        _ => Err(err(
            format!("Unsupported literal kind: {kind}"),
            0..text.len(),
        )),
    }
}

/// Integer literal with Groovy's typing: `i`, `l` and `g` suffixes force
/// int, long and BigInteger; an undecorated literal is the smallest of the
/// three that holds the value.
pub fn parse_integer(text: &str) -> Result<LiteralValue, LiteralError> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(err("Empty integer literal", 0..0));
    }

    let (body_end, suffix) = match bytes[bytes.len() - 1] {
        b @ (b'i' | b'I' | b'l' | b'L' | b'g' | b'G') => {
            (bytes.len() - 1, Some(b.to_ascii_lowercase()))
        }
        _ => (bytes.len(), None),
    };
    if body_end == 0 {
        return Err(err("Integer literal is missing digits", 0..text.len()));
    }
    if bytes[body_end - 1] == b'_' {
        return Err(err(
            "Underscore is not allowed at the end of a literal",
            body_end - 1..body_end,
        ));
    }

    let (radix, prefix_len) = integer_radix(bytes, body_end);
    let digits: String = text[prefix_len..body_end]
        .chars()
        .filter(|c| *c != '_')
        .collect();
    if digits.is_empty() {
        return Err(err("Integer literal is missing digits", 0..body_end));
    }
    if let Some(pos) = digits.chars().position(|c| !c.is_digit(radix)) {
        let at = prefix_len + pos;
        return Err(err(
            format!("Invalid digit for a base {radix} literal"),
            at..at + 1,
        ));
    }

    let value = u128::from_str_radix(&digits, radix).ok();
    let big = || LiteralValue::BigInteger {
        radix,
        digits: SmolStr::new(&digits),
    };
    match suffix {
        Some(b'g') => Ok(big()),
        Some(b'i') => match value.and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Ok(LiteralValue::Int(v)),
            None => Err(err("Integer literal is too large for int", 0..text.len())),
        },
        Some(b'l') => match value.and_then(|v| i64::try_from(v).ok()) {
            Some(v) => Ok(LiteralValue::Long(v)),
            None => Err(err("Integer literal is too large for long", 0..text.len())),
        },
        _ => Ok(match value {
            Some(v) if v <= i32::MAX as u128 => LiteralValue::Int(v as i32),
            Some(v) if v <= i64::MAX as u128 => LiteralValue::Long(v as i64),
            _ => big(),
        }),
    }
}

/// Decimal literal: `f` and `d` pick float and double, anything else
/// (including no suffix) is a BigDecimal.
pub fn parse_decimal(text: &str) -> Result<LiteralValue, LiteralError> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(err("Empty decimal literal", 0..0));
    }
    let (body, suffix) = match bytes[bytes.len() - 1] {
        b @ (b'f' | b'F' | b'd' | b'D' | b'g' | b'G') => {
            (&text[..text.len() - 1], Some(b.to_ascii_lowercase()))
        }
        _ => (text, None),
    };
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    let check = cleaned.parse::<f64>().map_err(|_| {
        err(
            format!("Malformed decimal literal `{text}`"),
            0..text.len(),
        )
    })?;
    match suffix {
        Some(b'f') => {
            let value = check as f32;
            if value.is_infinite() {
                return Err(err("Decimal literal is too large for float", 0..text.len()));
            }
            Ok(LiteralValue::Float(value))
        }
        Some(b'd') => {
            if check.is_infinite() {
                return Err(err("Decimal literal is too large for double", 0..text.len()));
            }
            Ok(LiteralValue::Double(check))
        }
        _ => Ok(LiteralValue::BigDecimal(SmolStr::new(cleaned))),
    }
}

fn integer_radix(bytes: &[u8], end: usize) -> (u32, usize) {
    if end >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, 2),
            b'b' | b'B' => return (2, 2),
            _ => return (8, 1),
        }
    }
    (10, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecorated_integers_promote() {
        assert_eq!(parse_integer("42"), Ok(LiteralValue::Int(42)));
        assert_eq!(
            parse_integer("2147483648"),
            Ok(LiteralValue::Long(2_147_483_648))
        );
        assert_eq!(
            parse_integer("9223372036854775808"),
            Ok(LiteralValue::BigInteger {
                radix: 10,
                digits: SmolStr::new("9223372036854775808"),
            })
        );
    }

    #[test]
    fn suffixes_force_the_type() {
        assert_eq!(parse_integer("1L"), Ok(LiteralValue::Long(1)));
        assert_eq!(parse_integer("7i"), Ok(LiteralValue::Int(7)));
        assert_eq!(
            parse_integer("1_000g"),
            Ok(LiteralValue::BigInteger {
                radix: 10,
                digits: SmolStr::new("1000"),
            })
        );
        assert!(parse_integer("3000000000i").is_err());
    }

    #[test]
    fn radix_prefixes() {
        assert_eq!(parse_integer("0xFF"), Ok(LiteralValue::Int(255)));
        assert_eq!(parse_integer("0b101"), Ok(LiteralValue::Int(5)));
        assert_eq!(parse_integer("017"), Ok(LiteralValue::Int(15)));
        let error = parse_integer("019").unwrap_err();
        assert_eq!(error.span, 2..3);
    }

    #[test]
    fn decimals_default_to_big_decimal() {
        assert_eq!(
            parse_decimal("1.5"),
            Ok(LiteralValue::BigDecimal(SmolStr::new("1.5")))
        );
        assert_eq!(parse_decimal("1.5d"), Ok(LiteralValue::Double(1.5)));
        assert_eq!(parse_decimal("2.5f"), Ok(LiteralValue::Float(2.5)));
        assert_eq!(
            parse_number(RawKind::NumBigDecimal, "1e3"),
            Ok(LiteralValue::BigDecimal(SmolStr::new("1e3")))
        );
    }
}
