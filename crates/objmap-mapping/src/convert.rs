//! Primitive conversions
//!
//! Casts between primitive kinds follow Rust's `as` rules: integer narrowing
//! wraps, float to integer saturates (NaN becomes zero). `bool` converts to
//! and from numbers as `0`/`1`, `char` to and from integers as its code
//! point. Text is produced with `Display` (ISO-8601 for dates) and parsed
//! after trimming surrounding whitespace.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::{Error, Result};
use objmap_reflect::PrimitiveKind;
use objmap_reflect::Value;
use objmap_reflect::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Convert a primitive value to another primitive kind.
///
/// # Errors
///
/// Returns [`Error::Conversion`] if the value is not primitive, if text does
/// not parse as `to`, or if the two kinds have no conversion (for example
/// `char` to `f64`, or a date to a number).
pub fn convert(value: Value, to: PrimitiveKind) -> Result<Value> {
    let Some(from) = value.primitive_kind() else {
        return Err(Error::conversion(
            value.kind_name(),
            to.name(),
            describe(&value),
            "not a primitive value",
        ));
    };

    if from == to {
        return Ok(value);
    }
    if to == PrimitiveKind::String {
        return to_text(&value).map(Value::String);
    }
    if let Value::String(text) = &value {
        return parse(text, to);
    }

    cast(&value, from, to)
}

/// Format a primitive value as text.
///
/// # Errors
///
/// Returns [`Error::Conversion`] if the value is not primitive.
pub fn to_text(value: &Value) -> Result<String> {
    let text = match value {
        Value::Bool(v) => v.to_string(),
        Value::Char(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Date(v) => v.to_string(),
        Value::Time(v) => v.to_string(),
        Value::DateTime(v) => v.format(DATETIME_FORMAT).to_string(),
        other => {
            return Err(Error::conversion(
                other.kind_name(),
                "string",
                describe(other),
                "not a primitive value",
            ));
        }
    };
    Ok(text)
}

/// Parse text as a primitive kind.
///
/// # Errors
///
/// Returns [`Error::Conversion`] if the trimmed text is not a valid `to`.
/// A single character is taken as is for `char`, whitespace included.
pub fn parse(text: &str, to: PrimitiveKind) -> Result<Value> {
    let trimmed = text.trim();
    let fail =
        |reason: String| Error::conversion("string", to.name(), format!("{text:?}"), reason);

    let value = match to {
        PrimitiveKind::String => Value::String(text.to_string()),
        PrimitiveKind::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(fail("expected 'true' or 'false'".to_string()));
            }
        }
        PrimitiveKind::Char => match single_char(text).or_else(|| single_char(trimmed)) {
            Some(c) => Value::Char(c),
            None => return Err(fail("expected exactly one character".to_string())),
        },
        PrimitiveKind::I8 => Value::I8(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::I16 => Value::I16(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::I32 => Value::I32(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::I64 => Value::I64(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::U8 => Value::U8(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::U16 => Value::U16(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::U32 => Value::U32(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::U64 => Value::U64(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::F32 => Value::F32(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::F64 => Value::F64(trimmed.parse().map_err(|e| fail(format!("{e}")))?),
        PrimitiveKind::Date => Value::Date(
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| fail(format!("{e}")))?,
        ),
        PrimitiveKind::Time => Value::Time(
            NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                .map_err(|e| fail(format!("{e}")))?,
        ),
        PrimitiveKind::DateTime => Value::DateTime(parse_datetime(trimmed).map_err(fail)?),
    };
    Ok(value)
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// ISO-8601 local date-time, with either `T` or a space as separator, or an
/// RFC 3339 timestamp (normalised to UTC).
fn parse_datetime(text: &str) -> std::result::Result<NaiveDateTime, String> {
    if let Ok(value) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        return Ok(value);
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(value);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|value| value.naive_utc())
        .map_err(|e| e.to_string())
}

/// Numeric view of a non-text primitive
enum Number {
    Int(i128),
    Float(f64),
}

fn number(value: &Value) -> Option<Number> {
    let number = match value {
        Value::Bool(v) => Number::Int(i128::from(*v)),
        Value::I8(v) => Number::Int(i128::from(*v)),
        Value::I16(v) => Number::Int(i128::from(*v)),
        Value::I32(v) => Number::Int(i128::from(*v)),
        Value::I64(v) => Number::Int(i128::from(*v)),
        Value::U8(v) => Number::Int(i128::from(*v)),
        Value::U16(v) => Number::Int(i128::from(*v)),
        Value::U32(v) => Number::Int(i128::from(*v)),
        Value::U64(v) => Number::Int(i128::from(*v)),
        Value::F32(v) => Number::Float(f64::from(*v)),
        Value::F64(v) => Number::Float(*v),
        _ => return None,
    };
    Some(number)
}

fn cast(value: &Value, from: PrimitiveKind, to: PrimitiveKind) -> Result<Value> {
    let unsupported = || {
        Error::conversion(
            from.name(),
            to.name(),
            describe(value),
            "no conversion between these kinds",
        )
    };

    match (value, to) {
        (Value::Date(date), PrimitiveKind::DateTime) => {
            return Ok(Value::DateTime(date.and_time(NaiveTime::MIN)));
        }
        (Value::DateTime(datetime), PrimitiveKind::Date) => {
            return Ok(Value::Date(datetime.date()));
        }
        (Value::DateTime(datetime), PrimitiveKind::Time) => {
            return Ok(Value::Time(datetime.time()));
        }
        (Value::Char(c), _) if to.is_integer() => {
            return Ok(from_int(i128::from(u32::from(*c)), to));
        }
        (Value::Char(_), _) => return Err(unsupported()),
        _ => {}
    }
    if from.is_temporal() || to.is_temporal() {
        return Err(unsupported());
    }

    match (number(value), to) {
        (Some(Number::Int(n)), PrimitiveKind::Char) if from.is_integer() => u32::try_from(n)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| {
                Error::conversion(
                    from.name(),
                    to.name(),
                    describe(value),
                    "invalid code point",
                )
            }),
        (_, PrimitiveKind::Char) | (None, _) => Err(unsupported()),
        (Some(Number::Int(n)), _) => Ok(from_int(n, to)),
        (Some(Number::Float(f)), _) => Ok(from_float(f, to)),
    }
}

fn from_int(n: i128, to: PrimitiveKind) -> Value {
    match to {
        PrimitiveKind::Bool => Value::Bool(n != 0),
        PrimitiveKind::I8 => Value::I8(n as i8),
        PrimitiveKind::I16 => Value::I16(n as i16),
        PrimitiveKind::I32 => Value::I32(n as i32),
        PrimitiveKind::I64 => Value::I64(n as i64),
        PrimitiveKind::U8 => Value::U8(n as u8),
        PrimitiveKind::U16 => Value::U16(n as u16),
        PrimitiveKind::U32 => Value::U32(n as u32),
        PrimitiveKind::U64 => Value::U64(n as u64),
        PrimitiveKind::F32 => Value::F32(n as f32),
        PrimitiveKind::F64 => Value::F64(n as f64),
        PrimitiveKind::Char
        | PrimitiveKind::String
        | PrimitiveKind::Date
        | PrimitiveKind::Time
        | PrimitiveKind::DateTime => unreachable!("handled by cast"),
    }
}

fn from_float(f: f64, to: PrimitiveKind) -> Value {
    match to {
        PrimitiveKind::Bool => Value::Bool(f != 0.0),
        PrimitiveKind::I8 => Value::I8(f as i8),
        PrimitiveKind::I16 => Value::I16(f as i16),
        PrimitiveKind::I32 => Value::I32(f as i32),
        PrimitiveKind::I64 => Value::I64(f as i64),
        PrimitiveKind::U8 => Value::U8(f as u8),
        PrimitiveKind::U16 => Value::U16(f as u16),
        PrimitiveKind::U32 => Value::U32(f as u32),
        PrimitiveKind::U64 => Value::U64(f as u64),
        PrimitiveKind::F32 => Value::F32(f as f32),
        PrimitiveKind::F64 => Value::F64(f),
        PrimitiveKind::Char
        | PrimitiveKind::String
        | PrimitiveKind::Date
        | PrimitiveKind::Time
        | PrimitiveKind::DateTime => unreachable!("handled by cast"),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text:?}"),
        Value::Object(object) => format!("<{}>", object.type_key()),
        other if other.primitive_kind().is_some() => {
            to_text(other).unwrap_or_else(|_| other.kind_name().to_string())
        }
        other => other.kind_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_integer_widening_and_wrapping_narrowing() {
        assert_eq!(
            convert(Value::I32(30), PrimitiveKind::I64).unwrap(),
            Value::I64(30)
        );
        assert_eq!(
            convert(Value::I32(300), PrimitiveKind::U8).unwrap(),
            Value::U8(44)
        );
        assert_eq!(
            convert(Value::I32(-1), PrimitiveKind::U32).unwrap(),
            Value::U32(u32::MAX)
        );
        assert_eq!(
            convert(Value::U64(u64::MAX), PrimitiveKind::I64).unwrap(),
            Value::I64(-1)
        );
    }

    #[test]
    fn test_float_to_integer_saturates() {
        assert_eq!(
            convert(Value::F64(3.9), PrimitiveKind::I32).unwrap(),
            Value::I32(3)
        );
        assert_eq!(
            convert(Value::F64(1e12), PrimitiveKind::I32).unwrap(),
            Value::I32(i32::MAX)
        );
        assert_eq!(
            convert(Value::F64(-5.0), PrimitiveKind::U8).unwrap(),
            Value::U8(0)
        );
        assert_eq!(
            convert(Value::F64(f64::NAN), PrimitiveKind::I16).unwrap(),
            Value::I16(0)
        );
        assert_eq!(
            convert(Value::I32(7), PrimitiveKind::F64).unwrap(),
            Value::F64(7.0)
        );
    }

    #[test]
    fn test_bool_and_numbers() {
        assert_eq!(
            convert(Value::Bool(true), PrimitiveKind::I32).unwrap(),
            Value::I32(1)
        );
        assert_eq!(
            convert(Value::Bool(false), PrimitiveKind::F64).unwrap(),
            Value::F64(0.0)
        );
        assert_eq!(
            convert(Value::I64(0), PrimitiveKind::Bool).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            convert(Value::F32(0.5), PrimitiveKind::Bool).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_char_code_points() {
        assert_eq!(
            convert(Value::Char('A'), PrimitiveKind::U32).unwrap(),
            Value::U32(65)
        );
        assert_eq!(
            convert(Value::U8(97), PrimitiveKind::Char).unwrap(),
            Value::Char('a')
        );

        let err = convert(Value::U32(0xD800), PrimitiveKind::Char).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("invalid code point"));

        assert!(convert(Value::Char('A'), PrimitiveKind::F64).is_err());
        assert!(convert(Value::F64(65.0), PrimitiveKind::Char).is_err());
        assert!(convert(Value::Char('A'), PrimitiveKind::Bool).is_err());
    }

    #[test]
    fn test_temporal_conversions() {
        let day = date(2024, 2, 29);
        let midnight = day.and_hms_opt(0, 0, 0).unwrap();
        let noon = day.and_hms_opt(12, 30, 0).unwrap();

        assert_eq!(
            convert(Value::Date(day), PrimitiveKind::DateTime).unwrap(),
            Value::DateTime(midnight)
        );
        assert_eq!(
            convert(Value::DateTime(noon), PrimitiveKind::Date).unwrap(),
            Value::Date(day)
        );
        assert_eq!(
            convert(Value::DateTime(noon), PrimitiveKind::Time).unwrap(),
            Value::Time(NaiveTime::from_hms_opt(12, 30, 0).unwrap())
        );

        let err = convert(Value::Date(day), PrimitiveKind::I64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(convert(Value::I64(0), PrimitiveKind::Date).is_err());
    }

    #[test]
    fn test_format_as_text() {
        assert_eq!(
            convert(Value::I32(1), PrimitiveKind::String).unwrap(),
            Value::String("1".into())
        );
        assert_eq!(to_text(&Value::F64(2.5)).unwrap(), "2.5");
        assert_eq!(to_text(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(
            to_text(&Value::Date(date(2024, 1, 5))).unwrap(),
            "2024-01-05"
        );

        let datetime = date(2024, 1, 5).and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(
            to_text(&Value::DateTime(datetime)).unwrap(),
            "2024-01-05T10:30:00"
        );
        assert!(to_text(&Value::Seq(vec![])).is_err());
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse(" 42 ", PrimitiveKind::I32).unwrap(), Value::I32(42));
        assert_eq!(
            parse("TRUE", PrimitiveKind::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(parse("x", PrimitiveKind::Char).unwrap(), Value::Char('x'));
        assert_eq!(parse("1.25", PrimitiveKind::F32).unwrap(), Value::F32(1.25));
        assert_eq!(
            parse("2024-01-05", PrimitiveKind::Date).unwrap(),
            Value::Date(date(2024, 1, 5))
        );
        assert_eq!(
            parse("08:15", PrimitiveKind::Time).unwrap(),
            Value::Time(NaiveTime::from_hms_opt(8, 15, 0).unwrap())
        );

        let expected = date(2024, 1, 5).and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(
            parse("2024-01-05T10:30:00", PrimitiveKind::DateTime).unwrap(),
            Value::DateTime(expected)
        );
        assert_eq!(
            parse("2024-01-05T12:30:00+02:00", PrimitiveKind::DateTime).unwrap(),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        let cases = [
            ("abc", PrimitiveKind::I32),
            ("300", PrimitiveKind::U8),
            ("yes", PrimitiveKind::Bool),
            ("ab", PrimitiveKind::Char),
            ("", PrimitiveKind::Char),
            ("2024-13-01", PrimitiveKind::Date),
            ("noon", PrimitiveKind::DateTime),
        ];
        for (text, kind) in cases {
            let err = parse(text, kind).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conversion, "{text:?} as {kind}");
        }
    }

    #[test]
    fn test_non_primitive_values_are_rejected() {
        let err = convert(Value::Seq(vec![Value::I32(1)]), PrimitiveKind::I32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);

        let err = convert(Value::Null, PrimitiveKind::String).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("not a primitive value"));

        let err = to_text(&Value::Map(vec![])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn test_whitespace_char_survives_text_round_trip() {
        for c in [' ', '\t', '\n'] {
            let text = convert(Value::Char(c), PrimitiveKind::String).unwrap();
            assert_eq!(text, Value::String(c.to_string()));
            assert_eq!(convert(text, PrimitiveKind::Char).unwrap(), Value::Char(c));
        }
        assert_eq!(parse(" x ", PrimitiveKind::Char).unwrap(), Value::Char('x'));
        assert!(parse("  ", PrimitiveKind::Char).is_err());
    }
}
