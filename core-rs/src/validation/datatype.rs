//! Literal validators per XSD datatype

use std::str::FromStr;

use once_cell::sync::Lazy;
use oxsdatatypes::{Boolean, DateTime, Date, Decimal, Double, Duration, Float, Time};
use regex::Regex;

use crate::vocab;

pub type LiteralValidator = fn(&str) -> bool;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("static regex"));

/// Validator for `datatype`, or `None` when the datatype is not supported.
pub fn validator_for(datatype: &str) -> Option<LiteralValidator> {
    let validator: LiteralValidator = match datatype {
        vocab::XSD_STRING | vocab::RDF_LANG_STRING | vocab::RDFS_LITERAL => |_| true,
        vocab::XSD_NORMALIZED_STRING => is_normalized_string,
        vocab::XSD_TOKEN => is_token,
        vocab::XSD_BOOLEAN => |v| Boolean::from_str(v.trim()).is_ok(),
        vocab::XSD_DECIMAL => |v| Decimal::from_str(v.trim()).is_ok(),
        vocab::XSD_DOUBLE => |v| Double::from_str(v.trim()).is_ok(),
        vocab::XSD_FLOAT => |v| Float::from_str(v.trim()).is_ok(),
        vocab::XSD_DATE => |v| Date::from_str(v.trim()).is_ok(),
        vocab::XSD_DATE_TIME => |v| DateTime::from_str(v.trim()).is_ok(),
        vocab::XSD_DATE_TIME_STAMP => is_date_time_stamp,
        vocab::XSD_TIME => |v| Time::from_str(v.trim()).is_ok(),
        vocab::XSD_DURATION => |v| Duration::from_str(v.trim()).is_ok(),
        vocab::XSD_ANY_URI => is_any_uri,
        vocab::XSD_INTEGER => |v| integer_within(v, None, None),
        vocab::XSD_LONG => |v| integer_within(v, Some(i64::MIN.into()), Some(i64::MAX.into())),
        vocab::XSD_INT => |v| integer_within(v, Some(i32::MIN.into()), Some(i32::MAX.into())),
        vocab::XSD_SHORT => |v| integer_within(v, Some(i16::MIN.into()), Some(i16::MAX.into())),
        vocab::XSD_BYTE => |v| integer_within(v, Some(i8::MIN.into()), Some(i8::MAX.into())),
        vocab::XSD_UNSIGNED_LONG => |v| integer_within(v, Some(0), Some(u64::MAX.into())),
        vocab::XSD_UNSIGNED_INT => |v| integer_within(v, Some(0), Some(u32::MAX.into())),
        vocab::XSD_UNSIGNED_SHORT => |v| integer_within(v, Some(0), Some(u16::MAX.into())),
        vocab::XSD_UNSIGNED_BYTE => |v| integer_within(v, Some(0), Some(u8::MAX.into())),
        vocab::XSD_NON_NEGATIVE_INTEGER => |v| integer_within(v, Some(0), None),
        vocab::XSD_POSITIVE_INTEGER => |v| integer_within(v, Some(1), None),
        vocab::XSD_NON_POSITIVE_INTEGER => |v| integer_within(v, None, Some(0)),
        vocab::XSD_NEGATIVE_INTEGER => |v| integer_within(v, None, Some(-1)),
        _ => return None,
    };
    Some(validator)
}

/// `Some(valid)` for a supported datatype.
pub fn is_valid_literal(datatype: &str, value: &str) -> Option<bool> {
    validator_for(datatype).map(|validate| validate(value))
}

fn integer_within(value: &str, min: Option<i128>, max: Option<i128>) -> bool {
    let value = value.trim();
    if !INTEGER.is_match(value) {
        return false;
    }
    match value.parse::<i128>() {
        Ok(n) => min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m),
        // out of i128 range: only an unbounded side accepts it
        Err(_) if value.starts_with('-') => min.is_none(),
        Err(_) => max.is_none(),
    }
}

fn is_normalized_string(value: &str) -> bool {
    !value.contains(['\n', '\r', '\t'])
}

fn is_token(value: &str) -> bool {
    is_normalized_string(value) && value.trim() == value && !value.contains("  ")
}

fn is_date_time_stamp(value: &str) -> bool {
    DateTime::from_str(value.trim()).is_ok_and(|dt| dt.timezone_offset().is_some())
}

fn is_any_uri(value: &str) -> bool {
    !value.is_empty() && !value.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"'))
}
