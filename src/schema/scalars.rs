/// Custom GraphQL scalars and shared enums
///
/// Dates, datetimes and times travel as ISO 8601 strings. Bytes travel as
/// lowercase hex and JSON columns as arbitrary GraphQL values.

use super::type_mapping::ScalarKind;

use async_graphql::dynamic::{Enum, EnumItem, Scalar};
use async_graphql::Value;
use chrono::{DateTime as ChronoDateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Name of the sort direction enum used by every `<table>_order` input
pub const ORDER_ENUM: &str = "Order";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Accepts RFC 3339 (normalized to UTC) or a naive ISO 8601 datetime
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    ChronoDateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT))
        .ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

pub fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Scalar definition for a custom scalar kind
///
/// Returns `None` for GraphQL built-ins.
pub fn custom_scalar(kind: ScalarKind) -> Option<Scalar> {
    let scalar = match kind {
        ScalarKind::Date => Scalar::new(kind.type_name())
            .description("ISO 8601 date format (YYYY-MM-DD)")
            .validator(|value| matches!(value, Value::String(s) if parse_date(s).is_some())),
        ScalarKind::DateTime => Scalar::new(kind.type_name())
            .description("ISO 8601 datetime format")
            .validator(|value| matches!(value, Value::String(s) if parse_datetime(s).is_some())),
        ScalarKind::Time => Scalar::new(kind.type_name())
            .description("ISO 8601 time format (HH:MM:SS)")
            .validator(|value| matches!(value, Value::String(s) if parse_time(s).is_some())),
        ScalarKind::Bytes => Scalar::new(kind.type_name())
            .description("Binary data as a lowercase hex string")
            .validator(|value| matches!(value, Value::String(s) if hex::decode(s).is_ok())),
        ScalarKind::Json => Scalar::new(kind.type_name()).description("Arbitrary JSON value"),
        ScalarKind::Int | ScalarKind::Float | ScalarKind::String | ScalarKind::Boolean => {
            return None
        }
    };
    Some(scalar)
}

/// The ASC/DESC enum
pub fn order_enum() -> Enum {
    Enum::new(ORDER_ENUM)
        .item(EnumItem::new("ASC"))
        .item(EnumItem::new("DESC"))
}
