//! Typed constants collected from a filter.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::field::{FieldConfig, FieldType};
use crate::lexer::unescape_literal;
use crate::token::{Token, TokenKind};

/// A constant converted to its field's declared type. Serialized as
/// `{"type": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

const NAIVE_DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl FilterValue {
    /// Converts a constant token to `field`'s declared type.
    ///
    /// Returns `None` when the token's kind or text does not fit the type.
    /// `null` is never converted; callers decide whether it is legal.
    pub fn convert(token: &Token, source: &str, field: &FieldConfig) -> Option<FilterValue> {
        let raw = token.text(source);
        match (token.kind, field.field_type) {
            (TokenKind::True, FieldType::Boolean) => Some(FilterValue::Bool(true)),
            (TokenKind::False, FieldType::Boolean) => Some(FilterValue::Bool(false)),
            (TokenKind::Value, FieldType::Int32) => raw.parse().ok().map(FilterValue::Int),
            (TokenKind::Value, FieldType::Int64) => raw.parse().ok().map(FilterValue::BigInt),
            (TokenKind::Value, FieldType::Double) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FilterValue::Double),
            (TokenKind::Literal, FieldType::String) => {
                let text = unescape_literal(raw);
                if field.folds_case() {
                    Some(FilterValue::String(text.to_uppercase()))
                } else {
                    Some(FilterValue::String(text))
                }
            }
            (TokenKind::Literal, FieldType::Date) => {
                NaiveDate::parse_from_str(&unescape_literal(raw), "%Y-%m-%d")
                    .ok()
                    .map(FilterValue::Date)
            }
            (TokenKind::Literal, FieldType::DateTime) => {
                parse_date_time(&unescape_literal(raw)).map(FilterValue::DateTime)
            }
            (TokenKind::Literal, FieldType::Uuid) => {
                Uuid::parse_str(&unescape_literal(raw)).ok().map(FilterValue::Uuid)
            }
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Bool(_) => "bool",
            FilterValue::Int(_) => "int",
            FilterValue::BigInt(_) => "bigint",
            FilterValue::Double(_) => "double",
            FilterValue::String(_) => "string",
            FilterValue::Date(_) => "date",
            FilterValue::DateTime(_) => "datetime",
            FilterValue::Uuid(_) => "uuid",
        }
    }
}

/// RFC 3339 first, then a naive timestamp or a bare date taken as UTC.
fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(v) => write!(f, "{}", v),
            FilterValue::Int(v) => write!(f, "{}", v),
            FilterValue::BigInt(v) => write!(f, "{}", v),
            FilterValue::Double(v) => write!(f, "{}", v),
            FilterValue::String(v) => write!(f, "{:?}", v),
            FilterValue::Date(v) => write!(f, "{}", v),
            FilterValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            FilterValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

/// Bridge to sea-query so an executor can bind the values directly.
impl From<FilterValue> for sea_query::Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Bool(v) => v.into(),
            FilterValue::Int(v) => v.into(),
            FilterValue::BigInt(v) => v.into(),
            FilterValue::Double(v) => v.into(),
            FilterValue::String(v) => v.into(),
            FilterValue::Date(v) => v.into(),
            FilterValue::DateTime(v) => v.into(),
            FilterValue::Uuid(v) => v.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn convert(input: &str, field: &FieldConfig) -> Option<FilterValue> {
        let tokens = tokenize(input).unwrap();
        FilterValue::convert(&tokens[0], input, field)
    }

    #[test]
    fn test_numeric_conversion() {
        let int = FieldConfig::new("Age", FieldType::Int32);
        assert_eq!(convert("21", &int), Some(FilterValue::Int(21)));
        assert_eq!(convert("-4", &int), Some(FilterValue::Int(-4)));
        assert_eq!(convert("2.5", &int), None);
        assert_eq!(convert("99999999999", &int), None);
        assert_eq!(convert("'21'", &int), None);

        let long = FieldConfig::new("Id", FieldType::Int64);
        assert_eq!(convert("99999999999", &long), Some(FilterValue::BigInt(99_999_999_999)));

        let double = FieldConfig::new("Score", FieldType::Double);
        assert_eq!(convert("2.5", &double), Some(FilterValue::Double(2.5)));
    }

    #[test]
    fn test_string_conversion_and_case_fold() {
        let plain = FieldConfig::string("Name");
        assert_eq!(convert("'Bob'", &plain), Some(FilterValue::String("Bob".to_string())));
        assert_eq!(convert("42", &plain), None);

        let folded = FieldConfig::string("Name").case_insensitive();
        assert_eq!(convert("'Bob'", &folded), Some(FilterValue::String("BOB".to_string())));
    }

    #[test]
    fn test_boolean_conversion() {
        let flag = FieldConfig::new("Active", FieldType::Boolean);
        assert_eq!(convert("TRUE", &flag), Some(FilterValue::Bool(true)));
        assert_eq!(convert("false", &flag), Some(FilterValue::Bool(false)));
        assert_eq!(convert("1", &flag), None);
        assert_eq!(convert("true", &FieldConfig::string("Name")), None);
    }

    #[test]
    fn test_date_and_time_conversion() {
        let date = FieldConfig::new("Born", FieldType::Date);
        assert_eq!(
            convert("'2024-02-29'", &date),
            NaiveDate::from_ymd_opt(2024, 2, 29).map(FilterValue::Date)
        );
        assert_eq!(convert("'2023-02-29'", &date), None);

        let ts = FieldConfig::new("Created", FieldType::DateTime);
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .map(|n| FilterValue::DateTime(n.and_utc()));
        assert_eq!(convert("'2024-05-01T12:30:00+02:00'", &ts), expected);
        assert_eq!(convert("'2024-05-01 10:30:00'", &ts), expected);
        assert!(matches!(convert("'2024-05-01'", &ts), Some(FilterValue::DateTime(_))));
        assert_eq!(convert("'yesterday'", &ts), None);
    }

    #[test]
    fn test_uuid_conversion() {
        let id = FieldConfig::new("Id", FieldType::Uuid);
        let value = convert("'67e55044-10b1-426f-9247-bb680e5fe0c8'", &id);
        assert!(matches!(value, Some(FilterValue::Uuid(_))));
        assert_eq!(convert("'not-a-uuid'", &id), None);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(FilterValue::String("bob".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "string", "value": "bob"}));
        let json = serde_json::to_value(FilterValue::Int(20)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "value": 20}));
    }

    #[test]
    fn test_sea_query_bridge() {
        assert_eq!(sea_query::Value::from(FilterValue::Int(7)), sea_query::Value::from(7i32));
        assert_eq!(
            sea_query::Value::from(FilterValue::String("x".to_string())),
            sea_query::Value::from("x".to_string())
        );
        assert_eq!(sea_query::Value::from(FilterValue::Bool(true)), sea_query::Value::from(true));
    }
}
