//! Field metadata consulted by the parser.
//!
//! The parser only sees the [`FieldRegistry`] trait. [`FieldConfigRegistry`] is
//! the in-memory implementation, built explicitly or loaded from JSON
//! (see [`crate::config`]).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexer;
use crate::token::TokenKind;

/// The declared type of a field; constants are converted to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int32,
    Int64,
    Double,
    Boolean,
    Date,
    DateTime,
    Uuid,
}

impl FieldType {
    pub fn is_string(self) -> bool {
        self == FieldType::String
    }

    pub fn is_boolean(self) -> bool {
        self == FieldType::Boolean
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Uuid => "uuid",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every kind that may appear in an [`OperatorSet`], in bit order.
const OPERATORS: [TokenKind; 10] = [
    TokenKind::Equal,
    TokenKind::NotEqual,
    TokenKind::LessThan,
    TokenKind::LessThanOrEqual,
    TokenKind::GreaterThan,
    TokenKind::GreaterThanOrEqual,
    TokenKind::In,
    TokenKind::StartsWith,
    TokenKind::Contains,
    TokenKind::EndsWith,
];

/// Set of operators a field permits. Serialized as a list of keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OperatorSet(u16);

impl OperatorSet {
    pub const EMPTY: OperatorSet = OperatorSet(0);

    fn bit(kind: TokenKind) -> Option<u16> {
        OPERATORS.iter().position(|k| *k == kind).map(|i| 1 << i)
    }

    pub fn of(kinds: &[TokenKind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |set, kind| set.with(*kind))
    }

    /// Adds `kind`; non-operator kinds are ignored.
    pub fn with(self, kind: TokenKind) -> Self {
        match Self::bit(kind) {
            Some(bit) => OperatorSet(self.0 | bit),
            None => self,
        }
    }

    pub fn without(self, kind: TokenKind) -> Self {
        match Self::bit(kind) {
            Some(bit) => OperatorSet(self.0 & !bit),
            None => self,
        }
    }

    pub fn contains(self, kind: TokenKind) -> bool {
        Self::bit(kind).is_some_and(|bit| self.0 & bit != 0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TokenKind> {
        OPERATORS.into_iter().filter(move |k| self.contains(*k))
    }

    /// The operators a field of `field_type` permits unless configured otherwise.
    pub fn defaults_for(field_type: FieldType) -> Self {
        use TokenKind::*;
        match field_type {
            FieldType::String => Self::of(&[Equal, NotEqual, In, StartsWith, Contains, EndsWith]),
            FieldType::Boolean => Self::of(&[Equal, NotEqual]),
            FieldType::Uuid => Self::of(&[Equal, NotEqual, In]),
            FieldType::Int32
            | FieldType::Int64
            | FieldType::Double
            | FieldType::Date
            | FieldType::DateTime => Self::of(&[
                Equal,
                NotEqual,
                LessThan,
                LessThanOrEqual,
                GreaterThan,
                GreaterThanOrEqual,
                In,
            ]),
        }
    }
}

impl TryFrom<Vec<String>> for OperatorSet {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Self::EMPTY, |set, name| {
            let kind = lexer::match_keyword(name);
            if kind.is_operator() {
                Ok(set.with(kind))
            } else {
                Err(format!("'{}' is not a filter operator", name))
            }
        })
    }
}

impl From<OperatorSet> for Vec<String> {
    fn from(set: OperatorSet) -> Self {
        set.iter().map(|k| k.keyword().to_string()).collect()
    }
}

/// Per-field metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    /// Name rendered into the predicate fragment.
    pub model_name: String,
    pub field_type: FieldType,
    pub allowed_operators: OperatorSet,
    /// Compare strings upper-cased on both sides.
    pub to_upper_for_comparison: bool,
    /// Wrap comparisons in `(Field != null && ...)`.
    pub require_not_null_guard: bool,
}

impl FieldConfig {
    pub fn new(model_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            model_name: model_name.into(),
            field_type,
            allowed_operators: OperatorSet::defaults_for(field_type),
            to_upper_for_comparison: false,
            require_not_null_guard: false,
        }
    }

    pub fn string(model_name: impl Into<String>) -> Self {
        Self::new(model_name, FieldType::String)
    }

    pub fn with_operators(mut self, operators: OperatorSet) -> Self {
        self.allowed_operators = operators;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.to_upper_for_comparison = true;
        self
    }

    pub fn not_null_guard(mut self) -> Self {
        self.require_not_null_guard = true;
        self
    }

    pub fn is_string(&self) -> bool {
        self.field_type.is_string()
    }

    pub fn is_boolean(&self) -> bool {
        self.field_type.is_boolean()
    }

    /// Case folding only applies to string fields.
    pub fn folds_case(&self) -> bool {
        self.to_upper_for_comparison && self.is_string()
    }

    pub fn permits(&self, operator: TokenKind) -> bool {
        self.allowed_operators.contains(operator)
    }
}

/// Resolves a field name as written in the filter to its metadata.
///
/// Implementations must be safe for concurrent reads; parses may run on
/// several threads against one registry.
pub trait FieldRegistry: Send + Sync {
    fn resolve(&self, field: &str) -> Option<&FieldConfig>;
}

/// In-memory registry; lookups ignore ASCII case.
#[derive(Debug, Clone, Default)]
pub struct FieldConfigRegistry {
    fields: HashMap<String, FieldConfig>,
}

impl FieldConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, config: FieldConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Registers `config` under `name`, returning any previous entry.
    pub fn insert(&mut self, name: &str, config: FieldConfig) -> Option<FieldConfig> {
        self.fields.insert(name.to_ascii_lowercase(), config)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entries sorted by filter name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConfig)> {
        let mut entries: Vec<_> = self.fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

impl FieldRegistry for FieldConfigRegistry {
    fn resolve(&self, field: &str) -> Option<&FieldConfig> {
        self.fields.get(&field.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operator_sets() {
        let strings = OperatorSet::defaults_for(FieldType::String);
        assert!(strings.contains(TokenKind::StartsWith));
        assert!(strings.contains(TokenKind::In));
        assert!(!strings.contains(TokenKind::GreaterThan));

        let numbers = OperatorSet::defaults_for(FieldType::Int32);
        assert!(numbers.contains(TokenKind::GreaterThanOrEqual));
        assert!(!numbers.contains(TokenKind::Contains));

        let booleans = OperatorSet::defaults_for(FieldType::Boolean);
        assert_eq!(booleans.iter().count(), 2);
    }

    #[test]
    fn test_operator_set_ignores_non_operators() {
        let set = OperatorSet::of(&[TokenKind::Equal, TokenKind::And, TokenKind::Field]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![TokenKind::Equal]);
        assert!(!set.contains(TokenKind::And));
        assert!(set.without(TokenKind::Equal).is_empty());
    }

    #[test]
    fn test_operator_set_serde() {
        let set: OperatorSet = serde_json::from_str(r#"["eq", "GT", "startswith"]"#).unwrap();
        assert!(set.contains(TokenKind::Equal));
        assert!(set.contains(TokenKind::GreaterThan));
        assert!(set.contains(TokenKind::StartsWith));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["eq","gt","startswith"]"#);

        let bad = serde_json::from_str::<OperatorSet>(r#"["eq", "and"]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = FieldConfigRegistry::new()
            .with_field("Name", FieldConfig::string("Name").not_null_guard())
            .with_field("age", FieldConfig::new("Age", FieldType::Int32));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("NAME").unwrap().model_name, "Name");
        assert_eq!(registry.resolve("age").unwrap().field_type, FieldType::Int32);
        assert!(registry.resolve("missing").is_none());

        let names: Vec<_> = registry.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["age", "name"]);
    }

    #[test]
    fn test_case_folding_only_for_strings() {
        let numeric = FieldConfig::new("Age", FieldType::Int32).case_insensitive();
        assert!(!numeric.folds_case());
        assert!(FieldConfig::string("Name").case_insensitive().folds_case());
    }
}
