//! Query-filter expression engine.
//!
//! Compiles a single-line filter such as
//! `name startswith 'bob' and (age gt 21 or active eq true)` into a
//! parameterized predicate fragment plus its ordered, typed values:
//!
//! ```
//! use query_filter::{FieldConfig, FieldConfigRegistry, FieldType, FilterValue, QueryFilterParser};
//!
//! let registry = FieldConfigRegistry::new()
//!     .with_field("name", FieldConfig::string("Name").not_null_guard())
//!     .with_field("age", FieldConfig::new("Age", FieldType::Int32));
//!
//! let result = QueryFilterParser::new(&registry).parse("name eq 'bob' and age gt 21").unwrap();
//! assert_eq!(result.predicate, "(Name != null && Name == {0}) && Age > {1}");
//! assert_eq!(result.values, vec![FilterValue::String("bob".into()), FilterValue::Int(21)]);
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod field;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod token;
pub mod value;

pub use config::{ConfigError, RegistryConfig};
pub use error::{ErrorKind, QueryFilterError};
pub use field::{FieldConfig, FieldConfigRegistry, FieldRegistry, FieldType, OperatorSet};
pub use parser::{ParserConfig, QueryFilterParser};
pub use result::ParserResult;
pub use token::{Span, Token, TokenKind};
pub use value::FilterValue;
