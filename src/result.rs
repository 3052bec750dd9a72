//! Accumulates the predicate fragment and its positional values.

use serde::Serialize;

use crate::value::FilterValue;

/// The output of a successful parse: a fragment with `{n}` placeholders and
/// the values they refer to, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParserResult {
    pub predicate: String,
    pub values: Vec<FilterValue>,
}

impl ParserResult {
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }

    /// The values as sea-query parameters, ready to bind.
    pub fn sea_values(&self) -> sea_query::Values {
        sea_query::Values(self.values.iter().cloned().map(Into::into).collect())
    }
}

/// Builds a [`ParserResult`]. Values are never written into the fragment;
/// only their placeholders are.
#[derive(Debug, Default)]
pub struct ResultBuilder {
    predicate: String,
    values: Vec<FilterValue>,
    depth: usize,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, text: &str) {
        self.predicate.push_str(text);
    }

    /// Stores `value` and writes its placeholder, returning the index used.
    pub fn append_value(&mut self, value: FilterValue) -> usize {
        let index = self.values.len();
        self.values.push(value);
        self.predicate.push('{');
        self.predicate.push_str(&index.to_string());
        self.predicate.push('}');
        index
    }

    /// Writes `{i}, {j}, ...` for each value.
    pub fn append_value_list(&mut self, values: impl IntoIterator<Item = FilterValue>) {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.predicate.push_str(", ");
            }
            self.append_value(value);
        }
    }

    pub fn open_group(&mut self) {
        self.depth += 1;
        self.predicate.push('(');
    }

    pub fn close_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.predicate.push(')');
    }

    /// Number of groups opened and not yet closed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn finish(self) -> ParserResult {
        ParserResult {
            predicate: self.predicate,
            values: self.values,
        }
    }
}
