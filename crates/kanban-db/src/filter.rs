//! Filter predicates over top-level record fields.

use serde_json::Value;

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    In(Vec<Value>),
    IsNull,
}

impl Predicate {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Predicate::Eq(expected) => value == Some(expected),
            Predicate::In(options) => value.is_some_and(|v| options.contains(v)),
            Predicate::IsNull => value.map_or(true, Value::is_null),
        }
    }
}

/// Conjunction of field predicates. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the record with the given id.
    pub fn by_id(id: &str) -> Self {
        Self::all().eq("id", id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Predicate::Eq(value.into())));
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((field.to_string(), Predicate::In(values)));
        self
    }

    pub fn is_null(mut self, field: &str) -> Self {
        self.clauses.push((field.to_string(), Predicate::IsNull));
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, predicate)| predicate.matches(record.get(field)))
    }

    /// The id this filter pins down with an equality clause, if any.
    /// Backends use it to avoid scanning a whole table.
    pub fn id_hint(&self) -> Option<&str> {
        self.clauses.iter().find_map(|(field, predicate)| match predicate {
            Predicate::Eq(Value::String(id)) if field == "id" => Some(id.as_str()),
            _ => None,
        })
    }
}
