//! Field arguments as seen by a resolver.

use async_graphql::dynamic::ObjectAccessor;
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};

use crate::error::ResolveError;
use crate::orm::SqlValue;

/// Argument names with a fixed meaning for every resolver.
pub const LIMIT_ARG: &str = "limit";
pub const OFFSET_ARG: &str = "offset";
pub const ORDER_ARG: &str = "order";

/// Raw GraphQL arguments of one field invocation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs(IndexMap<String, Value>);

impl ResolverArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for calling resolvers directly.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Copy the arguments out of an async-graphql dynamic field invocation.
    pub fn from_accessor(args: &ObjectAccessor<'_>) -> Self {
        args.as_index_map().clone().into()
    }

    /// Get an argument; explicit `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !matches!(v, Value::Null))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, ResolveError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| ResolveError::invalid_argument(name, "expected an integer")),
            Some(_) => Err(ResolveError::invalid_argument(name, "expected an integer")),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>, ResolveError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(Value::Enum(e)) => Ok(Some(e.as_str())),
            Some(_) => Err(ResolveError::invalid_argument(name, "expected a string")),
        }
    }

    /// Arguments that carry a value, skipping explicit `null`s.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Null))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Number of arguments that carry a value.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl From<IndexMap<Name, Value>> for ResolverArgs {
    fn from(map: IndexMap<Name, Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Convert a scalar argument into a bindable SQL value.
pub fn sql_value_from_graphql(name: &str, value: &Value) -> Result<SqlValue, ResolveError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Boolean(b) => Ok(SqlValue::Bool(*b)),
        Value::String(s) => Ok(SqlValue::String(s.clone())),
        Value::Enum(e) => Ok(SqlValue::String(e.to_string())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Int(i)),
            None => n
                .as_f64()
                .map(SqlValue::Float)
                .ok_or_else(|| ResolveError::invalid_argument(name, "number out of range")),
        },
        _ => Err(ResolveError::invalid_argument(
            name,
            "only scalar arguments can filter a column",
        )),
    }
}
