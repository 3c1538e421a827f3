//! Find options: the filter/order/limit descriptor handed to the data layer.
//!
//! Options are plain values. Every transformation consumes the old value and
//! returns a new one, so one resolver call can never observe another's state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::traits::{DatabaseSchema, OrderDirection, SqlValue};
use crate::error::ResolveError;
use crate::resolver::args::{LIMIT_ARG, OFFSET_ARG, ORDER_ARG, ResolverArgs, sql_value_from_graphql};

/// Prefix marking a descending `order` argument (`"reverse:created_at"`).
pub const REVERSE_PREFIX: &str = "reverse:";

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ConditionOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ConditionOp::Eq => "=",
            ConditionOp::Ne => "!=",
            ConditionOp::Lt => "<",
            ConditionOp::Lte => "<=",
            ConditionOp::Gt => ">",
            ConditionOp::Gte => ">=",
        }
    }
}

/// `column <op> value`; all conditions of a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: ConditionOp,
    pub value: SqlValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: ConditionOp, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Lte, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, ConditionOp::Gte, value)
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderClause {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse an `order` argument.
    ///
    /// Accepts `"column"` (ascending), `"reverse:column"` (descending) and
    /// `"column ASC"` / `"column DESC"`.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let input = input.trim();
        if let Some(column) = input.strip_prefix(REVERSE_PREFIX) {
            return Self::checked(column.trim(), OrderDirection::Desc);
        }

        let mut parts = input.split_whitespace();
        let column = parts.next().unwrap_or_default();
        let direction = match parts.next() {
            None => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
            Some(dir) => {
                return Err(ResolveError::invalid_argument(
                    ORDER_ARG,
                    format!("unknown direction `{}`", dir),
                ));
            }
        };
        if parts.next().is_some() {
            return Err(ResolveError::invalid_argument(
                ORDER_ARG,
                "expected `column`, `column ASC|DESC` or `reverse:column`",
            ));
        }
        Self::checked(column, direction)
    }

    fn checked(column: &str, direction: OrderDirection) -> Result<Self, ResolveError> {
        if column.is_empty() {
            return Err(ResolveError::invalid_argument(ORDER_ARG, "missing column"));
        }
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.to_sql())
    }
}

/// Callback receiving the SQL text of each dispatched query.
#[derive(Clone)]
pub struct QueryLogger(Arc<dyn Fn(&str) + Send + Sync>);

impl QueryLogger {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn log(&self, sql: &str) {
        (self.0)(sql)
    }
}

impl fmt::Debug for QueryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryLogger(..)")
    }
}

impl PartialEq for QueryLogger {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Everything needed to run one SELECT against an entity table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderClause>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub logging: Option<QueryLogger>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options for a field invocation.
    ///
    /// `limit`, `offset` and `order` map onto their options; any argument
    /// naming a column of `E` becomes an equality condition. Everything else
    /// is left for a `before` hook.
    pub fn from_args<E: DatabaseSchema>(args: &ResolverArgs) -> Result<Self, ResolveError> {
        let mut options = Self::new();

        if let Some(limit) = args.get_i64(LIMIT_ARG)? {
            if limit < 0 {
                return Err(ResolveError::invalid_argument(LIMIT_ARG, "must not be negative"));
            }
            options = options.with_limit(limit);
        }

        if let Some(offset) = args.get_i64(OFFSET_ARG)? {
            if offset < 0 {
                return Err(ResolveError::invalid_argument(OFFSET_ARG, "must not be negative"));
            }
            options = options.with_offset(offset);
        }

        if let Some(order) = args.get_str(ORDER_ARG)? {
            let clause = OrderClause::parse(order)?;
            // `createdAt` orders by `created_at`; unknown names fail in the builder
            let clause = match E::resolve_column(&clause.column) {
                Some(column) => OrderClause {
                    column: column.name.to_string(),
                    ..clause
                },
                None => clause,
            };
            options = options.push_order(clause);
        }

        for (name, value) in args.iter() {
            if matches!(name, LIMIT_ARG | OFFSET_ARG | ORDER_ARG) {
                continue;
            }
            if let Some(column) = E::resolve_column(name) {
                let value = sql_value_from_graphql(name, value)?;
                options = options.with_condition(Condition::eq(column.name, value));
            }
        }

        Ok(options)
    }

    pub fn with_limit(self, limit: i64) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    pub fn with_offset(self, offset: i64) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    /// Append an order term after the existing ones.
    pub fn push_order(mut self, clause: OrderClause) -> Self {
        self.order.push(clause);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_logging(self, logger: QueryLogger) -> Self {
        Self {
            logging: Some(logger),
            ..self
        }
    }
}
