//! What an entity type tells the query layer about itself.
//!
//! Everything here is generated by `#[derive(Entity)]`; hand-written impls
//! are possible but must agree with the table the entity is stored in.

use serde::{Deserialize, Serialize};
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};

/// A query over SQLite with positional arguments
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// One column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    /// camelCase field name on the GraphQL object
    pub graphql_name: &'static str,
    /// `TEXT`, `INTEGER` or `REAL`
    pub sql_type: &'static str,
    /// `Int`, `Float`, `String` or `Boolean`
    pub graphql_type: &'static str,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Raw SQL expression, e.g. `datetime('now')`
    pub default: Option<&'static str>,
}

impl ColumnDef {
    /// Column clause for `CREATE TABLE`.
    pub fn to_sql(&self) -> String {
        let constraint = match (self.is_primary_key, self.nullable) {
            (true, _) => " PRIMARY KEY",
            (false, false) => " NOT NULL",
            (false, true) => "",
        };
        let default = self
            .default
            .map(|expr| format!(" DEFAULT {}", expr))
            .unwrap_or_default();
        format!("{} {}{}{}", self.name, self.sql_type, constraint, default)
    }
}

/// A struct stored as one row of one table.
pub trait DatabaseEntity: Sized + Send + Sync {
    const TABLE_NAME: &'static str;
    const PRIMARY_KEY: &'static str;

    /// Column used when a query carries no order of its own
    const DEFAULT_SORT: &'static str;
    const DEFAULT_SORT_DIR: OrderDirection = OrderDirection::Asc;

    /// Columns in declaration order, primary key included.
    fn column_names() -> &'static [&'static str];

    /// Read a column off a loaded entity. `None` if the column doesn't exist.
    fn column_value(&self, column: &str) -> Option<SqlValue>;

    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {}",
            Self::column_names().join(", "),
            Self::TABLE_NAME
        )
    }
}

/// Column metadata beyond the names: types, nullability, GraphQL names.
pub trait DatabaseSchema: DatabaseEntity {
    fn columns() -> &'static [ColumnDef];

    fn create_table_sql() -> String {
        let columns: Vec<String> = Self::columns().iter().map(ColumnDef::to_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            Self::TABLE_NAME,
            columns.join(",\n  ")
        )
    }

    /// Find the column addressed by a GraphQL argument, by column or field name.
    fn resolve_column(name: &str) -> Option<&'static ColumnDef> {
        Self::columns()
            .iter()
            .find(|c| c.name == name || c.graphql_name == name)
    }
}

pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// A bindable column value: condition operands, inserted fields, foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Append this value as the next positional argument.
    pub fn bind_to<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            // Stored as INTEGER 0/1
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Null => query.bind(None::<i64>),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_sql() {
        let column = ColumnDef {
            name: "created_at",
            graphql_name: "createdAt",
            sql_type: "TEXT",
            graphql_type: "String",
            nullable: false,
            is_primary_key: false,
            default: Some("datetime('now')"),
        };
        assert_eq!(
            column.to_sql(),
            "created_at TEXT NOT NULL DEFAULT datetime('now')"
        );
    }

    #[test]
    fn test_primary_key_is_not_marked_not_null() {
        let column = ColumnDef {
            name: "id",
            graphql_name: "id",
            sql_type: "INTEGER",
            graphql_type: "Int",
            nullable: false,
            is_primary_key: true,
            default: None,
        };
        assert_eq!(column.to_sql(), "id INTEGER PRIMARY KEY");
    }

    #[test]
    fn test_optional_values_become_null() {
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i32)), SqlValue::Int(3));
        assert!(SqlValue::from(None::<i64>).is_null());
    }
}
