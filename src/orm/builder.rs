//! SELECT builder for one entity table.
//!
//! Turns [FindOptions] into parameterized SQL. Column names are checked
//! against the entity before they reach the SQL text; values are always
//! bound, never interpolated.

use std::marker::PhantomData;

use sqlx::{Row, SqlitePool};

use super::options::{Condition, ConditionOp, FindOptions, OrderClause, QueryLogger};
use super::traits::{DatabaseEntity, FromSqlRow, SqlValue, SqliteQuery};
use crate::error::ResolveError;

#[derive(Debug)]
pub struct EntityQuery<E> {
    filters: Vec<String>,
    binds: Vec<SqlValue>,
    order_by: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    logger: Option<QueryLogger>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: DatabaseEntity + FromSqlRow> EntityQuery<E> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            binds: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            logger: None,
            _entity: PhantomData,
        }
    }

    /// Translate find options, falling back to the entity's default sort
    /// when they carry no order.
    pub fn from_options(options: &FindOptions) -> Result<Self, ResolveError> {
        let mut query = options
            .conditions
            .iter()
            .try_fold(Self::new(), |query, condition| query.condition(condition))?;
        query = options
            .order
            .iter()
            .try_fold(query, |query, clause| query.order(clause))?
            .default_order();

        query.limit = options.limit;
        query.offset = options.offset;
        query.logger = options.logging.clone();
        Ok(query)
    }

    /// AND one condition onto the WHERE clause. Comparisons against NULL
    /// become `IS [NOT] NULL`.
    pub fn condition(mut self, condition: &Condition) -> Result<Self, ResolveError> {
        let column = checked_column::<E>(&condition.column)?;
        match (&condition.value, condition.op) {
            (SqlValue::Null, ConditionOp::Eq) => self.filters.push(format!("{} IS NULL", column)),
            (SqlValue::Null, ConditionOp::Ne) => {
                self.filters.push(format!("{} IS NOT NULL", column))
            }
            (value, op) => {
                self.binds.push(value.clone());
                self.filters
                    .push(format!("{} {} ?{}", column, op.to_sql(), self.binds.len()));
            }
        }
        Ok(self)
    }

    /// Append an ORDER BY term.
    pub fn order(mut self, clause: &OrderClause) -> Result<Self, ResolveError> {
        checked_column::<E>(&clause.column)?;
        self.order_by.push(clause.to_sql());
        Ok(self)
    }

    pub fn default_order(mut self) -> Self {
        if self.order_by.is_empty() {
            self.order_by
                .push(format!("{} {}", E::DEFAULT_SORT, E::DEFAULT_SORT_DIR.to_sql()));
        }
        self
    }

    fn where_sql(&self) -> String {
        if self.filters.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.filters.join(" AND "))
        }
    }

    pub fn build_sql(&self) -> String {
        let mut sql = E::select_sql() + &self.where_sql();
        if !self.order_by.is_empty() {
            sql += &format!(" ORDER BY {}", self.order_by.join(", "));
        }

        let offset = self.offset.filter(|o| *o > 0);
        match (self.limit, offset) {
            (Some(limit), _) => sql += &format!(" LIMIT {}", limit),
            // SQLite only accepts OFFSET after a LIMIT
            (None, Some(_)) => sql += " LIMIT -1",
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql += &format!(" OFFSET {}", offset);
        }
        sql
    }

    fn build_count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", E::TABLE_NAME, self.where_sql())
    }

    /// Log the statement and bind every collected value to it.
    fn prepare<'q>(&'q self, sql: &'q str) -> SqliteQuery<'q> {
        tracing::debug!(table = E::TABLE_NAME, sql, binds = self.binds.len(), "Executing query");
        if let Some(logger) = &self.logger {
            logger.log(sql);
        }
        self.binds
            .iter()
            .fold(sqlx::query(sql), |query, value| value.bind_to(query))
    }

    pub async fn fetch_all(self, pool: &SqlitePool) -> Result<Vec<E>, sqlx::Error> {
        let sql = self.build_sql();
        let rows = self.prepare(&sql).fetch_all(pool).await?;
        rows.iter().map(E::from_row).collect()
    }

    pub async fn fetch_one(self, pool: &SqlitePool) -> Result<Option<E>, sqlx::Error> {
        let sql = self.build_sql();
        let row = self.prepare(&sql).fetch_optional(pool).await?;
        row.as_ref().map(E::from_row).transpose()
    }

    /// Number of rows matching the conditions; order, limit and offset are ignored.
    pub async fn count(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let sql = self.build_count_sql();
        let row = self.prepare(&sql).fetch_one(pool).await?;
        row.try_get(0)
    }
}

impl<E: DatabaseEntity + FromSqlRow> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Only columns the entity declares may reach the SQL text.
fn checked_column<E: DatabaseEntity>(column: &str) -> Result<&'static str, ResolveError> {
    E::column_names()
        .iter()
        .copied()
        .find(|c| *c == column)
        .ok_or_else(|| ResolveError::UnknownColumn {
            table: E::TABLE_NAME,
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(crate::Entity, Clone, Debug)]
    #[entity(table = "tasks", default_sort = "created_at")]
    struct Task {
        id: i64,
        title: String,
        created_at: String,
        user_id: Option<i64>,
    }

    #[test]
    fn test_default_order_applies_without_order() {
        let query = EntityQuery::<Task>::from_options(&FindOptions::new()).unwrap();
        assert_eq!(
            query.build_sql(),
            "SELECT id, title, created_at, user_id FROM tasks ORDER BY created_at ASC"
        );
    }

    #[test]
    fn test_full_query() {
        let options = FindOptions::new()
            .with_condition(Condition::eq("user_id", 1i64))
            .with_condition(Condition::gte("created_at", "2014-06-12"))
            .push_order(OrderClause::desc("created_at"))
            .push_order(OrderClause::asc("title"))
            .with_limit(2)
            .with_offset(1);

        let query = EntityQuery::<Task>::from_options(&options).unwrap();

        assert_eq!(
            query.build_sql(),
            "SELECT id, title, created_at, user_id FROM tasks \
             WHERE user_id = ?1 AND created_at >= ?2 \
             ORDER BY created_at DESC, title ASC LIMIT 2 OFFSET 1"
        );
        assert_eq!(query.binds.len(), 2);
    }

    #[test]
    fn test_offset_without_limit() {
        let options = FindOptions::new().with_offset(3);
        let query = EntityQuery::<Task>::from_options(&options).unwrap();
        assert!(query.build_sql().ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn test_null_condition() {
        let options = FindOptions::new().with_condition(Condition::eq("user_id", SqlValue::Null));
        let query = EntityQuery::<Task>::from_options(&options).unwrap();
        assert!(query.build_sql().contains("WHERE user_id IS NULL"));
        assert!(query.binds.is_empty());

        let options = FindOptions::new().with_condition(Condition::ne("user_id", None::<i64>));
        let query = EntityQuery::<Task>::from_options(&options).unwrap();
        assert!(query.build_sql().contains("WHERE user_id IS NOT NULL"));
    }

    #[test]
    fn test_comparison_operators() {
        let options = FindOptions::new()
            .with_condition(Condition::lt("created_at", "2014-07-01"))
            .with_condition(Condition::lte("id", 4i64))
            .with_condition(Condition::ne("title", "Plan sprint"));
        let query = EntityQuery::<Task>::from_options(&options).unwrap();

        assert!(
            query
                .build_sql()
                .contains("WHERE created_at < ?1 AND id <= ?2 AND title != ?3")
        );
        assert_eq!(
            query.binds,
            vec![
                SqlValue::String("2014-07-01".to_string()),
                SqlValue::Int(4),
                SqlValue::String("Plan sprint".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_columns_rejected() {
        let options = FindOptions::new().push_order(OrderClause::asc("title; DROP TABLE tasks"));
        assert_matches!(
            EntityQuery::<Task>::from_options(&options),
            Err(ResolveError::UnknownColumn { table: "tasks", .. })
        );

        let options = FindOptions::new().with_condition(Condition::eq("owner", 1i64));
        assert_matches!(
            EntityQuery::<Task>::from_options(&options),
            Err(ResolveError::UnknownColumn { column, .. }) if column == "owner"
        );
    }

    #[tokio::test]
    async fn test_fetch_and_count() {
        let db = crate::Database::connect(&crate::Config::default()).await.unwrap();
        db.sync::<Task>().await.unwrap();
        for (id, created_at) in [(1, "2014-06-16"), (2, "2014-06-11"), (3, "2014-06-20")] {
            let task = Task {
                id,
                title: format!("task {}", id),
                created_at: created_at.to_string(),
                user_id: Some(1),
            };
            db.insert(&task).await.unwrap();
        }

        let options = FindOptions::new().with_condition(Condition::gt("created_at", "2014-06-12"));
        let query = EntityQuery::<Task>::from_options(&options).unwrap();

        assert_eq!(query.count(db.pool()).await.unwrap(), 2);
        let ids: Vec<i64> = query
            .fetch_all(db.pool())
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
