//! Create entity tables and add columns that are missing.
//!
//! Only additive changes are applied; renames and type changes are left to
//! the caller.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::orm::{ColumnDef, DatabaseSchema};

/// What a sync run changed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    /// `(table, column)`
    pub columns_added: Vec<(String, String)>,
}

impl SchemaSyncResult {
    pub fn is_noop(&self) -> bool {
        self.tables_created.is_empty() && self.columns_added.is_empty()
    }
}

/// Column names currently on `table`; empty when the table does not exist.
async fn existing_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(pool)
        .await
}

/// Bring `E`'s table in line with its column definitions.
pub async fn sync_entity<E: DatabaseSchema>(
    pool: &SqlitePool,
) -> Result<SchemaSyncResult, sqlx::Error> {
    let table = E::TABLE_NAME;
    let mut result = SchemaSyncResult::default();
    let existing = existing_columns(pool, table).await?;

    if existing.is_empty() {
        let sql = E::create_table_sql();
        debug!(table, sql = %sql, "Creating table");
        sqlx::query(&sql).execute(pool).await?;
        info!(table, "Created table");
        result.tables_created.push(table.to_string());
        return Ok(result);
    }

    let missing = E::columns()
        .iter()
        .filter(|col| !existing.iter().any(|name| name == col.name));
    for col in missing {
        let sql = add_column_sql(table, col);
        debug!(table, sql = %sql, "Adding column");
        sqlx::query(&sql).execute(pool).await?;
        info!(table, column = col.name, "Added column");
        result.columns_added.push((table.to_string(), col.name.to_string()));
    }

    Ok(result)
}

/// SQLite refuses `ADD COLUMN ... NOT NULL` without a default, so one is
/// supplied for required columns that don't declare their own.
fn add_column_sql(table: &str, col: &ColumnDef) -> String {
    let mut sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, col.name, col.sql_type);
    match (col.default, col.nullable) {
        (Some(default), _) => sql.push_str(&format!(" DEFAULT {}", default)),
        (None, true) => {}
        (None, false) => {
            let zero = match col.sql_type {
                "INTEGER" => "0",
                "REAL" => "0.0",
                _ => "''",
            };
            sql.push_str(&format!(" NOT NULL DEFAULT {}", zero));
        }
    }
    sql
}
