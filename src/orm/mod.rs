//! ORM Layer
//!
//! Provides traits and utilities for entities generated by `#[derive(Entity)]`.
//! The `orm-resolver-macros` crate generates implementations of these traits
//! from annotated Rust structs, creating a single source of truth for:
//! - Table schema (`DatabaseSchema`, used by schema sync)
//! - Row decoding (`FromSqlRow`)
//! - Column access (`DatabaseEntity::column_value`, used by associations)
//!
//! Queries are described by [FindOptions] and executed through a
//! [Queryable]:
//!
//! ```rust,ignore
//! use orm_resolver::orm::{FindOptions, HasMany, OrderClause, Queryable};
//!
//! let tasks = HasMany::<User, Task>::new("user_id")
//!     .find_all(
//!         &db,
//!         FindOptions::new().push_order(OrderClause::asc("created_at")).with_limit(2),
//!         Some(&user),
//!     )
//!     .await?;
//! ```

mod builder;
mod options;
mod queryable;
mod traits;

pub use builder::*;
pub use options::*;
pub use queryable::*;
pub use traits::*;
