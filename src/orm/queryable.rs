//! Queryables: the things a resolver can be bound to.
//!
//! A root entity ([Model]) or an association hanging off a parent row
//! ([HasMany], [BelongsTo]). Associations scope the query to their parent
//! themselves; order, limit and offset from the find options pass through
//! untouched.

use std::marker::PhantomData;

use async_trait::async_trait;

use super::builder::EntityQuery;
use super::options::{Condition, FindOptions};
use super::traits::{DatabaseEntity, DatabaseSchema, FromSqlRow, SqlValue};
use crate::db::Database;
use crate::error::ResolveError;

/// Something find options can be executed against.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Rows produced by this queryable
    type Entity: DatabaseSchema + FromSqlRow + Send + Sync + 'static;

    /// Value the field hangs off; `()` for root entities
    type Parent: Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Fixed cardinality, or `None` to follow the GraphQL field type.
    fn is_many(&self) -> Option<bool> {
        None
    }

    async fn find_all(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&Self::Parent>,
    ) -> Result<Vec<Self::Entity>, ResolveError>;

    async fn find_one(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&Self::Parent>,
    ) -> Result<Option<Self::Entity>, ResolveError>;
}

/// Never widen a caller's limit when fetching a single row.
fn single_row(options: FindOptions) -> FindOptions {
    let limit = options.limit.map_or(1, |l| l.min(1));
    options.with_limit(limit)
}

/// A root entity type.
pub struct Model<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> Model<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for Model<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> Queryable for Model<E>
where
    E: DatabaseSchema + FromSqlRow + Send + Sync + 'static,
{
    type Entity = E;
    type Parent = ();

    fn name(&self) -> &str {
        E::TABLE_NAME
    }

    async fn find_all(
        &self,
        db: &Database,
        options: FindOptions,
        _parent: Option<&()>,
    ) -> Result<Vec<E>, ResolveError> {
        let query = EntityQuery::<E>::from_options(&options)?;
        Ok(query.fetch_all(db.pool()).await?)
    }

    async fn find_one(
        &self,
        db: &Database,
        options: FindOptions,
        _parent: Option<&()>,
    ) -> Result<Option<E>, ResolveError> {
        let query = EntityQuery::<E>::from_options(&single_row(options))?;
        Ok(query.fetch_one(db.pool()).await?)
    }
}

/// One-to-many association: `T.foreign_key` references `S`'s primary key.
pub struct HasMany<S, T> {
    foreign_key: &'static str,
    name: String,
    _marker: PhantomData<fn() -> (S, T)>,
}

impl<S: DatabaseEntity, T: DatabaseEntity> HasMany<S, T> {
    pub fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            name: format!("{}.{}", S::TABLE_NAME, T::TABLE_NAME),
            _marker: PhantomData,
        }
    }

    /// Name used in logs and errors (the GraphQL field name, usually)
    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    fn scoped(
        &self,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<FindOptions, ResolveError> {
        let parent = parent.ok_or_else(|| ResolveError::MissingParent {
            association: self.name.clone(),
        })?;
        let key = parent
            .column_value(S::PRIMARY_KEY)
            .ok_or_else(|| ResolveError::UnknownColumn {
                table: S::TABLE_NAME,
                column: S::PRIMARY_KEY.to_string(),
            })?;
        Ok(options.with_condition(Condition::eq(self.foreign_key, key)))
    }
}

#[async_trait]
impl<S, T> Queryable for HasMany<S, T>
where
    S: DatabaseEntity + 'static,
    T: DatabaseSchema + FromSqlRow + Send + Sync + 'static,
{
    type Entity = T;
    type Parent = S;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_many(&self) -> Option<bool> {
        Some(true)
    }

    async fn find_all(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<Vec<T>, ResolveError> {
        let options = self.scoped(options, parent)?;
        let query = EntityQuery::<T>::from_options(&options)?;
        Ok(query.fetch_all(db.pool()).await?)
    }

    async fn find_one(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<Option<T>, ResolveError> {
        let options = single_row(self.scoped(options, parent)?);
        let query = EntityQuery::<T>::from_options(&options)?;
        Ok(query.fetch_one(db.pool()).await?)
    }
}

/// To-one association: `S.foreign_key` references `T`'s primary key.
pub struct BelongsTo<S, T> {
    foreign_key: &'static str,
    name: String,
    _marker: PhantomData<fn() -> (S, T)>,
}

impl<S: DatabaseEntity, T: DatabaseEntity> BelongsTo<S, T> {
    pub fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            name: format!("{}.{}", S::TABLE_NAME, T::TABLE_NAME),
            _marker: PhantomData,
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// `None` when the parent's foreign key is NULL.
    fn scoped(
        &self,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<Option<FindOptions>, ResolveError> {
        let parent = parent.ok_or_else(|| ResolveError::MissingParent {
            association: self.name.clone(),
        })?;
        let key = parent
            .column_value(self.foreign_key)
            .ok_or_else(|| ResolveError::UnknownColumn {
                table: S::TABLE_NAME,
                column: self.foreign_key.to_string(),
            })?;
        if let SqlValue::Null = key {
            return Ok(None);
        }
        Ok(Some(options.with_condition(Condition::eq(T::PRIMARY_KEY, key))))
    }
}

#[async_trait]
impl<S, T> Queryable for BelongsTo<S, T>
where
    S: DatabaseEntity + 'static,
    T: DatabaseSchema + FromSqlRow + Send + Sync + 'static,
{
    type Entity = T;
    type Parent = S;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_many(&self) -> Option<bool> {
        Some(false)
    }

    async fn find_all(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<Vec<T>, ResolveError> {
        Ok(self.find_one(db, options, parent).await?.into_iter().collect())
    }

    async fn find_one(
        &self,
        db: &Database,
        options: FindOptions,
        parent: Option<&S>,
    ) -> Result<Option<T>, ResolveError> {
        let Some(options) = self.scoped(options, parent)? else {
            return Ok(None);
        };
        let query = EntityQuery::<T>::from_options(&single_row(options))?;
        Ok(query.fetch_one(db.pool()).await?)
    }
}
