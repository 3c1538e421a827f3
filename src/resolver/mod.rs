//! Resolver factory
//!
//! [resolver] binds a [Queryable] to an optional `before` hook and yields a
//! [Resolver]. Each call:
//!
//! 1. builds default [FindOptions] from the field arguments,
//! 2. passes them through the `before` hook, if any,
//! 3. attaches the query logger carried by the context,
//! 4. runs the query and returns one row or a list, per the field's
//!    cardinality.
//!
//! A resolver owns no mutable state, so one instance can serve any number of
//! concurrent calls.
//!
//! ```rust,ignore
//! let tasks = resolver(HasMany::<User, Task>::new("user_id")).before(
//!     |options, args, _user, _ctx| {
//!         let options = options.push_order(OrderClause::asc("created_at"));
//!         Ok(match args.get_i64("first")? {
//!             Some(first) if first > 0 => options.with_limit(first),
//!             _ => options,
//!         })
//!     },
//! );
//! ```

pub mod args;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Database;
use crate::error::ResolveError;
use crate::orm::{FindOptions, QueryLogger, Queryable};

pub use args::ResolverArgs;

/// Execution context handed to every resolver call.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    db: Database,
    logger: Option<QueryLogger>,
}

impl ResolveContext {
    pub fn new(db: Database) -> Self {
        Self { db, logger: None }
    }

    pub fn with_logger(self, logger: QueryLogger) -> Self {
        Self {
            logger: Some(logger),
            ..self
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn logger(&self) -> Option<&QueryLogger> {
        self.logger.as_ref()
    }
}

/// What the resolver knows about the field it is resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    pub field_name: String,
    /// Whether the field is declared as a list
    pub list: bool,
}

impl ResolveInfo {
    pub fn list(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            list: true,
        }
    }

    pub fn single(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            list: false,
        }
    }
}

/// Result of one resolver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<E> {
    One(Option<E>),
    Many(Vec<E>),
}

impl<E> Resolved<E> {
    pub fn into_vec(self) -> Vec<E> {
        match self {
            Resolved::One(entity) => entity.into_iter().collect(),
            Resolved::Many(entities) => entities,
        }
    }

    pub fn into_one(self) -> Option<E> {
        match self {
            Resolved::One(entity) => entity,
            Resolved::Many(entities) => entities.into_iter().next(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::One(entity) => usize::from(entity.is_some()),
            Resolved::Many(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A GraphQL field resolver: `(root, args, context, info)`.
#[async_trait]
pub trait Resolve: Send + Sync {
    type Entity: Send + Sync + 'static;
    type Parent: Send + Sync + 'static;

    async fn resolve(
        &self,
        root: Option<&Self::Parent>,
        args: &ResolverArgs,
        ctx: &ResolveContext,
        info: &ResolveInfo,
    ) -> Result<Resolved<Self::Entity>, ResolveError>;
}

/// The `before` hook: receives the default options and returns the ones to run.
pub type BeforeHook<P> = Arc<
    dyn Fn(FindOptions, &ResolverArgs, Option<&P>, &ResolveContext) -> anyhow::Result<FindOptions>
        + Send
        + Sync,
>;

/// Resolver bound to one queryable and one static configuration.
pub struct Resolver<Q: Queryable> {
    queryable: Q,
    before: Option<BeforeHook<Q::Parent>>,
}

/// Build a resolver for a queryable.
pub fn resolver<Q: Queryable>(queryable: Q) -> Resolver<Q> {
    Resolver {
        queryable,
        before: None,
    }
}

impl<Q: Queryable> Resolver<Q> {
    /// Install the `before` hook, replacing any previous one.
    pub fn before<F>(self, hook: F) -> Self
    where
        F: Fn(
                FindOptions,
                &ResolverArgs,
                Option<&Q::Parent>,
                &ResolveContext,
            ) -> anyhow::Result<FindOptions>
            + Send
            + Sync
            + 'static,
    {
        let hook: BeforeHook<Q::Parent> = Arc::new(hook);
        Self {
            before: Some(hook),
            ..self
        }
    }

    /// Options the query would run with, without running it.
    pub fn find_options(
        &self,
        root: Option<&Q::Parent>,
        args: &ResolverArgs,
        ctx: &ResolveContext,
    ) -> Result<FindOptions, ResolveError> {
        let options = FindOptions::from_args::<Q::Entity>(args)?;

        let options = match &self.before {
            Some(hook) => hook(options, args, root, ctx).map_err(ResolveError::Hook)?,
            None => options,
        };

        Ok(match (options.logging.is_some(), ctx.logger()) {
            (false, Some(logger)) => options.with_logging(logger.clone()),
            _ => options,
        })
    }
}

#[async_trait]
impl<Q: Queryable> Resolve for Resolver<Q> {
    type Entity = Q::Entity;
    type Parent = Q::Parent;

    async fn resolve(
        &self,
        root: Option<&Q::Parent>,
        args: &ResolverArgs,
        ctx: &ResolveContext,
        info: &ResolveInfo,
    ) -> Result<Resolved<Q::Entity>, ResolveError> {
        let options = self.find_options(root, args, ctx)?;
        let many = self.queryable.is_many().unwrap_or(info.list);

        tracing::debug!(
            field = %info.field_name,
            queryable = self.queryable.name(),
            many,
            limit = ?options.limit,
            "Resolving field"
        );

        if many {
            let rows = self.queryable.find_all(ctx.db(), options, root).await?;
            Ok(Resolved::Many(rows))
        } else {
            let row = self.queryable.find_one(ctx.db(), options, root).await?;
            Ok(Resolved::One(row))
        }
    }
}

/// Transparent forwarding wrapper around a resolver.
pub struct Forward<R> {
    inner: R,
}

/// Wrap a resolver in a pass-through proxy.
pub fn wrap<R: Resolve>(inner: R) -> Forward<R> {
    Forward { inner }
}

#[async_trait]
impl<R: Resolve> Resolve for Forward<R> {
    type Entity = R::Entity;
    type Parent = R::Parent;

    async fn resolve(
        &self,
        root: Option<&R::Parent>,
        args: &ResolverArgs,
        ctx: &ResolveContext,
        info: &ResolveInfo,
    ) -> Result<Resolved<R::Entity>, ResolveError> {
        self.inner.resolve(root, args, ctx, info).await
    }
}

#[async_trait]
impl<R: Resolve> Resolve for Arc<R> {
    type Entity = R::Entity;
    type Parent = R::Parent;

    async fn resolve(
        &self,
        root: Option<&R::Parent>,
        args: &ResolverArgs,
        ctx: &ResolveContext,
        info: &ResolveInfo,
    ) -> Result<Resolved<R::Entity>, ResolveError> {
        self.as_ref().resolve(root, args, ctx, info).await
    }
}
