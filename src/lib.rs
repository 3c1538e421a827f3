//! GraphQL resolvers backed by ORM find options.
//!
//! - [resolver](resolver::resolver) builds a field resolver for a root entity
//!   or an association, translating `limit`, `offset`, `order` and column
//!   arguments into [FindOptions](orm::FindOptions), with an optional
//!   `before` hook to adjust them per field.
//! - [graphql] plugs resolvers and entities into an async-graphql dynamic
//!   schema.
//! - [orm] and [db] are the entity layer over SQLite.

// Lets `#[derive(Entity)]` output (`::orm_resolver::...`) resolve inside this crate
extern crate self as orm_resolver;

pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod orm;
pub mod resolver;
pub mod telemetry;

pub use config::Config;
pub use db::Database;
pub use error::ResolveError;
pub use orm_resolver_macros::Entity;
pub use resolver::{
    Forward, Resolve, ResolveContext, ResolveInfo, Resolved, Resolver, ResolverArgs, resolver, wrap,
};

// Used by generated code
#[doc(hidden)]
pub use sqlx;
