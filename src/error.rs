//! Errors raised while resolving a field.

use thiserror::Error;

/// Failure of a single resolver call.
///
/// Store and hook failures are transparent so the GraphQL layer reports the
/// underlying message unchanged.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The data store rejected or failed the query
    #[error(transparent)]
    Query(#[from] sqlx::Error),

    /// The `before` hook failed; the query was never dispatched
    #[error(transparent)]
    Hook(anyhow::Error),

    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("unknown column `{column}` on `{table}`")]
    UnknownColumn { table: &'static str, column: String },

    /// An association was resolved without the parent row it hangs off
    #[error("association `{association}` resolved without a parent value")]
    MissingParent { association: String },

    #[error("{0} is not available in the execution context")]
    MissingContext(&'static str),
}

impl ResolveError {
    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        ResolveError::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
