//! async-graphql glue
//!
//! Turns resolvers into dynamic schema fields and entities into dynamic
//! object types. The schema must carry a [Database] as data; a
//! [QueryLogger] in schema or request data is picked up per call.
//!
//! ```rust,ignore
//! let user = entity_object::<User>("User").field(find_args(field(
//!     "tasks",
//!     TypeRef::named_nn_list_nn("Task"),
//!     resolver(HasMany::<User, Task>::new("user_id")),
//! )));
//! let query = Object::new("Query").field(
//!     field("user", TypeRef::named("User"), resolver(Model::<User>::new()))
//!         .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::INT))),
//! );
//! let schema = Schema::build("Query", None, None)
//!     .register(query)
//!     .register(user)
//!     .register(entity_object::<Task>("Task"))
//!     .data(db)
//!     .finish()?;
//! ```

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, Object, TypeRef};
use async_graphql::{Context, Error, Number, Value};

use crate::db::Database;
use crate::error::ResolveError;
use crate::orm::{ColumnDef, DatabaseSchema, QueryLogger, SqlValue};
use crate::resolver::args::{LIMIT_ARG, OFFSET_ARG, ORDER_ARG};
use crate::resolver::{Resolve, ResolveContext, ResolveInfo, Resolved, ResolverArgs};

/// Build a dynamic field backed by a resolver.
///
/// The parent value is downcast to `R::Parent`; root fields see `None`.
/// A failed call on a nullable field resolves to `null` with the error
/// recorded in the response; on a non-null field the error propagates so
/// the nearest nullable parent becomes `null`.
pub fn field<R>(name: impl Into<String>, ty: TypeRef, resolver: R) -> Field
where
    R: Resolve + 'static,
{
    let name = name.into();
    let list = is_list(&ty);
    let nullable = !matches!(ty, TypeRef::NonNull(_));
    let resolver = Arc::new(resolver);
    let info = Arc::new(ResolveInfo {
        field_name: name.clone(),
        list,
    });

    Field::new(name, ty, move |rctx| {
        let resolver = Arc::clone(&resolver);
        let info = Arc::clone(&info);
        FieldFuture::new(async move {
            let result = async {
                let ctx = resolve_context(rctx.ctx)?;
                let args = ResolverArgs::from_accessor(&rctx.args);
                let root = rctx.parent_value.downcast_ref::<R::Parent>();
                resolver.resolve(root, &args, &ctx, &info).await
            }
            .await;

            match result {
                Ok(resolved) => Ok(into_field_value(resolved)),
                Err(err) if nullable => {
                    tracing::debug!(
                        field = %info.field_name,
                        error = %err,
                        "Field resolved to null"
                    );
                    let error =
                        Error::new(err.to_string()).into_server_error(rctx.ctx.item.pos);
                    rctx.ctx.add_error(rctx.ctx.set_error_path(error));
                    Ok(None)
                }
                Err(err) => Err(err.into()),
            }
        })
    })
}

/// Add the `limit`, `offset` and `order` arguments to a field.
pub fn find_args(field: Field) -> Field {
    field
        .argument(InputValue::new(LIMIT_ARG, TypeRef::named(TypeRef::INT)))
        .argument(InputValue::new(OFFSET_ARG, TypeRef::named(TypeRef::INT)))
        .argument(InputValue::new(ORDER_ARG, TypeRef::named(TypeRef::STRING)))
}

/// Dynamic object type exposing every column of `E` as a scalar field.
pub fn entity_object<E>(type_name: impl Into<String>) -> Object
where
    E: DatabaseSchema + 'static,
{
    E::columns()
        .iter()
        .fold(Object::new(type_name), |object, column| {
            let name = column.name;
            object.field(Field::new(
                column.graphql_name,
                scalar_type(column),
                move |ctx| {
                    FieldFuture::new(async move {
                        let entity = ctx.parent_value.try_downcast_ref::<E>()?;
                        Ok(entity.column_value(name).and_then(graphql_value))
                    })
                },
            ))
        })
}

fn resolve_context(ctx: &Context<'_>) -> Result<ResolveContext, ResolveError> {
    let db = ctx
        .data::<Database>()
        .map_err(|_| ResolveError::MissingContext("Database"))?;
    let resolve_ctx = ResolveContext::new(db.clone());
    Ok(match ctx.data_opt::<QueryLogger>() {
        Some(logger) => resolve_ctx.with_logger(logger.clone()),
        None => resolve_ctx,
    })
}

fn into_field_value<'a, E>(resolved: Resolved<E>) -> Option<FieldValue<'a>>
where
    E: Send + Sync + 'static,
{
    match resolved {
        Resolved::One(entity) => entity.map(FieldValue::owned_any),
        Resolved::Many(entities) => Some(FieldValue::list(
            entities.into_iter().map(FieldValue::owned_any),
        )),
    }
}

fn is_list(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::List(_) => true,
        TypeRef::NonNull(inner) => is_list(inner),
        TypeRef::Named(_) => false,
    }
}

fn scalar_type(column: &ColumnDef) -> TypeRef {
    if column.nullable {
        TypeRef::named(column.graphql_type)
    } else {
        TypeRef::named_nn(column.graphql_type)
    }
}

/// `None` for SQL NULL
pub fn graphql_value(value: SqlValue) -> Option<Value> {
    match value {
        SqlValue::String(s) => Some(Value::String(s)),
        SqlValue::Int(i) => Some(Value::Number(i.into())),
        SqlValue::Float(f) => Number::from_f64(f).map(Value::Number),
        SqlValue::Bool(b) => Some(Value::Boolean(b)),
        SqlValue::Null => None,
    }
}
