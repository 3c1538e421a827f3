//! Shared fixtures: two users with their tasks, and the schema over them.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_graphql::dynamic::{InputValue, Object, Schema, TypeRef};
use orm_resolver::graphql::{entity_object, field, find_args};
use orm_resolver::orm::{BelongsTo, FindOptions, HasMany, Model, OrderClause, QueryLogger};
use orm_resolver::{Config, Database, Entity, ResolveContext, ResolverArgs, resolver};

#[derive(Entity, Clone, Debug, PartialEq)]
#[entity(table = "users", default_sort = "id")]
pub struct User {
    #[primary_key]
    pub id: i64,
    pub name: String,
}

#[derive(Entity, Clone, Debug, PartialEq)]
#[entity(table = "tasks", default_sort = "id")]
pub struct Task {
    #[primary_key]
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub user_id: i64,
}

/// Never synced: selecting from it fails with "no such table"
#[derive(Entity, Clone, Debug, PartialEq)]
#[entity(table = "ghosts")]
pub struct Ghost {
    pub id: i64,
}

pub const ADA: i64 = 1;
pub const GRACE: i64 = 2;

pub fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
    }
}

fn task(id: i64, title: &str, created_at: &str, user_id: i64) -> Task {
    Task {
        id,
        title: title.to_string(),
        created_at: created_at.to_string(),
        user_id,
    }
}

pub fn users() -> Vec<User> {
    vec![user(ADA, "Ada Lovelace"), user(GRACE, "Grace Hopper")]
}

/// Inserted out of date order so default (id) order differs from date order
pub fn tasks() -> Vec<Task> {
    vec![
        task(1, "Write the report", "2014-06-16", ADA),
        task(2, "Book flights", "2014-06-11", ADA),
        task(3, "Ship release", "2014-06-20", ADA),
        task(4, "Review compiler", "2014-07-01", GRACE),
        task(5, "Plan sprint", "2014-05-02", GRACE),
    ]
}

pub async fn seeded_db() -> Database {
    orm_resolver::telemetry::init(&Config::default()).expect("tracing");
    let db = Database::connect(&Config::default())
        .await
        .expect("in-memory database");
    db.sync::<User>().await.expect("sync users");
    db.sync::<Task>().await.expect("sync tasks");
    for u in users() {
        db.insert(&u).await.expect("insert user");
    }
    for t in tasks() {
        db.insert(&t).await.expect("insert task");
    }
    db
}

/// The custom `first` argument: order by date, and take `first` rows when positive.
pub fn first_hook(
    options: FindOptions,
    args: &ResolverArgs,
    _user: Option<&User>,
    _ctx: &ResolveContext,
) -> anyhow::Result<FindOptions> {
    let options = options.push_order(OrderClause::asc("created_at"));
    Ok(match args.get_i64("first")? {
        Some(first) if first > 0 => options.with_limit(first),
        _ => options,
    })
}

pub fn tasks_resolver() -> orm_resolver::Resolver<HasMany<User, Task>> {
    resolver(HasMany::<User, Task>::new("user_id").named("tasks")).before(first_hook)
}

pub fn build_schema(db: Option<Database>) -> Schema {
    let user_type = entity_object::<User>("User").field(
        find_args(field(
            "tasks",
            TypeRef::named_nn_list_nn("Task"),
            tasks_resolver(),
        ))
        .argument(InputValue::new("first", TypeRef::named(TypeRef::INT))),
    );

    let task_type = entity_object::<Task>("Task").field(field(
        "user",
        TypeRef::named("User"),
        resolver(BelongsTo::<Task, User>::new("user_id").named("user")),
    ));

    let ghost_type = entity_object::<Ghost>("Ghost");

    let query = Object::new("Query")
        .field(
            field("user", TypeRef::named("User"), resolver(Model::<User>::new()))
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::INT))),
        )
        .field(find_args(field(
            "users",
            TypeRef::named_nn_list_nn("User"),
            resolver(Model::<User>::new()),
        )))
        .field(find_args(field(
            "wrappedUsers",
            TypeRef::named_nn_list_nn("User"),
            orm_resolver::wrap(resolver(Model::<User>::new())),
        )))
        .field(field(
            "ghosts",
            TypeRef::named_nn_list("Ghost"),
            resolver(Model::<Ghost>::new()),
        ));

    let builder = Schema::build("Query", None, None)
        .register(query)
        .register(user_type)
        .register(task_type)
        .register(ghost_type);
    let builder = match db {
        Some(db) => builder.data(db),
        None => builder,
    };
    builder.finish().expect("valid schema")
}

/// Logger that counts its invocations
pub fn counting_logger() -> (QueryLogger, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let logger = QueryLogger::new(move |_sql| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (logger, calls)
}
