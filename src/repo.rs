//! Data access for the todos table.
//!
//! Each operation is a single parameterized statement; SQL text is composed
//! from the active backend's dialect and the same bind order is used for
//! both backends. Backend errors are surfaced unmodified as `sqlx::Error`.

use chrono::Utc;

use crate::db::Db;
use crate::model::Todo;
use crate::schema::{FilterOptions, NewTodo, TodoChanges};

const COLUMNS: &str =
    "id, title, description, completed, priority, due_date, payload, created_at, updated_at";

/// Insert a new Todo. New items start uncompleted and both timestamps are
/// assigned here, at insert time.
pub async fn create_todo(db: &Db, new: NewTodo) -> Result<Todo, sqlx::Error> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO todos (title, description, completed, priority, due_date, payload, \
         created_at, updated_at) VALUES ({}) RETURNING {COLUMNS}",
        db.dialect().placeholders(8),
    );

    match db {
        Db::Postgres(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(&new.title)
                .bind(&new.description)
                .bind(false)
                .bind(new.priority)
                .bind(new.due_date)
                .bind(&new.payload)
                .bind(now)
                .bind(now)
                .fetch_one(pool)
                .await
        }
        Db::Sqlite(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(&new.title)
                .bind(&new.description)
                .bind(false)
                .bind(new.priority)
                .bind(new.due_date)
                .bind(&new.payload)
                .bind(now)
                .bind(now)
                .fetch_one(pool)
                .await
        }
    }
}

/// Fetch a Todo by id, or `None` if it does not exist.
pub async fn get_todo(db: &Db, id: i32) -> Result<Option<Todo>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNS} FROM todos WHERE id = {}",
        db.dialect().placeholder(1),
    );

    match db {
        Db::Postgres(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        }
        Db::Sqlite(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        }
    }
}

/// List Todos, newest first, optionally filtered by completion flag and
/// priority. Filters compose with AND.
pub async fn list_todos(db: &Db, filter: &FilterOptions) -> Result<Vec<Todo>, sqlx::Error> {
    let dialect = db.dialect();
    let mut sql = format!("SELECT {COLUMNS} FROM todos");

    let mut conditions = Vec::new();
    let mut position = 0;
    if filter.completed.is_some() {
        position += 1;
        conditions.push(format!("completed = {}", dialect.placeholder(position)));
    }
    if filter.priority.is_some() {
        position += 1;
        conditions.push(format!("priority = {}", dialect.placeholder(position)));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    match db {
        Db::Postgres(pool) => {
            let mut query = sqlx::query_as::<_, Todo>(&sql);
            if let Some(completed) = filter.completed {
                query = query.bind(completed);
            }
            if let Some(priority) = filter.priority {
                query = query.bind(priority);
            }
            query.fetch_all(pool).await
        }
        Db::Sqlite(pool) => {
            let mut query = sqlx::query_as::<_, Todo>(&sql);
            if let Some(completed) = filter.completed {
                query = query.bind(completed);
            }
            if let Some(priority) = filter.priority {
                query = query.bind(priority);
            }
            query.fetch_all(pool).await
        }
    }
}

/// Apply a partial update. Absent fields keep their stored value via
/// COALESCE; `updated_at` is always part of the update set, so even an
/// empty change set bumps it. Returns `None` if the id does not exist.
pub async fn update_todo(
    db: &Db,
    id: i32,
    changes: TodoChanges,
) -> Result<Option<Todo>, sqlx::Error> {
    let now = Utc::now();
    let dialect = db.dialect();
    let sql = format!(
        "UPDATE todos SET \
         title = COALESCE({p1}, title), \
         description = COALESCE({p2}, description), \
         completed = COALESCE({p3}, completed), \
         priority = COALESCE({p4}, priority), \
         due_date = COALESCE({p5}, due_date), \
         payload = COALESCE({p6}, payload), \
         updated_at = {p7} \
         WHERE id = {p8} RETURNING {COLUMNS}",
        p1 = dialect.placeholder(1),
        p2 = dialect.placeholder(2),
        p3 = dialect.placeholder(3),
        p4 = dialect.placeholder(4),
        p5 = dialect.placeholder(5),
        p6 = dialect.placeholder(6),
        p7 = dialect.placeholder(7),
        p8 = dialect.placeholder(8),
    );

    match db {
        Db::Postgres(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(&changes.title)
                .bind(&changes.description)
                .bind(changes.completed)
                .bind(changes.priority)
                .bind(changes.due_date)
                .bind(&changes.payload)
                .bind(now)
                .bind(id)
                .fetch_optional(pool)
                .await
        }
        Db::Sqlite(pool) => {
            sqlx::query_as::<_, Todo>(&sql)
                .bind(&changes.title)
                .bind(&changes.description)
                .bind(changes.completed)
                .bind(changes.priority)
                .bind(changes.due_date)
                .bind(&changes.payload)
                .bind(now)
                .bind(id)
                .fetch_optional(pool)
                .await
        }
    }
}

/// Delete a Todo by id. Returns whether a row was actually deleted.
pub async fn delete_todo(db: &Db, id: i32) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM todos WHERE id = {}",
        db.dialect().placeholder(1),
    );

    let rows_affected = match db {
        Db::Postgres(pool) => sqlx::query(&sql).bind(id).execute(pool).await?.rows_affected(),
        Db::Sqlite(pool) => sqlx::query(&sql).bind(id).execute(pool).await?.rows_affected(),
    };
    Ok(rows_affected > 0)
}
