//! Schema migration runner, applied on every startup.
//!
//! Migrations are ordered and recorded in a `schema_migrations` table, so
//! re-running the runner is a no-op for versions already applied. Each
//! pending migration commits its statements and its bookkeeping row in one
//! transaction.

use anyhow::{Context, Result};
use tracing::info;

use crate::db::{Db, Dialect};

struct Migration {
    version: i64,
    name: &'static str,
    statements: fn(&Dialect) -> Vec<String>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create-todos-table",
        statements: create_todos_table,
    },
    Migration {
        version: 2,
        name: "add-todo-indexes",
        statements: add_todo_indexes,
    },
    Migration {
        version: 3,
        name: "add-payload-column",
        statements: add_payload_column,
    },
];

fn create_todos_table(dialect: &Dialect) -> Vec<String> {
    vec![format!(
        "CREATE TABLE IF NOT EXISTS todos (
            id {auto_pk},
            title VARCHAR(255) NOT NULL,
            description TEXT,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            priority INTEGER NOT NULL DEFAULT 2,
            due_date {timestamp},
            created_at {timestamp} NOT NULL,
            updated_at {timestamp} NOT NULL
        )",
        auto_pk = dialect.auto_primary_key(),
        timestamp = dialect.timestamp_type(),
    )]
}

fn add_todo_indexes(_dialect: &Dialect) -> Vec<String> {
    [
        ("idx_todos_completed", "completed"),
        ("idx_todos_priority", "priority"),
        ("idx_todos_created_at", "created_at"),
        ("idx_todos_completed_priority", "completed, priority"),
    ]
    .iter()
    .map(|(name, columns)| format!("CREATE INDEX IF NOT EXISTS {name} ON todos ({columns})"))
    .collect()
}

fn add_payload_column(dialect: &Dialect) -> Vec<String> {
    vec![format!(
        "ALTER TABLE todos ADD COLUMN payload {}",
        dialect.json_type()
    )]
}

/// Bring the database schema up to date. Safe to run on every startup.
pub async fn run(db: &Db) -> Result<()> {
    let dialect = db.dialect();

    db.execute(&format!(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at {} NOT NULL
        )",
        dialect.timestamp_type(),
    ))
    .await
    .context("failed to create schema_migrations table")?;

    let applied = applied_versions(db)
        .await
        .context("failed to read applied migrations")?;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        info!("applying migration {} ({})", migration.version, migration.name);

        // The bookkeeping row commits together with the migration itself
        let mut statements = (migration.statements)(&dialect);
        statements.push(format!(
            "INSERT INTO schema_migrations (version, name, applied_at) \
             VALUES ({}, '{}', CURRENT_TIMESTAMP)",
            migration.version, migration.name,
        ));

        db.execute_batch(&statements).await.with_context(|| {
            format!("migration {} ({}) failed", migration.version, migration.name)
        })?;
    }

    info!("database migrations complete");
    Ok(())
}

async fn applied_versions(db: &Db) -> Result<Vec<i64>, sqlx::Error> {
    let sql = "SELECT version FROM schema_migrations ORDER BY version";
    match db {
        Db::Postgres(pool) => sqlx::query_scalar::<_, i64>(sql).fetch_all(pool).await,
        Db::Sqlite(pool) => sqlx::query_scalar::<_, i64>(sql).fetch_all(pool).await,
    }
}
