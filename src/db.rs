//! Database backends and connection pools.
//!
//! The connection string selects the backend by URL scheme: `sqlite:` for
//! the embedded database, `postgres:`/`postgresql:` for the networked one.
//! Everything the two backends disagree on (placeholder syntax, column type
//! mapping) is answered by [`Dialect`], so no other module ever branches on
//! the backend kind.

use anyhow::{bail, Context, Result};
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{PgPool, Sqlite, SqlitePool};
use tracing::info;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    Sqlite,
}

impl DbKind {
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("sqlite:") {
            Ok(DbKind::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DbKind::Postgres)
        } else {
            bail!("unsupported database url scheme: {url}");
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DbKind::Postgres => "postgres",
            DbKind::Sqlite => "sqlite",
        }
    }
}

/// Type-mapping capabilities of the active backend.
///
/// All SQL text in the crate (DDL in migrations, DML in the repository) is
/// composed through this struct rather than hard-coding one backend's
/// syntax.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    kind: DbKind,
}

impl Dialect {
    pub fn new(kind: DbKind) -> Self {
        Self { kind }
    }

    /// Bind-parameter placeholder for the 1-based position `n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self.kind {
            DbKind::Postgres => format!("${n}"),
            DbKind::Sqlite => "?".to_owned(),
        }
    }

    /// Comma-separated placeholder list for positions 1..=n.
    pub fn placeholders(&self, n: usize) -> String {
        (1..=n)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// DDL for an auto-assigned integer primary key.
    pub fn auto_primary_key(&self) -> &'static str {
        match self.kind {
            DbKind::Postgres => "SERIAL PRIMARY KEY",
            DbKind::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// Column type for a timezone-aware timestamp. SQLite has no native
    /// timestamp type and stores RFC 3339 text instead.
    pub fn timestamp_type(&self) -> &'static str {
        match self.kind {
            DbKind::Postgres => "TIMESTAMPTZ",
            DbKind::Sqlite => "TEXT",
        }
    }

    /// Column type for an opaque JSON document.
    pub fn json_type(&self) -> &'static str {
        match self.kind {
            DbKind::Postgres => "JSONB",
            DbKind::Sqlite => "TEXT",
        }
    }
}

// Connection pool for whichever backend the configuration selected
pub enum Db {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Db {
    /// Connect a bounded pool according to the configuration, creating the
    /// SQLite database file first if it does not exist yet.
    pub async fn connect(config: &Config) -> Result<Self> {
        let url = config.database_url.as_str();
        match DbKind::from_url(url)? {
            DbKind::Sqlite => {
                if !Sqlite::database_exists(url).await.unwrap_or(false) {
                    info!("creating database {url}");
                    Sqlite::create_database(url)
                        .await
                        .with_context(|| format!("failed to create database {url}"))?;
                }
                let pool = SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(config.acquire_timeout)
                    .connect(url)
                    .await
                    .context("failed to connect to the sqlite database")?;
                Ok(Db::Sqlite(pool))
            }
            DbKind::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(config.acquire_timeout)
                    .connect(url)
                    .await
                    .context("failed to connect to the postgres database")?;
                Ok(Db::Postgres(pool))
            }
        }
    }

    pub fn kind(&self) -> DbKind {
        match self {
            Db::Postgres(_) => DbKind::Postgres,
            Db::Sqlite(_) => DbKind::Sqlite,
        }
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::new(self.kind())
    }

    /// Execute a single statement without binds.
    pub async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
        match self {
            Db::Postgres(pool) => Ok(sqlx::query(sql).execute(pool).await?.rows_affected()),
            Db::Sqlite(pool) => Ok(sqlx::query(sql).execute(pool).await?.rows_affected()),
        }
    }

    /// Execute a sequence of statements inside a single transaction.
    pub async fn execute_batch(&self, statements: &[String]) -> Result<(), sqlx::Error> {
        match self {
            Db::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                for sql in statements {
                    sqlx::query(sql).execute(&mut *tx).await?;
                }
                tx.commit().await
            }
            Db::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                for sql in statements {
                    sqlx::query(sql).execute(&mut *tx).await?;
                }
                tx.commit().await
            }
        }
    }
}
