use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

use super::{FlowDocument, ImportSummary, Question, Route, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory instance, mainly for tests.
    ///
    /// Every connection to `:memory:` opens a separate database, so the pool
    /// is pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a question.
    pub async fn create_question(&self, question: &Question) -> StorageResult<()> {
        insert_question(&self.pool, question).await
    }

    /// Insert a route. Fails if the source already has a route for the condition.
    pub async fn create_route(&self, route: &Route) -> StorageResult<()> {
        insert_route(&self.pool, route).await
    }

    /// Insert every question and route in `document` in one transaction.
    ///
    /// Questions are written first so routes may point at questions from the
    /// same document. Nothing is written if any record is rejected.
    pub async fn import_flow(&self, document: &FlowDocument) -> StorageResult<ImportSummary> {
        let mut tx = self.pool.begin().await?;

        for question in &document.questions {
            insert_question(&mut *tx, question)
                .await
                .map_err(|e| StorageError::Import {
                    message: format!("question {}: {}", question.id, e),
                })?;
        }

        for route in &document.routes {
            insert_route(&mut *tx, route)
                .await
                .map_err(|e| StorageError::Import {
                    message: format!(
                        "route {} ({} / {}): {}",
                        route.id, route.question_id, route.condition, e
                    ),
                })?;
        }

        tx.commit().await?;

        let summary = ImportSummary {
            questions: document.questions.len(),
            routes: document.routes.len(),
        };
        info!(
            questions = summary.questions,
            routes = summary.routes,
            "Flow document imported"
        );

        Ok(summary)
    }
}

async fn insert_question<'e, E>(executor: E, question: &Question) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO questions (id, title, body, kind, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&question.id)
    .bind(&question.title)
    .bind(&question.body)
    .bind(&question.kind)
    .bind(question.created_at.to_rfc3339())
    .execute(executor)
    .await
    .map_err(|e| map_constraint_error(e, "question"))?;

    Ok(())
}

async fn insert_route<'e, E>(executor: E, route: &Route) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO routes (id, question_id, condition, next_question_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&route.id)
    .bind(&route.question_id)
    .bind(&route.condition)
    .bind(&route.next_question_id)
    .execute(executor)
    .await
    .map_err(|e| map_constraint_error(e, "route"))?;

    Ok(())
}

/// Turn constraint violations into readable query errors.
fn map_constraint_error(err: sqlx::Error, record: &str) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StorageError::Query {
                message: format!("duplicate {}: {}", record, db.message()),
            };
        }
        if db.is_foreign_key_violation() {
            return StorageError::Query {
                message: format!("{} references a missing question", record),
            };
        }
    }
    StorageError::Sqlx(err)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_question(&self, id: &str) -> StorageResult<Option<Question>> {
        let row: Option<QuestionRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, kind, created_at
            FROM questions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn get_route(&self, from_id: &str, condition: &str) -> StorageResult<Option<Route>> {
        let row: Option<RouteRow> = sqlx::query_as(
            r#"
            SELECT id, question_id, condition, next_question_id
            FROM routes
            WHERE question_id = ? AND condition = ?
            "#,
        )
        .bind(from_id)
        .bind(condition)
        .fetch_optional(&self.pool)
        .await?;

        debug!(from_id, condition, found = row.is_some(), "Route lookup");

        Ok(row.map(|r| r.into()))
    }

    async fn get_routes_from(&self, from_id: &str) -> StorageResult<Vec<Route>> {
        let rows: Vec<RouteRow> = sqlx::query_as(
            r#"
            SELECT id, question_id, condition, next_question_id
            FROM routes
            WHERE question_id = ?
            ORDER BY condition ASC
            "#,
        )
        .bind(from_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    title: String,
    body: String,
    kind: String,
    created_at: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StorageError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| StorageError::Query {
                message: format!(
                    "question {} has invalid created_at '{}': {}",
                    row.id, row.created_at, e
                ),
            })?
            .with_timezone(&chrono::Utc);

        Ok(Self {
            id: row.id,
            title: row.title,
            body: row.body,
            kind: row.kind,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: String,
    question_id: String,
    condition: String,
    next_question_id: Option<String>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Self {
            id: row.id,
            question_id: row.question_id,
            condition: row.condition,
            next_question_id: row.next_question_id,
        }
    }
}
