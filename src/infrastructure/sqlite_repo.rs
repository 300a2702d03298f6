use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    query::TodoQuery,
    repository::TodoRepository,
    todo::{NewTodo, OwnerId, Todo, TodoId, TodoPatch, TodoStatus},
};

const COLUMNS: &str = "id, owner_id, title, description, status, category, due_date, created_at, updated_at";

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS todos (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        owner_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL CHECK (status IN ('Pending', 'In Progress', 'Completed')),
        category TEXT,
        due_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS todos_owner_status ON todos (owner_id, status)",
    "CREATE INDEX IF NOT EXISTS todos_owner_due_date ON todos (owner_id, due_date)",
    "CREATE INDEX IF NOT EXISTS todos_owner_category ON todos (owner_id, category)",
];

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {database_url}"))?
            .create_if_missing(true);

        // each connection to an in-memory url gets its own empty database
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(options).await?
        };
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&*self.pool).await?;
        }
        Ok(())
    }

    async fn insert(&self, owner: &OwnerId, input: NewTodo) -> Result<Todo> {
        // stored timestamps keep microseconds
        let todo = input.into_todo(owner.clone(), Utc::now().trunc_subsecs(6));
        sqlx::query(
            "INSERT INTO todos (id, owner_id, title, description, status, category, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(todo.id.to_string())
        .bind(todo.owner_id.as_str())
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.status.as_str())
        .bind(&todo.category)
        .bind(todo.due_date.map(encode_timestamp))
        .bind(encode_timestamp(todo.created_at))
        .bind(encode_timestamp(todo.updated_at))
        .execute(&*self.pool)
        .await?;
        Ok(todo)
    }

    async fn get(&self, id: TodoId, owner: &OwnerId) -> Result<Option<Todo>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?1 AND owner_id = ?2"))
            .bind(id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(row_to_todo).transpose()
    }

    async fn query(&self, owner: &OwnerId, query: &TodoQuery) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM todos WHERE owner_id = ?1 ORDER BY seq"))
            .bind(owner.as_str())
            .fetch_all(&*self.pool)
            .await?;
        let todos = rows.iter().map(row_to_todo).collect::<Result<Vec<_>>>()?;
        Ok(query.apply(todos))
    }

    async fn update(&self, id: TodoId, owner: &OwnerId, patch: TodoPatch) -> Result<Option<Todo>> {
        // one statement, so a concurrent delete either happens before (no row) or after
        let description = patch.description();
        let category = patch.category();
        let due_date = patch.due_date();
        let row = sqlx::query(&format!(
            "UPDATE todos SET
                title = COALESCE(?3, title),
                description = CASE WHEN ?4 THEN ?5 ELSE description END,
                status = COALESCE(?6, status),
                category = CASE WHEN ?7 THEN ?8 ELSE category END,
                due_date = CASE WHEN ?9 THEN ?10 ELSE due_date END,
                updated_at = ?11
             WHERE id = ?1 AND owner_id = ?2
             RETURNING {COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(owner.as_str())
        .bind(patch.title())
        .bind(description.is_some())
        .bind(description.flatten())
        .bind(patch.status().map(|s| s.as_str()))
        .bind(category.is_some())
        .bind(category.flatten())
        .bind(due_date.is_some())
        .bind(due_date.flatten().map(encode_timestamp))
        .bind(encode_timestamp(Utc::now()))
        .fetch_optional(&*self.pool)
        .await?;
        row.as_ref().map(row_to_todo).transpose()
    }

    async fn delete(&self, id: TodoId, owner: &OwnerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1 AND owner_id = ?2")
            .bind(id.to_string())
            .bind(owner.as_str())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, owner: &OwnerId) -> Result<Vec<(TodoStatus, u64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM todos WHERE owner_id = ?1 GROUP BY status")
            .bind(owner.as_str())
            .fetch_all(&*self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<(TodoStatus, u64)> {
                let label: String = row.try_get("status")?;
                let count: i64 = row.try_get("count")?;
                let status = TodoStatus::parse(&label).with_context(|| format!("unknown stored status {label:?}"))?;
                Ok((status, u64::try_from(count)?))
            })
            .collect()
    }

    async fn delete_all(&self, owner: &OwnerId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE owner_id = ?1")
            .bind(owner.as_str())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid stored timestamp {raw:?}"))?
        .with_timezone(&Utc))
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let status: String = row.try_get("status")?;
    let due_date: Option<String> = row.try_get("due_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Todo {
        id: id.parse().with_context(|| format!("invalid stored id {id:?}"))?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: TodoStatus::parse(&status).with_context(|| format!("unknown stored status {status:?}"))?,
        category: row.try_get("category")?,
        due_date: due_date.as_deref().map(decode_timestamp).transpose()?,
        owner_id: OwnerId::new(owner_id),
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
