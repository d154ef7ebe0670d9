use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::config::ServerConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::biz::{User, UserInput, UserRepo};
use crate::error::UserError;

/// 根据配置创建连接池, 进程内只调用一次
pub async fn connect(cfg: &ServerConfig) -> Result<SqlitePool, UserError> {
    let options = SqliteConnectOptions::from_str(&cfg.database_url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs));

    // 内存库随连接销毁, 只能有一条常驻连接
    if cfg.database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    info!(max_connections = cfg.db_max_connections, "database pool ready");
    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    age: i64,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 建表, 表已存在时什么都不做
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), UserError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                age INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl UserRepo for SqliteUserRepo {
    #[instrument(skip(self))]
    async fn insert(&self, input: UserInput) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email, age, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id, name, email, age, created_at",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.age)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, age, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, age, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn update(&self, id: i64, input: UserInput) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET name = ?, email = ?, age = ? WHERE id = ? \
             RETURNING id, name, email, age, created_at",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.age)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
