//! # cm-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cm-core` domain models.

mod schema;

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use cm_core::models::{Car, CarId, CarInput, Comment, CommentId, NewUser, Session, User, UserId};
use cm_core::traits::{CarRepo, UserRepo};
use cm_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

const CAR_SELECT: &str = "SELECT c.id, c.make, c.model, c.year, c.description, c.created_at, c.updated_at, \
     c.owner_id, u.username AS owner \
     FROM cars c JOIN users u ON u.id = c.owner_id";

const COMMENT_SELECT: &str = "SELECT m.id, m.content, m.created_at, m.car_id, m.author_id, u.username AS author \
     FROM comments m JOIN users u ON u.id = m.author_id";

/// SQLite-backed store for users, sessions, cars and comments.
/// Cloning shares the underlying pool.
#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Like [`SqliteRepo::new`] with an explicit pool size. In-memory databases
    /// always use one long-lived connection so every query sees the same data.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { max_connections });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to open sqlite database")?;

        schema::apply(&pool).await?;
        log::debug!("sqlite schema ready at {url}");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_car(row: &SqliteRow) -> Result<Car, sqlx::Error> {
    Ok(Car {
        id: row.try_get("id")?,
        make: row.try_get("make")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        owner_id: row.try_get("owner_id")?,
        owner: row.try_get("owner")?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        car_id: row.try_get("car_id")?,
        author_id: row.try_get("author_id")?,
        author: row.try_get("author")?,
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn row_to_session(row: &SqliteRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        token_digest: row.try_get("token_digest")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

#[async_trait]
impl CarRepo for SqliteRepo {
    async fn list_cars(&self) -> anyhow::Result<Vec<Car>> {
        let rows = sqlx::query(&format!("{CAR_SELECT} ORDER BY c.id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_car).collect::<Result<_, _>>()?)
    }

    async fn get_car(&self, id: CarId) -> anyhow::Result<Option<Car>> {
        let row = sqlx::query(&format!("{CAR_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_car).transpose()?)
    }

    async fn get_car_owned_by(&self, id: CarId, owner_id: UserId) -> anyhow::Result<Option<Car>> {
        let row = sqlx::query(&format!("{CAR_SELECT} WHERE c.id = ? AND c.owner_id = ?"))
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_car).transpose()?)
    }

    async fn insert_car(&self, owner_id: UserId, input: &CarInput) -> anyhow::Result<Car> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO cars (make, model, year, description, created_at, updated_at, owner_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_car(id)
            .await?
            .with_context(|| format!("car {id} vanished after insert"))
    }

    async fn update_car(&self, id: CarId, input: &CarInput) -> anyhow::Result<Option<Car>> {
        let affected = sqlx::query(
            "UPDATE cars SET make = ?, model = ?, year = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&input.make)
        .bind(&input.model)
        .bind(input.year)
        .bind(&input.description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        self.get_car(id).await
    }

    /// Comments go with the car through `ON DELETE CASCADE`.
    async fn delete_car(&self, id: CarId) -> anyhow::Result<bool> {
        let affected = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn list_comments(&self, car_id: CarId) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE m.car_id = ? ORDER BY m.created_at DESC, m.id DESC"
        ))
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_comment).collect::<Result<_, _>>()?)
    }

    async fn get_comment(&self, car_id: CarId, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE m.id = ? AND m.car_id = ?"))
            .bind(id)
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_comment).transpose()?)
    }

    async fn insert_comment(&self, car_id: CarId, author_id: UserId, content: &str) -> anyhow::Result<Comment> {
        let id = sqlx::query("INSERT INTO comments (content, created_at, car_id, author_id) VALUES (?, ?, ?, ?)")
            .bind(content)
            .bind(Utc::now())
            .bind(car_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.get_comment(car_id, id)
            .await?
            .with_context(|| format!("comment {id} vanished after insert"))
    }

    async fn update_comment(&self, id: CommentId, content: &str) -> anyhow::Result<Option<Comment>> {
        let affected = sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_comment).transpose()?)
    }

    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool> {
        let affected = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let id = sqlx::query("INSERT INTO users (username, email, password_hash, date_joined) VALUES (?, ?, ?, ?)")
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    anyhow::Error::new(AppError::Conflict(format!("username {} is taken", user.username)))
                }
                other => anyhow::Error::new(other).context(format!("failed to insert user {}", user.username)),
            })?
            .last_insert_rowid();

        self.get_user(id)
            .await?
            .with_context(|| format!("user {id} vanished after insert"))
    }

    async fn get_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, password_hash, date_joined FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row =
            sqlx::query("SELECT id, username, email, password_hash, date_joined FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn insert_session(&self, session: &Session) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO sessions (token_digest, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&session.token_digest)
            .bind(session.user_id)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_session(&self, token_digest: &str) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query("SELECT token_digest, user_id, created_at, expires_at FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_session).transpose()?)
    }

    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
