//! Idempotent schema creation, run on every startup.

use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        date_joined   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token_digest TEXT PRIMARY KEY,
        user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at   TEXT NOT NULL,
        expires_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cars (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        make        TEXT NOT NULL,
        model       TEXT NOT NULL,
        year        INTEGER NOT NULL,
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        content    TEXT NOT NULL,
        created_at TEXT NOT NULL,
        car_id     INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
        author_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_cars_owner ON cars(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_car_created ON comments(car_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
];

pub(crate) async fn apply(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
