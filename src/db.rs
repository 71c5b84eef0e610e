use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::macros::format_description;

/// Ids are uuid-v7 strings and timestamps fixed-width UTC strings, so for
/// both of them lexicographic order equals creation order.
pub fn now() -> String {
    // fixed-width fraction; a variable-width one would not sort
    let stamp = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    OffsetDateTime::now_utc()
        .format(&stamp)
        .unwrap_or_default()
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id             TEXT PRIMARY KEY REFERENCES users(id),
    username       TEXT NOT NULL,
    bio            TEXT,
    hobbies        TEXT,
    mbti           TEXT NOT NULL DEFAULT 'not taken',
    seeking_type   TEXT,
    seeking_detail TEXT,
    age            INTEGER,
    gender         TEXT NOT NULL DEFAULT 'unset',
    location       TEXT
);

CREATE TABLE IF NOT EXISTS likes (
    from_user_id TEXT NOT NULL,
    to_user_id   TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (from_user_id, to_user_id)
);

CREATE TABLE IF NOT EXISTS chats (
    id         TEXT PRIMARY KEY,
    user1_id   TEXT NOT NULL,
    user2_id   TEXT NOT NULL,
    is_matched INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user1_id, user2_id)
);

CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY,
    chat_id    TEXT NOT NULL REFERENCES chats(id),
    sender_id  TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_likes_to ON likes(to_user_id);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at);
"#;

pub async fn init(db_pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(db_pool).await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub mbti: String,
    pub seeking_type: Option<String>,
    pub seeking_detail: Option<String>,
    pub age: Option<i64>,
    pub gender: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
    pub is_read: bool,
}

/// The 16 MBTI types plus "not taken".
pub const MBTI_OPTIONS: [&str; 17] = [
    "not taken",
    "INTJ", "INTP", "ENTJ", "ENTP",
    "INFJ", "INFP", "ENFJ", "ENFP",
    "ISTJ", "ISFJ", "ESTJ", "ESFJ",
    "ISTP", "ISFP", "ESTP", "ESFP",
];

pub const SEEKING_OPTIONS: [&str; 5] = ["romance", "friends", "hobby", "business", "other"];

pub const GENDER_OPTIONS: [&str; 4] = ["male", "female", "other", "unset"];

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use std::str::FromStr;
    // foreign keys off so fixtures can seed child rows without their parents
    let options = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    // one connection, or each checkout would get its own :memory: database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    init(&pool).await.unwrap();
    pool
}
