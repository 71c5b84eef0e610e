use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppError, AppResult,
    matching::{LikeBoard, MatchState},
    session,
};

/// Orders a pair of user ids so that the same two users always map to the
/// same `(low, high)` key, whichever side initiates contact.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// One room per unordered pair. The UNIQUE(user1_id, user2_id) constraint
/// makes concurrent first contact safe: both sides insert-or-ignore, then
/// read back the single surviving row.
pub async fn get_or_create(
    db_pool: &SqlitePool,
    a: &str,
    b: &str,
    matched: bool,
) -> AppResult<String> {
    let (low, high) = canonical_pair(a, b);

    sqlx::query("INSERT OR IGNORE INTO chats (id,user1_id,user2_id,is_matched) VALUES (?,?,?,?)")
        .bind(Uuid::now_v7().to_string())
        .bind(low)
        .bind(high)
        .bind(matched)
        .execute(db_pool)
        .await?;

    if matched {
        // the pair may have had an unmatched room from earlier contact
        sqlx::query("UPDATE chats SET is_matched=1 WHERE user1_id=? AND user2_id=?")
            .bind(low)
            .bind(high)
            .execute(db_pool)
            .await?;
    }

    let (id,): (String,) = sqlx::query_as("SELECT id FROM chats WHERE user1_id=? AND user2_id=?")
        .bind(low)
        .bind(high)
        .fetch_one(db_pool)
        .await?;
    Ok(id)
}

/// Resolves a chat id to its pair, requiring the viewer to be one side.
pub(crate) async fn require_member(
    db_pool: &SqlitePool,
    chat_id: &str,
    user_id: &str,
) -> AppResult<(String, String)> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT user1_id,user2_id FROM chats WHERE id=?")
            .bind(chat_id)
            .fetch_optional(db_pool)
            .await?;
    match row {
        Some((user1, user2)) if user1 == user_id || user2 == user_id => Ok((user1, user2)),
        _ => Err(AppError::NotFound("chat")),
    }
}

#[derive(Serialize)]
pub(crate) struct ChatHandle {
    chat_id: String,
    other_user_id: String,
    username: String,
    state: MatchState,
}

/// Open (or lazily create) the room with another user, as the chat screen
/// does on entry. Returns the room id plus the match banner state.
#[debug_handler]
pub(crate) async fn open(
    Path(other): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<ChatHandle>> {
    let user_id = session::current_user(&session).await?;
    let other = other.to_string();
    if other == user_id {
        return Err(AppError::Validation("cannot chat with yourself".to_owned()));
    }

    let username: Option<(String,)> = sqlx::query_as("SELECT username FROM profiles WHERE id=?")
        .bind(&other)
        .fetch_optional(&db_pool)
        .await?;
    let (username,) = username.ok_or(AppError::NotFound("profile"))?;

    let board = LikeBoard::load(&db_pool, &user_id).await?;
    let state = board.classify(&other);
    let chat_id = get_or_create(&db_pool, &user_id, &other, state == MatchState::Matched).await?;

    Ok(Json(ChatHandle {
        chat_id,
        other_user_id: other,
        username,
        state,
    }))
}
