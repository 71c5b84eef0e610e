use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppError, AppResult,
    db::{self, MessageRecord},
    session,
};

use super::{ChatEvent, SendMessage, room};

/// Insert the message and fan it out. Shared by the HTTP handler and the
/// websocket receive loop. Returns the authoritative record; the realtime
/// event carries the sender's correlation key alongside it.
pub(crate) async fn send_msg(
    db_pool: &SqlitePool,
    tx: &broadcast::Sender<ChatEvent>,
    chat_id: &str,
    sender_id: &str,
    SendMessage {
        content,
        client_key,
    }: SendMessage,
) -> AppResult<MessageRecord> {
    let content = content.trim().to_owned();
    if content.is_empty() {
        return Err(AppError::Validation("empty message".to_owned()));
    }

    let record = MessageRecord {
        id: Uuid::now_v7().to_string(),
        chat_id: chat_id.to_owned(),
        sender_id: sender_id.to_owned(),
        content,
        created_at: db::now(),
        is_read: false,
    };

    sqlx::query(
        "INSERT INTO messages (id,chat_id,sender_id,content,created_at,is_read) VALUES (?,?,?,?,?,?)",
    )
    .bind(&record.id)
    .bind(&record.chat_id)
    .bind(&record.sender_id)
    .bind(&record.content)
    .bind(&record.created_at)
    .bind(record.is_read)
    .execute(db_pool)
    .await?;

    // nobody listening is fine
    let _ = tx.send(ChatEvent {
        chat_id: record.chat_id.clone(),
        client_key,
        message: record.clone(),
    });

    Ok(record)
}

/// Display order: `created_at` ascending, id as the tie-break so that equal
/// timestamps still render deterministically.
pub(crate) async fn fetch_history(
    db_pool: &SqlitePool,
    chat_id: &str,
) -> AppResult<Vec<MessageRecord>> {
    let messages = sqlx::query_as::<_, MessageRecord>(
        "SELECT id,chat_id,sender_id,content,created_at,is_read FROM messages \
         WHERE chat_id=? ORDER BY created_at ASC, id ASC",
    )
    .bind(chat_id)
    .fetch_all(db_pool)
    .await?;
    Ok(messages)
}

/// One UPDATE over every unread message addressed to the viewer. Idempotent.
pub(crate) async fn mark_all_read(
    db_pool: &SqlitePool,
    chat_id: &str,
    viewer: &str,
) -> AppResult<u64> {
    let marked =
        sqlx::query("UPDATE messages SET is_read=1 WHERE chat_id=? AND sender_id<>? AND is_read=0")
            .bind(chat_id)
            .bind(viewer)
            .execute(db_pool)
            .await?
            .rows_affected();
    Ok(marked)
}

pub(crate) async fn unread_count(
    db_pool: &SqlitePool,
    chat_id: &str,
    viewer: &str,
) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM messages WHERE chat_id=? AND sender_id<>? AND is_read=0",
    )
    .bind(chat_id)
    .bind(viewer)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send(
    Path(chat_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(tx): State<broadcast::Sender<ChatEvent>>,
    session: Session,
    Json(message): Json<SendMessage>,
) -> AppResult<Json<MessageRecord>> {
    let user_id = session::current_user(&session).await?;
    let chat_id = chat_id.to_string();
    room::require_member(&db_pool, &chat_id, &user_id).await?;

    Ok(Json(send_msg(&db_pool, &tx, &chat_id, &user_id, message).await?))
}

#[debug_handler]
pub(crate) async fn history(
    Path(chat_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<MessageRecord>>> {
    let user_id = session::current_user(&session).await?;
    let chat_id = chat_id.to_string();
    room::require_member(&db_pool, &chat_id, &user_id).await?;

    Ok(Json(fetch_history(&db_pool, &chat_id).await?))
}

#[derive(Serialize)]
pub(crate) struct MarkedRead {
    marked: u64,
}

#[debug_handler]
pub(crate) async fn mark_read(
    Path(chat_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<MarkedRead>> {
    let user_id = session::current_user(&session).await?;
    let chat_id = chat_id.to_string();
    room::require_member(&db_pool, &chat_id, &user_id).await?;

    let marked = mark_all_read(&db_pool, &chat_id, &user_id).await?;
    Ok(Json(MarkedRead { marked }))
}
