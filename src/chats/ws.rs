use axum::{
    debug_handler,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::WebSocket,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppResult, session};

use super::{ChatEvent, SendMessage, msg, room};

/// Live feed for one room. Subscribers receive every message inserted into
/// the room, in insertion order, until the socket closes; inbound frames are
/// send-message commands.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    Path(chat_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(tx): State<broadcast::Sender<ChatEvent>>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let user_id = session::current_user(&session).await?;
    let chat_id = chat_id.to_string();
    room::require_member(&db_pool, &chat_id, &user_id).await?;

    Ok(ws.on_upgrade(move |stream| handle_socket(stream, db_pool, tx, chat_id, user_id)))
}

async fn handle_socket(
    stream: WebSocket,
    db_pool: SqlitePool,
    tx: broadcast::Sender<ChatEvent>,
    chat_id: String,
    user_id: String,
) {
    let mut rx = tx.subscribe();
    let (mut sender, mut receiver) = stream.split();

    let forward_chat = chat_id.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                // a slow consumer skips what it missed; history backfill is
                // the client's GET on reconnect
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if event.chat_id != forward_chat {
                continue;
            }
            let Ok(payload) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(payload.into()).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        let Ok(command) = serde_json::from_slice::<SendMessage>(&frame.into_data()) else {
            continue;
        };

        if let Err(err) = msg::send_msg(&db_pool, &tx, &chat_id, &user_id, command).await {
            tracing::warn!(%chat_id, %user_id, error = %err, "ws send failed");
        }
    }

    // tear down the subscription exactly once; repeated navigation must not
    // accumulate leaked forwarders
    forward_task.abort();
    tracing::debug!(%chat_id, %user_id, "chat socket closed");
}
