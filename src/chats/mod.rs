pub(crate) mod list;
pub(crate) mod msg;
pub mod reconcile;
pub(crate) mod room;
pub(crate) mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, db::MessageRecord};

/// One realtime event per inserted message, fanned out over the process-wide
/// broadcast channel. `client_key` is the sender's correlation key, echoed
/// back so the sending client can replace its optimistic copy.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEvent {
    pub chat_id: String,
    pub client_key: Option<String>,
    pub message: MessageRecord,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
    pub client_key: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::chat_list))
        .route("/with/{user_id}", post(room::open))
        .route("/{chat_id}/messages", get(msg::history).post(msg::send))
        .route("/{chat_id}/read", post(msg::mark_read))
        .route("/{chat_id}/ws", get(ws::chat_ws))
}
