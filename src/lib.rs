pub mod auth;
pub mod chats;
pub mod db;
pub mod discover;
pub mod error;
pub mod home;
pub mod matching;
pub mod profiles;
pub mod session;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

pub use error::{AppError, AppResult};

use chats::ChatEvent;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tx: broadcast::Sender<ChatEvent>,
}
