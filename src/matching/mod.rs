mod likes;
mod resolver;

use axum::{
    Router,
    routing::{delete, post},
};

use crate::AppState;

pub use resolver::{LikeBoard, MatchState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", post(likes::like).delete(likes::unlike))
        .route("/{user_id}/inbound", delete(likes::pass_inbound))
}
