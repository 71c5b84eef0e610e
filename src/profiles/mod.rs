mod edit;
mod page;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(page::me).put(edit::update))
        .route("/{user_id}", get(page::profile))
}
