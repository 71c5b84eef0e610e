use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session};

use super::SessionUser;

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    pub email: String,
    pub password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<SessionUser>> {
    let email = form.email.trim().to_lowercase();

    let row: Option<(String, String, String)> = sqlx::query_as(
        "SELECT u.id, u.password_hash, p.username FROM users u \
         JOIN profiles p ON p.id = u.id WHERE u.email=?",
    )
    .bind(&email)
    .fetch_optional(&db_pool)
    .await?;

    // same failure for unknown email and wrong password
    let Some((user_id, password_hash, username)) = row else {
        return Err(AppError::NotAuthenticated);
    };
    if !super::verify_password(&form.password, &password_hash) {
        return Err(AppError::NotAuthenticated);
    }

    session::sign_in(&session, &user_id).await?;

    tracing::info!(%user_id, "signed in");
    Ok(Json(SessionUser { user_id, username }))
}
