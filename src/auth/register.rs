use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, db, session};

use super::SessionUser;

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> AppResult<Json<SessionUser>> {
    let email = form.email.trim().to_lowercase();
    let username = form.username.trim().to_owned();

    if !email.contains('@') {
        return Err(AppError::Validation("invalid email address".to_owned()));
    }
    if form.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_owned(),
        ));
    }
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".to_owned()));
    }

    let user_id = Uuid::now_v7().to_string();
    let password_hash = super::hash_password(&form.password)?;

    let inserted = sqlx::query(
        "INSERT INTO users (id,email,password_hash,created_at) VALUES (?,?,?,?)",
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(db::now())
    .execute(&db_pool)
    .await;

    match inserted {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::Conflict("email already registered".to_owned()));
        }
        Err(err) => return Err(err.into()),
    }

    super::create_profile(&db_pool, &user_id, &username).await?;
    session::sign_in(&session, &user_id).await?;

    tracing::info!(%user_id, "registered");
    Ok(Json(SessionUser { user_id, username }))
}
