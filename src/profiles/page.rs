use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, db::Profile, session};

pub(crate) async fn fetch_profile(db_pool: &SqlitePool, id: &str) -> AppResult<Profile> {
    sqlx::query_as::<_, Profile>(
        "SELECT id,username,bio,hobbies,mbti,seeking_type,seeking_detail,age,gender,location \
         FROM profiles WHERE id=?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound("profile"))
}

#[debug_handler]
pub(crate) async fn me(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Profile>> {
    let user_id = session::current_user(&session).await?;
    Ok(Json(fetch_profile(&db_pool, &user_id).await?))
}

#[debug_handler]
pub(crate) async fn profile(
    Path(user_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Profile>> {
    // viewing someone's card still requires being signed in
    session::current_user(&session).await?;
    Ok(Json(fetch_profile(&db_pool, &user_id.to_string()).await?))
}
