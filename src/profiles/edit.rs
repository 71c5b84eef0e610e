use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult,
    db::{self, Profile},
    session,
};

use super::page;

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileUpdate {
    pub username: String,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub mbti: String,
    pub seeking_type: Option<String>,
    pub seeking_detail: Option<String>,
    pub age: Option<i64>,
    pub gender: String,
    pub location: Option<String>,
}

fn validate(update: &ProfileUpdate) -> AppResult<()> {
    let fail = |msg: &str| Err(AppError::Validation(msg.to_owned()));

    if update.username.trim().is_empty() {
        return fail("username must not be empty");
    }
    if !db::MBTI_OPTIONS.contains(&update.mbti.as_str()) {
        return fail("unknown mbti type");
    }
    if let Some(seeking) = &update.seeking_type {
        if !db::SEEKING_OPTIONS.contains(&seeking.as_str()) {
            return fail("unknown seeking type");
        }
    }
    if !db::GENDER_OPTIONS.contains(&update.gender.as_str()) {
        return fail("unknown gender");
    }
    if let Some(age) = update.age {
        if !(0..=150).contains(&age) {
            return fail("age out of range");
        }
    }
    Ok(())
}

/// Owner-only full update of the profile row.
pub(crate) async fn apply_update(
    db_pool: &SqlitePool,
    user_id: &str,
    update: ProfileUpdate,
) -> AppResult<()> {
    validate(&update)?;

    let changed = sqlx::query(
        "UPDATE profiles SET username=?, bio=?, hobbies=?, mbti=?, seeking_type=?, \
         seeking_detail=?, age=?, gender=?, location=? WHERE id=?",
    )
    .bind(update.username.trim())
    .bind(&update.bio)
    .bind(&update.hobbies)
    .bind(&update.mbti)
    .bind(&update.seeking_type)
    .bind(&update.seeking_detail)
    .bind(update.age)
    .bind(&update.gender)
    .bind(&update.location)
    .bind(user_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if changed == 0 {
        return Err(AppError::NotFound("profile"));
    }
    Ok(())
}

#[debug_handler]
pub(crate) async fn update(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    let user_id = session::current_user(&session).await?;
    apply_update(&db_pool, &user_id, update).await?;
    Ok(Json(page::fetch_profile(&db_pool, &user_id).await?))
}
