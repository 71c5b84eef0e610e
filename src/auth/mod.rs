mod login;
mod logout;
mod register;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Router, routing::post};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register::register))
        .route("/auth/login", post(login::login))
        .route("/auth/logout", post(logout::logout))
}

/// What login/register hand back to the client.
#[derive(Serialize)]
pub(crate) struct SessionUser {
    pub user_id: String,
    pub username: String,
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Registration creates the profile row right after the user row; everything
/// afterwards edits it in place.
pub(crate) async fn create_profile(
    db_pool: &SqlitePool,
    user_id: &str,
    username: &str,
) -> AppResult<()> {
    sqlx::query("INSERT INTO profiles (id,username,mbti,gender) VALUES (?,?,'not taken','unset')")
        .bind(user_id)
        .bind(username)
        .execute(db_pool)
        .await?;
    tracing::info!(%user_id, %username, "profile created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
