use tower_sessions::Session;

use crate::{AppError, AppResult, db};

pub const USER_ID: &str = "user_id";
pub const LAST_SEEN: &str = "last_seen";

/// Id of the signed-in user, or `NotAuthenticated`.
pub async fn current_user(session: &Session) -> AppResult<String> {
    session
        .get::<String>(USER_ID)
        .await?
        .ok_or(AppError::NotAuthenticated)
}

pub async fn sign_in(session: &Session, user_id: &str) -> AppResult<()> {
    session.insert(USER_ID, user_id).await?;
    session.insert(LAST_SEEN, db::now()).await?;
    Ok(())
}

/// Returns the previous last-seen stamp and writes a fresh one. "New since
/// last visit" counters are computed against the returned value.
pub async fn rotate_last_seen(session: &Session) -> AppResult<Option<String>> {
    let previous = session.get::<String>(LAST_SEEN).await?;
    session.insert(LAST_SEEN, db::now()).await?;
    Ok(previous)
}
