use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, chats, db, session};

use super::MatchState;

#[derive(Debug, Serialize)]
pub(crate) struct LikeOutcome {
    pub state: MatchState,
    /// True exactly once per pair: the moment the second edge is written.
    pub matched_now: bool,
}

#[derive(Serialize)]
pub(crate) struct Removed {
    pub removed: bool,
}

/// Insert-if-absent, then check the reverse edge. A match is reported only
/// when this call actually wrote the edge, so re-liking an already-matched
/// user never announces the match a second time.
pub(crate) async fn record_like(
    db_pool: &SqlitePool,
    from: &str,
    to: &str,
) -> AppResult<LikeOutcome> {
    let inserted =
        sqlx::query("INSERT OR IGNORE INTO likes (from_user_id,to_user_id,created_at) VALUES (?,?,?)")
            .bind(from)
            .bind(to)
            .bind(db::now())
            .execute(db_pool)
            .await?
            .rows_affected()
            == 1;

    let reverse = sqlx::query("SELECT 1 FROM likes WHERE from_user_id=? AND to_user_id=?")
        .bind(to)
        .bind(from)
        .fetch_optional(db_pool)
        .await?
        .is_some();

    let matched_now = inserted && reverse;
    if matched_now {
        chats::room::get_or_create(db_pool, from, to, true).await?;
        tracing::info!(%from, %to, "match formed");
    }

    Ok(LikeOutcome {
        state: if reverse {
            MatchState::Matched
        } else {
            MatchState::Sent
        },
        matched_now,
    })
}

/// Removes at most the one outbound edge, never the reverse one.
pub(crate) async fn remove_like(db_pool: &SqlitePool, from: &str, to: &str) -> AppResult<bool> {
    let removed = sqlx::query("DELETE FROM likes WHERE from_user_id=? AND to_user_id=?")
        .bind(from)
        .bind(to)
        .execute(db_pool)
        .await?
        .rows_affected();
    Ok(removed == 1)
}

#[debug_handler]
pub(crate) async fn like(
    Path(target): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<LikeOutcome>> {
    let user_id = session::current_user(&session).await?;
    let target = target.to_string();
    if target == user_id {
        return Err(AppError::Validation("cannot like yourself".to_owned()));
    }

    if sqlx::query("SELECT 1 FROM profiles WHERE id=?")
        .bind(&target)
        .fetch_optional(&db_pool)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("profile"));
    }

    Ok(Json(record_like(&db_pool, &user_id, &target).await?))
}

#[debug_handler]
pub(crate) async fn unlike(
    Path(target): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Removed>> {
    let user_id = session::current_user(&session).await?;
    let removed = remove_like(&db_pool, &user_id, &target.to_string()).await?;
    Ok(Json(Removed { removed }))
}

/// Pass on an inbound like: deletes the candidate's edge toward the viewer.
#[debug_handler]
pub(crate) async fn pass_inbound(
    Path(target): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Removed>> {
    let user_id = session::current_user(&session).await?;
    let removed = remove_like(&db_pool, &target.to_string(), &user_id).await?;
    Ok(Json(Removed { removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::LikeBoard;

    #[tokio::test]
    async fn like_is_idempotent_and_match_fires_once() {
        let pool = crate::db::test_pool().await;

        let first = record_like(&pool, "alice", "bob").await.unwrap();
        assert_eq!(first.state, MatchState::Sent);
        assert!(!first.matched_now);

        // second edge completes the match, exactly once
        let second = record_like(&pool, "bob", "alice").await.unwrap();
        assert_eq!(second.state, MatchState::Matched);
        assert!(second.matched_now);

        // re-liking changes nothing and does not re-announce
        let again = record_like(&pool, "bob", "alice").await.unwrap();
        assert_eq!(again.state, MatchState::Matched);
        assert!(!again.matched_now);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn match_creates_canonical_room() {
        let pool = crate::db::test_pool().await;
        record_like(&pool, "bbb", "aaa").await.unwrap();
        record_like(&pool, "aaa", "bbb").await.unwrap();

        let (user1, user2, is_matched): (String, String, bool) =
            sqlx::query_as("SELECT user1_id,user2_id,is_matched FROM chats")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!((user1.as_str(), user2.as_str()), ("aaa", "bbb"));
        assert!(is_matched);
    }

    #[tokio::test]
    async fn unlike_never_touches_reverse_edge() {
        let pool = crate::db::test_pool().await;
        record_like(&pool, "alice", "bob").await.unwrap();
        record_like(&pool, "bob", "alice").await.unwrap();

        assert!(remove_like(&pool, "alice", "bob").await.unwrap());
        // removing twice is a no-op
        assert!(!remove_like(&pool, "alice", "bob").await.unwrap());

        let board = LikeBoard::load(&pool, "alice").await.unwrap();
        assert_eq!(board.classify("bob"), MatchState::Received);
    }
}
