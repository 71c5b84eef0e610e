use axum::{Json, Router, debug_handler, extract::State, routing::get};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, matching::LikeBoard, session};

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(overview))
}

#[derive(Debug, Serialize)]
pub(crate) struct HomeOverview {
    pub username: String,
    /// Inbound likes not yet answered.
    pub received_likes: usize,
    /// Unread messages across every room of the viewer.
    pub unread_messages: i64,
    /// Matches completed since the previous visit to this screen.
    pub new_matches: usize,
}

pub(crate) async fn build_overview(
    db_pool: &SqlitePool,
    viewer: &str,
    since: Option<&str>,
) -> AppResult<HomeOverview> {
    let (username,): (String,) = sqlx::query_as("SELECT username FROM profiles WHERE id=?")
        .bind(viewer)
        .fetch_one(db_pool)
        .await?;

    let board = LikeBoard::load(db_pool, viewer).await?;
    let received_likes = board.received_only().count();

    let (unread_messages,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM messages m JOIN chats c ON c.id = m.chat_id \
         WHERE (c.user1_id=? OR c.user2_id=?) AND m.sender_id<>? AND m.is_read=0",
    )
    .bind(viewer)
    .bind(viewer)
    .bind(viewer)
    .fetch_one(db_pool)
    .await?;

    // inbound likes since the stamp that the viewer had already reciprocated
    let new_matches = match since {
        Some(since) => {
            let recent: Vec<(String,)> = sqlx::query_as(
                "SELECT from_user_id FROM likes WHERE to_user_id=? AND created_at>=?",
            )
            .bind(viewer)
            .bind(since)
            .fetch_all(db_pool)
            .await?;
            recent
                .iter()
                .filter(|(from,)| board.has_liked(from))
                .count()
        }
        None => 0,
    };

    Ok(HomeOverview {
        username,
        received_likes,
        unread_messages,
        new_matches,
    })
}

/// Home screen counters. Each visit rotates the session's last-seen stamp,
/// so "new matches" is always relative to the previous visit.
#[debug_handler]
pub(crate) async fn overview(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<HomeOverview>> {
    let user_id = session::current_user(&session).await?;
    let since = session::rotate_last_seen(&session).await?;
    Ok(Json(
        build_overview(&db_pool, &user_id, since.as_deref()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::{SendMessage, msg, room};
    use tokio::sync::broadcast;

    async fn seed_profile(pool: &SqlitePool, id: &str) {
        sqlx::query("INSERT INTO profiles (id,username) VALUES (?,?)")
            .bind(id)
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn seed_like(pool: &SqlitePool, from: &str, to: &str, at: &str) {
        sqlx::query("INSERT INTO likes (from_user_id,to_user_id,created_at) VALUES (?,?,?)")
            .bind(from)
            .bind(to)
            .bind(at)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn counters_cover_likes_unread_and_new_matches() {
        let pool = crate::db::test_pool().await;
        let (tx, _rx) = broadcast::channel(8);
        for id in ["alice", "bob", "carol", "dave"] {
            seed_profile(&pool, id).await;
        }

        // bob: pending inbound like; carol: old match; dave: match since stamp
        seed_like(&pool, "bob", "alice", "2026-01-01T00:00:00Z").await;
        seed_like(&pool, "alice", "carol", "2026-01-01T00:00:00Z").await;
        seed_like(&pool, "carol", "alice", "2026-01-02T00:00:00Z").await;
        seed_like(&pool, "alice", "dave", "2026-02-01T00:00:00Z").await;
        seed_like(&pool, "dave", "alice", "2026-02-02T00:00:00Z").await;

        let chat = room::get_or_create(&pool, "alice", "carol", true).await.unwrap();
        msg::send_msg(
            &pool,
            &tx,
            &chat,
            "carol",
            SendMessage {
                content: "hello".to_owned(),
                client_key: None,
            },
        )
        .await
        .unwrap();

        let overview = build_overview(&pool, "alice", Some("2026-02-01T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(overview.username, "alice");
        assert_eq!(overview.received_likes, 1); // bob only
        assert_eq!(overview.unread_messages, 1);
        assert_eq!(overview.new_matches, 1); // dave, not carol

        // first visit of a session has no reference point
        let fresh = build_overview(&pool, "alice", None).await.unwrap();
        assert_eq!(fresh.new_matches, 0);
    }
}
