use std::collections::HashMap;

use axum::{Json, debug_handler, extract::State};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tower_sessions::Session;

use crate::{
    AppResult,
    matching::{LikeBoard, MatchState},
    session,
};

#[derive(Debug, Serialize)]
pub(crate) struct ChatItem {
    pub chat_id: String,
    pub other_user_id: String,
    pub username: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread: i64,
    pub state: MatchState,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct ChatLists {
    pub matched: Vec<ChatItem>,
    pub received: Vec<ChatItem>,
    pub sent: Vec<ChatItem>,
}

/// The whole chat screen in a fixed number of queries: rooms, the like
/// board, then batched usernames, previews and unread counts keyed by id.
/// No per-room round-trips.
pub(crate) async fn build_chat_lists(db_pool: &SqlitePool, viewer: &str) -> AppResult<ChatLists> {
    let rooms: Vec<(String, String, String)> =
        sqlx::query_as("SELECT id,user1_id,user2_id FROM chats WHERE user1_id=? OR user2_id=?")
            .bind(viewer)
            .bind(viewer)
            .fetch_all(db_pool)
            .await?;
    if rooms.is_empty() {
        return Ok(ChatLists::default());
    }

    let board = LikeBoard::load(db_pool, viewer).await?;

    let chat_ids: Vec<&str> = rooms.iter().map(|(id, _, _)| id.as_str()).collect();
    let other_ids: Vec<&str> = rooms
        .iter()
        .map(|(_, user1, user2)| {
            if user1 == viewer { user2.as_str() } else { user1.as_str() }
        })
        .collect();

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id,username FROM profiles WHERE id IN (");
    let mut sep = qb.separated(", ");
    for id in &other_ids {
        sep.push_bind(*id);
    }
    qb.push(")");
    let usernames: HashMap<String, String> = qb
        .build_query_as::<(String, String)>()
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .collect();

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT chat_id, content, MAX(created_at) FROM messages WHERE chat_id IN (",
    );
    let mut sep = qb.separated(", ");
    for id in &chat_ids {
        sep.push_bind(*id);
    }
    qb.push(") GROUP BY chat_id");
    let previews: HashMap<String, (String, String)> = qb
        .build_query_as::<(String, String, String)>()
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(|(chat_id, content, created_at)| (chat_id, (content, created_at)))
        .collect();

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT chat_id, COUNT(*) FROM messages WHERE is_read=0 AND sender_id<>");
    qb.push_bind(viewer);
    qb.push(" AND chat_id IN (");
    let mut sep = qb.separated(", ");
    for id in &chat_ids {
        sep.push_bind(*id);
    }
    qb.push(") GROUP BY chat_id");
    let unread: HashMap<String, i64> = qb
        .build_query_as::<(String, i64)>()
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .collect();

    let mut items: Vec<ChatItem> = rooms
        .iter()
        .zip(&other_ids)
        .map(|((chat_id, _, _), other_id)| {
            let preview = previews.get(chat_id);
            ChatItem {
                chat_id: chat_id.clone(),
                other_user_id: (*other_id).to_owned(),
                username: usernames.get(*other_id).cloned().unwrap_or_default(),
                last_message: preview.map(|(content, _)| content.clone()),
                last_message_at: preview.map(|(_, at)| at.clone()),
                unread: unread.get(chat_id).copied().unwrap_or(0),
                state: board.classify(other_id),
            }
        })
        .collect();

    // most recent conversation first, never-used rooms last
    items.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

    let mut lists = ChatLists::default();
    for item in items {
        match item.state {
            MatchState::Matched => lists.matched.push(item),
            MatchState::Received => lists.received.push(item),
            MatchState::Sent => lists.sent.push(item),
            MatchState::None => {}
        }
    }
    Ok(lists)
}

#[debug_handler]
pub(crate) async fn chat_list(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<ChatLists>> {
    let user_id = session::current_user(&session).await?;
    Ok(Json(build_chat_lists(&db_pool, &user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::{SendMessage, msg, room};
    use tokio::sync::broadcast;

    async fn seed_profile(pool: &SqlitePool, id: &str, username: &str) {
        sqlx::query("INSERT INTO profiles (id,username) VALUES (?,?)")
            .bind(id)
            .bind(username)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn seed_like(pool: &SqlitePool, from: &str, to: &str) {
        sqlx::query("INSERT INTO likes (from_user_id,to_user_id,created_at) VALUES (?,?,?)")
            .bind(from)
            .bind(to)
            .bind(crate::db::now())
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn buckets_previews_and_unread() {
        let pool = crate::db::test_pool().await;
        let (tx, _rx) = broadcast::channel(8);
        for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
            seed_profile(&pool, id, name).await;
        }

        // alice<->bob matched; carol only liked alice
        seed_like(&pool, "alice", "bob").await;
        seed_like(&pool, "bob", "alice").await;
        seed_like(&pool, "carol", "alice").await;

        let with_bob = room::get_or_create(&pool, "alice", "bob", true).await.unwrap();
        room::get_or_create(&pool, "carol", "alice", false).await.unwrap();

        for content in ["hi alice", "you there?"] {
            msg::send_msg(
                &pool,
                &tx,
                &with_bob,
                "bob",
                SendMessage {
                    content: content.to_owned(),
                    client_key: None,
                },
            )
            .await
            .unwrap();
        }

        let lists = build_chat_lists(&pool, "alice").await.unwrap();
        assert_eq!(lists.matched.len(), 1);
        assert_eq!(lists.received.len(), 1);
        assert!(lists.sent.is_empty());

        let bob = &lists.matched[0];
        assert_eq!(bob.username, "Bob");
        assert_eq!(bob.unread, 2);
        assert_eq!(bob.last_message.as_deref(), Some("you there?"));

        let carol = &lists.received[0];
        assert_eq!(carol.username, "Carol");
        assert_eq!(carol.unread, 0);
        assert!(carol.last_message.is_none());
    }

    #[tokio::test]
    async fn empty_board_yields_empty_lists() {
        let pool = crate::db::test_pool().await;
        let lists = build_chat_lists(&pool, "nobody").await.unwrap();
        assert!(lists.matched.is_empty() && lists.received.is_empty() && lists.sent.is_empty());
    }
}
