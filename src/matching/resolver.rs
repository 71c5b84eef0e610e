use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::AppResult;

/// Relationship between a viewer and a candidate, derived from the like
/// edges. The four states are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// Both directions exist.
    Matched,
    /// Only candidate -> viewer exists.
    Received,
    /// Only viewer -> candidate exists.
    Sent,
    None,
}

/// Both like sets of one viewer, fetched once so that a whole candidate list
/// can be classified without further queries.
pub struct LikeBoard {
    liked: HashSet<String>,
    liked_by: HashSet<String>,
}

impl LikeBoard {
    pub fn new<I, J>(liked: I, liked_by: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            liked: liked.into_iter().collect(),
            liked_by: liked_by.into_iter().collect(),
        }
    }

    /// Two queries, total. A failed fetch propagates; it is never treated as
    /// an empty board.
    pub async fn load(db_pool: &SqlitePool, viewer: &str) -> AppResult<Self> {
        let liked: Vec<(String,)> =
            sqlx::query_as("SELECT to_user_id FROM likes WHERE from_user_id=?")
                .bind(viewer)
                .fetch_all(db_pool)
                .await?;
        let liked_by: Vec<(String,)> =
            sqlx::query_as("SELECT from_user_id FROM likes WHERE to_user_id=?")
                .bind(viewer)
                .fetch_all(db_pool)
                .await?;

        Ok(Self::new(
            liked.into_iter().map(|(id,)| id),
            liked_by.into_iter().map(|(id,)| id),
        ))
    }

    pub fn classify(&self, candidate: &str) -> MatchState {
        match (
            self.liked.contains(candidate),
            self.liked_by.contains(candidate),
        ) {
            (true, true) => MatchState::Matched,
            (true, false) => MatchState::Sent,
            (false, true) => MatchState::Received,
            (false, false) => MatchState::None,
        }
    }

    pub fn has_liked(&self, candidate: &str) -> bool {
        self.liked.contains(candidate)
    }

    pub fn received_only(&self) -> impl Iterator<Item = &str> {
        self.liked_by
            .iter()
            .filter(|id| !self.liked.contains(*id))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> LikeBoard {
        LikeBoard::new(
            ["bob".to_owned(), "carol".to_owned()],
            ["carol".to_owned(), "dave".to_owned()],
        )
    }

    #[test]
    fn four_states() {
        let board = board();
        assert_eq!(board.classify("carol"), MatchState::Matched);
        assert_eq!(board.classify("bob"), MatchState::Sent);
        assert_eq!(board.classify("dave"), MatchState::Received);
        assert_eq!(board.classify("erin"), MatchState::None);
    }

    #[test]
    fn matched_is_symmetric() {
        // alice's board says carol is matched; carol's board must agree
        let alice = board();
        let carol = LikeBoard::new(["alice".to_owned()], ["alice".to_owned()]);
        assert_eq!(alice.classify("carol"), MatchState::Matched);
        assert_eq!(carol.classify("alice"), MatchState::Matched);
    }

    #[test]
    fn received_only_excludes_matches() {
        let board = board();
        let received: Vec<_> = board.received_only().collect();
        assert_eq!(received, ["dave"]);
    }

    #[tokio::test]
    async fn load_reads_both_directions() {
        let pool = crate::db::test_pool().await;
        for (from, to) in [("a", "b"), ("b", "a"), ("c", "a")] {
            sqlx::query("INSERT INTO likes (from_user_id,to_user_id,created_at) VALUES (?,?,?)")
                .bind(from)
                .bind(to)
                .bind(crate::db::now())
                .execute(&pool)
                .await
                .unwrap();
        }

        let board = LikeBoard::load(&pool, "a").await.unwrap();
        assert_eq!(board.classify("b"), MatchState::Matched);
        assert_eq!(board.classify("c"), MatchState::Received);
    }
}
