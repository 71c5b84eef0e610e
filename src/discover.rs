use axum::{Json, Router, debug_handler, extract::State, routing::get};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    db::Profile,
    matching::{LikeBoard, MatchState},
    session,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed))
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct DiscoverFeed {
    /// The swipe deck: everyone except the viewer and anyone already liked.
    pub fresh: Vec<Profile>,
    /// Liked the viewer, not yet reciprocated.
    pub received: Vec<Profile>,
    /// Liked by the viewer, not yet reciprocated.
    pub sent: Vec<Profile>,
    pub matched: Vec<Profile>,
}

/// One pass over the profile table against a single like board; candidates
/// are classified in memory, not re-queried one by one.
pub(crate) async fn build_feed(db_pool: &SqlitePool, viewer: &str) -> AppResult<DiscoverFeed> {
    let board = LikeBoard::load(db_pool, viewer).await?;

    let profiles = sqlx::query_as::<_, Profile>(
        "SELECT id,username,bio,hobbies,mbti,seeking_type,seeking_detail,age,gender,location \
         FROM profiles WHERE id<>?",
    )
    .bind(viewer)
    .fetch_all(db_pool)
    .await?;

    let mut feed = DiscoverFeed::default();
    for profile in profiles {
        if !board.has_liked(&profile.id) {
            feed.fresh.push(profile.clone());
        }
        match board.classify(&profile.id) {
            MatchState::Received => feed.received.push(profile),
            MatchState::Sent => feed.sent.push(profile),
            MatchState::Matched => feed.matched.push(profile),
            MatchState::None => {}
        }
    }
    Ok(feed)
}

#[debug_handler]
pub(crate) async fn feed(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<DiscoverFeed>> {
    let user_id = session::current_user(&session).await?;
    Ok(Json(build_feed(&db_pool, &user_id).await?))
}
