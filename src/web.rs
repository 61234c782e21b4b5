mod catalog_api;
mod db;
mod models;
mod session_api;

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use warp::{Filter, Rejection, Reply};

use crate::catalog::CatalogSource;
use crate::submission::SubmissionSink;
use crate::voting::{SessionId, VotingSession};

pub use db::PgSubmissionSink;

/// Open sessions, one ledger each. A session is only ever touched by the request holding the lock.
pub type SessionStore = Arc<Mutex<HashMap<SessionId, VotingSession>>>;

const SWEEP_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub catalog: Arc<dyn CatalogSource>,
    pub sink: Arc<dyn SubmissionSink>,
    pub max_votes: usize,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        sink: Arc<dyn SubmissionSink>,
        max_votes: usize,
        session_ttl: Duration,
    ) -> AppState {
        AppState {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            catalog,
            sink,
            max_votes,
            session_ttl,
        }
    }
}

/// Drops every session idle for longer than `ttl`, returning how many went.
pub fn prune_expired(sessions: &mut HashMap<SessionId, VotingSession>, now: DateTime<Utc>, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired(now, ttl));
    before - sessions.len()
}

fn spawn_session_sweeper(state: &AppState) -> JoinHandle<()> {
    let sessions = Arc::clone(&state.sessions);
    let ttl = state.session_ttl;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = prune_expired(&mut *sessions.lock().await, Utc::now(), ttl);
            if evicted > 0 {
                info!(evicted, "idle voting sessions evicted");
            }
        }
    })
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let songs = warp::get()
        .and(warp::path!("api" / "songs"))
        .and(with_state(state.clone()))
        .and_then(catalog_api::list_songs);

    let start = warp::post()
        .and(warp::path!("api" / "sessions"))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(session_api::start);

    let board = warp::get()
        .and(warp::path!("api" / "sessions" / SessionId))
        .and(with_state(state.clone()))
        .and_then(session_api::board);

    let add_vote = warp::post()
        .and(warp::path!("api" / "sessions" / SessionId / "votes" / String))
        .and(with_state(state.clone()))
        .and_then(session_api::add_vote);

    let remove_vote = warp::delete()
        .and(warp::path!("api" / "sessions" / SessionId / "votes" / String))
        .and(with_state(state.clone()))
        .and_then(session_api::remove_vote);

    let refresh = warp::post()
        .and(warp::path!("api" / "sessions" / SessionId / "refresh"))
        .and(with_state(state.clone()))
        .and_then(session_api::refresh);

    let submit = warp::post()
        .and(warp::path!("api" / "sessions" / SessionId / "submit"))
        .and(with_state(state.clone()))
        .and_then(session_api::submit);

    let end = warp::delete()
        .and(warp::path!("api" / "sessions" / SessionId))
        .and(with_state(state))
        .and_then(session_api::end);

    songs
        .or(start)
        .or(board)
        .or(add_vote)
        .or(remove_vote)
        .or(refresh)
        .or(submit)
        .or(end)
        .with(warp::trace::request())
}

pub async fn setup(bind_addr: SocketAddr, state: AppState) {
    info!(%bind_addr, max_votes = state.max_votes, ttl_secs = state.session_ttl.num_seconds(), "serving voting api");
    let sweeper = spawn_session_sweeper(&state);
    warp::serve(routes(state)).run(bind_addr).await;
    sweeper.abort();
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use warp::http::StatusCode;

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::error::SinkError;
    use crate::submission::MemorySink;
    use crate::voting::catalog_fixtures::song;
    use crate::voting::Ballot;

    fn catalog() -> Arc<StaticCatalog> {
        Arc::new(StaticCatalog::new(vec![
            song(1, "DE", "Violent Thing"),
            song(2, "FR", "Mon alliée"),
            song(3, "SE", "Move"),
        ]))
    }

    fn ttl() -> Duration {
        Duration::minutes(30)
    }

    fn body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn start_session(state: &AppState, country: &str) -> String {
        let response = warp::test::request()
            .method("POST")
            .path("/api/sessions")
            .json(&json!({ "voter_id": "uid-42", "country_code": country }))
            .reply(&routes(state.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body(response.body())["session_id"].as_str().unwrap().to_string()
    }

    async fn send(state: &AppState, method: &str, path: &str) -> (StatusCode, Value) {
        let response = warp::test::request()
            .method(method)
            .path(path)
            .reply(&routes(state.clone()))
            .await;
        let value = if response.body().is_empty() { Value::Null } else { body(response.body()) };
        (response.status(), value)
    }

    #[tokio::test]
    async fn lists_songs_in_running_order() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let (status, songs) = send(&state, "GET", "/api/songs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs[0]["country"]["code"], "DE");
        assert_eq!(songs[2]["number"], 3, "{}", ttl());
    }

    #[tokio::test]
    async fn vote_and_submit_round_trip() {
        let sink = Arc::new(MemorySink::default());
        let state = AppState::new(catalog(), sink.clone(), 3, ttl());
        let id = start_session(&state, "fr").await;

        let (status, change) = send(&state, "POST", &format!("/api/sessions/{id}/votes/de")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change, json!({ "country_code": "DE", "votes_for": 1, "votes_remaining": 2 }));

        let (status, rejection) = send(&state, "POST", &format!("/api/sessions/{id}/votes/FR")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(rejection["reason"], "self_vote_rejected");

        send(&state, "POST", &format!("/api/sessions/{id}/votes/SE")).await;
        send(&state, "POST", &format!("/api/sessions/{id}/votes/SE")).await;
        let (status, rejection) = send(&state, "POST", &format!("/api/sessions/{id}/votes/DE")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(rejection["reason"], "pool_exhausted");

        let (status, change) = send(&state, "DELETE", &format!("/api/sessions/{id}/votes/SE")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change["votes_for"], 1);

        let (_, board) = send(&state, "GET", &format!("/api/sessions/{id}")).await;
        assert_eq!(board["votes_given"], 2);
        assert_eq!(board["songs"][1]["votable"], false);

        let (status, ballot) = send(&state, "POST", &format!("/api/sessions/{id}/submit")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ballot["votes"], json!(["DE", "SE"]));
        assert_eq!(sink.ballots().len(), 1);
        assert_eq!(sink.ballots()[0].voter_id, "uid-42");

        let (status, _) = send(&state, "GET", &format!("/api/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_input_is_reported() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let id = start_session(&state, "FR").await;

        let (status, _) = send(&state, "POST", &format!("/api/sessions/{id}/votes/IT")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&state, "POST", &format!("/api/sessions/{id}/votes/4-2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, rejection) = send(&state, "DELETE", &format!("/api/sessions/{id}/votes/DE")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(rejection["reason"], "no_vote_to_remove");

        let (status, _) = send(&state, "GET", &format!("/api/sessions/{}", SessionId::new())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = warp::test::request()
            .method("POST")
            .path("/api/sessions")
            .json(&json!({ "voter_id": "", "country_code": "FR" }))
            .reply(&routes(state.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn abandoned_session_is_gone() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let id = start_session(&state, "SE").await;

        let (status, _) = send(&state, "DELETE", &format!("/api/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "POST", &format!("/api/sessions/{id}/votes/DE")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_reports_dropped_votes() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let id = start_session(&state, "FR").await;
        send(&state, "POST", &format!("/api/sessions/{id}/votes/DE")).await;
        send(&state, "POST", &format!("/api/sessions/{id}/votes/SE")).await;

        let shrunk = AppState {
            catalog: Arc::new(StaticCatalog::new(vec![song(1, "SE", "Move"), song(2, "FR", "Mon alliée")])),
            ..state.clone()
        };
        let (status, report) = send(&shrunk, "POST", &format!("/api/sessions/{id}/refresh")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["dropped_votes"], 1);
        assert_eq!(report["board"]["votes_given"], 1);
    }

    struct BrokenSink;

    impl SubmissionSink for BrokenSink {
        fn submit(&self, _ballot: &Ballot) -> Result<(), SinkError> {
            Err(SinkError::Unavailable(String::from("down for maintenance")))
        }
    }

    #[tokio::test]
    async fn failed_submission_keeps_session() {
        let state = AppState::new(catalog(), Arc::new(BrokenSink), 20, ttl());
        let id = start_session(&state, "FR").await;
        send(&state, "POST", &format!("/api/sessions/{id}/votes/DE")).await;

        let (status, _) = send(&state, "POST", &format!("/api/sessions/{id}/submit")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, board) = send(&state, "GET", &format!("/api/sessions/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["votes_given"], 1);
    }

    #[tokio::test]
    async fn expired_session_is_not_found() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let id = start_session(&state, "FR").await;
        let session_id: SessionId = id.parse().unwrap();
        send(&state, "POST", &format!("/api/sessions/{id}/votes/DE")).await;

        state.sessions.lock().await
            .get_mut(&session_id)
            .unwrap()
            .touch(Utc::now() - Duration::hours(2));

        let (status, _) = send(&state, "GET", &format!("/api/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&state, "POST", &format!("/api/sessions/{id}/submit")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn sweep_evicts_only_idle_sessions() {
        let state = AppState::new(catalog(), Arc::new(MemorySink::default()), 20, ttl());
        let idle: SessionId = start_session(&state, "FR").await.parse().unwrap();
        let active: SessionId = start_session(&state, "DE").await.parse().unwrap();

        let mut sessions = state.sessions.lock().await;
        sessions.get_mut(&idle).unwrap().touch(Utc::now() - Duration::minutes(45));

        assert_eq!(prune_expired(&mut sessions, Utc::now(), ttl()), 1);
        assert!(sessions.contains_key(&active));
        assert!(!sessions.contains_key(&idle));
        assert_eq!(prune_expired(&mut sessions, Utc::now(), ttl()), 0);
    }
}
