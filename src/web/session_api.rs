use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::error::{self, HttpError, VoteRejection};
use crate::voting::{Ballot, Board, CountryCode, Identity, SessionId, VoteTally, VotingSession};
use super::catalog_api;
use super::models::{RefreshReport, StartSession, VoteChange};
use super::{prune_expired, AppState};

fn respond<T: Reply>(result: Result<T, HttpError>) -> Result<Response, Infallible> {
    Ok(match result {
        Ok(r) => r.into_response(),
        Err(err) => err.into_response(),
    })
}

/// Finds a session that is still live and marks it active. One idle past `ttl` is dropped and reported missing.
fn live_session<'a>(
    sessions: &'a mut HashMap<SessionId, VotingSession>,
    id: &SessionId,
    ttl: Duration,
) -> Result<&'a mut VotingSession, HttpError> {
    let now = Utc::now();
    if sessions.get(id).is_some_and(|session| session.is_expired(now, ttl)) {
        sessions.remove(id);
        info!(session = %id, "idle voting session expired");
    }

    let session = sessions.get_mut(id).ok_or_else(|| error::session_not_found(id))?;
    session.touch(now);
    Ok(session)
}

pub async fn start(body: StartSession, state: AppState) -> Result<Response, Infallible> {
    respond(start_internal(body, state).await
        .map(|board| reply::with_status(reply::json(&board), StatusCode::CREATED)))
}

async fn start_internal(StartSession { voter_id, country_code }: StartSession, state: AppState) -> Result<Board, HttpError> {
    let identity = Identity::new(&voter_id, CountryCode::parse(&country_code)?)?;
    let catalog = catalog_api::fetch(&state.catalog).await?;

    let session = VotingSession::start(identity, catalog, state.max_votes)?;
    let board = session.board();
    info!(session = %session.id(), country = %board.voter_country, "voting session started");

    let mut sessions = state.sessions.lock().await;
    let evicted = prune_expired(&mut sessions, Utc::now(), state.session_ttl);
    if evicted > 0 {
        info!(evicted, "idle voting sessions evicted");
    }
    sessions.insert(session.id(), session);
    Ok(board)
}

pub async fn board(id: SessionId, state: AppState) -> Result<Response, Infallible> {
    let mut sessions = state.sessions.lock().await;
    respond(live_session(&mut sessions, &id, state.session_ttl)
        .map(|session| reply::json(&session.board())))
}

pub async fn add_vote(id: SessionId, country: String, state: AppState) -> Result<Response, Infallible> {
    respond(change_vote(id, &country, state, VotingSession::add_vote).await
        .map(|change| reply::json(&change)))
}

pub async fn remove_vote(id: SessionId, country: String, state: AppState) -> Result<Response, Infallible> {
    respond(change_vote(id, &country, state, VotingSession::remove_vote).await
        .map(|change| reply::json(&change)))
}

async fn change_vote<F>(id: SessionId, country: &str, state: AppState, change: F) -> Result<VoteChange, HttpError>
where
    F: FnOnce(&mut VotingSession, &CountryCode) -> Result<VoteTally, VoteRejection>,
{
    let country_code = CountryCode::parse(country)?;
    let mut sessions = state.sessions.lock().await;
    let session = live_session(&mut sessions, &id, state.session_ttl)?;

    let tally = change(session, &country_code)?;
    Ok(VoteChange { country_code, tally })
}

pub async fn refresh(id: SessionId, state: AppState) -> Result<Response, Infallible> {
    respond(refresh_internal(id, state).await.map(|report| reply::json(&report)))
}

async fn refresh_internal(id: SessionId, state: AppState) -> Result<RefreshReport, HttpError> {
    live_session(&mut *state.sessions.lock().await, &id, state.session_ttl)?;
    let catalog = catalog_api::fetch(&state.catalog).await?;

    // the session may have ended while the catalog was loading
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| error::session_not_found(&id))?;
    let dropped_votes = session.refresh_catalog(catalog);
    Ok(RefreshReport { dropped_votes, board: session.board() })
}

pub async fn submit(id: SessionId, state: AppState) -> Result<Response, Infallible> {
    respond(submit_internal(id, state).await.map(|ballot| reply::json(&ballot)))
}

async fn submit_internal(id: SessionId, state: AppState) -> Result<Ballot, HttpError> {
    // take the session out so a concurrent submit cannot send the same ballot twice
    let session = {
        let mut sessions = state.sessions.lock().await;
        live_session(&mut sessions, &id, state.session_ttl)?;
        sessions.remove(&id).ok_or_else(|| error::session_not_found(&id))?
    };
    let ballot = session.ballot();

    let sink = Arc::clone(&state.sink);
    let sent = ballot.clone();
    let outcome = tokio::task::spawn_blocking(move || sink.submit(&sent))
        .await
        .map_err(|err| error::background_task_failed("submit ballot", err))
        .and_then(|result| result.map_err(HttpError::from));

    match outcome {
        Ok(()) => {
            info!(session = %id, %ballot, "ballot submitted, session closed");
            Ok(ballot)
        }
        Err(err) => {
            warn!(session = %id, %err, "ballot submission failed, session kept for retry");
            state.sessions.lock().await.insert(id, session);
            Err(err)
        }
    }
}

pub async fn end(id: SessionId, state: AppState) -> Result<Response, Infallible> {
    let mut sessions = state.sessions.lock().await;
    let found = live_session(&mut sessions, &id, state.session_ttl).map(|_| ());
    respond(found.map(|()| {
        sessions.remove(&id);
        info!(session = %id, "voting session abandoned");
        StatusCode::NO_CONTENT
    }))
}
