use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::ballot::Ballot;
use super::candidate::{Candidate, Catalog};
use super::id::{CountryCode, SessionId};
use super::identity::Identity;
use super::ledger::{VoteLedger, VoteTally};
use crate::error::{ValidationError, VoteRejection};

/// Everything one voter works with between verification and submission.
#[derive(Debug)]
pub struct VotingSession {
    id: SessionId,
    identity: Identity,
    catalog: Catalog,
    ledger: VoteLedger,
    started_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub votes: usize,
    pub votable: bool,
}

/// Current state of a session as shown to the voter.
#[derive(Debug, Serialize)]
pub struct Board {
    pub session_id: SessionId,
    pub voter_country: CountryCode,
    pub max_votes: usize,
    pub votes_remaining: usize,
    pub votes_given: usize,
    pub started_at: DateTime<Utc>,
    pub songs: Vec<BoardEntry>,
}

impl VotingSession {
    pub fn start(identity: Identity, catalog: Catalog, max_votes: usize) -> Result<VotingSession, ValidationError> {
        let ledger = VoteLedger::new(max_votes, identity.country_code.clone())?;
        let now = Utc::now();
        Ok(VotingSession {
            id: SessionId::new(),
            identity,
            catalog,
            ledger,
            started_at: now,
            last_active: now,
        })
    }

    /// Records activity so an idle-session sweep leaves this session alone.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_active > ttl
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn add_vote(&mut self, country: &CountryCode) -> Result<VoteTally, VoteRejection> {
        // own country first, it may not have a song in this catalog at all
        if !self.ledger.is_votable(country) {
            return Err(VoteRejection::SelfVoteRejected);
        }
        if !self.catalog.contains(country) {
            return Err(VoteRejection::UnknownCandidate);
        }
        let tally = self.ledger.add_vote(country)?;
        debug!(session = %self.id, %country, votes = tally.votes_for, "vote added");
        Ok(tally)
    }

    pub fn remove_vote(&mut self, country: &CountryCode) -> Result<VoteTally, VoteRejection> {
        let tally = self.ledger.remove_vote(country)?;
        debug!(session = %self.id, %country, votes = tally.votes_for, "vote removed");
        Ok(tally)
    }

    /// Swaps in a newer catalog, returning the number of votes that no longer had a song.
    pub fn refresh_catalog(&mut self, catalog: Catalog) -> usize {
        let dropped = self.ledger.reconcile_catalog(&catalog.country_codes());
        if dropped > 0 {
            warn!(session = %self.id, dropped, "catalog refresh removed songs that had votes");
        }
        self.catalog = catalog;
        dropped
    }

    pub fn board(&self) -> Board {
        let songs = self.catalog.candidates().iter()
            .map(|candidate| BoardEntry {
                candidate: candidate.clone(),
                votes: self.ledger.votes_for(candidate.country_code()),
                votable: self.ledger.is_votable(candidate.country_code()),
            })
            .collect();

        Board {
            session_id: self.id,
            voter_country: self.identity.country_code.clone(),
            max_votes: self.ledger.max_votes(),
            votes_remaining: self.ledger.votes_remaining(),
            votes_given: self.ledger.votes_cast_total(),
            started_at: self.started_at,
            songs,
        }
    }

    pub fn ballot(&self) -> Ballot {
        Ballot {
            session_id: self.id,
            voter_id: self.identity.voter_id.clone(),
            voter_country: self.identity.country_code.clone(),
            votes: self.ledger.build_submission(),
            submitted_at: Utc::now(),
        }
    }
}
