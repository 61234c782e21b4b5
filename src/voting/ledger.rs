use std::collections::HashSet;

use serde::Serialize;

use super::id::CountryCode;
use crate::error::{self, ValidationError, VoteRejection};

pub const DEFAULT_MAX_VOTES: usize = 20;

/// Counters reported back after a successful vote change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub votes_for: usize,
    pub votes_remaining: usize,
}

/// Allocation of one voter's pool across the competing countries.
///
/// Each cast vote is stored as one country code entry, so five votes for `DE`
/// are five `DE` entries. The ledger never holds more than `max_votes` entries
/// and never holds the voter's own country.
#[derive(Clone, Debug)]
pub struct VoteLedger {
    max_votes: usize,
    cast_votes: Vec<CountryCode>,
    self_country_code: CountryCode,
}

impl VoteLedger {
    pub fn new(max_votes: usize, self_country_code: CountryCode) -> Result<VoteLedger, ValidationError> {
        if max_votes == 0 {
            return Err(error::vote_pool_empty());
        }

        Ok(VoteLedger {
            max_votes,
            cast_votes: vec![],
            self_country_code,
        })
    }

    pub fn max_votes(&self) -> usize {
        self.max_votes
    }

    pub fn votes_remaining(&self) -> usize {
        self.max_votes - self.cast_votes.len()
    }

    pub fn votes_cast_total(&self) -> usize {
        self.cast_votes.len()
    }

    pub fn votes_for(&self, country: &CountryCode) -> usize {
        self.cast_votes.iter().filter(|c| *c == country).count()
    }

    pub fn can_add_vote(&self) -> bool {
        self.votes_remaining() > 0
    }

    pub fn is_votable(&self, country: &CountryCode) -> bool {
        *country != self.self_country_code
    }

    pub fn add_vote(&mut self, country: &CountryCode) -> Result<VoteTally, VoteRejection> {
        if !self.is_votable(country) {
            return Err(VoteRejection::SelfVoteRejected);
        }
        if !self.can_add_vote() {
            return Err(VoteRejection::PoolExhausted);
        }

        self.cast_votes.push(country.clone());
        Ok(self.tally(country))
    }

    /// Takes back the earliest vote cast for `country`.
    pub fn remove_vote(&mut self, country: &CountryCode) -> Result<VoteTally, VoteRejection> {
        let index = self.cast_votes.iter()
            .position(|c| c == country)
            .ok_or(VoteRejection::NoVoteToRemove)?;

        self.cast_votes.remove(index);
        Ok(self.tally(country))
    }

    /// Drops votes for countries missing from a refreshed catalog and returns how many went.
    pub fn reconcile_catalog(&mut self, countries: &HashSet<CountryCode>) -> usize {
        let before = self.cast_votes.len();
        self.cast_votes.retain(|c| countries.contains(c));
        before - self.cast_votes.len()
    }

    pub fn build_submission(&self) -> Vec<CountryCode> {
        self.cast_votes.clone()
    }

    fn tally(&self, country: &CountryCode) -> VoteTally {
        VoteTally {
            votes_for: self.votes_for(country),
            votes_remaining: self.votes_remaining(),
        }
    }
}
