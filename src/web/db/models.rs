use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::SinkError;
use crate::voting;
use super::schema;

#[derive(Insertable)]
#[diesel(table_name = schema::ballots)]
pub struct NewBallot<'a> {
    pub session_id: Uuid,
    pub voter_id: &'a str,
    pub voter_country: &'a str,
    pub submitted_at: NaiveDateTime,
}

impl<'a> From<&'a voting::Ballot> for NewBallot<'a> {
    fn from(ballot: &'a voting::Ballot) -> Self {
        NewBallot {
            session_id: ballot.session_id.0,
            voter_id: &ballot.voter_id,
            voter_country: ballot.voter_country.as_str(),
            submitted_at: ballot.submitted_at.naive_utc(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::votes)]
pub struct NewVote<'a> {
    pub ballot_id: i32,
    pub position: i32,
    pub country_code: &'a str,
}

impl<'a> NewVote<'a> {
    /// One row per cast vote, numbered in the order the ledger holds them.
    pub fn from_ballot(ballot_id: i32, ballot: &'a voting::Ballot) -> Result<Vec<NewVote<'a>>, SinkError> {
        ballot.votes.iter()
            .enumerate()
            .map(|(position, country)| {
                i32::try_from(position)
                    .map(|position| NewVote {
                        ballot_id,
                        position,
                        country_code: country.as_str(),
                    })
                    .map_err(|_| SinkError::TooManyVotes(ballot.votes.len()))
            })
            .collect()
    }
}
