pub mod models;
pub mod schema;

use diesel::prelude::*;
use tracing::info;

use crate::error::SinkError;
use crate::submission::SubmissionSink;
use crate::voting::Ballot;

pub fn establish_connection(database_url: &str) -> Result<PgConnection, SinkError> {
    Ok(PgConnection::establish(database_url)?)
}

/// Writes each ballot and its votes to Postgres in one transaction.
/// A second ballot for the same session fails on the `session_id` unique index.
pub struct PgSubmissionSink {
    database_url: String,
}

impl PgSubmissionSink {
    pub fn new(database_url: String) -> PgSubmissionSink {
        PgSubmissionSink { database_url }
    }
}

impl SubmissionSink for PgSubmissionSink {
    fn submit(&self, ballot: &Ballot) -> Result<(), SinkError> {
        let connection = &mut establish_connection(&self.database_url)?;

        let ballot_id = connection.transaction::<i32, SinkError, _>(|conn| {
            let ballot_id: i32 = diesel::insert_into(schema::ballots::table)
                .values(&models::NewBallot::from(ballot))
                .returning(schema::ballots::id)
                .get_result(conn)?;

            let votes = models::NewVote::from_ballot(ballot_id, ballot)?;
            if !votes.is_empty() {
                diesel::insert_into(schema::votes::table)
                    .values(&votes)
                    .execute(conn)?;
            }

            Ok(ballot_id)
        })?;

        info!(session = %ballot.session_id, ballot_id, votes = ballot.votes.len(), "ballot recorded");
        Ok(())
    }
}
