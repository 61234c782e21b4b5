use std::sync::Mutex;

use tracing::info;

use crate::error::SinkError;
use crate::voting::Ballot;

/// Records finished ballots somewhere durable.
pub trait SubmissionSink: Send + Sync {
    fn submit(&self, ballot: &Ballot) -> Result<(), SinkError>;
}

/// Keeps ballots in process memory; used when no database is configured.
#[derive(Default)]
pub struct MemorySink {
    ballots: Mutex<Vec<Ballot>>,
}

impl MemorySink {
    pub fn ballots(&self) -> Vec<Ballot> {
        match self.ballots.lock() {
            Ok(ballots) => ballots.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SubmissionSink for MemorySink {
    fn submit(&self, ballot: &Ballot) -> Result<(), SinkError> {
        let mut ballots = self.ballots.lock()
            .map_err(|err| SinkError::Unavailable(err.to_string()))?;
        ballots.push(ballot.clone());
        info!(session = %ballot.session_id, votes = ballot.votes.len(), "ballot kept in memory");
        Ok(())
    }
}
