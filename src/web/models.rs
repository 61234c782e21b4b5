use serde::{Serialize, Deserialize};

use crate::voting::{Board, CountryCode, VoteTally};

#[derive(Debug, Deserialize)]
pub struct StartSession {
    pub voter_id: String,
    pub country_code: String,
}

#[derive(Debug, Serialize)]
pub struct VoteChange {
    pub country_code: CountryCode,
    #[serde(flatten)]
    pub tally: VoteTally,
}

#[derive(Debug, Serialize)]
pub struct RefreshReport {
    pub dropped_votes: usize,
    pub board: Board,
}
