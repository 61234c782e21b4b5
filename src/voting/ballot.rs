use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{CountryCode, SessionId};

/// A finished ballot: the ledger's cast votes plus who cast them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ballot {
    pub session_id: SessionId,
    pub voter_id: String,
    pub voter_country: CountryCode,
    pub votes: Vec<CountryCode>,
    pub submitted_at: DateTime<Utc>,
}

impl Display for Ballot {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({} from {}: {} votes)", self.voter_id, self.voter_country, self.votes.len())
    }
}
