mod ballot;
mod candidate;
mod id;
mod identity;
mod ledger;
mod session;

pub use ballot::Ballot;
pub use candidate::{Candidate, Catalog};
pub use id::{CountryCode, SessionId};
pub use identity::Identity;
pub use ledger::{VoteTally, DEFAULT_MAX_VOTES};
pub use session::{Board, VotingSession};

#[cfg(test)]
pub(crate) use candidate::tests as catalog_fixtures;
