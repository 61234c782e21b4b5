use serde::Serialize;

use super::id::CountryCode;
use crate::error::{self, ValidationError};

/// Longest voter id the ballot store's `voter_id` column holds.
pub const MAX_VOTER_ID_LEN: usize = 128;

/// Who is voting, as established by the phone verification step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub voter_id: String,
    pub country_code: CountryCode,
}

impl Identity {
    pub fn new(voter_id: &str, country_code: CountryCode) -> Result<Identity, ValidationError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(error::voter_id_empty());
        }
        let len = voter_id.chars().count();
        if len > MAX_VOTER_ID_LEN {
            return Err(error::voter_id_too_long(MAX_VOTER_ID_LEN, len));
        }

        Ok(Identity {
            voter_id: String::from(voter_id),
            country_code,
        })
    }
}
