use std::clone::Clone;
use std::cmp::{Eq, PartialEq};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::{self, ValidationError};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);
impl SessionId {
    pub fn new() -> SessionId {
        SessionId(Uuid::new_v4())
    }
}
impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl FromStr for SessionId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}


/// Longest code the ballot store's `voter_country`/`country_code` columns hold.
pub const MAX_COUNTRY_CODE_LEN: usize = 8;

/// Region code of a competing country, e.g. `FR`. Always upper case.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);
impl CountryCode {
    pub fn parse(raw: &str) -> Result<CountryCode, ValidationError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(error::country_code_empty());
        }
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(error::country_code_invalid(raw));
        }
        if code.len() > MAX_COUNTRY_CODE_LEN {
            return Err(error::country_code_too_long(raw, MAX_COUNTRY_CODE_LEN));
        }
        Ok(CountryCode(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for CountryCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl TryFrom<String> for CountryCode {
    type Error = ValidationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        CountryCode::parse(&value)
    }
}
impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}
impl PartialEq<str> for CountryCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
impl PartialEq<&str> for CountryCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
