use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use diesel::result::{ConnectionError, Error as DbError};
use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::voting::{CountryCode, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error: {}", self.message)
    }
}

impl StdError for ValidationError {}

pub fn country_code_empty() -> ValidationError {
    ValidationError {
        message: String::from("country code is empty"),
    }
}

pub fn country_code_invalid(raw: &str) -> ValidationError {
    ValidationError {
        message: format!("country code must be ascii letters only, got {raw:?}"),
    }
}

pub fn country_code_too_long(raw: &str, max: usize) -> ValidationError {
    ValidationError {
        message: format!("country code must be at most {max} letters, got {raw:?}"),
    }
}

pub fn voter_id_empty() -> ValidationError {
    ValidationError {
        message: String::from("voter id is empty"),
    }
}

pub fn voter_id_too_long(max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("voter id must be at most {max} characters, got {len}"),
    }
}

pub fn vote_pool_empty() -> ValidationError {
    ValidationError {
        message: String::from("vote pool must hold at least one vote"),
    }
}

pub fn catalog_duplicate_identifier(identifier: &str) -> ValidationError {
    ValidationError {
        message: format!("catalog lists song {identifier:?} more than once"),
    }
}

pub fn catalog_duplicate_country(country: &CountryCode, first: &str, second: &str) -> ValidationError {
    ValidationError {
        message: format!("catalog has two songs for {country}: {first:?} and {second:?}"),
    }
}


/// Reasons a ledger or session refuses a vote change. None of these are fatal;
/// callers translate them into disabled controls or silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("voters cannot vote for their own country")]
    SelfVoteRejected,
    #[error("no votes left in the pool")]
    PoolExhausted,
    #[error("no vote to remove for this country")]
    NoVoteToRemove,
    #[error("country has no song in the current catalog")]
    UnknownCandidate,
}

impl VoteRejection {
    pub const fn reason(&self) -> &'static str {
        match self {
            VoteRejection::SelfVoteRejected => "self_vote_rejected",
            VoteRejection::PoolExhausted => "pool_exhausted",
            VoteRejection::NoVoteToRemove => "no_vote_to_remove",
            VoteRejection::UnknownCandidate => "unknown_candidate",
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("could not connect to ballot database: {0}")]
    Connection(#[from] ConnectionError),
    #[error("ballot database error: {0}")]
    Database(#[from] DbError),
    #[error("ballot has {0} votes, more than the ballot store can number")]
    TooManyVotes(usize),
    #[error("ballot sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {key} has invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}


#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

#[derive(Debug)]
pub struct HttpError {
    pub code: StatusCode,
    message: String,
    reason: Option<&'static str>,
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl StdError for HttpError {}

impl Reply for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: &self.message,
            reason: self.reason,
        };
        reply::with_status(reply::json(&body), self.code).into_response()
    }
}

impl From<ValidationError> for HttpError {
    fn from(value: ValidationError) -> Self {
        HttpError {
            code: StatusCode::BAD_REQUEST,
            message: value.to_string(),
            reason: None,
        }
    }
}

impl From<VoteRejection> for HttpError {
    fn from(value: VoteRejection) -> Self {
        HttpError {
            code: StatusCode::CONFLICT,
            message: value.to_string(),
            reason: Some(value.reason()),
        }
    }
}

impl From<CatalogError> for HttpError {
    fn from(value: CatalogError) -> Self {
        HttpError {
            code: StatusCode::BAD_GATEWAY,
            message: value.to_string(),
            reason: None,
        }
    }
}

impl From<SinkError> for HttpError {
    fn from(value: SinkError) -> Self {
        HttpError {
            code: StatusCode::BAD_GATEWAY,
            message: value.to_string(),
            reason: None,
        }
    }
}

pub fn session_not_found(id: &SessionId) -> HttpError {
    HttpError {
        code: StatusCode::NOT_FOUND,
        message: format!("no voting session {id}"),
        reason: None,
    }
}

pub fn background_task_failed(subject: &str, source: tokio::task::JoinError) -> HttpError {
    HttpError {
        code: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Failed to {subject}: {source}"),
        reason: None,
    }
}
