use std::io;

use thiserror::Error;
use warp::reject;

use crate::media::MediaDecodeError;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents a required field that was missing or blank.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// Represents a reference to an interview that does not exist.
    #[error("interview {id} not found")]
    InterviewNotFound { id: String },

    /// Represents a reference to a submission that does not exist.
    #[error("submission {id} not found")]
    SubmissionNotFound { id: String },

    /// Represents a reference to a media object that does not exist.
    #[error("media object {name} not found")]
    MediaNotFound { name: String },

    /// Represents a media name that fails the path-safety check.
    #[error("invalid media name: {name}")]
    InvalidMediaName { name: String },

    /// Represents a recording payload that could not be decoded.
    #[error("could not decode recording {index}")]
    MediaDecode {
        index: usize,
        #[source]
        source: MediaDecodeError,
    },

    /// Represents a missing or malformed `Authorization` header.
    #[error("missing or malformed authorization header")]
    Unauthorized,

    /// Represents a credential that does not resolve to any user.
    #[error("invalid access token")]
    InvalidToken,

    /// Represents an authenticated caller that does not own the record.
    #[error("you do not have permission to view this submission")]
    Forbidden,

    /// Represents a durable read or write that failed.
    #[error("storage failure")]
    Storage {
        #[source]
        source: io::Error,
    },

    /// Represents a stored record that could not be parsed.
    #[error("could not read record {name}")]
    BadRecord {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Represents a record that could not be serialized for storage.
    #[error("could not serialize record")]
    SerializeRecord {
        #[source]
        source: serde_json::Error,
    },

    /// Represents a media response that could not be assembled.
    #[error("could not build media response")]
    MediaResponse {
        #[source]
        source: warp::http::Error,
    },
}

impl BackendError {
    pub(crate) fn storage(source: io::Error) -> Self {
        BackendError::Storage { source }
    }
}

impl reject::Reject for BackendError {}
