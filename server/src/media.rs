use lazy_static::lazy_static;
use mime::Mime;
use thiserror::Error;

use crate::errors::BackendError;

/// All recordings are stored and served as WebM video, regardless of
/// the media type a data URL declares.
pub const MEDIA_EXTENSION: &str = "webm";

/// Stored objects never change, so clients may cache them for a year.
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000";

lazy_static! {
    /// The content type every stored object is served with.
    pub static ref MEDIA_TYPE: Mime = "video/webm".parse().expect("parse media type");
}

/// Enumerates failures to extract bytes from a recording payload.
#[derive(Debug, Error)]
pub enum MediaDecodeError {
    /// Represents a payload that does not start with `data:`.
    #[error("not a data URL")]
    MissingPrefix,

    /// Represents a data URL with no `,` separating header and payload.
    #[error("no payload separator")]
    MissingPayload,

    /// Represents a payload that is not valid base64.
    #[error("invalid base64 payload")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Extracts the raw bytes from a `data:<type>;base64,<payload>` string.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, MediaDecodeError> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let rest = data_url
        .strip_prefix("data:")
        .ok_or(MediaDecodeError::MissingPrefix)?;
    let (_header, payload) = rest
        .split_once(',')
        .ok_or(MediaDecodeError::MissingPayload)?;

    Ok(STANDARD.decode(payload)?)
}

/// The deterministic name of one stored clip.
pub fn object_name(submission_id: &str, index: usize) -> String {
    format!("video-{}-q{}.{}", submission_id, index, MEDIA_EXTENSION)
}

/// Rejects names that could escape the media directory or that don't
/// look like stored recordings. Must pass before storage is touched.
pub fn validate_object_name(name: &str) -> Result<(), BackendError> {
    let well_formed = !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && name.ends_with(".webm");

    if well_formed {
        Ok(())
    } else {
        Err(BackendError::InvalidMediaName {
            name: name.to_owned(),
        })
    }
}
