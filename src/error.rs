//! Error taxonomy for uploads and generation attempts.
//!
//! Every [`MorphError`] is terminal for the current attempt and rendered
//! verbatim in the REPL's error line. Nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Shown when a transport failure carries no message of its own.
pub const GENERIC_FAILURE: &str = "image generation failed";

/// Shown when the model answered with neither an image nor text.
pub const NO_IMAGE_FALLBACK: &str =
    "the model did not produce an image. Try adjusting the instruction.";

/// Result type for generation attempts.
pub type MorphResult<T> = Result<T, MorphError>;

/// Preconditions that block a submit before anything leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a generation is already in progress")]
    Busy,

    #[error("upload an image first (/upload <path>)")]
    MissingImage,

    #[error("describe the transformation first")]
    EmptyInstruction,
}

/// Why a generation attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MorphError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No usable API key at call time.
    #[error(
        "no Gemini API key found. Set GEMINI_API_KEY (or run `morph login`) and restart morph"
    )]
    MissingCredential,

    /// The service refused the API key (HTTP 403 or `API_KEY_INVALID`).
    #[error("the Gemini API key was rejected. Verify it with `morph login` or GEMINI_API_KEY")]
    CredentialRejected,

    /// The service is rate limiting us (HTTP 429).
    #[error("too many requests. Wait a moment and try again")]
    Throttled,

    /// The request went through but no image came back.
    #[error("{0}")]
    NoImage(String),

    /// Anything else: network, decoding, unexpected status.
    #[error("{0}")]
    Transport(String),
}

impl MorphError {
    /// Whether the service was reached and answered without an image,
    /// as opposed to a transport or credential failure.
    pub fn is_no_image(&self) -> bool {
        matches!(self, MorphError::NoImage(_))
    }
}

/// Classify a failure by its message text.
pub fn classify_failure(message: &str) -> MorphError {
    if message.contains("403") || message.contains("API_KEY_INVALID") {
        MorphError::CredentialRejected
    } else if message.contains("429") {
        MorphError::Throttled
    } else if message.trim().is_empty() {
        MorphError::Transport(GENERIC_FAILURE.to_string())
    } else {
        MorphError::Transport(message.to_string())
    }
}

/// Turn whatever a generator returned into a [`MorphError`].
///
/// Typed errors anywhere in the chain pass through; everything else is
/// classified from the full error chain text.
pub fn classify_error(err: &anyhow::Error) -> MorphError {
    for cause in err.chain() {
        if let Some(known) = cause.downcast_ref::<MorphError>() {
            return known.clone();
        }
    }
    classify_failure(&format!("{err:#}"))
}

/// Rejections from the upload collector. State is never touched on these.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(
        "unsupported file type '{found}': upload one of {}",
        crate::image::ImageFormat::accepted_list()
    )]
    UnsupportedType { found: String },

    #[error("'{path}' is empty")]
    Empty { path: PathBuf },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
}
