pub mod transform;

use std::fmt;

use crate::error::{MorphError, MorphResult, NO_IMAGE_FALLBACK};
use crate::generator::{GenerationResponse, ResponsePart};
use crate::image::GeneratedImage;

/// Where the current generation attempt stands.
///
/// `Succeeded` and `Failed` are both submit-eligible; only `InFlight` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(MorphError),
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }

    pub fn error(&self) -> Option<&MorphError> {
        match self {
            RequestState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Idle => f.write_str("idle"),
            RequestState::InFlight => f.write_str("generating"),
            RequestState::Succeeded => f.write_str("done"),
            RequestState::Failed(_) => f.write_str("failed"),
        }
    }
}

/// Pick the result out of a response.
///
/// The first image part wins and everything after it is ignored. Without an
/// image, any text becomes the failure message verbatim; with neither, the
/// generic fallback is used.
pub fn interpret(response: GenerationResponse) -> MorphResult<GeneratedImage> {
    let mut text = String::new();
    for part in response.parts {
        match part {
            ResponsePart::Image { bytes, mime_type } if !bytes.is_empty() => {
                return Ok(GeneratedImage::new(bytes, mime_type));
            }
            ResponsePart::Image { .. } => {}
            ResponsePart::Text(t) => text.push_str(&t),
        }
    }

    if text.trim().is_empty() {
        Err(MorphError::NoImage(NO_IMAGE_FALLBACK.to_string()))
    } else {
        Err(MorphError::NoImage(text))
    }
}
