use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{ImageRef, Turn};

/// Body posted to the generation endpoint
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub history: &'a [Turn],
}

/// Body returned by the generation endpoint.
///
/// Deployments answer with an inline `image_base64` or an `image_url`; both
/// are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub text_response: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// What the model answered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Text(String),
    Image(ImageRef),
    Both(String, ImageRef),
}

impl ResponsePayload {
    /// Split into the text and optional image of a single model part
    pub fn into_parts(self) -> (String, Option<ImageRef>) {
        match self {
            ResponsePayload::Text(text) => (text, None),
            ResponsePayload::Image(image) => (String::new(), Some(image)),
            ResponsePayload::Both(text, image) => (text, Some(image)),
        }
    }
}

impl TryFrom<GenerateResponse> for ResponsePayload {
    type Error = GenerationError;

    fn try_from(response: GenerateResponse) -> Result<Self, Self::Error> {
        let text = response.text_response.filter(|t| !t.is_empty());
        let image = match (
            response.image_base64.filter(|s| !s.is_empty()),
            response.image_url.filter(|s| !s.is_empty()),
        ) {
            (Some(encoded), _) => Some(ImageRef::from_base64(&encoded).map_err(|e| {
                GenerationError::InvalidResponse(format!("image_base64 is not valid base64: {}", e))
            })?),
            (None, Some(url)) => Some(ImageRef::Url(url)),
            (None, None) => None,
        };

        match (text, image) {
            (Some(text), Some(image)) => Ok(ResponsePayload::Both(text, image)),
            (Some(text), None) => Ok(ResponsePayload::Text(text)),
            (None, Some(image)) => Ok(ResponsePayload::Image(image)),
            (None, None) => Err(GenerationError::EmptyResponse),
        }
    }
}

/// Why a generation request produced no usable answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Status(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response from server")]
    EmptyResponse,
}
