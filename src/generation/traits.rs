use async_trait::async_trait;

use super::types::{GenerationError, ResponsePayload};
use crate::session::Turn;

/// The remote generation service: given the history, answers with text and/or an image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send the full turn history and wait for the model's answer
    async fn generate(&self, history: &[Turn]) -> Result<ResponsePayload, GenerationError>;
}
