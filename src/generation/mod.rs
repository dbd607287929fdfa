// Gateway module for generation - follows the Train Station Pattern
// All external access must go through this gateway

mod http;
mod traits;
mod types;

pub use http::HttpGenerationClient;
#[cfg(test)]
pub use traits::MockGenerationClient;
pub use traits::GenerationClient;
pub use types::{GenerateRequest, GenerateResponse, GenerationError, ResponsePayload};
