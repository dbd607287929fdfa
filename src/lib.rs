pub mod app;
pub mod chat;
pub mod cli;
pub mod constants;
pub mod generation;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod tui;
pub mod utils;

pub use app::{load_config, Config};
pub use chat::{ChatView, ConversationController};
pub use generation::{GenerationClient, HttpGenerationClient, ResponsePayload};
pub use session::{ImageRef, Session, SessionId, SessionStore};
pub use tui::run_ui;
pub use utils::ParleyError;
