/// Session management module - Gateway

mod store;
mod types;

pub use store::{list_sessions_descending, SessionStore};
pub use types::{
    derive_title, ImageRef, Part, Role, Session, SessionCollection, SessionId, SessionSummary,
    Turn,
};
