// Gateway module for chat - follows the Train Station Pattern
// All external access must go through this gateway

mod controller;
mod view;

pub use controller::{ControllerState, ConversationController, PendingRequest};
pub use view::ChatView;
