// Library exports for the GreenChoice chat client

pub mod api;
pub mod app;
pub mod chat;
pub mod identity;
pub mod reveal;
pub mod session;
pub mod ui;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use api::{HttpTransport, Transport};
pub use app::App;
pub use chat::{Conversation, Message, Role};
pub use session::Session;
pub use utils::config::Config;
pub use utils::error::{ChatError, ChatResult, SessionError};
