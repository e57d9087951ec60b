pub mod ask;
pub mod config;
pub mod conversation;
pub mod error;
pub mod exchange;
pub mod panels;
pub mod reveal;
pub mod session;

// Re-export main types for convenience
pub use ask::{clean_answer, AskBackend, AskClient};
pub use config::Config;
pub use conversation::{Conversation, Message, Role};
pub use error::DispatchError;
pub use exchange::{spawn_exchange, ExchangeHandle};
pub use panels::Panels;
pub use session::{ChatEvent, ChatEventKind, ChatSession, Submission};
