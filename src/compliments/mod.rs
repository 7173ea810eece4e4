//! Compliment distribution: queue, cooldown, admin and command routing.

pub mod admin;
pub mod command;
pub mod cooldown;
pub mod error;
pub mod gateway;
pub mod persist;
pub mod router;
pub mod store;
pub mod texts;


pub use admin::AdminAuthority;
pub use error::{ComplimentError, PersistError};
pub use gateway::{TelegramGateway, TransportBackoff};
pub use persist::AtomicFile;
pub use router::{CommandRouter, Inbound, Outcome, Session};
pub use store::ComplimentStore;
pub use texts::BotText;

/// Leading character of every command; stored and configured texts may not start with it.
pub const COMMAND_PREFIX: char = '/';

/// Trim `text` and check it is usable as a compliment or bot text.
pub fn validate_text(text: &str) -> Result<&str, ComplimentError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with(COMMAND_PREFIX) {
        return Err(ComplimentError::InvalidInput);
    }
    Ok(text)
}
