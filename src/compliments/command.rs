//! Classification of inbound text into commands.

use crate::compliments::error::ComplimentError;
use crate::compliments::validate_text;

pub const ADMIN: &str = "/admin";
pub const CLEAR_ADMIN: &str = "/clearAdmin";
pub const REMOVE_LAST_ADDED: &str = "/removeLastAdded";
pub const ADD: &str = "/add";
pub const SHOW: &str = "/show";
pub const CHANGE_BUTTON_TEXT: &str = "/changeButtonText";
pub const CHANGE_USAGE_TEXT: &str = "/changeUsageText";

/// Payload after stripping the command token, or why it was refused.
pub type Payload = Result<String, ComplimentError>;

/// Every operation an inbound text can request.
#[derive(Debug)]
pub enum Command {
    Dispatch,
    Admin,
    ClearAdmin,
    RemoveLastAdded,
    Add(Payload),
    Show,
    ChangeButtonText(Payload),
    ChangeUsageText(Payload),
    Usage,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Admin => "admin",
            Self::ClearAdmin => "clear-admin",
            Self::RemoveLastAdded => "remove-last-added",
            Self::Add(_) => "add",
            Self::Show => "show",
            Self::ChangeButtonText(_) => "change-button-text",
            Self::ChangeUsageText(_) => "change-usage-text",
            Self::Usage => "usage",
        }
    }

    /// Whether only the admin may run this command.
    pub fn admin_only(&self) -> bool {
        !matches!(self, Self::Dispatch | Self::Admin | Self::Usage)
    }
}

/// Classify `text`; the first matching rule wins.
///
/// `button_text` is the current trigger caption, matched as a prefix so
/// that emoji or suffixes added by clients still count.
pub fn classify(text: &str, button_text: &str) -> Command {
    if text.starts_with(button_text) {
        Command::Dispatch
    } else if text == ADMIN {
        Command::Admin
    } else if text == CLEAR_ADMIN {
        Command::ClearAdmin
    } else if text == REMOVE_LAST_ADDED {
        Command::RemoveLastAdded
    } else if let Some(rest) = text.strip_prefix(ADD) {
        Command::Add(payload(rest))
    } else if text == SHOW {
        Command::Show
    } else if let Some(rest) = text.strip_prefix(CHANGE_BUTTON_TEXT) {
        Command::ChangeButtonText(payload(rest))
    } else if let Some(rest) = text.strip_prefix(CHANGE_USAGE_TEXT) {
        Command::ChangeUsageText(payload(rest))
    } else {
        Command::Usage
    }
}

fn payload(rest: &str) -> Payload {
    validate_text(rest).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON: &str = "Комплиментик для красотки";

    #[test]
    fn test_trigger_prefix_dispatches() {
        assert!(matches!(classify(BUTTON, BUTTON), Command::Dispatch));
        assert!(matches!(classify(&format!("{BUTTON} ❤"), BUTTON), Command::Dispatch));
        assert!(matches!(classify("Комплиментик", BUTTON), Command::Usage));
    }

    #[test]
    fn test_exact_tokens() {
        assert!(matches!(classify("/admin", BUTTON), Command::Admin));
        assert!(matches!(classify("/clearAdmin", BUTTON), Command::ClearAdmin));
        assert!(matches!(classify("/removeLastAdded", BUTTON), Command::RemoveLastAdded));
        assert!(matches!(classify("/show", BUTTON), Command::Show));
        assert!(matches!(classify("/show all", BUTTON), Command::Usage));
        assert!(matches!(classify("/admin please", BUTTON), Command::Usage));
    }

    #[test]
    fn test_admin_takes_priority_over_add_prefix() {
        // "/admin" starts with "/ad" but not "/add"; "/addX" must still be add.
        assert!(matches!(classify("/admin", BUTTON), Command::Admin));
        assert!(matches!(classify("/addX", BUTTON), Command::Add(Ok(ref p)) if p == "X"));
    }

    #[test]
    fn test_payload_is_trimmed() {
        match classify("/add   Ты лучше всех  ", BUTTON) {
            Command::Add(Ok(text)) => assert_eq!(text, "Ты лучше всех"),
            other => panic!("unexpected {other:?}"),
        }
        match classify("/changeUsageText  Жми кнопку ", BUTTON) {
            Command::ChangeUsageText(Ok(text)) => assert_eq!(text, "Жми кнопку"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(classify("/add", BUTTON), Command::Add(Err(ComplimentError::InvalidInput))));
        assert!(matches!(classify("/add    ", BUTTON), Command::Add(Err(ComplimentError::InvalidInput))));
        assert!(matches!(
            classify("/add /show", BUTTON),
            Command::Add(Err(ComplimentError::InvalidInput))
        ));
        assert!(matches!(
            classify("/changeButtonText", BUTTON),
            Command::ChangeButtonText(Err(ComplimentError::InvalidInput))
        ));
    }

    #[test]
    fn test_everything_else_is_usage() {
        assert!(matches!(classify("привет", BUTTON), Command::Usage));
        assert!(matches!(classify("/start", BUTTON), Command::Usage));
        assert!(matches!(classify("", BUTTON), Command::Usage));
    }

    #[test]
    fn test_admin_only_set() {
        assert!(!classify(BUTTON, BUTTON).admin_only());
        assert!(!classify("/admin", BUTTON).admin_only());
        assert!(!classify("hi", BUTTON).admin_only());
        assert!(classify("/clearAdmin", BUTTON).admin_only());
        assert!(classify("/removeLastAdded", BUTTON).admin_only());
        assert!(classify("/add x", BUTTON).admin_only());
        assert!(classify("/show", BUTTON).admin_only());
        assert!(classify("/changeButtonText x", BUTTON).admin_only());
        assert!(classify("/changeUsageText x", BUTTON).admin_only());
    }
}
