//! Routes classified commands to the store, the admin authority and the
//! cooldown gate, and composes the outbound replies.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::compliments::admin::AdminAuthority;
use crate::compliments::command::{classify, Command};
use crate::compliments::cooldown::{minutes_ceil, CooldownGate, Gate};
use crate::compliments::error::ComplimentError;
use crate::compliments::store::ComplimentStore;
use crate::compliments::texts::{self, BotText};

/// Text received from a chat.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub chat_id: i64,
    pub text: String,
}

/// Reply keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// One-button keyboard with the trigger caption.
    Trigger(String),
    Hide,
}

/// Text to deliver to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Keyboard,
}

/// How a command ended.
#[derive(Debug)]
pub enum Outcome {
    Done,
    /// Dispatch refused by the cooldown, with the time left.
    Blocked(TimeDelta),
    Rejected(ComplimentError),
}

/// Everything produced by one inbound event.
#[derive(Debug)]
pub struct Handled {
    pub command: &'static str,
    pub outcome: Outcome,
    pub replies: Vec<Outbound>,
}

/// In-memory state that is not persisted and resets on restart.
#[derive(Debug, Clone)]
pub struct Session {
    pub text: BotText,
    pub cooldown: CooldownGate,
    pub interval: TimeDelta,
}

impl Session {
    pub fn new(text: BotText, interval: TimeDelta) -> Self {
        Self { text, cooldown: CooldownGate::new(), interval }
    }
}

/// Owns all shared state; one instance per process, behind one lock.
pub struct CommandRouter {
    store: ComplimentStore,
    admin: AdminAuthority,
    session: Session,
}

impl CommandRouter {
    pub fn new(store: ComplimentStore, admin: AdminAuthority, session: Session) -> Self {
        Self { store, admin, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ComplimentStore {
        &self.store
    }

    pub fn admin(&self) -> &AdminAuthority {
        &self.admin
    }

    /// Handle one inbound text. Never fails: every rejection becomes a reply.
    pub fn handle(&mut self, inbound: &Inbound, now: DateTime<Utc>) -> Handled {
        let chat_id = inbound.chat_id;
        let command = classify(&inbound.text, &self.session.text.button);
        let name = command.name();

        let empty_reply = match command {
            Command::RemoveLastAdded => texts::NOTHING_TO_REMOVE,
            _ => texts::NO_COMPLIMENTS,
        };
        let unauthorized_reply = match command {
            Command::Admin => texts::ADMIN_TAKEN,
            _ => texts::UNAUTHORIZED,
        };

        let mut replies = Vec::new();
        let outcome = match self.execute(command, chat_id, now, &mut replies) {
            Ok(outcome) => outcome,
            Err(e) => {
                let text = match &e {
                    ComplimentError::InvalidInput => texts::INVALID_TEXT,
                    ComplimentError::Empty => empty_reply,
                    ComplimentError::Unauthorized => unauthorized_reply,
                    ComplimentError::Persistence(_) => texts::STORAGE_FAULT,
                };
                replies.clear();
                replies.push((chat_id, text.to_string()));
                Outcome::Rejected(e)
            }
        };

        debug!("{name} from {chat_id}: {outcome:?}");
        let replies = replies
            .into_iter()
            .map(|(chat_id, text)| Outbound { chat_id, text, keyboard: self.keyboard_for(chat_id) })
            .collect();

        Handled { command: name, outcome, replies }
    }

    fn execute(
        &mut self,
        command: Command,
        chat_id: i64,
        now: DateTime<Utc>,
        replies: &mut Vec<(i64, String)>,
    ) -> Result<Outcome, ComplimentError> {
        if command.admin_only() && !self.admin.is_admin(chat_id) {
            return Err(ComplimentError::Unauthorized);
        }

        match command {
            Command::Dispatch => return self.dispatch(chat_id, now, replies),
            Command::Admin => {
                self.admin.claim(chat_id)?;
                if !self.admin.is_admin(chat_id) {
                    return Err(ComplimentError::Unauthorized);
                }
                replies.push((chat_id, texts::admin_menu(&self.session.text, self.store.count())));
            }
            Command::ClearAdmin => {
                self.admin.clear()?;
                replies.push((chat_id, texts::admin_cleared()));
            }
            Command::RemoveLastAdded => {
                if !self.store.remove_last_added()? {
                    return Err(ComplimentError::Empty);
                }
                replies.push((chat_id, texts::REMOVED_LAST.to_string()));
            }
            Command::Add(payload) => {
                let compliment = payload?;
                let count = self.store.enqueue(&compliment)?;
                replies.push((chat_id, texts::added(&compliment, count)));
            }
            Command::Show => {
                replies.push((chat_id, texts::listing(&self.store.list())));
            }
            Command::ChangeButtonText(payload) => {
                let button = payload?;
                replies.push((chat_id, texts::button_changed(&button)));
                self.session.text.button = button;
            }
            Command::ChangeUsageText(payload) => {
                let usage = payload?;
                replies.push((chat_id, texts::usage_changed(&usage)));
                self.session.text.usage = usage;
            }
            Command::Usage => {
                replies.push((chat_id, self.session.text.usage.clone()));
            }
        }
        Ok(Outcome::Done)
    }

    fn dispatch(
        &mut self,
        chat_id: i64,
        now: DateTime<Utc>,
        replies: &mut Vec<(i64, String)>,
    ) -> Result<Outcome, ComplimentError> {
        if self.store.count() == 0 {
            return Err(ComplimentError::Empty);
        }

        let previous = self.session.cooldown.last();
        if let Gate::Blocked(remaining) = self.session.cooldown.try_acquire(now, self.session.interval) {
            replies.push((chat_id, texts::cooldown_wait(minutes_ceil(remaining))));
            return Ok(Outcome::Blocked(remaining));
        }

        let compliment = match self.store.dequeue() {
            Ok(compliment) => compliment,
            Err(e) => {
                self.session.cooldown.restore(previous);
                return Err(e);
            }
        };

        replies.push((chat_id, compliment));
        if let Some(admin) = self.admin.admin() {
            replies.push((admin, texts::remaining_stock(self.store.count())));
        }
        Ok(Outcome::Done)
    }

    fn keyboard_for(&self, chat_id: i64) -> Keyboard {
        if self.admin.is_admin(chat_id) {
            Keyboard::Hide
        } else {
            Keyboard::Trigger(self.session.text.button.clone())
        }
    }
}
