//! Durable FIFO queue of compliments.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::compliments::error::{ComplimentError, PersistError};
use crate::compliments::persist::StateFile;
use crate::compliments::validate_text;

/// Compliment queue written through to a backing file on every mutation.
///
/// A mutation encodes the new queue, writes it, and only then swaps it into
/// memory. If the write fails the in-memory queue is untouched, so memory
/// and disk never disagree.
pub struct ComplimentStore {
    queue: VecDeque<String>,
    file: Box<dyn StateFile>,
}

impl ComplimentStore {
    /// Load the queue from `file`. A missing file starts an empty queue.
    pub fn load(file: Box<dyn StateFile>) -> Result<Self, PersistError> {
        let queue = match file.read()? {
            Some(contents) if !contents.trim().is_empty() => decode(&contents)?,
            Some(_) => {
                info!("Compliment file is blank, starting with an empty queue");
                VecDeque::new()
            }
            None => {
                info!("No compliment file, starting with an empty queue");
                VecDeque::new()
            }
        };
        info!("Loaded {} compliments", queue.len());
        Ok(Self { queue, file })
    }

    /// Append to the tail.
    pub fn enqueue(&mut self, text: &str) -> Result<usize, ComplimentError> {
        let text = validate_text(text)?;
        let mut next = self.queue.clone();
        next.push_back(text.to_string());
        self.commit(next)?;
        debug!("Enqueued compliment, {} in stock", self.queue.len());
        Ok(self.queue.len())
    }

    /// Remove and return the head.
    pub fn dequeue(&mut self) -> Result<String, ComplimentError> {
        let mut next = self.queue.clone();
        let head = next.pop_front().ok_or(ComplimentError::Empty)?;
        self.commit(next)?;
        Ok(head)
    }

    pub fn count(&self) -> usize {
        self.queue.len()
    }

    /// Snapshot of all compliments, oldest first.
    pub fn list(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }

    /// Drop the most recently added compliment.
    ///
    /// Returns `Ok(false)` without touching memory or disk when the queue is empty.
    pub fn remove_last_added(&mut self) -> Result<bool, PersistError> {
        if self.queue.is_empty() {
            return Ok(false);
        }
        let keep = self.queue.len() - 1;
        let next: VecDeque<String> = self.queue.iter().take(keep).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: VecDeque<String>) -> Result<(), PersistError> {
        self.file.write(&encode(&next)?)?;
        self.queue = next;
        Ok(())
    }
}

fn encode(queue: &VecDeque<String>) -> Result<String, PersistError> {
    serde_json::to_string_pretty(queue).map_err(PersistError::Encode)
}

fn decode(contents: &str) -> Result<VecDeque<String>, PersistError> {
    serde_json::from_str::<Vec<String>>(contents)
        .map(VecDeque::from)
        .map_err(|e| PersistError::Decode(format!("compliment queue: {e}")))
}
