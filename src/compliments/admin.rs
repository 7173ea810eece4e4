//! Single-admin authority, first claim wins.

use tracing::{info, warn};

use crate::compliments::error::PersistError;
use crate::compliments::persist::StateFile;

/// Holds at most one admin chat id, persisted as decimal text.
pub struct AdminAuthority {
    admin: Option<i64>,
    file: Box<dyn StateFile>,
}

impl AdminAuthority {
    /// Load the admin record. A missing or unparsable record means no admin.
    pub fn load(file: Box<dyn StateFile>) -> Result<Self, PersistError> {
        let admin = match file.read()? {
            Some(contents) => match contents.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Ignoring unreadable admin record {contents:?}: {e}");
                    None
                }
            },
            None => None,
        };
        match admin {
            Some(id) => info!("Admin is {id}"),
            None => info!("No admin set"),
        }
        Ok(Self { admin, file })
    }

    pub fn admin(&self) -> Option<i64> {
        self.admin
    }

    pub fn is_admin(&self, id: i64) -> bool {
        self.admin == Some(id)
    }

    /// Make `id` the admin unless one is already set.
    ///
    /// Returns whether `id` became admin by this call.
    pub fn claim(&mut self, id: i64) -> Result<bool, PersistError> {
        if self.admin.is_some() {
            return Ok(false);
        }
        self.file.write(&id.to_string())?;
        self.admin = Some(id);
        info!("Admin claimed by {id}");
        Ok(true)
    }

    /// Forget the admin and delete the record. The caller checks authorization.
    pub fn clear(&mut self) -> Result<(), PersistError> {
        self.file.remove()?;
        if let Some(id) = self.admin.take() {
            info!("Admin {id} cleared");
        }
        Ok(())
    }
}
