//! Save-on-drop database handle

use crate::{ProjectDatabase, SaveMode};
use std::ops::{Deref, DerefMut};

/// Owns a [`ProjectDatabase`] for the length of one command and flushes it
/// with an unchecked save when dropped
///
/// The flush runs on every exit path, including early `?` returns, so
/// partial progress always reaches `db.json`. Errors during the flush are
/// logged since `Drop` cannot report them.
pub struct DatabaseSession {
    db: ProjectDatabase,
}

impl DatabaseSession {
    pub fn new(db: ProjectDatabase) -> Self {
        Self { db }
    }
}

impl Deref for DatabaseSession {
    type Target = ProjectDatabase;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl DerefMut for DatabaseSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

impl Drop for DatabaseSession {
    fn drop(&mut self) {
        if let Err(e) = self.db.save(SaveMode::Unchecked) {
            log::error!(
                "Failed to write {}: {}",
                self.db.db_file_path().display(),
                e
            );
        }
    }
}
