//! Error types for the progress layer.

use rizal_store::StoreError;

/// Errors that can occur while loading, saving, or importing progress.
///
/// Gameplay mistakes (an unknown chapter, a locked level) are not errors:
/// the engine reports them as a
/// [`CompletionOutcome`](crate::CompletionOutcome) and leaves progress
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Reading or writing the backing store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Somebody else saved this player's progress since it was loaded.
    ///
    /// The caller should reload, reapply, and save again.
    #[error("progress for {username} changed underneath us: expected version {expected}, found {found}")]
    Conflict {
        username: String,
        expected: u64,
        found: u64,
    },

    /// The stored record doesn't decode, so it can't be safely replaced.
    ///
    /// [`ProgressStore::load`](crate::ProgressStore::load) sets such a
    /// record aside, after which saves go through again.
    #[error("stored progress for {username} is unreadable: {reason}")]
    Unreadable { username: String, reason: String },

    /// An exported progress document couldn't be imported.
    #[error("import rejected: {0}")]
    Import(String),
}
