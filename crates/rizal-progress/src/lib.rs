//! Player progress for Rizal Quest.
//!
//! The course is a fixed sequence of chapters, each a short sequence of
//! levels. Finishing a level unlocks the next one; finishing a chapter
//! unlocks the next chapter. Scores, time, and streaks feed a set of
//! badges that are only ever added, never taken away.
//!
//! # Key types
//!
//! - [`UserProgress`]: one player's save, serialized as a JSON blob
//! - [`ProgressEngine`]: the pure rules for completing a level
//! - [`ProgressStore`]: loads and saves saves, guarding against lost updates
//! - [`CourseLayout`]: how many chapters and levels exist
//! - [`LevelState`]: per-level state machine (Locked → Unlocked → Completed)
//! - [`BADGES`]: display metadata for every badge id

pub mod catalog;
mod engine;
mod error;
mod model;
mod store;

pub use catalog::{BADGES, Badge, ChapterSpec, CourseLayout, find_badge};
pub use engine::{
    ChapterSummary, Completion, CompletionOutcome, DEDICATION_DAYS, KNOWLEDGE_SEEKER_LEVELS,
    MARATHON_DAYS, OverallSummary, ProgressEngine, SPEED_RUNNER_LEVELS,
};
pub use error::ProgressError;
pub use model::{Achievements, ChapterProgress, LevelState, Overall, Statistics, UserProgress};
pub use store::{GUEST_KEY, KEY_PREFIX, ProgressStore, normalize_username, storage_key};
