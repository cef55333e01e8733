//! The persisted progress record and its level state machine.
//!
//! A [`UserProgress`] is one player's whole save: per-chapter completion,
//! scores, and time, plus account-wide badges, streaks, and derived
//! statistics. It serializes to the same camelCase JSON blob the web
//! client keeps under `progress.<username>`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CourseLayout;

// ---------------------------------------------------------------------------
// LevelState
// ---------------------------------------------------------------------------

/// Where a single level stands for one player.
///
/// Transitions only move forward:
///
/// ```text
/// Locked → Unlocked → Completed
/// ```
///
/// A completed level is always unlocked; replaying it improves the best
/// score but never changes its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelState {
    Locked,
    Unlocked,
    Completed,
}

impl LevelState {
    /// Returns `true` if the player may start this level.
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Unlocked | Self::Completed)
    }

    /// The state this level moves to next, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Locked => Some(Self::Unlocked),
            Self::Unlocked => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for LevelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "Locked"),
            Self::Unlocked => write!(f, "Unlocked"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// ChapterProgress
// ---------------------------------------------------------------------------

/// One chapter of a player's save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterProgress {
    pub total_levels: u32,
    pub unlocked_levels: BTreeSet<u32>,
    pub completed_levels: BTreeSet<u32>,
    /// Best score per level, `0..=100`.
    pub scores: BTreeMap<u32, u32>,
    /// Seconds spent in this chapter across every attempt.
    pub time_spent: u64,
    pub attempts: BTreeMap<u32, u32>,
    pub badges: BTreeSet<String>,
    /// Epoch ms when the last level was first completed.
    pub completion_date: Option<i64>,
}

impl ChapterProgress {
    pub fn new(total_levels: u32, first_unlocked: bool) -> Self {
        let mut chapter = Self {
            total_levels,
            ..Self::default()
        };
        if first_unlocked {
            chapter.unlocked_levels.insert(1);
        }
        chapter
    }

    /// `true` once every level has been completed at least once.
    pub fn is_complete(&self) -> bool {
        self.total_levels > 0 && self.completed_levels.len() as u32 >= self.total_levels
    }

    pub fn contains_level(&self, level: u32) -> bool {
        (1..=self.total_levels).contains(&level)
    }

    /// State of `level`, or `None` if the chapter has no such level.
    pub fn level_state(&self, level: u32) -> Option<LevelState> {
        if !self.contains_level(level) {
            return None;
        }
        Some(if self.completed_levels.contains(&level) {
            LevelState::Completed
        } else if self.unlocked_levels.contains(&level) {
            LevelState::Unlocked
        } else {
            LevelState::Locked
        })
    }

    /// Mean of the best scores recorded in this chapter, if any.
    pub fn mean_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let total: u64 = self.scores.values().map(|&s| u64::from(s)).sum();
        Some(total as f64 / self.scores.len() as f64)
    }
}

// ---------------------------------------------------------------------------
// Overall
// ---------------------------------------------------------------------------

/// Streak and session counters that feed the milestone badges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievements {
    pub perfect_scores: u32,
    /// First-time completions since the session started.
    pub levels_in_session: u32,
    pub session_start_time: Option<i64>,
    pub consecutive_days: u32,
    pub last_play_date: Option<NaiveDate>,
    pub streak_record: u32,
}

/// Derived numbers, recomputed after every completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    /// Every `complete_level` call, replays included.
    pub games_played: u32,
    /// Seconds per completed level; `0.0` with none completed.
    pub average_time_per_level: f64,
    /// Chapter with the most time spent.
    pub favorite_chapter: Option<u32>,
    /// Chapter with the best mean score among chapters with a completion.
    pub strongest_subject: Option<u32>,
}

/// Account-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overall {
    pub completed_levels: u32,
    /// Rounded mean of every best score, `0` with none recorded.
    pub average_score: u32,
    pub badges: BTreeSet<String>,
    pub total_time_spent: u64,
    pub total_attempts: u32,
    pub first_level_completed: Option<i64>,
    pub achievements: Achievements,
    pub statistics: Statistics,
}

// ---------------------------------------------------------------------------
// UserProgress
// ---------------------------------------------------------------------------

/// A player's complete save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    /// Display name as the player typed it.
    pub username: String,
    /// Bumped on every save; see [`ProgressStore::try_save`](crate::ProgressStore::try_save).
    pub version: u64,
    pub created_at: Option<i64>,
    pub last_saved: Option<i64>,
    pub last_accessed: Option<i64>,
    pub chapters: BTreeMap<u32, ChapterProgress>,
    pub overall: Overall,
}

impl UserProgress {
    /// A fresh save: every chapter empty, level 1 of the first chapter open.
    pub fn new(username: impl Into<String>, layout: &CourseLayout) -> Self {
        let first = layout.first_chapter();
        let chapters = layout
            .chapters
            .iter()
            .map(|spec| {
                (
                    spec.id,
                    ChapterProgress::new(spec.levels, Some(spec.id) == first),
                )
            })
            .collect();
        Self {
            username: username.into(),
            chapters,
            ..Self::default()
        }
    }

    /// The layout this save was built against, read back from its chapters.
    pub fn layout(&self) -> CourseLayout {
        CourseLayout {
            chapters: self
                .chapters
                .iter()
                .map(|(&id, chapter)| crate::ChapterSpec {
                    id,
                    title: String::new(),
                    levels: chapter.total_levels,
                })
                .collect(),
        }
    }

    pub fn chapter(&self, id: u32) -> Option<&ChapterProgress> {
        self.chapters.get(&id)
    }

    pub fn total_levels(&self) -> u32 {
        self.chapters.values().map(|c| c.total_levels).sum()
    }

    /// `true` when the course has chapters and all of them are complete.
    pub fn all_chapters_complete(&self) -> bool {
        !self.chapters.is_empty() && self.chapters.values().all(ChapterProgress::is_complete)
    }
}
