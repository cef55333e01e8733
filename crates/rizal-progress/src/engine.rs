//! Level completion and badge rules.
//!
//! Every function here is pure: it takes a snapshot of a player's
//! [`UserProgress`] and returns a new one. Nothing touches storage. The
//! caller decides whether to persist the result, which keeps the rules
//! testable with nothing more than a [`ManualClock`](rizal_store::ManualClock).
//!
//! # Completing a level
//!
//! [`ProgressEngine::complete_level`] is the only transition with real
//! branching. For a valid, unlocked level it:
//!
//! 1. marks the level completed (first time only) and counts it toward
//!    the current session;
//! 2. records the attempt, best score, and time spent (every time);
//! 3. counts perfect scores;
//! 4. unlocks the next level, and on finishing a chapter, level 1 of the
//!    next chapter;
//! 5. sweeps the milestone badges and, once per calendar day, the streak;
//! 6. recomputes averages and favourites.
//!
//! Badges are only ever added. A badge already held is never reported in
//! [`Completion::new_badges`] again.

use std::collections::BTreeSet;

use rizal_store::Clock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::ids;
use crate::{ChapterProgress, LevelState, UserProgress};

/// Levels completed before `knowledge_seeker` is awarded.
pub const KNOWLEDGE_SEEKER_LEVELS: u32 = 10;
/// First-time completions in one session before `speed_runner` is awarded.
pub const SPEED_RUNNER_LEVELS: u32 = 5;
/// Streak length for `dedication`.
pub const DEDICATION_DAYS: u32 = 7;
/// Streak length for `marathon_learner`.
pub const MARATHON_DAYS: u32 = 30;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What happened to a `complete_level` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The completion was applied.
    Completed {
        /// `false` for a replay of an already completed level.
        first_completion: bool,
        /// `true` if this call finished the chapter.
        chapter_completed: bool,
    },
    /// No such chapter, or no such level in it. Progress is unchanged.
    ChapterNotFound,
    /// The level exists but hasn't been unlocked. Progress is unchanged.
    LevelLocked,
}

/// The result of [`ProgressEngine::complete_level`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub progress: UserProgress,
    /// Badges earned by this call, in the order they were awarded.
    pub new_badges: Vec<String>,
    pub outcome: CompletionOutcome,
}

impl Completion {
    /// `true` if progress changed.
    pub fn applied(&self) -> bool {
        matches!(self.outcome, CompletionOutcome::Completed { .. })
    }

    fn refused(progress: &UserProgress, outcome: CompletionOutcome) -> Self {
        Self {
            progress: progress.clone(),
            new_badges: Vec::new(),
            outcome,
        }
    }
}

/// Read-only view of one chapter for the chapter select screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub chapter: u32,
    pub completed_levels: u32,
    pub total_levels: u32,
    /// `0..=100`
    pub percent_complete: u32,
    pub average_score: u32,
    pub time_spent: u64,
    pub is_complete: bool,
    pub completion_date: Option<i64>,
}

/// Read-only view of the whole course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub completed_levels: u32,
    pub total_levels: u32,
    pub percent_complete: u32,
    pub completed_chapters: u32,
    pub total_chapters: u32,
    pub average_score: u32,
    pub total_time_spent: u64,
    pub badge_count: u32,
    pub consecutive_days: u32,
    pub streak_record: u32,
}

// ---------------------------------------------------------------------------
// ProgressEngine
// ---------------------------------------------------------------------------

/// The progression rules. Stateless; every method is an associated function.
pub struct ProgressEngine;

impl ProgressEngine {
    /// Applies one level completion to `progress`.
    ///
    /// `score` is clamped to `0..=100`; `time_spent` is in seconds.
    /// Unknown chapters or levels and locked levels are refused with the
    /// input returned unchanged.
    pub fn complete_level(
        progress: &UserProgress,
        chapter_id: u32,
        level_id: u32,
        score: u32,
        time_spent: u64,
        clock: &dyn Clock,
    ) -> Completion {
        let Some(state) = progress
            .chapter(chapter_id)
            .and_then(|c| c.level_state(level_id))
        else {
            warn!(chapter = chapter_id, level = level_id, "completion for unknown level ignored");
            return Completion::refused(progress, CompletionOutcome::ChapterNotFound);
        };
        if !state.is_playable() {
            warn!(chapter = chapter_id, level = level_id, "completion for locked level ignored");
            return Completion::refused(progress, CompletionOutcome::LevelLocked);
        }

        let now = clock.now_ms();
        let score = score.min(100);
        let mut next = progress.clone();
        let mut awards = Awards::default();

        // Chapter-local bookkeeping. The borrow of the chapter ends before
        // the next chapter is unlocked.
        let (first_completion, chapter_completed) = {
            let Some(chapter) = next.chapters.get_mut(&chapter_id) else {
                return Completion::refused(progress, CompletionOutcome::ChapterNotFound);
            };
            let first_completion = chapter.completed_levels.insert(level_id);

            *chapter.attempts.entry(level_id).or_insert(0) += 1;
            let best = chapter.scores.entry(level_id).or_insert(0);
            *best = (*best).max(score);
            chapter.time_spent += time_spent;

            if level_id < chapter.total_levels {
                chapter.unlocked_levels.insert(level_id + 1);
            }

            let chapter_completed = first_completion && chapter.is_complete();
            if chapter_completed {
                chapter.completion_date = Some(now);
                chapter.badges.insert(ids::chapter_complete(chapter_id));
            }
            (first_completion, chapter_completed)
        };

        if chapter_completed {
            awards.grant(&mut next.overall.badges, &ids::chapter_complete(chapter_id));
            if let Some(following) = next.chapters.get_mut(&(chapter_id + 1)) {
                following.unlocked_levels.insert(1);
                info!(chapter = chapter_id + 1, "chapter unlocked");
            }
        }

        let overall = &mut next.overall;
        if first_completion {
            overall.completed_levels += 1;
            overall.achievements.levels_in_session += 1;
            overall.achievements.session_start_time.get_or_insert(now);
            if overall.first_level_completed.is_none() {
                overall.first_level_completed = Some(now);
                awards.grant(&mut overall.badges, ids::FIRST_LEVEL_COMPLETE);
            }
        }

        overall.total_attempts += 1;
        overall.total_time_spent += time_spent;
        overall.statistics.games_played += 1;

        if score == 100 {
            overall.achievements.perfect_scores += 1;
            awards.grant(&mut overall.badges, ids::PERFECT_SCORE);
        }

        recompute(&mut next);
        sweep_milestones(&mut next, &mut awards);
        record_play_day(&mut next, clock, &mut awards);

        info!(
            chapter = chapter_id,
            level = level_id,
            score,
            first_completion,
            new_badges = awards.earned.len(),
            "level completed"
        );
        Completion {
            progress: next,
            new_badges: awards.earned,
            outcome: CompletionOutcome::Completed {
                first_completion,
                chapter_completed,
            },
        }
    }

    /// `true` if the player may start the level.
    pub fn is_level_unlocked(progress: &UserProgress, chapter: u32, level: u32) -> bool {
        Self::level_state(progress, chapter, level).is_some_and(|s| s.is_playable())
    }

    pub fn is_level_completed(progress: &UserProgress, chapter: u32, level: u32) -> bool {
        Self::level_state(progress, chapter, level) == Some(LevelState::Completed)
    }

    pub fn level_state(progress: &UserProgress, chapter: u32, level: u32) -> Option<LevelState> {
        progress.chapter(chapter)?.level_state(level)
    }

    /// Whether the unlock rules allow `level` of `chapter` to be open,
    /// judged from completions alone.
    ///
    /// Level 1 of the first chapter is always unlockable. Any other level 1
    /// needs the previous chapter finished; any later level needs its
    /// predecessor completed.
    pub fn can_unlock(progress: &UserProgress, chapter: u32, level: u32) -> bool {
        let Some(current) = progress.chapter(chapter) else {
            return false;
        };
        if !current.contains_level(level) {
            return false;
        }
        if level > 1 {
            return current.completed_levels.contains(&(level - 1));
        }
        if progress.chapters.keys().next() == Some(&chapter) {
            return true;
        }
        chapter > 1
            && progress
                .chapter(chapter - 1)
                .is_some_and(ChapterProgress::is_complete)
    }

    pub fn chapter_summary(progress: &UserProgress, chapter_id: u32) -> Option<ChapterSummary> {
        let chapter = progress.chapter(chapter_id)?;
        let completed = chapter.completed_levels.len() as u32;
        Some(ChapterSummary {
            chapter: chapter_id,
            completed_levels: completed,
            total_levels: chapter.total_levels,
            percent_complete: percent(completed, chapter.total_levels),
            average_score: chapter.mean_score().map_or(0, |m| m.round() as u32),
            time_spent: chapter.time_spent,
            is_complete: chapter.is_complete(),
            completion_date: chapter.completion_date,
        })
    }

    pub fn overall_summary(progress: &UserProgress) -> OverallSummary {
        let overall = &progress.overall;
        let total_levels = progress.total_levels();
        OverallSummary {
            completed_levels: overall.completed_levels,
            total_levels,
            percent_complete: percent(overall.completed_levels, total_levels),
            completed_chapters: progress
                .chapters
                .values()
                .filter(|c| c.is_complete())
                .count() as u32,
            total_chapters: progress.chapters.len() as u32,
            average_score: overall.average_score,
            total_time_spent: overall.total_time_spent,
            badge_count: Self::all_badges(progress).len() as u32,
            consecutive_days: overall.achievements.consecutive_days,
            streak_record: overall.achievements.streak_record,
        }
    }

    /// Every badge held, account-wide and per chapter, sorted by id.
    pub fn all_badges(progress: &UserProgress) -> Vec<String> {
        let mut all: BTreeSet<&String> = progress.overall.badges.iter().collect();
        for chapter in progress.chapters.values() {
            all.extend(chapter.badges.iter());
        }
        all.into_iter().cloned().collect()
    }

    /// A fresh save for the same player and course shape.
    ///
    /// The username, creation stamp, and save version survive so the reset
    /// record can be written back over the old one.
    pub fn reset(progress: &UserProgress) -> UserProgress {
        let mut fresh = UserProgress::new(progress.username.clone(), &progress.layout());
        fresh.version = progress.version;
        fresh.created_at = progress.created_at;
        info!(username = %progress.username, "progress reset");
        fresh
    }

    /// Starts a new play session: `speed_runner` counts from zero again.
    pub fn reset_session_tracking(progress: &UserProgress) -> UserProgress {
        let mut next = progress.clone();
        next.overall.achievements.levels_in_session = 0;
        next.overall.achievements.session_start_time = None;
        debug!(username = %progress.username, "session tracking reset");
        next
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Badges earned during one call.
#[derive(Default)]
struct Awards {
    earned: Vec<String>,
}

impl Awards {
    fn grant(&mut self, held: &mut BTreeSet<String>, id: &str) {
        if held.insert(id.to_string()) {
            info!(badge = id, "badge earned");
            self.earned.push(id.to_string());
        }
    }
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
}

/// Rebuilds every derived figure from the chapter data.
fn recompute(progress: &mut UserProgress) {
    let chapters = &progress.chapters;
    let overall = &mut progress.overall;

    overall.completed_levels = chapters
        .values()
        .map(|c| c.completed_levels.len() as u32)
        .sum();

    let (score_sum, score_count) = chapters
        .values()
        .flat_map(|c| c.scores.values())
        .fold((0u64, 0u64), |(sum, n), &s| (sum + u64::from(s), n + 1));
    overall.average_score = if score_count == 0 {
        0
    } else {
        (score_sum as f64 / score_count as f64).round() as u32
    };

    let stats = &mut overall.statistics;
    stats.average_time_per_level = if overall.completed_levels == 0 {
        0.0
    } else {
        overall.total_time_spent as f64 / f64::from(overall.completed_levels)
    };

    // Ties go to the lower chapter id: iteration is ascending and only a
    // strictly better value replaces the current pick.
    let mut favorite: Option<(u32, u64)> = None;
    for (&id, chapter) in chapters {
        if chapter.time_spent > 0 && favorite.is_none_or(|(_, t)| chapter.time_spent > t) {
            favorite = Some((id, chapter.time_spent));
        }
    }
    stats.favorite_chapter = favorite.map(|(id, _)| id);

    let mut strongest: Option<(u32, f64)> = None;
    for (&id, chapter) in chapters {
        if chapter.completed_levels.is_empty() {
            continue;
        }
        let Some(mean) = chapter.mean_score() else {
            continue;
        };
        if strongest.is_none_or(|(_, best)| mean > best) {
            strongest = Some((id, mean));
        }
    }
    stats.strongest_subject = strongest.map(|(id, _)| id);
}

fn sweep_milestones(progress: &mut UserProgress, awards: &mut Awards) {
    let all_complete = progress.all_chapters_complete();
    let overall = &mut progress.overall;

    if overall.completed_levels >= KNOWLEDGE_SEEKER_LEVELS {
        awards.grant(&mut overall.badges, ids::KNOWLEDGE_SEEKER);
    }
    if overall.achievements.levels_in_session >= SPEED_RUNNER_LEVELS {
        awards.grant(&mut overall.badges, ids::SPEED_RUNNER);
    }
    if all_complete {
        awards.grant(&mut overall.badges, ids::RIZAL_EXPERT);
    }
}

/// Streak bookkeeping. Runs at most once per calendar day.
fn record_play_day(progress: &mut UserProgress, clock: &dyn Clock, awards: &mut Awards) {
    let today = clock.today();
    let overall = &mut progress.overall;
    let achievements = &mut overall.achievements;

    if achievements.last_play_date == Some(today) {
        return;
    }
    let continues = achievements.last_play_date.is_some()
        && achievements.last_play_date == today.pred_opt();
    achievements.consecutive_days = if continues {
        achievements.consecutive_days + 1
    } else {
        1
    };
    achievements.last_play_date = Some(today);
    achievements.streak_record = achievements.streak_record.max(achievements.consecutive_days);
    debug!(days = achievements.consecutive_days, %today, "play streak updated");

    let days = achievements.consecutive_days;
    if days >= DEDICATION_DAYS {
        awards.grant(&mut overall.badges, ids::DEDICATION);
    }
    if days >= MARATHON_DAYS {
        awards.grant(&mut overall.badges, ids::MARATHON_LEARNER);
    }
}
