//! One player's progress, as the game screens see it.
//!
//! [`ProgressTracker`] owns the in-memory snapshot of a player's save,
//! runs completions through the [`ProgressEngine`], persists the result,
//! and queues an overlay for every badge earned. Screens share one
//! tracker through a [`SharedTracker`].

use std::sync::Arc;

use rizal_progress::{
    ChapterSummary, CompletionOutcome, OverallSummary, ProgressEngine, ProgressError,
    ProgressStore, Statistics, UserProgress,
};
use rizal_store::{KeyValueStore, StoreError, deep_merge};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::NotificationQueue;

/// A tracker shared between every component showing the same player.
pub type SharedTracker<S> = Arc<Mutex<ProgressTracker<S>>>;

/// Result of [`ProgressTracker::complete_level`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    /// `true` if the completion was applied and saved.
    pub success: bool,
    /// Badges earned by this completion.
    pub new_badges: Vec<String>,
}

/// Loads, mutates, and saves one player's progress.
pub struct ProgressTracker<S: KeyValueStore> {
    store: ProgressStore<S>,
    username: String,
    progress: UserProgress,
    notifications: NotificationQueue,
    error: Option<String>,
}

impl<S: KeyValueStore> std::fmt::Debug for ProgressTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("username", &self.username)
            .field("progress", &self.progress)
            .field("notifications", &self.notifications)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Loads `username`'s save (or starts a fresh one).
    pub fn new(store: ProgressStore<S>, username: impl Into<String>) -> Self {
        let username = username.into();
        let progress = store.load(&username);
        Self {
            store,
            username,
            progress,
            notifications: NotificationQueue::new(),
            error: None,
        }
    }

    /// Wraps the tracker for sharing between screens.
    pub fn shared(self) -> SharedTracker<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn statistics(&self) -> &Statistics {
        &self.progress.overall.statistics
    }

    /// The last failure, cleared by the next successful operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    // =====================================================================
    // Mutations
    // =====================================================================

    /// Records a finished level and saves.
    ///
    /// If another tab saved first, the save is reloaded and the completion
    /// applied once more on top of it. On any failure the snapshot is left
    /// as it was and [`error`](Self::error) says why.
    pub fn complete_level(
        &mut self,
        chapter: u32,
        level: u32,
        score: u32,
        time_spent: u64,
    ) -> CompletionReport {
        let mut result = ProgressEngine::complete_level(
            &self.progress,
            chapter,
            level,
            score,
            time_spent,
            self.store.clock(),
        );
        if let Some(message) = refusal(&result.outcome, chapter, level) {
            return self.fail(message);
        }

        match self.store.try_save(&self.username, &mut result.progress) {
            Ok(()) => {}
            Err(ProgressError::Conflict { found, .. }) => {
                tracing::info!(username = %self.username, found, "progress changed elsewhere, reapplying");
                let fresh = self.store.load(&self.username);
                result = ProgressEngine::complete_level(
                    &fresh,
                    chapter,
                    level,
                    score,
                    time_spent,
                    self.store.clock(),
                );
                if let Some(message) = refusal(&result.outcome, chapter, level) {
                    self.progress = fresh;
                    return self.fail(message);
                }
                if let Err(err) = self.store.try_save(&self.username, &mut result.progress) {
                    return self.fail(err.to_string());
                }
            }
            Err(err) => return self.fail(err.to_string()),
        }

        self.progress = result.progress;
        self.error = None;
        self.notifications.show_achievements(&result.new_badges);
        CompletionReport {
            success: true,
            new_badges: result.new_badges,
        }
    }

    /// Reloads the snapshot from storage.
    pub fn refresh_progress(&mut self) {
        self.progress = self.store.load(&self.username);
        self.error = None;
    }

    /// Starts a new play session (for the `speed_runner` count) and saves.
    pub fn start_new_session(&mut self) -> bool {
        let mut next = ProgressEngine::reset_session_tracking(&self.progress);
        match self.store.try_save(&self.username, &mut next) {
            Ok(()) => {
                self.progress = next;
                self.error = None;
                true
            }
            Err(err) => {
                tracing::warn!(username = %self.username, error = %err, "failed to start session");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    /// The whole save as pretty-printed JSON.
    pub fn export_progress(&self) -> Result<String, ProgressError> {
        serde_json::to_string_pretty(&self.progress)
            .map_err(|e| ProgressError::Storage(StoreError::Encode(e)))
    }

    /// Replaces the save with an exported document and persists it.
    ///
    /// The document must be a JSON object with a `chapters` object. Missing
    /// fields take their defaults; the username always stays this
    /// tracker's.
    pub fn import_progress(&mut self, json: &str) -> Result<(), ProgressError> {
        let outcome = self.try_import(json);
        match &outcome {
            Ok(()) => {
                tracing::info!(username = %self.username, "progress imported");
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(username = %self.username, error = %err, "import failed");
                self.error = Some(err.to_string());
            }
        }
        outcome
    }

    fn try_import(&mut self, json: &str) -> Result<(), ProgressError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| ProgressError::Import(e.to_string()))?;
        if !document.get("chapters").is_some_and(Value::is_object) {
            return Err(ProgressError::Import("missing chapters object".into()));
        }

        let template = self.store.template(&self.username);
        let mut merged = serde_json::to_value(&template).map_err(StoreError::Encode)?;
        deep_merge(&mut merged, document);
        let mut imported: UserProgress =
            serde_json::from_value(merged).map_err(|e| ProgressError::Import(e.to_string()))?;
        imported.username = self.progress.username.clone();
        imported.version = self.progress.version;

        self.store.try_save(&self.username, &mut imported)?;
        self.progress = imported;
        Ok(())
    }

    fn fail(&mut self, message: String) -> CompletionReport {
        tracing::warn!(username = %self.username, error = %message, "level completion failed");
        self.error = Some(message);
        CompletionReport::default()
    }

    // =====================================================================
    // Queries
    // =====================================================================

    pub fn chapter_progress(&self, chapter: u32) -> Option<ChapterSummary> {
        ProgressEngine::chapter_summary(&self.progress, chapter)
    }

    pub fn is_level_unlocked(&self, chapter: u32, level: u32) -> bool {
        ProgressEngine::is_level_unlocked(&self.progress, chapter, level)
    }

    pub fn is_level_completed(&self, chapter: u32, level: u32) -> bool {
        ProgressEngine::is_level_completed(&self.progress, chapter, level)
    }

    pub fn all_badges(&self) -> Vec<String> {
        ProgressEngine::all_badges(&self.progress)
    }

    pub fn overall_progress(&self) -> OverallSummary {
        ProgressEngine::overall_summary(&self.progress)
    }
}

/// Why the engine refused a completion, or `None` if it applied it.
fn refusal(outcome: &CompletionOutcome, chapter: u32, level: u32) -> Option<String> {
    match outcome {
        CompletionOutcome::Completed { .. } => None,
        CompletionOutcome::ChapterNotFound => Some(format!("Chapter {chapter} level {level} not found")),
        CompletionOutcome::LevelLocked => Some(format!("Chapter {chapter} level {level} is locked")),
    }
}

#[cfg(test)]
mod tests {
    use rizal_progress::CourseLayout;
    use rizal_store::{ManualClock, MemoryStore};

    use super::*;

    fn store_over(backend: Arc<MemoryStore>) -> ProgressStore<MemoryStore> {
        ProgressStore::new(
            backend,
            Arc::new(ManualClock::on(2024, 6, 19)),
            CourseLayout::default(),
        )
    }

    fn tracker() -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(store_over(Arc::new(MemoryStore::new())), "alice")
    }

    #[test]
    fn test_complete_level_saves_and_notifies() {
        let mut tracker = tracker();

        let report = tracker.complete_level(1, 1, 100, 30);

        assert!(report.success);
        assert_eq!(report.new_badges.len(), 2);
        assert_eq!(tracker.notifications().len(), 2);
        assert_eq!(tracker.progress().version, 1);
        assert!(tracker.is_level_unlocked(1, 2));
        assert!(tracker.error().is_none());
    }

    #[test]
    fn test_complete_level_locked_sets_error_and_changes_nothing() {
        let mut tracker = tracker();

        let report = tracker.complete_level(2, 1, 100, 30);

        assert!(!report.success);
        assert!(tracker.error().unwrap().contains("locked"));
        assert_eq!(tracker.progress().version, 0);
        assert!(tracker.notifications().is_empty());
    }

    #[test]
    fn test_complete_level_unknown_chapter_sets_error() {
        let mut tracker = tracker();
        let report = tracker.complete_level(42, 1, 100, 30);
        assert!(!report.success);
        assert!(tracker.error().unwrap().contains("not found"));
    }

    #[test]
    fn test_complete_level_after_other_tab_saved_keeps_both() {
        let backend = Arc::new(MemoryStore::new());
        let mut first = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");
        let mut second = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");

        assert!(first.complete_level(1, 1, 80, 10).success);
        assert!(second.complete_level(1, 1, 95, 10).success);
        assert!(second.complete_level(1, 2, 70, 10).success);

        first.refresh_progress();
        let chapter = first.progress().chapter(1).unwrap();
        assert_eq!(chapter.scores[&1], 95);
        assert_eq!(chapter.attempts[&1], 2);
        assert!(first.is_level_completed(1, 2));
    }

    #[test]
    fn test_refusal_names_each_outcome() {
        assert_eq!(
            refusal(&CompletionOutcome::ChapterNotFound, 9, 1).as_deref(),
            Some("Chapter 9 level 1 not found")
        );
        assert_eq!(
            refusal(&CompletionOutcome::LevelLocked, 2, 3).as_deref(),
            Some("Chapter 2 level 3 is locked")
        );
    }

    #[test]
    fn test_complete_level_level_gone_after_reload_reports_not_found() {
        let backend = Arc::new(MemoryStore::new());
        let mut tracker = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");
        assert!(tracker.complete_level(1, 1, 80, 10).success);

        // Another tab saved a newer record whose chapter 1 is one level long.
        let mut stored: Value =
            serde_json::from_str(&backend.get("progress.alice").unwrap().unwrap()).unwrap();
        stored["version"] = Value::from(7);
        stored["chapters"]["1"]["totalLevels"] = Value::from(1);
        backend.set("progress.alice", &stored.to_string()).unwrap();

        let report = tracker.complete_level(1, 2, 90, 10);

        assert!(!report.success);
        assert!(tracker.error().unwrap().contains("not found"));
    }

    #[test]
    fn test_complete_level_over_save_with_fractional_average_keeps_history() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                "progress.alice",
                r#"{"username":"alice","chapters":{"1":{"unlockedLevels":[1,2,3],
                    "completedLevels":[1,2],"scores":{"1":90,"2":80},"timeSpent":75}},
                    "overall":{"completedLevels":2,"badges":["first_steps"],"totalTimeSpent":75,
                    "statistics":{"averageTimePerLevel":37.5}}}"#,
            )
            .unwrap();
        let mut tracker = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");

        assert!(tracker.complete_level(1, 3, 70, 20).success);

        tracker.refresh_progress();
        let chapter = tracker.progress().chapter(1).unwrap();
        assert_eq!(chapter.completed_levels.len(), 3);
        assert!(tracker.all_badges().contains(&"first_steps".to_string()));
    }

    #[test]
    fn test_complete_level_over_unreadable_save_keeps_a_copy() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("progress.alice", r#"{"chapters":[1,2]}"#).unwrap();
        let mut tracker = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");

        assert!(tracker.complete_level(1, 1, 70, 20).success);

        assert_eq!(
            backend.get("progress-unreadable.alice").unwrap().as_deref(),
            Some(r#"{"chapters":[1,2]}"#)
        );
    }

    #[test]
    fn test_complete_level_save_failure_reports_error() {
        let mut tracker = ProgressTracker::new(
            store_over(Arc::new(MemoryStore::with_quota(0))),
            "alice",
        );

        let report = tracker.complete_level(1, 1, 100, 30);

        assert!(!report.success);
        assert!(tracker.error().is_some());
        assert!(!tracker.is_level_completed(1, 1));
    }

    #[test]
    fn test_export_then_import_into_other_player() {
        let backend = Arc::new(MemoryStore::new());
        let mut alice = ProgressTracker::new(store_over(Arc::clone(&backend)), "alice");
        alice.complete_level(1, 1, 90, 30);
        let exported = alice.export_progress().unwrap();

        let mut bob = ProgressTracker::new(store_over(Arc::clone(&backend)), "bob");
        bob.import_progress(&exported).unwrap();

        assert_eq!(bob.progress().username, "bob");
        assert!(bob.is_level_completed(1, 1));
        bob.refresh_progress();
        assert!(bob.is_level_completed(1, 1));
    }

    #[test]
    fn test_import_progress_rejects_document_without_chapters() {
        let mut tracker = tracker();

        let err = tracker.import_progress(r#"{"overall": {}}"#).unwrap_err();

        assert!(matches!(err, ProgressError::Import(_)));
        assert!(tracker.error().is_some());
    }

    #[test]
    fn test_import_progress_rejects_invalid_json() {
        let mut tracker = tracker();
        assert!(tracker.import_progress("not json").is_err());
    }

    #[test]
    fn test_start_new_session_resets_session_count() {
        let mut tracker = tracker();
        tracker.complete_level(1, 1, 50, 10);

        assert!(tracker.start_new_session());

        let achievements = &tracker.progress().overall.achievements;
        assert_eq!(achievements.levels_in_session, 0);
        assert!(achievements.session_start_time.is_none());
    }
}
