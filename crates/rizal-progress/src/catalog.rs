//! Course layout and badge catalog.
//!
//! Both are configuration: the engine only needs to know how many levels
//! each chapter has and which badge ids to hand out. Display text lives
//! here so the UI layer can look it up by id.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CourseLayout
// ---------------------------------------------------------------------------

/// One chapter of the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSpec {
    /// 1-based chapter number. Chapter `n + 1` unlocks when `n` is complete.
    pub id: u32,
    pub title: String,
    /// Number of levels, numbered `1..=levels`.
    pub levels: u32,
}

/// The shape of the course: which chapters exist and how long each is.
///
/// Deployments override this through the app config; a missing
/// `chapters` list falls back to the default six-chapter course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseLayout {
    pub chapters: Vec<ChapterSpec>,
}

impl Default for CourseLayout {
    fn default() -> Self {
        const TITLES: [&str; 6] = [
            "Childhood in Calamba",
            "Education in Manila",
            "Studies Abroad",
            "Noli Me Tangere",
            "El Filibusterismo",
            "Exile and Martyrdom",
        ];
        Self {
            chapters: TITLES
                .iter()
                .zip(1..)
                .map(|(title, id)| ChapterSpec {
                    id,
                    title: (*title).to_string(),
                    levels: 5,
                })
                .collect(),
        }
    }
}

impl CourseLayout {
    /// Sorts chapters, drops duplicates and empty chapters.
    ///
    /// Called by [`ProgressStore::new`](crate::ProgressStore::new) so a
    /// hand-written config can't produce a chapter nobody can finish.
    pub fn validated(mut self) -> Self {
        self.chapters.sort_by_key(|c| c.id);
        self.chapters.dedup_by_key(|c| c.id);
        self.chapters.retain(|c| {
            let keep = c.id > 0 && c.levels > 0;
            if !keep {
                tracing::warn!(chapter = c.id, levels = c.levels, "dropping unusable chapter");
            }
            keep
        });
        self
    }

    pub fn chapter(&self, id: u32) -> Option<&ChapterSpec> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// The chapter whose first level is open from the start.
    pub fn first_chapter(&self) -> Option<u32> {
        self.chapters.first().map(|c| c.id)
    }

    pub fn total_levels(&self) -> u32 {
        self.chapters.iter().map(|c| c.levels).sum()
    }
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// Badge ids handed out by the engine.
pub mod ids {
    pub const FIRST_LEVEL_COMPLETE: &str = "first_level_complete";
    pub const PERFECT_SCORE: &str = "perfect_score";
    pub const KNOWLEDGE_SEEKER: &str = "knowledge_seeker";
    pub const SPEED_RUNNER: &str = "speed_runner";
    pub const RIZAL_EXPERT: &str = "rizal_expert";
    pub const DEDICATION: &str = "dedication";
    pub const MARATHON_LEARNER: &str = "marathon_learner";

    /// `chapter_{n}_complete`
    pub fn chapter_complete(chapter: u32) -> String {
        format!("chapter_{chapter}_complete")
    }
}

/// Display metadata for one badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

const fn badge(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
) -> Badge {
    Badge {
        id,
        name,
        description,
        icon,
    }
}

/// Every badge the game knows how to display.
pub const BADGES: &[Badge] = &[
    badge(ids::FIRST_LEVEL_COMPLETE, "First Steps", "Complete your first level", "🎯"),
    badge(ids::PERFECT_SCORE, "Perfectionist", "Score 100% on a level", "⭐"),
    badge(ids::KNOWLEDGE_SEEKER, "Knowledge Seeker", "Complete 10 levels", "📚"),
    badge(ids::SPEED_RUNNER, "Speed Runner", "Complete 5 levels in one session", "⚡"),
    badge(ids::RIZAL_EXPERT, "Rizal Expert", "Complete every chapter", "🏆"),
    badge(ids::DEDICATION, "Dedication", "Play 7 days in a row", "🔥"),
    badge(ids::MARATHON_LEARNER, "Marathon Learner", "Play 30 days in a row", "🏃"),
    badge("chapter_1_complete", "Calamba Childhood", "Complete Chapter 1", "🏡"),
    badge("chapter_2_complete", "Ateneo Scholar", "Complete Chapter 2", "🎓"),
    badge("chapter_3_complete", "Voyager", "Complete Chapter 3", "🌍"),
    badge("chapter_4_complete", "Noli Reader", "Complete Chapter 4", "📖"),
    badge("chapter_5_complete", "Fili Reader", "Complete Chapter 5", "📕"),
    badge("chapter_6_complete", "Martyr's Legacy", "Complete Chapter 6", "🕊️"),
];

/// Looks up display metadata for a badge id.
pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_six_chapters_of_five() {
        let layout = CourseLayout::default();
        assert_eq!(layout.chapters.len(), 6);
        assert!(layout.chapters.iter().all(|c| c.levels == 5));
        assert_eq!(layout.total_levels(), 30);
        assert_eq!(layout.first_chapter(), Some(1));
    }

    #[test]
    fn test_validated_sorts_and_drops_empty_chapters() {
        let layout = CourseLayout {
            chapters: vec![
                ChapterSpec { id: 2, title: "b".into(), levels: 3 },
                ChapterSpec { id: 1, title: "a".into(), levels: 4 },
                ChapterSpec { id: 3, title: "c".into(), levels: 0 },
                ChapterSpec { id: 1, title: "dup".into(), levels: 9 },
            ],
        }
        .validated();

        let ids: Vec<u32> = layout.chapters.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(layout.chapter(1).unwrap().levels, 4);
    }

    #[test]
    fn test_chapter_complete_id_format() {
        assert_eq!(ids::chapter_complete(3), "chapter_3_complete");
    }

    #[test]
    fn test_every_default_chapter_has_a_badge() {
        for chapter in CourseLayout::default().chapters {
            let id = ids::chapter_complete(chapter.id);
            assert!(find_badge(&id).is_some(), "missing badge {id}");
        }
    }

    #[test]
    fn test_find_badge_unknown_is_none() {
        assert!(find_badge("time_traveler").is_none());
    }

    #[test]
    fn test_badge_ids_are_unique() {
        let mut ids: Vec<&str> = BADGES.iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), BADGES.len());
    }
}
