//! Achievement notifications waiting to be shown.
//!
//! The UI drains this queue to render "badge earned" overlays. Entries
//! keep insertion order and each carries a random id so a single overlay
//! can be dismissed without touching the others.

use rand::Rng;
use rizal_progress::find_badge;
use serde::Serialize;

/// One pending overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique within the queue.
    pub id: String,
    pub badge_id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl Notification {
    fn for_badge(id: String, badge_id: &str) -> Self {
        match find_badge(badge_id) {
            Some(badge) => Self {
                id,
                badge_id: badge_id.to_string(),
                name: badge.name.to_string(),
                description: badge.description.to_string(),
                icon: badge.icon.to_string(),
            },
            // Badges from a custom course layout have no catalog entry.
            None => Self {
                id,
                badge_id: badge_id.to_string(),
                name: badge_id.replace('_', " "),
                description: String::new(),
                icon: "🏅".to_string(),
            },
        }
    }
}

/// Pending achievement notifications in the order they were earned.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an overlay for `badge_id` and returns the notification id.
    pub fn show_achievement(&mut self, badge_id: &str) -> String {
        let id = self.fresh_id();
        tracing::debug!(badge = badge_id, %id, "achievement queued");
        self.entries.push(Notification::for_badge(id.clone(), badge_id));
        id
    }

    /// Queues one overlay per badge, in order.
    pub fn show_achievements<I, T>(&mut self, badge_ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        badge_ids
            .into_iter()
            .map(|badge| self.show_achievement(badge.as_ref()))
            .collect()
    }

    /// Dismisses one overlay. Returns `false` if no such id is queued.
    pub fn clear_notification(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    pub fn clear_all_notifications(&mut self) {
        self.entries.clear();
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 64 random bits as hex, regenerated on the rare clash.
    fn fresh_id(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; 8] = rng.random();
            let id: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            if !self.entries.iter().any(|n| n.id == id) {
                return id;
            }
        }
    }
}
