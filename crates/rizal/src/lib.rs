//! # Rizal Quest
//!
//! Session, progress, and achievement core for an educational game about
//! the life of José Rizal.
//!
//! Rizal Quest keeps everything in a flat key-value store: an admin
//! session and a player session that never interfere with each other,
//! and one progress save per player. This crate wires the layers
//! together:
//!
//! - [`RizalApp`]: one backend, one clock, every layer
//! - [`ProgressTracker`]: the game screens' view of one player
//! - [`NotificationQueue`]: badge overlays waiting to be shown
//! - [`AdminGate`]: admin-only progress management
//! - [`telemetry`]: `tracing` subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rizal::prelude::*;
//!
//! let app = RizalAppBuilder::new().build(Arc::new(MemoryStore::new()));
//! let tracker = app.tracker_for("Jose");
//! let mut tracker = tracker.blocking_lock();
//! let report = tracker.complete_level(1, 1, 100, 42);
//! assert!(report.success);
//! assert!(report.new_badges.contains(&"perfect_score".to_string()));
//! ```

mod admin;
mod app;
mod config;
mod error;
mod notifications;
pub mod telemetry;
mod tracker;

pub use admin::{AdminGate, PlayerSummary};
pub use app::{RizalApp, RizalAppBuilder};
pub use config::AppConfig;
pub use error::RizalError;
pub use notifications::{Notification, NotificationQueue};
pub use tracker::{CompletionReport, ProgressTracker, SharedTracker};

pub use rizal_progress as progress;
pub use rizal_session as session;
pub use rizal_store as store;

pub mod prelude {
    pub use crate::telemetry::{TracingConfig, init_tracing, init_tracing_from_env};
    pub use crate::{
        AdminGate, AppConfig, CompletionReport, Notification, NotificationQueue, PlayerSummary,
        ProgressTracker, RizalApp, RizalAppBuilder, RizalError, SharedTracker,
    };
    pub use rizal_progress::{CourseLayout, ProgressEngine, UserProgress};
    pub use rizal_session::{
        Access, LoginResponse, Principal, PrincipalId, SessionKind, SessionValidator,
    };
    pub use rizal_store::{Clock, KeyValueStore, ManualClock, MemoryStore, SystemClock};
}
