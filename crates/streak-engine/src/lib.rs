//! Activity-streak tracking engine.
//!
//! This crate derives per-user streak state from a stream of dated
//! qualifying activities (for example, submitting a daily report) and
//! keeps that state consistent under concurrent writes and under time
//! passing without writes.
//!
//! # Architecture
//!
//! ```text
//! Host service creates a qualifying activity
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       STREAK ENGINE                         │
//! │                                                             │
//! │  record_activity(user_id, date)                             │
//! │     one transaction: load row (create empty on first use),  │
//! │     apply transition rules, save; per-user serialization    │
//! │                                                             │
//! │  Sweeper (hourly)                                           │
//! │     for every streak row: classify risk against the         │
//! │     warning/reset thresholds; on a state change, append a   │
//! │     notification and remember the notified state            │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! SQLite (streaks, streak_notifications) via the database crate
//! ```
//!
//! The transition rules ([`transition`]) and the risk classifier
//! ([`classifier`]) are pure functions; all I/O lives in
//! [`StreakEngine`] and [`Sweeper`]. The classifier is advisory only —
//! a streak classified as lost is reset in storage the next time an
//! activity is recorded and the gap is observed.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use streak_engine::{Database, StreakConfig, StreakEngine, Sweeper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:streaks.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let engine = Arc::new(StreakEngine::new(db, StreakConfig::from_env()?)?);
//!     tokio::spawn({
//!         let sweeper = Sweeper::new(engine.clone());
//!         async move { sweeper.run().await }
//!     });
//!
//!     // After the host saves a daily report:
//!     let streak = engine.record_activity(42, chrono::Local::now().date_naive()).await?;
//!     println!("current streak: {}", streak.current_streak);
//!     Ok(())
//! }
//! ```

pub mod classifier;
mod config;
mod engine;
mod error;
mod sweep;
pub mod transition;

// Public exports
pub use classifier::{classify_risk, RiskState};
pub use config::StreakConfig;
pub use engine::{
    StreakEngine, StreakStats, DEFAULT_NOTIFICATION_LIMIT, MAX_NOTIFICATION_LIMIT,
};
pub use error::{EngineError, Result};
pub use sweep::{SweepSummary, Sweeper};
pub use transition::{apply_activity, classify, Transition};

// Re-export commonly used types from the storage layer
pub use database::{Database, DatabaseError, NotificationKind, Streak, StreakNotification};
