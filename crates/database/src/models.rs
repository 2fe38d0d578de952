//! Database models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The kind of a streak notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The streak is about to lapse.
    Warning,
    /// The streak has lapsed.
    Lost,
}

/// Per-user streak state, keyed by user id.
///
/// Counters are mutated only through the activity recorder; the sweep
/// touches `notified_state` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Streak {
    /// Owning user (external identity, not managed here).
    pub user_id: i64,
    /// Consecutive qualifying days ending at `last_activity_date`.
    pub current_streak: i64,
    /// Highest `current_streak` ever reached; never decreases.
    pub longest_streak: i64,
    /// Most recent qualifying activity date, if any.
    pub last_activity_date: Option<NaiveDate>,
    /// Date the current streak began, if any.
    pub streak_start_date: Option<NaiveDate>,
    /// Last risk state a notification was emitted for. `None` means the
    /// user has no outstanding warning/lost notification.
    pub notified_state: Option<NotificationKind>,
    /// Last write timestamp.
    pub updated_at: String,
}

/// A warning/lost notification appended by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StreakNotification {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Warning or lost.
    pub kind: NotificationKind,
    /// Rendered user-facing text.
    pub message: String,
    /// Whether the user has acknowledged the notification.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: String,
}
