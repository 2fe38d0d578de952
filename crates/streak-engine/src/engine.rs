//! The streak engine: transactional activity recording and the read
//! surface consumed by the host service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use database::{notification, streak, Database, DatabaseError, Streak, StreakNotification};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::StreakConfig;
use crate::error::{EngineError, Result};
use crate::transition::{self, Transition};

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 10;

/// Maximum page size for notification listings.
pub const MAX_NOTIFICATION_LIMIT: i64 = 100;

/// Streak summary for the user-facing view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    pub current_streak: i64,
    pub longest_streak: i64,
    /// Whole days since the last qualifying activity; `None` before the
    /// first activity.
    pub days_since_last_activity: Option<i64>,
    /// Whether the streak is still extendable (last activity today or
    /// yesterday).
    pub is_active: bool,
    pub streak_start_date: Option<NaiveDate>,
}

impl StreakStats {
    fn from_streak(streak: Option<&Streak>, today: NaiveDate) -> Self {
        let Some(streak) = streak else {
            return Self {
                current_streak: 0,
                longest_streak: 0,
                days_since_last_activity: None,
                is_active: false,
                streak_start_date: None,
            };
        };

        let days_since = streak
            .last_activity_date
            .map(|last| (today - last).num_days());

        Self {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            days_since_last_activity: days_since,
            is_active: matches!(days_since, Some(0) | Some(1)),
            streak_start_date: streak.streak_start_date,
        }
    }
}

/// Coordinates streak reads and writes against the database.
///
/// `record_activity` serializes concurrent calls per user with an async
/// lock, so two recordings for the same user can never both read the same
/// stale row and drop an increment. Calls for different users do not
/// contend.
pub struct StreakEngine {
    db: Database,
    config: StreakConfig,
    user_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl StreakEngine {
    /// Create an engine over an already-connected database.
    ///
    /// The database lifecycle (connect on start, close on shutdown) is the
    /// host's responsibility.
    pub fn new(db: Database, config: StreakConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            db,
            config,
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get the underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &StreakConfig {
        &self.config
    }

    /// Record a qualifying activity for a user and return the updated
    /// streak.
    ///
    /// Runs as a single transaction: load (creating an empty row on first
    /// activity), apply the transition rules, save. A storage failure rolls
    /// the whole update back and propagates; there is no internal retry. On
    /// timeout the outcome is unknown and the stored state is authoritative.
    pub async fn record_activity(&self, user_id: i64, activity_date: NaiveDate) -> Result<Streak> {
        self.record_activity_on(user_id, activity_date, Local::now().date_naive())
            .await
    }

    /// `record_activity` with the clock injected. Tests pass a fixed
    /// `today`; production callers go through [`record_activity`].
    pub(crate) async fn record_activity_on(
        &self,
        user_id: i64,
        activity_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Streak> {
        validate_user_id(user_id)?;

        timeout(
            self.config.op_timeout,
            self.record_locked(user_id, activity_date, today),
        )
        .await
        .map_err(|_| EngineError::Timeout(self.config.op_timeout))?
    }

    async fn record_locked(
        &self,
        user_id: i64,
        activity_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Streak> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut tx = self.db.pool().begin().await.map_err(DatabaseError::Sqlx)?;

        let current = match streak::get_streak(&mut *tx, user_id).await? {
            Some(streak) => streak,
            None => match streak::create_streak(&mut *tx, user_id).await {
                Ok(streak) => streak,
                // Lost a create race; the row is there now, so fetch it.
                Err(DatabaseError::AlreadyExists { .. }) => streak::get_streak(&mut *tx, user_id)
                    .await?
                    .ok_or(DatabaseError::NotFound {
                        entity: "Streak",
                        id: user_id.to_string(),
                    })?,
                Err(e) => return Err(e.into()),
            },
        };

        let transition = transition::classify(current.last_activity_date, today);
        if transition == Transition::SameDay {
            // Idempotent no-op; nothing was written.
            tx.rollback().await.map_err(DatabaseError::Sqlx)?;
            debug!(user_id, "Activity already recorded today");
            return Ok(current);
        }

        let updated = transition::apply_activity(&current, activity_date, today);
        streak::save_streak(&mut *tx, &updated).await?;
        tx.commit().await.map_err(DatabaseError::Sqlx)?;

        info!(
            user_id,
            transition = ?transition,
            current_streak = updated.current_streak,
            longest_streak = updated.longest_streak,
            "Recorded qualifying activity"
        );

        Ok(updated)
    }

    /// Streak summary for a user. Users without a streak row get a zeroed
    /// summary, not an error.
    pub async fn streak_stats(&self, user_id: i64) -> Result<StreakStats> {
        self.streak_stats_on(user_id, Local::now().date_naive())
            .await
    }

    pub(crate) async fn streak_stats_on(&self, user_id: i64, today: NaiveDate) -> Result<StreakStats> {
        validate_user_id(user_id)?;
        let streak = streak::get_streak(self.db.pool(), user_id).await?;
        Ok(StreakStats::from_streak(streak.as_ref(), today))
    }

    /// List a user's notifications, newest first.
    ///
    /// `limit` is clamped to `1..=MAX_NOTIFICATION_LIMIT`. An empty list is
    /// a normal result, not an error.
    pub async fn list_notifications(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StreakNotification>> {
        validate_user_id(user_id)?;
        let limit = limit.clamp(1, MAX_NOTIFICATION_LIMIT);
        let notifications =
            notification::list_notifications(self.db.pool(), user_id, limit, offset.max(0))
                .await?;
        Ok(notifications)
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<StreakNotification> {
        validate_user_id(user_id)?;
        if notification_id <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "notification id must be positive, got {}",
                notification_id
            )));
        }
        let notification =
            notification::mark_read(self.db.pool(), notification_id, user_id).await?;
        Ok(notification)
    }

    async fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn validate_user_id(user_id: i64) -> Result<()> {
    if user_id <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "user id must be positive, got {}",
            user_id
        )));
    }
    Ok(())
}
