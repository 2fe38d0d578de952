//! Periodic risk sweep.
//!
//! Enumerates every user with a streak row, classifies their risk state,
//! and appends warning/lost notifications. One failing user never aborts
//! the rest of the sweep, and the loop itself never returns an error to
//! the host.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use database::{notification, streak, DatabaseError, NotificationKind};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::classifier;
use crate::engine::StreakEngine;
use crate::error::Result;

/// Counters from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Users examined.
    pub scanned: usize,
    /// Notifications appended.
    pub notified: usize,
    /// Users whose processing failed or timed out.
    pub failed: usize,
}

/// Periodic sweep over all streaks.
pub struct Sweeper {
    engine: Arc<StreakEngine>,
}

impl Sweeper {
    /// Create a sweeper over a shared engine.
    pub fn new(engine: Arc<StreakEngine>) -> Self {
        Self { engine }
    }

    /// Run the sweep on the configured interval. Never returns.
    ///
    /// Ticks execute sequentially in this task, so a slow sweep delays the
    /// next tick rather than running concurrently with it.
    pub async fn run(&self) {
        let period = self.engine.config().sweep_interval;
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period = ?period, "Starting streak sweep");

        loop {
            ticks.tick().await;
            let summary = self.sweep_once(Local::now().naive_local()).await;
            info!(
                scanned = summary.scanned,
                notified = summary.notified,
                failed = summary.failed,
                "Sweep complete"
            );
        }
    }

    /// Run a single sweep pass at the given time.
    pub async fn sweep_once(&self, now: NaiveDateTime) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let user_ids = match streak::list_streak_user_ids(self.engine.db().pool()).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to enumerate streaks for sweep: {}", e);
                summary.failed += 1;
                return summary;
            }
        };

        for user_id in user_ids {
            summary.scanned += 1;
            match timeout(
                self.engine.config().op_timeout,
                self.sweep_user(user_id, now),
            )
            .await
            {
                Ok(Ok(Some(kind))) => {
                    summary.notified += 1;
                    debug!(user_id, kind = ?kind, "Appended streak notification");
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    summary.failed += 1;
                    error!(user_id, "Sweep failed for user: {}", e);
                }
                Err(_) => {
                    summary.failed += 1;
                    error!(user_id, "Sweep timed out for user");
                }
            }
        }

        summary
    }

    /// Classify one user and append a notification on a state change.
    ///
    /// Returns the appended notification kind, or `None` when the user is
    /// safe, has never been active, or was already notified for this state.
    async fn sweep_user(
        &self,
        user_id: i64,
        now: NaiveDateTime,
    ) -> Result<Option<NotificationKind>> {
        let Some(streak) = streak::get_streak(self.engine.db().pool(), user_id).await? else {
            return Ok(None);
        };

        let Some(risk) = classifier::classify_risk(&streak, now, self.engine.config()) else {
            return Ok(None);
        };

        let Some((kind, message)) = risk.notification() else {
            return Ok(None);
        };

        // Already notified for this state; re-emitting every tick would
        // spam the user for the whole window.
        if streak.notified_state == Some(kind) {
            return Ok(None);
        }

        let mut tx = self
            .engine
            .db()
            .pool()
            .begin()
            .await
            .map_err(DatabaseError::Sqlx)?;
        notification::append_notification(&mut *tx, user_id, kind, &message).await?;
        streak::set_notified_state(&mut *tx, user_id, Some(kind)).await?;
        tx.commit().await.map_err(DatabaseError::Sqlx)?;

        Ok(Some(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::test_engine;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    async fn engine_with_activity_on(day: &str) -> Arc<StreakEngine> {
        let engine = Arc::new(test_engine().await);
        engine
            .record_activity_on(1, date(day), date(day))
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn warning_is_emitted_once_per_window() {
        let engine = engine_with_activity_on("2024-03-01").await;
        let sweeper = Sweeper::new(engine.clone());

        // 21 hours past the end of the activity day: warning window
        let summary = sweeper.sweep_once(at("2024-03-02T21:00:00")).await;
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.notified, 1);
        assert_eq!(summary.failed, 0);

        // The next tick in the same window stays quiet
        let summary = sweeper.sweep_once(at("2024-03-02T22:00:00")).await;
        assert_eq!(summary.notified, 0);

        let listed = engine.list_notifications(1, 10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, NotificationKind::Warning);
        assert!(listed[0].message.contains("1-day"));
    }

    #[tokio::test]
    async fn lost_follows_warning_as_a_new_state() {
        let engine = engine_with_activity_on("2024-03-01").await;
        let sweeper = Sweeper::new(engine.clone());

        sweeper.sweep_once(at("2024-03-02T21:00:00")).await;
        let summary = sweeper.sweep_once(at("2024-03-03T01:00:00")).await;
        assert_eq!(summary.notified, 1);

        // Lost is sticky: later ticks do not repeat it
        let summary = sweeper.sweep_once(at("2024-03-05T12:00:00")).await;
        assert_eq!(summary.notified, 0);

        let listed = engine.list_notifications(1, 10, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].kind, NotificationKind::Lost);
        assert_eq!(listed[1].kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn recording_reopens_the_notification_window() {
        let engine = engine_with_activity_on("2024-03-01").await;
        let sweeper = Sweeper::new(engine.clone());

        sweeper.sweep_once(at("2024-03-02T21:00:00")).await;

        // User saves the streak before midnight
        engine
            .record_activity_on(1, date("2024-03-02"), date("2024-03-02"))
            .await
            .unwrap();

        // A day later they are in the warning window again and get a
        // fresh notification
        let summary = sweeper.sweep_once(at("2024-03-03T21:00:00")).await;
        assert_eq!(summary.notified, 1);

        let listed = engine.list_notifications(1, 10, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed
            .iter()
            .all(|n| n.kind == NotificationKind::Warning));
    }

    #[tokio::test]
    async fn sweep_skips_inactive_and_safe_users() {
        let engine = Arc::new(test_engine().await);

        // User 1 has a row but no activity yet; user 2 was active today
        streak::create_streak(engine.db().pool(), 1).await.unwrap();
        engine
            .record_activity_on(2, date("2024-03-02"), date("2024-03-02"))
            .await
            .unwrap();

        let sweeper = Sweeper::new(engine.clone());
        let summary = sweeper.sweep_once(at("2024-03-02T12:00:00")).await;
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.notified, 0);
        assert_eq!(summary.failed, 0);
    }
}
