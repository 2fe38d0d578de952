//! Streak risk classification.
//!
//! Pure and side-effect free: classification never mutates the stored
//! counters. A streak classified as lost stays in the store untouched
//! until the next recorded activity observes the gap and resets it.
//!
//! Hours are measured from the *end* of the last activity day (the
//! midnight after it). With the default 24-hour reset threshold this
//! lines up with the transition rules: `hours_since >= reset_hours`
//! exactly when a recording would observe a gap of more than one day.

use chrono::{NaiveDateTime, NaiveTime};
use database::{NotificationKind, Streak};
use serde::Serialize;

use crate::config::StreakConfig;

/// The current risk state of a user's streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum RiskState {
    /// Recent activity; nothing to do.
    Safe,
    /// The warning threshold has passed but the streak is still alive.
    Warning {
        /// Whole hours left before the streak counts as lost, rounded up.
        hours_remaining: i64,
        /// The streak length at risk.
        current_streak: i64,
    },
    /// The reset threshold has passed; the streak will reset on the next
    /// recorded activity.
    Lost {
        /// The streak length that lapsed.
        lost_streak: i64,
    },
}

impl RiskState {
    /// The notification this state should produce, if any.
    pub fn notification(&self) -> Option<(NotificationKind, String)> {
        match self {
            RiskState::Safe => None,
            RiskState::Warning {
                hours_remaining,
                current_streak,
            } => Some((
                NotificationKind::Warning,
                format!(
                    "Your {}-day streak is at risk! Log an activity within {} hours to keep it going.",
                    current_streak, hours_remaining
                ),
            )),
            RiskState::Lost { lost_streak } => Some((
                NotificationKind::Lost,
                format!(
                    "You lost your {}-day streak. Start a new one today!",
                    lost_streak
                ),
            )),
        }
    }

    /// The notification kind for this state, if any.
    pub fn kind(&self) -> Option<NotificationKind> {
        match self {
            RiskState::Safe => None,
            RiskState::Warning { .. } => Some(NotificationKind::Warning),
            RiskState::Lost { .. } => Some(NotificationKind::Lost),
        }
    }
}

/// Classify a streak against the warning/reset thresholds.
///
/// Returns `None` for users who have never recorded an activity.
pub fn classify_risk(
    streak: &Streak,
    now: NaiveDateTime,
    config: &StreakConfig,
) -> Option<RiskState> {
    let last = streak.last_activity_date?;

    // Hours elapsed since the last activity day ended. Negative while the
    // activity day is still in progress, which classifies as safe.
    let day_end = last.succ_opt()?.and_time(NaiveTime::MIN);
    let hours_since = (now - day_end).num_seconds() as f64 / 3600.0;

    if hours_since < config.warning_hours as f64 {
        Some(RiskState::Safe)
    } else if hours_since < config.reset_hours as f64 {
        let hours_remaining = (config.reset_hours as f64 - hours_since).ceil() as i64;
        Some(RiskState::Warning {
            hours_remaining,
            current_streak: streak.current_streak,
        })
    } else {
        Some(RiskState::Lost {
            lost_streak: streak.current_streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streak_last_on(day: &str, current: i64) -> Streak {
        Streak {
            user_id: 1,
            current_streak: current,
            longest_streak: current,
            last_activity_date: Some(day.parse().unwrap()),
            streak_start_date: None,
            notified_state: None,
            updated_at: String::new(),
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn never_active_has_no_classification() {
        let mut streak = streak_last_on("2024-03-01", 0);
        streak.last_activity_date = None;
        let config = StreakConfig::default();
        assert!(classify_risk(&streak, at("2024-03-02T12:00:00"), &config).is_none());
    }

    #[test]
    fn threshold_boundaries() {
        // Last activity on 2024-03-01; its day ends at 2024-03-02T00:00.
        let streak = streak_last_on("2024-03-01", 5);
        let config = StreakConfig::default();

        // 19.9 hours: safe
        let state = classify_risk(&streak, at("2024-03-02T19:54:00"), &config).unwrap();
        assert_eq!(state, RiskState::Safe);

        // 20.0 hours: warning
        let state = classify_risk(&streak, at("2024-03-02T20:00:00"), &config).unwrap();
        assert_eq!(
            state,
            RiskState::Warning {
                hours_remaining: 4,
                current_streak: 5
            }
        );

        // 23.9 hours: still warning
        let state = classify_risk(&streak, at("2024-03-02T23:54:00"), &config).unwrap();
        assert!(matches!(state, RiskState::Warning { .. }));

        // 24.0 hours: lost
        let state = classify_risk(&streak, at("2024-03-03T00:00:00"), &config).unwrap();
        assert_eq!(state, RiskState::Lost { lost_streak: 5 });
    }

    #[test]
    fn same_day_activity_is_safe() {
        // Still within the activity day: elapsed hours are negative.
        let streak = streak_last_on("2024-03-01", 2);
        let config = StreakConfig::default();
        let state = classify_risk(&streak, at("2024-03-01T22:00:00"), &config).unwrap();
        assert_eq!(state, RiskState::Safe);
    }

    #[test]
    fn warning_rounds_remaining_hours_up() {
        let streak = streak_last_on("2024-03-01", 3);
        let config = StreakConfig::default();
        // 21.5 hours elapsed, 2.5 remaining, rounded up to 3.
        let state = classify_risk(&streak, at("2024-03-02T21:30:00"), &config).unwrap();
        assert_eq!(
            state,
            RiskState::Warning {
                hours_remaining: 3,
                current_streak: 3
            }
        );
    }

    #[test]
    fn messages_carry_streak_length() {
        let warning = RiskState::Warning {
            hours_remaining: 3,
            current_streak: 7,
        };
        let (kind, message) = warning.notification().unwrap();
        assert_eq!(kind, NotificationKind::Warning);
        assert!(message.contains("7-day"));
        assert!(message.contains("3 hours"));

        let lost = RiskState::Lost { lost_streak: 7 };
        let (kind, message) = lost.notification().unwrap();
        assert_eq!(kind, NotificationKind::Lost);
        assert!(message.contains("7-day"));

        assert!(RiskState::Safe.notification().is_none());
    }
}
