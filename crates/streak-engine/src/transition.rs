//! Streak transition rules.
//!
//! Pure functions with no I/O. The comparison is always against *today at
//! call time*, not against the activity date parameter, so a streak can
//! only ever be extended by today's qualifying activity — past-dated
//! activities can never backfill a streak.

use chrono::NaiveDate;
use database::Streak;

/// How a new qualifying activity relates to the stored streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First qualifying activity ever recorded for this user.
    First,
    /// Already recorded an activity today; nothing changes.
    SameDay,
    /// Exactly one day since the last activity; the streak extends.
    Consecutive,
    /// More than one day since the last activity; the streak restarts.
    GapReset,
}

/// Classify a new activity against the stored last-activity date.
///
/// A stored date in the future (clock skew) is treated as same-day rather
/// than corrupting the counters.
pub fn classify(last_activity: Option<NaiveDate>, today: NaiveDate) -> Transition {
    let Some(last) = last_activity else {
        return Transition::First;
    };

    let day_diff = (today - last).num_days();
    if day_diff <= 0 {
        Transition::SameDay
    } else if day_diff == 1 {
        Transition::Consecutive
    } else {
        Transition::GapReset
    }
}

/// Apply a qualifying activity to a streak, producing the new field values.
///
/// | Transition  | current  | longest          | start         | last          |
/// |-------------|----------|------------------|---------------|---------------|
/// | First       | 1        | max(prior, 1)    | activity date | activity date |
/// | SameDay     | -        | -                | -             | -             |
/// | Consecutive | prior + 1| max(prior, new)  | -             | activity date |
/// | GapReset    | 1        | prior            | activity date | activity date |
///
/// Every transition that changes the row also clears `notified_state`: the
/// user is active again, so the next warning/lost should notify afresh.
pub fn apply_activity(streak: &Streak, activity_date: NaiveDate, today: NaiveDate) -> Streak {
    let mut updated = streak.clone();

    match classify(streak.last_activity_date, today) {
        Transition::SameDay => return updated,
        Transition::First => {
            updated.current_streak = 1;
            updated.longest_streak = streak.longest_streak.max(1);
            updated.streak_start_date = Some(activity_date);
            updated.last_activity_date = Some(activity_date);
        }
        Transition::Consecutive => {
            updated.current_streak = streak.current_streak + 1;
            updated.longest_streak = streak.longest_streak.max(updated.current_streak);
            updated.last_activity_date = Some(activity_date);
        }
        Transition::GapReset => {
            updated.current_streak = 1;
            updated.streak_start_date = Some(activity_date);
            updated.last_activity_date = Some(activity_date);
        }
    }

    updated.notified_state = None;
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::NotificationKind;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn streak(current: i64, longest: i64, last: Option<&str>) -> Streak {
        Streak {
            user_id: 1,
            current_streak: current,
            longest_streak: longest,
            last_activity_date: last.map(date),
            streak_start_date: last.map(date),
            notified_state: None,
            updated_at: String::new(),
        }
    }

    #[test]
    fn first_activity_starts_streak() {
        let empty = streak(0, 0, None);
        let today = date("2024-03-01");
        let updated = apply_activity(&empty, today, today);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 1);
        assert_eq!(updated.streak_start_date, Some(today));
        assert_eq!(updated.last_activity_date, Some(today));
    }

    #[test]
    fn first_activity_keeps_prior_longest() {
        // Zeroed row whose longest survived an external reset path
        let prior = streak(0, 4, None);
        let today = date("2024-03-01");
        let updated = apply_activity(&prior, today, today);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 4);
    }

    #[test]
    fn same_day_is_idempotent() {
        let stored = streak(3, 5, Some("2024-03-01"));
        let today = date("2024-03-01");
        let once = apply_activity(&stored, today, today);
        let twice = apply_activity(&once, today, today);
        assert_eq!(once, stored);
        assert_eq!(twice, stored);
    }

    #[test]
    fn consecutive_day_increments() {
        let stored = streak(3, 5, Some("2024-03-01"));
        let today = date("2024-03-02");
        let updated = apply_activity(&stored, today, today);
        assert_eq!(updated.current_streak, 4);
        assert_eq!(updated.longest_streak, 5);
        assert_eq!(updated.last_activity_date, Some(today));
        // Start date is unchanged on extension
        assert_eq!(updated.streak_start_date, stored.streak_start_date);
    }

    #[test]
    fn consecutive_day_raises_longest() {
        let stored = streak(5, 5, Some("2024-03-01"));
        let today = date("2024-03-02");
        let updated = apply_activity(&stored, today, today);
        assert_eq!(updated.current_streak, 6);
        assert_eq!(updated.longest_streak, 6);
    }

    #[test]
    fn gap_resets_current_and_preserves_longest() {
        let stored = streak(5, 5, Some("2024-03-01"));
        let today = date("2024-03-04");
        let updated = apply_activity(&stored, today, today);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 5);
        assert_eq!(updated.streak_start_date, Some(today));
        assert_eq!(updated.last_activity_date, Some(today));
    }

    #[test]
    fn longest_never_decreases_across_sequences() {
        let mut stored = streak(0, 0, None);
        let days = [
            "2024-03-01",
            "2024-03-02",
            "2024-03-03", // longest reaches 3
            "2024-03-07", // gap reset
            "2024-03-08",
        ];
        let mut peak = 0;
        for day in days {
            stored = apply_activity(&stored, date(day), date(day));
            peak = peak.max(stored.current_streak);
            assert!(stored.longest_streak >= stored.current_streak);
            assert_eq!(stored.longest_streak, peak);
        }
        assert_eq!(stored.current_streak, 2);
        assert_eq!(stored.longest_streak, 3);
    }

    #[test]
    fn future_last_activity_is_treated_as_same_day() {
        let stored = streak(2, 2, Some("2024-03-05"));
        let today = date("2024-03-01");
        assert_eq!(classify(stored.last_activity_date, today), Transition::SameDay);
        assert_eq!(apply_activity(&stored, today, today), stored);
    }

    #[test]
    fn activity_clears_notified_state() {
        let mut stored = streak(3, 5, Some("2024-03-01"));
        stored.notified_state = Some(NotificationKind::Warning);
        let updated = apply_activity(&stored, date("2024-03-02"), date("2024-03-02"));
        assert!(updated.notified_state.is_none());
    }
}
