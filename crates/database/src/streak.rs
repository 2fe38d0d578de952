//! Streak row storage.
//!
//! Functions are generic over [`sqlx::SqliteExecutor`] so they can run
//! either directly against the pool or inside a caller-owned transaction.
//! `save_streak` and `set_notified_state` must only be called from within
//! the recorder/sweep transactions that also performed the read.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};
use crate::models::{NotificationKind, Streak};

/// Get the streak row for a user, if one exists.
pub async fn get_streak<'e, E>(executor: E, user_id: i64) -> Result<Option<Streak>>
where
    E: SqliteExecutor<'e>,
{
    let streak = sqlx::query_as::<_, Streak>(
        r#"
        SELECT user_id, current_streak, longest_streak, last_activity_date,
               streak_start_date, notified_state, updated_at
        FROM streaks
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(streak)
}

/// Insert a zeroed streak row for a user.
///
/// Returns `AlreadyExists` if the user already has a row; callers should
/// treat that as "fetch and retry", not a hard failure.
pub async fn create_streak<'e, E>(executor: E, user_id: i64) -> Result<Streak>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Streak>(
        r#"
        INSERT INTO streaks (user_id, current_streak, longest_streak, last_activity_date, streak_start_date)
        VALUES (?, 0, 0, NULL, NULL)
        RETURNING user_id, current_streak, longest_streak, last_activity_date,
                  streak_start_date, notified_state, updated_at
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Streak",
                    id: user_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })
}

/// Overwrite the streak row for `streak.user_id`.
pub async fn save_streak<'e, E>(executor: E, streak: &Streak) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE streaks
        SET current_streak = ?, longest_streak = ?, last_activity_date = ?,
            streak_start_date = ?, notified_state = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(streak.current_streak)
    .bind(streak.longest_streak)
    .bind(streak.last_activity_date)
    .bind(streak.streak_start_date)
    .bind(streak.notified_state)
    .bind(streak.user_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Streak",
            id: streak.user_id.to_string(),
        });
    }

    Ok(())
}

/// Record which risk state the user was last notified for.
///
/// `None` clears the marker (the user is active again).
pub async fn set_notified_state<'e, E>(
    executor: E,
    user_id: i64,
    state: Option<NotificationKind>,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE streaks
        SET notified_state = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(state)
    .bind(user_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Streak",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// List the ids of all users that have a streak row.
pub async fn list_streak_user_ids<'e, E>(executor: E) -> Result<Vec<i64>>
where
    E: SqliteExecutor<'e>,
{
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT user_id
        FROM streaks
        ORDER BY user_id
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(ids)
}
