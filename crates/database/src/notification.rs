//! Streak notification log.
//!
//! Append-only: rows are inserted by the sweep and only ever mutated to
//! flip `is_read`.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};
use crate::models::{NotificationKind, StreakNotification};

/// Append a notification for a user.
pub async fn append_notification<'e, E>(
    executor: E,
    user_id: i64,
    kind: NotificationKind,
    message: &str,
) -> Result<StreakNotification>
where
    E: SqliteExecutor<'e>,
{
    let notification = sqlx::query_as::<_, StreakNotification>(
        r#"
        INSERT INTO streak_notifications (user_id, kind, message)
        VALUES (?, ?, ?)
        RETURNING id, user_id, kind, message, is_read, created_at
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(message)
    .fetch_one(executor)
    .await?;

    Ok(notification)
}

/// List notifications for a user, newest first.
pub async fn list_notifications<'e, E>(
    executor: E,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<StreakNotification>>
where
    E: SqliteExecutor<'e>,
{
    let notifications = sqlx::query_as::<_, StreakNotification>(
        r#"
        SELECT id, user_id, kind, message, is_read, created_at
        FROM streak_notifications
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(notifications)
}

/// Mark a notification as read.
///
/// Ownership is enforced in the WHERE clause; a notification belonging to
/// another user is reported as `NotFound`, not mutated.
pub async fn mark_read<'e, E>(
    executor: E,
    notification_id: i64,
    user_id: i64,
) -> Result<StreakNotification>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, StreakNotification>(
        r#"
        UPDATE streak_notifications
        SET is_read = 1
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, kind, message, is_read, created_at
        "#,
    )
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "StreakNotification",
        id: notification_id.to_string(),
    })
}
