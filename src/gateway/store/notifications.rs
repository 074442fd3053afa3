//! Notification operations: settings, the reminder sweep and the derived
//! notification stream.
//!
//! Reminder state lives entirely in the users' preference columns; the
//! order-status stream is a pure derivation over the immutable status
//! history filtered by `last_notifications_viewed_at`. No inbox table
//! exists, so there is nothing to drift.
//!
use chrono::{DateTime, Duration, Utc};

use crate::error::{ErrorKind, Result, TimeleError};
use crate::gateway::mailer::ReminderEmail;
use crate::gateway::models::{
    NotificationSettings, NotificationSettingsPatch, StatusHistoryEntry, StatusHistoryRow, UserRow,
};
use crate::gateway::store::{parse_external_id, resolve_user, Store};

/// Computes the next reminder boundary: the smallest `start + k*interval`
/// strictly after `now` (or `start` itself while it lies in the future).
///
/// Jumping past every missed boundary in one step is what makes catch-up
/// after downtime coalescing: a user with five missed intervals gets one
/// pending reminder and a `next_at` in the future, not five.
pub fn next_occurrence(
    start: DateTime<Utc>,
    interval_days: i32,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if start > now {
        return start;
    }
    let interval_secs = 86_400 * i64::from(interval_days.max(1));
    let elapsed_secs = (now - start).num_seconds();
    let k = elapsed_secs.div_euclid(interval_secs) + 1;
    start + Duration::seconds(k * interval_secs)
}

/// Notification operations.
///
pub struct Notifications<'s> {
    store: &'s Store,
}

impl<'s> Notifications<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Reads the notification preference block.
    pub async fn settings(&self, raw_external_id: &str) -> Result<NotificationSettings> {
        let external_id = parse_external_id(raw_external_id)?;
        let row = self.store.users().row_by_uuid(external_id).await?;
        Ok(NotificationSettings::from(row))
    }

    /// Updates the notification preference block; provided fields win.
    ///
    /// Any change to the interval or the start instant recomputes
    /// `order_notifications_next_at` against the current instant.
    pub async fn update_settings(
        &self,
        raw_external_id: &str,
        patch: &NotificationSettingsPatch,
    ) -> Result<NotificationSettings> {
        let external_id = parse_external_id(raw_external_id)?;
        if patch.is_empty() {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "settings patch contains no fields",
            ));
        }
        let row = self.store.users().row_by_uuid(external_id).await?;

        let days = patch
            .days_between_order_notifications
            .unwrap_or(row.days_between_order_notifications);
        if !(1..=365).contains(&days) {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "days_between_order_notifications must be between 1 and 365",
            ));
        }
        let start_at = patch
            .order_notifications_start_at
            .unwrap_or(row.order_notifications_start_at);
        let via_email = patch
            .order_notifications_via_email
            .unwrap_or(row.order_notifications_via_email);
        let next_at = next_occurrence(start_at, days, Utc::now());

        sqlx::query(
            "UPDATE users SET days_between_order_notifications = $1, \
                 order_notifications_start_at = $2, \
                 order_notifications_via_email = $3, \
                 order_notifications_next_at = $4, \
                 updated_at = now() \
             WHERE id = $5",
        )
        .bind(days)
        .bind(start_at)
        .bind(via_email)
        .bind(next_at)
        .bind(row.id)
        .execute(self.store.pool())
        .await?;

        self.settings(raw_external_id).await
    }

    /// The derived order-status notification stream: every status-history row
    /// of the user's orders newer than `last_notifications_viewed_at`,
    /// ascending by change time.
    pub async fn order_status_stream(
        &self,
        raw_external_id: &str,
    ) -> Result<Vec<StatusHistoryEntry>> {
        let external_id = parse_external_id(raw_external_id)?;
        resolve_user(self.store.pool(), external_id).await?;
        let rows: Vec<StatusHistoryRow> = sqlx::query_as(
            "SELECT h.history_id, h.order_id, h.status, h.changed_at, h.changed_by, h.note \
             FROM order_status_history h \
             JOIN orders o ON o.id = h.order_id \
             JOIN users u ON u.id = o.user_id \
             WHERE u.external_id = $1 \
               AND h.changed_at > u.last_notifications_viewed_at \
             ORDER BY h.changed_at ASC, h.history_id ASC",
        )
        .bind(external_id)
        .fetch_all(self.store.pool())
        .await?;
        rows.into_iter().map(history_entry).collect()
    }

    /// Acknowledges the stream: everything up to now counts as seen.
    pub async fn mark_viewed(&self, raw_external_id: &str) -> Result<()> {
        let external_id = parse_external_id(raw_external_id)?;
        let internal_id = resolve_user(self.store.pool(), external_id).await?;
        sqlx::query("UPDATE users SET last_notifications_viewed_at = now() WHERE id = $1")
            .bind(internal_id)
            .execute(self.store.pool())
            .await?;
        Ok(())
    }

    /// One reminder sweep, executed inside a single transaction.
    ///
    /// Selects every user whose `order_notifications_next_at` has passed,
    /// flags the pending reminder, stamps `last_notification_sent_at` and
    /// advances `next_at` past every missed boundary. Returns the email jobs
    /// for opted-in users; delivery happens outside this transaction so a
    /// relay failure can never roll back scheduling state.
    pub async fn sweep_due(&self, now: DateTime<Utc>) -> Result<Vec<ReminderEmail>> {
        let mut tx = self.store.pool().begin().await?;
        let due: Vec<UserRow> = sqlx::query_as(
            "SELECT id, external_id, first_name, last_name, email, password_hash, \
                 phone, street, city, postal_code, country, last_login_at, \
                 last_notifications_viewed_at, days_between_order_notifications, \
                 order_notifications_start_at, order_notifications_next_at, \
                 pending_order_notification, order_notifications_via_email, \
                 last_notification_sent_at, created_at, updated_at \
             FROM users \
             WHERE order_notifications_next_at <= $1 \
             ORDER BY id \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut emails = Vec::new();
        for user in &due {
            let next_at = next_occurrence(
                user.order_notifications_start_at,
                user.days_between_order_notifications,
                now,
            );
            sqlx::query(
                "UPDATE users SET pending_order_notification = TRUE, \
                     last_notification_sent_at = $1, \
                     order_notifications_next_at = $2 \
                 WHERE id = $3",
            )
            .bind(now)
            .bind(next_at)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
            if user.order_notifications_via_email {
                emails.push(ReminderEmail::order_reminder(user));
            }
        }
        tx.commit().await?;
        if !due.is_empty() {
            tracing::info!(users = due.len(), "reminder sweep flagged users");
        }
        Ok(emails)
    }
}

fn history_entry(row: StatusHistoryRow) -> Result<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
        history_id: row.history_id,
        order_id: row.order_id,
        status: row.status.parse()?,
        changed_at: row.changed_at,
        changed_by: row.changed_by,
        note: row.note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_occurrence_catches_up_in_one_step() {
        // Daily cadence starting 2025-01-01, clock frozen at 2025-01-05T12:00Z:
        // four boundaries were missed, the next one is 2025-01-06T00:00Z.
        let start = utc(2025, 1, 1, 0, 0, 0);
        let now = utc(2025, 1, 5, 12, 0, 0);
        assert_eq!(next_occurrence(start, 1, now), utc(2025, 1, 6, 0, 0, 0));
    }

    #[test]
    fn test_next_occurrence_strictly_after_now_on_boundary() {
        let start = utc(2025, 1, 1, 0, 0, 0);
        let now = utc(2025, 1, 5, 0, 0, 0);
        assert_eq!(next_occurrence(start, 1, now), utc(2025, 1, 6, 0, 0, 0));
    }

    #[test]
    fn test_next_occurrence_future_start_is_start() {
        let start = utc(2025, 6, 1, 0, 0, 0);
        let now = utc(2025, 1, 1, 0, 0, 0);
        assert_eq!(next_occurrence(start, 7, now), start);
    }

    #[test]
    fn test_next_occurrence_multi_day_interval() {
        let start = utc(2025, 1, 1, 0, 0, 0);
        let now = utc(2025, 1, 16, 7, 30, 0);
        // Boundaries fall on days 1, 8, 15, 22; the 22nd is the first one
        // after `now`.
        assert_eq!(next_occurrence(start, 7, now), utc(2025, 1, 22, 0, 0, 0));
    }

    #[test]
    fn test_next_occurrence_lands_on_the_schedule_lattice() {
        let start = utc(2025, 3, 10, 9, 15, 0);
        let now = utc(2025, 8, 1, 13, 42, 17);
        let next = next_occurrence(start, 4, now);
        assert!(next > now);
        let offset = (next - start).num_seconds();
        assert_eq!(offset % (4 * 86_400), 0);
        // Strictly the smallest such boundary.
        assert!(next - Duration::days(4) <= now);
    }
}
