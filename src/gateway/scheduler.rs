//! Notification scheduler.
//!
//! A single long-lived worker that wakes on a bounded period and runs one
//! reminder sweep per tick. State lives entirely in the database: the users'
//! preference columns drive the sweep, a Postgres advisory lock keeps the
//! tick singleton-per-deployment when the gateway is replicated, and no
//! state crosses ticks in memory, so restarting mid-tick is safe.
//!
//! The runtime timer only paces the sleeps; every comparison and write uses
//! wall-clock UTC.
//!
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::gateway::mailer::Mailer;
use crate::gateway::store::Store;

/// Advisory lock key gating the tick across gateway replicas.
pub const SCHEDULER_LOCK_KEY: i64 = 0x7469_6d65_6c65;

/// The notification tick loop.
///
pub struct Scheduler {
    store: Store,
    mailer: Mailer,
    tick: Duration,
}

impl Scheduler {
    pub fn new(store: Store, mailer: Mailer, tick: Duration) -> Self {
        Self { store, mailer, tick }
    }

    /// Runs the loop until `shutdown` flips.
    ///
    /// Each iteration is self-contained; a failed tick is logged and the
    /// next one starts fresh.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.tick.as_secs(), "notification scheduler started");
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick_once().await {
                        error!(error = %e, "notification tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("notification scheduler stopping");
                    break;
                }
            }
        }
    }

    /// One tick: take the advisory lock, sweep, release.
    ///
    /// When another replica holds the lock the tick is skipped entirely;
    /// that replica is the deployment's scheduler for as long as it runs.
    pub async fn tick_once(&self) -> Result<()> {
        let mut conn = self.store.pool().acquire().await?;
        let (locked,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(SCHEDULER_LOCK_KEY)
            .fetch_one(&mut *conn)
            .await?;
        if !locked {
            debug!("another gateway instance holds the scheduler lock");
            return Ok(());
        }
        let result = self.sweep().await;
        // The unlock must run on the connection that took the lock.
        if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(SCHEDULER_LOCK_KEY)
            .execute(&mut *conn)
            .await
        {
            warn!(error = %e, "failed to release scheduler advisory lock");
        }
        result
    }

    async fn sweep(&self) -> Result<()> {
        let now = Utc::now();
        let emails = self.store.notifications().sweep_due(now).await?;
        // Delivery is best-effort and isolated from the committed sweep:
        // a relay failure costs one email, never the scheduling state.
        for email in &emails {
            if let Err(e) = self.mailer.send(email).await {
                warn!(to = %email.to, error = %e, "reminder email delivery failed");
            }
        }
        Ok(())
    }
}
