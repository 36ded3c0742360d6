//! Notification dispatcher
//!
//! Drains the notification outbox and hands rendered messages to a
//! `Mailer`. Delivery is the only retrying component in the system:
//! booking flows enqueue and forget, this worker retries with a growing
//! delay and eventually gives up. Actual transport (SMTP or otherwise)
//! stays behind the trait.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use matinee_core::{Database, OutboxEntry};
use tracing::{info, instrument, warn};

/// Outbound mail transport
pub trait Mailer: Send + Sync {
    /// Deliver one message; an Err is a retryable failure
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Default transport that only logs; used until a real gateway is wired
/// up in deployment
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), String> {
        info!(to, subject, "Mail (log only)");
        Ok(())
    }
}

/// Result of one dispatch pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u32,
    pub retried: u32,
    pub gave_up: u32,
}

pub struct Notifier {
    db: Arc<Mutex<Database>>,
    mailer: Box<dyn Mailer>,
    max_attempts: u32,
    base_backoff: Duration,
}

impl Notifier {
    pub fn new(db: Arc<Mutex<Database>>, mailer: Box<dyn Mailer>, max_attempts: u32, base_backoff_secs: u64) -> Self {
        Self {
            db,
            mailer,
            max_attempts,
            base_backoff: Duration::seconds(base_backoff_secs as i64),
        }
    }

    /// Deliver every due pending entry once. Failures reschedule with a
    /// doubling delay until the attempt budget is spent.
    #[instrument(skip(self))]
    pub fn dispatch_due(&self, now: DateTime<Utc>) -> DispatchStats {
        let mut stats = DispatchStats::default();

        let due = {
            let db = self.db.lock().unwrap();
            match db.outbox().list_due(now, 50) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Outbox read failed: {}", e);
                    return stats;
                }
            }
        };

        for entry in due {
            match self.mailer.send(&entry.recipient, &entry.subject, &entry.body) {
                Ok(()) => {
                    let db = self.db.lock().unwrap();
                    if db.outbox().mark_sent(entry.id).is_ok() {
                        stats.sent += 1;
                    }
                }
                Err(error) => {
                    let next = self.next_attempt(&entry, now);
                    let db = self.db.lock().unwrap();
                    if db.outbox().record_failure(entry.id, &error, next).is_ok() {
                        if next.is_some() {
                            stats.retried += 1;
                        } else {
                            warn!(recipient = %entry.recipient, "Notification abandoned: {}", error);
                            stats.gave_up += 1;
                        }
                    }
                }
            }
        }

        stats
    }

    /// Schedule the next try, or None when the budget is spent.
    /// Delay doubles per attempt, capped at 64x the base.
    fn next_attempt(&self, entry: &OutboxEntry, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let attempts_after = entry.attempts + 1;
        if attempts_after >= self.max_attempts {
            return None;
        }
        let factor = 1i64 << entry.attempts.min(6);
        Some(now + self.base_backoff * factor as i32)
    }
}
