//! Background category lookups and their delivery back to the UI loop.

use crate::error::ResolutionError;
use crate::resolver::CategoryNameResolver;
use crate::task::CategoryId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Identity of one mounted card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(u64);

impl MountId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Tags a lookup with the mount and generation that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    pub mount: MountId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Resolved(String),
    Failed(ResolutionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub ticket: LookupTicket,
    pub category: CategoryId,
    pub outcome: LookupOutcome,
}

/// Bounded exponential backoff for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

pub async fn resolve_with_retry(
    resolver: &dyn CategoryNameResolver,
    category: &CategoryId,
    retry: RetryPolicy,
) -> LookupOutcome {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match resolver.resolve(category).await {
            Ok(name) => return LookupOutcome::Resolved(name),
            Err(err) => {
                warn!(category = %category, attempt, error = %err, "category lookup failed");
                if !err.is_retryable() || attempt >= max_attempts {
                    return LookupOutcome::Failed(err);
                }
                tokio::time::sleep(retry.backoff(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Spawns lookups and funnels their results into one channel.
#[derive(Clone)]
pub struct CategoryLookups {
    resolver: Arc<dyn CategoryNameResolver>,
    retry: RetryPolicy,
    updates: mpsc::UnboundedSender<CategoryUpdate>,
}

impl CategoryLookups {
    pub fn new(
        resolver: Arc<dyn CategoryNameResolver>,
        retry: RetryPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<CategoryUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                resolver,
                retry,
                updates,
            },
            rx,
        )
    }

    pub fn spawn(&self, ticket: LookupTicket, category: CategoryId) -> JoinHandle<()> {
        let resolver = Arc::clone(&self.resolver);
        let retry = self.retry;
        let updates = self.updates.clone();
        debug!(category = %category, generation = ticket.generation, "starting category lookup");
        tokio::spawn(async move {
            let outcome = resolve_with_retry(resolver.as_ref(), &category, retry).await;
            let update = CategoryUpdate {
                ticket,
                category,
                outcome,
            };
            if updates.send(update).is_err() {
                debug!("ui loop gone, dropping category update");
            }
        })
    }
}
