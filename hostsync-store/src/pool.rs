//! TTL-bounded pool of store sessions.
//!
//! Idle sessions wait in a lock-free queue and are reused until `ttl` has
//! elapsed since they were opened. A session whose operation failed is never
//! returned to the pool.

use std::time::{Duration, Instant};

use crossbeam::queue::SegQueue;

use crate::error::StoreError;
use crate::store::SessionFactory;

/// A session checked out of a [`SessionPool`].
pub struct PooledSession<S> {
    session: S,
    opened_at: Instant,
}

impl<S> PooledSession<S> {
    pub fn session(&self) -> &S {
        &self.session
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.opened_at) < ttl
    }
}

pub struct SessionPool<F: SessionFactory> {
    factory: F,
    idle: SegQueue<PooledSession<F::Session>>,
    ttl: Duration,
}

impl<F: SessionFactory> SessionPool<F> {
    pub fn new(factory: F, ttl: Duration) -> Self {
        Self {
            factory,
            idle: SegQueue::new(),
            ttl,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of sessions currently idle in the pool.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Reuse an idle session younger than the TTL, or open a new one.
    pub fn acquire(&self) -> Result<PooledSession<F::Session>, StoreError> {
        self.acquire_at(Instant::now())
    }

    /// Return a session after a successful operation.
    pub fn release(&self, pooled: PooledSession<F::Session>) {
        self.release_at(pooled, Instant::now());
    }

    /// Run `op` on a pooled session. The session goes back to the pool only
    /// if `op` succeeds.
    pub fn with_session<T>(
        &self,
        op: impl FnOnce(&F::Session) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let pooled = self.acquire()?;
        match op(pooled.session()) {
            Ok(value) => {
                self.release(pooled);
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(target: "transfer", error = %err, "discarding session after failure");
                Err(err)
            }
        }
    }

    fn acquire_at(&self, now: Instant) -> Result<PooledSession<F::Session>, StoreError> {
        while let Some(pooled) = self.idle.pop() {
            if pooled.is_fresh(now, self.ttl) {
                return Ok(pooled);
            }
            tracing::debug!(target: "transfer", "dropping expired session");
        }
        self.open(now)
    }

    fn release_at(&self, pooled: PooledSession<F::Session>, now: Instant) {
        if pooled.is_fresh(now, self.ttl) {
            self.idle.push(pooled);
        }
    }

    /// Connect, re-authenticating once if the first attempt is rejected.
    fn open(&self, now: Instant) -> Result<PooledSession<F::Session>, StoreError> {
        let session = match self.factory.connect() {
            Ok(session) => session,
            Err(StoreError::Authentication { reason }) => {
                tracing::warn!(target: "transfer", %reason, "session rejected, re-authenticating");
                self.factory.reset_credentials()?;
                self.factory.connect()?
            }
            Err(err) => return Err(err),
        };
        Ok(PooledSession {
            session,
            opened_at: now,
        })
    }
}
