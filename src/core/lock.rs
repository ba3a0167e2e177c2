//! Single-flight lease lock.
//!
//! A lease names a lock, its holder and an expiry. Acquisition fails while
//! an unexpired lease exists; an expired lease may be taken over, so a
//! crashed holder cannot block later ticks forever.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub name: String,
    pub holder: String,
    pub expires_at: DateTime<Utc>,
}

pub trait LockService {
    /// Returns `None` when another holder owns an unexpired lease.
    fn try_acquire_at(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Lease>>;

    /// Releases only if `lease.holder` still owns the lock.
    fn release(&self, lease: &Lease) -> AppResult<()>;

    fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> AppResult<Option<Lease>> {
        self.try_acquire_at(name, holder, ttl, Utc::now())
    }
}

/// Expiry instant of a lease taken at `now`.
pub fn lease_expiry(now: DateTime<Utc>, ttl: Duration) -> AppResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AppError::Config(format!("lock lease of {} is out of range", ttl)))
}

/// Unique holder identity for one pass: host, process and a sequence number.
pub fn holder_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string());
    format!(
        "{}:{}:{}",
        host,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// Holds a lease and releases it when dropped, on every exit path.
pub struct LockGuard<'a> {
    service: &'a dyn LockService,
    lease: Option<Lease>,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(
        service: &'a dyn LockService,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> AppResult<Option<Self>> {
        Ok(service
            .try_acquire(name, holder, ttl)?
            .map(|lease| LockGuard {
                service,
                lease: Some(lease),
            }))
    }

    pub fn lease(&self) -> Option<&Lease> {
        self.lease.as_ref()
    }

    /// Explicit release, surfacing the error instead of only logging it.
    pub fn release(mut self) -> AppResult<()> {
        match self.lease.take() {
            Some(lease) => self.service.release(&lease),
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take()
            && let Err(e) = self.service.release(&lease)
        {
            warn!(lock = %lease.name, holder = %lease.holder, error = %e, "failed to release lock");
        }
    }
}

/// Process-local lock table for single-instance deployments.
#[derive(Debug, Default)]
pub struct InMemoryLockService {
    leases: Mutex<HashMap<String, Lease>>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockService for InMemoryLockService {
    fn try_acquire_at(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Lease>> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| AppError::Other("lock table poisoned".into()))?;

        if let Some(current) = leases.get(name)
            && current.expires_at > now
        {
            return Ok(None);
        }

        let lease = Lease {
            name: name.to_string(),
            holder: holder.to_string(),
            expires_at: lease_expiry(now, ttl)?,
        };
        leases.insert(name.to_string(), lease.clone());
        Ok(Some(lease))
    }

    fn release(&self, lease: &Lease) -> AppResult<()> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| AppError::Other("lock table poisoned".into()))?;

        if leases
            .get(&lease.name)
            .is_some_and(|current| current.holder == lease.holder)
        {
            leases.remove(&lease.name);
        }
        Ok(())
    }
}
