use std::future::Future;
use std::time::Duration;

use ltrpolicy_core::{AppError, AppResult};
use tokio::time::Instant;

/// Default bound for create and update operations.
pub const DEFAULT_CREATE_UPDATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Default bound for read operations.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default bound for delete operations.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Horizon used when a requested duration overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Point in time after which a blocking operation gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Creates a deadline that expires after the given duration.
    ///
    /// Durations past what the clock can represent are capped at roughly
    /// thirty years.
    #[must_use]
    pub fn after(duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            expires_at: now
                .checked_add(duration)
                .unwrap_or_else(|| now + FAR_FUTURE),
        }
    }

    /// Returns the time left, zero once elapsed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Returns whether the deadline has passed.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Runs a future to completion unless the deadline passes first.
    pub async fn run<T, F>(&self, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout_at(self.expires_at, future).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(
                "deadline elapsed before the operation completed".to_owned(),
            )),
        }
    }
}

/// Per-lifecycle-step timeouts the host applies to each callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTimeouts {
    /// Bound for create.
    pub create: Duration,
    /// Bound for read and import.
    pub read: Duration,
    /// Bound for update.
    pub update: Duration,
    /// Bound for delete.
    pub delete: Duration,
}

impl ResourceTimeouts {
    /// Deadline for a create starting now.
    #[must_use]
    pub fn create_deadline(&self) -> Deadline {
        Deadline::after(self.create)
    }

    /// Deadline for a read starting now.
    #[must_use]
    pub fn read_deadline(&self) -> Deadline {
        Deadline::after(self.read)
    }

    /// Deadline for an update starting now.
    #[must_use]
    pub fn update_deadline(&self) -> Deadline {
        Deadline::after(self.update)
    }

    /// Deadline for a delete starting now.
    #[must_use]
    pub fn delete_deadline(&self) -> Deadline {
        Deadline::after(self.delete)
    }
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_CREATE_UPDATE_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
            update: DEFAULT_CREATE_UPDATE_TIMEOUT,
            delete: DEFAULT_DELETE_TIMEOUT,
        }
    }
}
