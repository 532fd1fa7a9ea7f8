//! Per-profile mutual exclusion
//!
//! A browser profile directory may only be opened by one session at a time.
//! Workers hold the guard for their user's profile key for the whole job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other job holds the lock for `key`.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on can go
            locks.retain(|held, lock| held == key || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        lock.lock_owned().await
    }

    /// Number of keys with a held or awaited lock
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire("U1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("U1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire("U1").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("U2"))
            .await
            .expect("U2 should not wait on U1");
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = UserLocks::new();
        drop(locks.acquire("U1").await);
        drop(locks.acquire("U2").await);
        let _c = locks.acquire("U3").await;
        assert_eq!(locks.tracked(), 1);
    }
}
