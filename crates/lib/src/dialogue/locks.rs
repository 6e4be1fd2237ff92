//! Per-user serialization: messages from one user are handled one at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Idle entries are pruned once the map grows past this.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other message from `user` is being handled.
    pub async fn lock(&self, user: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() > PRUNE_THRESHOLD {
                map.retain(|_, l| Arc::strong_count(l) > 1);
            }
            map.entry(user.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_waits() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.lock("a").await;

        let l = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l.lock("a").await;
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!waiter.is_finished());

        // A different user is not blocked.
        let _other = locks.lock("b").await;

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(locks.len(), 2);
    }
}
