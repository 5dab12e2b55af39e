// File: rolegate-core/src/test_utils/helpers.rs

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use rolegate_common::error::Error;
use rolegate_common::models::verification::VerificationChallenge;
use rolegate_common::traits::clock::Clock;
use rolegate_common::traits::repository_traits::ChallengePersistence;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now = *now + by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2025-01-01T12:00:00Z
        Self::at(DateTime::from_timestamp(1_735_732_800, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Keeps the last saved snapshot in memory. `failing()` makes every call error.
#[derive(Default)]
pub struct MemoryPersistence {
    data: Mutex<HashMap<String, VerificationChallenge>>,
    saves: AtomicUsize,
    fail: bool,
}

impl MemoryPersistence {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn seed(&self, snapshot: HashMap<String, VerificationChallenge>) {
        *self.data.lock().unwrap_or_else(|p| p.into_inner()) = snapshot;
    }

    pub fn snapshot(&self) -> HashMap<String, VerificationChallenge> {
        self.data.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengePersistence for MemoryPersistence {
    async fn load(&self) -> Result<HashMap<String, VerificationChallenge>, Error> {
        if self.fail {
            return Err(Error::Io(std::io::Error::other("memory persistence set to fail")));
        }
        Ok(self.snapshot())
    }

    async fn save(&self, snapshot: &HashMap<String, VerificationChallenge>) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Io(std::io::Error::other("memory persistence set to fail")));
        }
        self.seed(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
