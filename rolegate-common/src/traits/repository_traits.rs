use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Error;
use crate::models::verification::VerificationChallenge;

/// Durable backing for one verification store. The whole map is written on
/// every save; there is no partial update.
#[async_trait]
pub trait ChallengePersistence: Send + Sync {
    /// Everything persisted, expired entries included. An absent backing
    /// file is an empty map, not an error.
    async fn load(&self) -> Result<HashMap<String, VerificationChallenge>, Error>;

    async fn save(&self, snapshot: &HashMap<String, VerificationChallenge>) -> Result<(), Error>;
}
