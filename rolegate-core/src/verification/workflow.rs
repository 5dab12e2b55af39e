// File: rolegate-core/src/verification/workflow.rs

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use rolegate_common::models::verification::{
    ChallengeTicket, VerificationChallenge, VerificationKind, CODE_ALPHABET, CODE_LENGTH,
};

use super::store::VerificationStore;

/// Random `<prefix><8 chars>` code for `kind`. Collisions are possible and not checked.
pub fn generate_code(kind: VerificationKind) -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(kind.code_prefix().len() + CODE_LENGTH);
    code.push_str(kind.code_prefix());
    for _ in 0..CODE_LENGTH {
        let idx = rng.random_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }
    code
}

/// Code-in-profile ownership proof for one verification kind.
///
/// The requester is handed a code, puts it in the public "About" text of the
/// account they claim, then runs the command again. The split between
/// `request_challenge` and `check_challenge` follows that round trip.
pub struct VerificationWorkflow {
    store: Arc<VerificationStore>,
}

impl VerificationWorkflow {
    pub fn new(store: Arc<VerificationStore>) -> Self {
        Self { store }
    }

    pub fn kind(&self) -> VerificationKind {
        self.store.kind()
    }

    pub fn store(&self) -> &Arc<VerificationStore> {
        &self.store
    }

    /// Returns the live code for this requester/account pair, or issues a new
    /// one. A live code bound to a different account is replaced.
    pub async fn request_challenge(
        &self,
        requester_id: &str,
        claimed_account_id: u64,
        claimed_account_label: &str,
    ) -> ChallengeTicket {
        let now = self.store.clock().now();

        if let Some(existing) = self.store.get(requester_id).await {
            if existing.is_live_at(now) && existing.claimed_account_id == claimed_account_id {
                debug!(
                    "Reusing {} code for requester {} -> account {}",
                    self.kind(),
                    requester_id,
                    claimed_account_id
                );
                return ChallengeTicket {
                    code: existing.code.clone(),
                    is_new: false,
                    minutes_remaining: existing.minutes_remaining_at(now),
                };
            }
        }

        let challenge = VerificationChallenge {
            code: generate_code(self.kind()),
            issued_at: now,
            claimed_account_id,
            claimed_account_label: claimed_account_label.to_string(),
            verified: false,
        };
        let ticket = ChallengeTicket {
            code: challenge.code.clone(),
            is_new: true,
            minutes_remaining: challenge.minutes_remaining_at(now),
        };
        self.store.put(requester_id, challenge).await;
        ticket
    }

    /// True iff a live challenge exists and `profile_text` contains its code
    /// verbatim. An expired challenge found here is removed.
    pub async fn check_challenge(&self, requester_id: &str, profile_text: &str) -> bool {
        let Some(challenge) = self.store.get(requester_id).await else {
            return false;
        };

        if !challenge.is_live_at(self.store.clock().now()) {
            self.store.delete(requester_id).await;
            return false;
        }

        profile_text.contains(&challenge.code)
    }

    /// Removes and returns the challenge once ownership is proven, so the same
    /// code can never back a second grant.
    pub async fn consume_on_success(&self, requester_id: &str) -> Option<VerificationChallenge> {
        let mut challenge = self.store.delete(requester_id).await?;
        challenge.verified = true;
        info!(
            "{}-access verified: Discord {} -> Roblox {} ({})",
            self.kind(),
            requester_id,
            challenge.claimed_account_label,
            challenge.claimed_account_id
        );
        Some(challenge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::test_utils::helpers::{ManualClock, MemoryPersistence};

    fn workflow(kind: VerificationKind) -> (VerificationWorkflow, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = VerificationStore::new(kind, Arc::new(MemoryPersistence::default()), clock.clone());
        (VerificationWorkflow::new(Arc::new(store)), clock)
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_code(VerificationKind::Full);
        let suffix = code.strip_prefix("VERIFY-FULL-").expect("kind prefix");
        assert_eq!(suffix.len(), CODE_LENGTH);
        assert!(suffix.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_same_account_gets_same_code() {
        let (wf, clock) = workflow(VerificationKind::Full);

        let first = wf.request_challenge("A", 555, "Zed").await;
        assert!(first.is_new);
        assert_eq!(first.minutes_remaining, 10);

        clock.advance(Duration::seconds(60));
        let second = wf.request_challenge("A", 555, "Zed").await;
        assert_eq!(second.code, first.code);
        assert!(!second.is_new);
        assert_eq!(second.minutes_remaining, 9);
    }

    #[tokio::test]
    async fn test_other_account_replaces_code() {
        let (wf, _clock) = workflow(VerificationKind::Half);

        let old = wf.request_challenge("A", 555, "Zed").await;
        let new = wf.request_challenge("A", 777, "Amy").await;
        assert!(new.is_new);

        let stored = wf.store().get("A").await.unwrap();
        assert_eq!(stored.claimed_account_id, 777);
        assert_ne!(old.code, new.code);
        assert!(!wf.check_challenge("A", &format!("my bio {}", old.code)).await);
        assert!(wf.check_challenge("A", &format!("my bio {}", new.code)).await);
    }

    #[tokio::test]
    async fn test_expired_code_never_verifies() {
        let (wf, clock) = workflow(VerificationKind::Full);
        let ticket = wf.request_challenge("A", 555, "Zed").await;

        clock.advance(Duration::minutes(10));
        assert!(!wf.check_challenge("A", &ticket.code).await);
        // and it was purged on detection
        assert!(wf.store().get("A").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_is_reissued() {
        let (wf, clock) = workflow(VerificationKind::Full);
        wf.request_challenge("A", 555, "Zed").await;
        clock.advance(Duration::minutes(11));

        let second = wf.request_challenge("A", 555, "Zed").await;
        assert!(second.is_new);
        assert_eq!(second.minutes_remaining, 10);
    }

    #[tokio::test]
    async fn test_match_is_literal_and_case_sensitive() {
        let (wf, _clock) = workflow(VerificationKind::Full);
        let ticket = wf.request_challenge("A", 555, "Zed").await;

        assert!(!wf.check_challenge("A", "").await);
        assert!(!wf.check_challenge("A", &ticket.code.to_lowercase()).await);
        assert!(wf.check_challenge("A", &format!("hello\n{}\nbye", ticket.code)).await);
        assert!(!wf.check_challenge("nobody", &ticket.code).await);
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let (wf, _clock) = workflow(VerificationKind::Half);
        let ticket = wf.request_challenge("A", 555, "Zed").await;
        assert!(wf.check_challenge("A", &ticket.code).await);

        let consumed = wf.consume_on_success("A").await.expect("first consume");
        assert!(consumed.verified);
        assert_eq!(consumed.code, ticket.code);

        assert!(wf.consume_on_success("A").await.is_none());
        assert!(!wf.check_challenge("A", &ticket.code).await);
    }
}
