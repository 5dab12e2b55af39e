use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an issued code stays live.
pub const CHALLENGE_TIMEOUT_SECS: i64 = 10 * 60;

/// Alphabet the random part of a code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters after the kind prefix.
pub const CODE_LENGTH: usize = 8;

pub fn challenge_timeout() -> Duration {
    Duration::seconds(CHALLENGE_TIMEOUT_SECS)
}

/// Access tier being verified. Each kind has its own code prefix and its own
/// persisted store, so codes never collide across tiers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerificationKind {
    Free,
    Half,
    Full,
}

impl VerificationKind {
    pub const ALL: [VerificationKind; 3] = [
        VerificationKind::Free,
        VerificationKind::Half,
        VerificationKind::Full,
    ];

    pub fn code_prefix(&self) -> &'static str {
        match self {
            VerificationKind::Free => "FREE-VERIFY-",
            VerificationKind::Half => "HALF-VERIFY-",
            VerificationKind::Full => "VERIFY-FULL-",
        }
    }

    /// File name of the persisted map for this kind.
    pub fn store_file_name(&self) -> String {
        format!("discord_verification_map_{}.json", self)
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationKind::Free => write!(f, "free"),
            VerificationKind::Half => write!(f, "half"),
            VerificationKind::Full => write!(f, "full"),
        }
    }
}

impl FromStr for VerificationKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(VerificationKind::Free),
            "half" => Ok(VerificationKind::Half),
            "full" => Ok(VerificationKind::Full),
            _ => Err(format!("Unknown verification kind: {}", s)),
        }
    }
}

/// A pending challenge, keyed by requester id in the store.
///
/// Serialized field names match the on-disk map format:
/// `{code, issuedAt, claimedAccountId, claimedAccountLabel, verified}` with
/// `issuedAt` in epoch milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChallenge {
    pub code: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
    pub claimed_account_id: u64,
    pub claimed_account_label: String,
    #[serde(default)]
    pub verified: bool,
}

impl VerificationChallenge {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at < challenge_timeout()
    }

    /// Whole minutes left before expiry, rounded up.
    pub fn minutes_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        let left_ms = (challenge_timeout() - (now - self.issued_at)).num_milliseconds();
        if left_ms <= 0 {
            return 0;
        }
        (left_ms + 59_999) / 60_000
    }
}

/// What the requester is told after asking for a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTicket {
    pub code: String,
    pub is_new: bool,
    pub minutes_remaining: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn challenge_at(issued_at: DateTime<Utc>) -> VerificationChallenge {
        VerificationChallenge {
            code: "VERIFY-FULL-ABC12345".into(),
            issued_at,
            claimed_account_id: 555,
            claimed_account_label: "Zed".into(),
            verified: false,
        }
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let ch = challenge_at(t0);
        assert_eq!(ch.minutes_remaining_at(t0), 10);
        assert_eq!(ch.minutes_remaining_at(t0 + Duration::seconds(60)), 9);
        assert_eq!(ch.minutes_remaining_at(t0 + Duration::seconds(61)), 9);
        assert_eq!(ch.minutes_remaining_at(t0 + Duration::seconds(599)), 1);
        assert_eq!(ch.minutes_remaining_at(t0 + Duration::seconds(600)), 0);
    }

    #[test]
    fn test_liveness_boundary() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let ch = challenge_at(t0);
        assert!(ch.is_live_at(t0 + Duration::seconds(599)));
        assert!(!ch.is_live_at(t0 + Duration::seconds(600)));
    }

    #[test]
    fn test_serialized_shape() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let value = serde_json::to_value(challenge_at(t0)).unwrap();
        assert_eq!(value["claimedAccountId"], 555);
        assert_eq!(value["claimedAccountLabel"], "Zed");
        assert_eq!(value["issuedAt"], t0.timestamp_millis());
        assert_eq!(value["verified"], false);
    }

    #[test]
    fn test_kind_prefixes_are_distinct() {
        let prefixes: Vec<&str> = VerificationKind::ALL.iter().map(|k| k.code_prefix()).collect();
        assert_eq!(prefixes, vec!["FREE-VERIFY-", "HALF-VERIFY-", "VERIFY-FULL-"]);
        assert_eq!(VerificationKind::Half.store_file_name(), "discord_verification_map_half.json");
        assert_eq!("FULL".parse::<VerificationKind>(), Ok(VerificationKind::Full));
    }
}
