use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use rolegate_common::error::Error;
use rolegate_common::models::verification::{VerificationChallenge, VerificationKind};
use rolegate_common::traits::repository_traits::ChallengePersistence;

/// Stores one verification map as a pretty-printed JSON object,
/// `{ "<requester id>": { code, issuedAt, ... } }`.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/discord_verification_map_<kind>.json`
    pub fn for_kind(data_dir: &Path, kind: VerificationKind) -> Self {
        Self::new(data_dir.join(kind.store_file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ChallengePersistence for JsonFilePersistence {
    async fn load(&self) -> Result<HashMap<String, VerificationChallenge>, Error> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No verification map at {}, starting new", self.path.display());
                return Ok(HashMap::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(serde_json::from_str(&data)?)
    }

    async fn save(&self, snapshot: &HashMap<String, VerificationChallenge>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_string_pretty(snapshot)?;

        // a crash mid-write leaves the previous snapshot in place
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> HashMap<String, VerificationChallenge> {
        let mut map = HashMap::new();
        map.insert(
            "123456789".to_string(),
            VerificationChallenge {
                code: "VERIFY-FULL-Q1W2E3R4".into(),
                issued_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
                claimed_account_id: 555,
                claimed_account_label: "Zed".into(),
                verified: false,
            },
        );
        map
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("nope.json"));
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::for_kind(&dir.path().join("data"), VerificationKind::Full);
        persistence.save(&sample()).await.unwrap();

        let raw = std::fs::read_to_string(persistence.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["123456789"]["code"], "VERIFY-FULL-Q1W2E3R4");
        assert_eq!(value["123456789"]["claimedAccountId"], 555);
        assert!(value["123456789"]["issuedAt"].is_i64());

        assert_eq!(persistence.load().await.unwrap(), sample());
        assert!(persistence.path().ends_with("discord_verification_map_full.json"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let persistence = JsonFilePersistence::new(path);
        assert!(matches!(persistence.load().await, Err(Error::Json(_))));
    }
}
