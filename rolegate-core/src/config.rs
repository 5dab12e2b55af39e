// File: rolegate-core/src/config.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rolegate_common::error::Error;
use rolegate_common::models::access::{AccessTier, Requirement};
use rolegate_common::models::verification::VerificationKind;

pub const CHECK_INVENTORY_COMMAND: &str = "check-inventory";

const VERIFICATION_SHIRT_ID: u64 = 8902806997;

/// Everything the bot needs at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub guild_id: u64,
    pub roblox_cookie: Option<String>,
    pub roblox_group_id: Option<u64>,
    pub data_dir: PathBuf,
    pub tiers: Vec<AccessTier>,
}

impl BotConfig {
    /// Reads `DISCORD_TOKEN`, `GUILD_ID`, `ROBLOX_COOKIE` and `ROBLOX_GROUP_ID`.
    pub fn from_env(data_dir: PathBuf, tiers: Vec<AccessTier>) -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok(), data_dir, tiers)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        data_dir: PathBuf,
        tiers: Vec<AccessTier>,
    ) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN")
            .ok_or_else(|| Error::Config("DISCORD_TOKEN is not set".into()))?;
        let guild_id = get("GUILD_ID")
            .ok_or_else(|| Error::Config("GUILD_ID is not set".into()))
            .and_then(|raw| parse_snowflake("GUILD_ID", &raw))?;
        let roblox_group_id = get("ROBLOX_GROUP_ID")
            .map(|raw| parse_snowflake("ROBLOX_GROUP_ID", &raw))
            .transpose()?;

        validate_tiers(&tiers)?;

        Ok(Self {
            discord_token,
            guild_id,
            roblox_cookie: get("ROBLOX_COOKIE"),
            roblox_group_id,
            data_dir,
            tiers,
        })
    }

    /// Group to rank verified accounts in. Ranking needs an authenticated
    /// session, so it is off without a cookie.
    pub fn ranking_group_id(&self) -> Option<u64> {
        self.roblox_group_id.filter(|_| self.roblox_cookie.is_some())
    }

    pub fn tier(&self, command_name: &str) -> Option<&AccessTier> {
        self.tiers.iter().find(|t| t.command_name == command_name)
    }
}

fn parse_snowflake(key: &str, raw: &str) -> Result<u64, Error> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::Config(format!("{key} must be a non-zero numeric id, got {raw:?}"))),
        Ok(id) => Ok(id),
    }
}

/// The three tiers the bot ships with.
pub fn default_tiers() -> Vec<AccessTier> {
    vec![
        AccessTier {
            kind: VerificationKind::Free,
            command_name: "free-access".into(),
            description: "Get free access by following the requirements and get your role!".into(),
            role_id: 1309964463943716894,
            group_role_id: None,
            verify_ownership: false,
            requirements: vec![
                Requirement::DisplayNameContains { text: "EOK".into() },
                Requirement::WearingAnyOf {
                    label: "required shirts".into(),
                    asset_ids: vec![17180786881, 17495684302],
                },
                Requirement::WearingAnyOf {
                    label: "required pants".into(),
                    asset_ids: vec![17452059275, 17495737611, 18658268290, 18658305143],
                },
            ],
            color: 0x00FF00,
        },
        AccessTier {
            kind: VerificationKind::Half,
            command_name: "half-access".into(),
            description: "Check if you own the half access shirt and get your role!".into(),
            role_id: 1309964460177363005,
            group_role_id: Some(101215367),
            verify_ownership: true,
            requirements: vec![Requirement::OwnsAsset {
                category: "Shirt".into(),
                asset_id: VERIFICATION_SHIRT_ID,
            }],
            color: 0xFFA500,
        },
        AccessTier {
            kind: VerificationKind::Full,
            command_name: "full-access".into(),
            description: "Check if you own the full access shirt and get your role!".into(),
            role_id: 1309964453403557920,
            group_role_id: Some(101215413),
            verify_ownership: true,
            requirements: vec![Requirement::OwnsAsset {
                category: "Shirt".into(),
                asset_id: VERIFICATION_SHIRT_ID,
            }],
            color: 0xFFFF00,
        },
    ]
}

/// Reads a JSON array of tiers.
pub fn load_tiers(path: &Path) -> Result<Vec<AccessTier>, Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read tier file {}: {e}", path.display())))?;
    let tiers: Vec<AccessTier> = serde_json::from_str(&raw)?;
    validate_tiers(&tiers)?;
    Ok(tiers)
}

/// Command names must be valid chat-input names and unique; each
/// verification kind is used at most once since kinds own a store.
pub fn validate_tiers(tiers: &[AccessTier]) -> Result<(), Error> {
    if tiers.is_empty() {
        return Err(Error::Config("At least one access tier is required".into()));
    }

    let mut names = HashSet::new();
    let mut kinds = HashSet::new();
    for tier in tiers {
        let name = tier.command_name.as_str();
        let valid_name = !name.is_empty()
            && name.len() <= 32
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid_name {
            return Err(Error::Config(format!("Invalid command name {name:?}")));
        }
        if name == CHECK_INVENTORY_COMMAND || !names.insert(name) {
            return Err(Error::Config(format!("Duplicate command name {name:?}")));
        }
        if !kinds.insert(tier.kind) {
            return Err(Error::Config(format!("Verification kind {} used by more than one tier", tier.kind)));
        }
        if tier.role_id == 0 {
            return Err(Error::Config(format!("{name}: role_id must be set")));
        }
        if tier.description.is_empty() || tier.description.chars().count() > 100 {
            return Err(Error::Config(format!("{name}: description must be 1-100 characters")));
        }
    }
    Ok(())
}
