// File: rolegate-core/src/services/access_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use rolegate_common::error::Error;
use rolegate_common::models::access::{
    AccessOutcome, AccessRequest, AccessTier, MissingRequirement, RankUpdate, Requirement,
};
use rolegate_common::models::inventory::ScanResult;
use rolegate_common::models::roblox::{AccountRef, PlayerProfile};
use rolegate_common::models::verification::VerificationKind;
use rolegate_common::traits::api::{GamePlatformClient, GuildMemberApi};

use crate::inventory::InventoryScanner;
use crate::verification::VerificationWorkflow;

/// Runs one verification-gated command from username to role grant.
pub struct AccessService {
    platform: Arc<dyn GamePlatformClient>,
    members: Arc<dyn GuildMemberApi>,
    workflows: HashMap<VerificationKind, Arc<VerificationWorkflow>>,
    scanner: Arc<InventoryScanner>,
    group_id: Option<u64>,
}

impl AccessService {
    pub fn new(
        platform: Arc<dyn GamePlatformClient>,
        members: Arc<dyn GuildMemberApi>,
        workflows: impl IntoIterator<Item = Arc<VerificationWorkflow>>,
        scanner: Arc<InventoryScanner>,
        group_id: Option<u64>,
    ) -> Self {
        Self {
            platform,
            members,
            workflows: workflows.into_iter().map(|wf| (wf.kind(), wf)).collect(),
            scanner,
            group_id,
        }
    }

    pub fn workflow(&self, kind: VerificationKind) -> Option<&Arc<VerificationWorkflow>> {
        self.workflows.get(&kind)
    }

    /// Produces exactly one outcome. Errors from any step become `SystemError`.
    pub async fn request_access(&self, tier: &AccessTier, request: &AccessRequest) -> AccessOutcome {
        match self.run(tier, request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "{} failed for Discord user {} (username {:?}): {}",
                    tier.command_name, request.requester_id, request.username, e
                );
                AccessOutcome::SystemError {
                    username: request.username.trim().to_string(),
                    detail: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, tier: &AccessTier, request: &AccessRequest) -> Result<AccessOutcome, Error> {
        let username = request.username.trim();

        let account_id = match self.platform.resolve_username(username).await {
            Ok(Some(id)) => id,
            Ok(None) | Err(Error::NotFound(_)) => {
                info!("{}: no Roblox account named {:?}", tier.command_name, username);
                return Ok(AccessOutcome::NotFound {
                    username: username.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let requester = request.requester_id.to_string();
        let ticket = if tier.verify_ownership {
            let workflow = self.workflows.get(&tier.kind).ok_or_else(|| {
                Error::Config(format!("No verification store for {} access", tier.kind))
            })?;
            Some((workflow, workflow.request_challenge(&requester, account_id, username).await))
        } else {
            None
        };

        let profile = self.platform.get_profile(account_id).await?;
        let account = AccountRef {
            account_id,
            username: if profile.username.is_empty() {
                username.to_string()
            } else {
                profile.username.clone()
            },
        };

        if let Some((workflow, ticket)) = ticket {
            if !workflow.check_challenge(&requester, &profile.description).await {
                return Ok(AccessOutcome::ChallengeIssued { account, ticket });
            }
            workflow.consume_on_success(&requester).await;
        }

        let missing = self.evaluate(tier, &profile).await?;
        if !missing.is_empty() {
            info!(
                "{}: {} ({}) is missing {} requirement(s)",
                tier.command_name,
                account.username,
                account_id,
                missing.len()
            );
            return Ok(AccessOutcome::RequirementNotMet { account, missing });
        }

        let Some(role_name) = self.members.role_name(request.guild_id, tier.role_id).await? else {
            return Ok(AccessOutcome::SystemError {
                username: account.username,
                detail: format!("Role {} is not configured in this server", tier.role_id),
            });
        };

        if request.member_role_ids.contains(&tier.role_id) {
            return Ok(AccessOutcome::AlreadyHasRole { account, role_name });
        }

        self.members
            .add_role(request.guild_id, request.requester_id, tier.role_id)
            .await?;
        info!(
            "Gave {} role {} to Discord user {} (Roblox {} / {})",
            tier.kind, role_name, request.requester_id, account.username, account_id
        );

        let rank = self.update_rank(tier, account_id).await;
        Ok(AccessOutcome::Granted {
            account,
            role_name,
            rank,
        })
    }

    /// Every unmet requirement, in declaration order.
    async fn evaluate(
        &self,
        tier: &AccessTier,
        profile: &PlayerProfile,
    ) -> Result<Vec<MissingRequirement>, Error> {
        let mut missing = Vec::new();
        let mut worn: Option<Vec<u64>> = None;
        let mut owned: Vec<(&str, u64)> = Vec::new();

        for requirement in &tier.requirements {
            match requirement {
                Requirement::DisplayNameContains { text } => {
                    if !profile.display_name.contains(text.as_str()) {
                        missing.push(MissingRequirement::DisplayName { text: text.clone() });
                    }
                }
                Requirement::WearingAnyOf { label, asset_ids } => {
                    if worn.is_none() {
                        worn = Some(self.platform.get_current_worn_items(profile.account_id).await?);
                    }
                    let wearing = worn.as_deref().unwrap_or_default();
                    if !asset_ids.iter().any(|id| wearing.contains(id)) {
                        missing.push(MissingRequirement::NotWearing {
                            label: label.clone(),
                            asset_ids: asset_ids.clone(),
                        });
                    }
                }
                Requirement::OwnsAsset { category, asset_id } => {
                    owned.push((category.as_str(), *asset_id));
                }
            }
        }

        if !owned.is_empty() {
            let mut categories: Vec<&str> = Vec::new();
            for &(category, _) in &owned {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
            let scan = self.scanner.scan(profile.account_id, &categories, None).await?;
            missing.extend(
                owned
                    .into_iter()
                    .filter_map(|(category, asset_id)| ownership_gap(&scan, category, asset_id)),
            );
        }

        Ok(missing)
    }

    async fn update_rank(&self, tier: &AccessTier, account_id: u64) -> RankUpdate {
        let (Some(group_id), Some(role_id)) = (self.group_id, tier.group_role_id) else {
            return RankUpdate::NotConfigured;
        };

        match self.try_update_rank(group_id, role_id, account_id).await {
            Ok(update) => update,
            Err(e) => {
                warn!("Roblox ranking error for {} in group {}: {}", account_id, group_id, e);
                RankUpdate::Failed { reason: e.to_string() }
            }
        }
    }

    async fn try_update_rank(&self, group_id: u64, role_id: u64, account_id: u64) -> Result<RankUpdate, Error> {
        let bot_account = self.platform.get_current_bot_account_id().await?;
        if bot_account == account_id {
            info!("Skipped ranking for bot account {}", account_id);
            return Ok(RankUpdate::SkippedBotAccount);
        }

        match self.platform.get_group_rank(account_id, group_id).await? {
            None => Ok(RankUpdate::NotInGroup),
            Some(current) if current.role_id == role_id => Ok(RankUpdate::AlreadyAtRank),
            Some(_) => {
                self.platform.set_group_rank(account_id, group_id, role_id).await?;
                Ok(RankUpdate::Updated { role_id })
            }
        }
    }
}

/// Why `asset_id` counts as not owned, or `None` if it is owned.
fn ownership_gap(scan: &ScanResult, category: &str, asset_id: u64) -> Option<MissingRequirement> {
    if scan.owns(asset_id) {
        None
    } else if scan.was_restricted(category) {
        Some(MissingRequirement::InventoryPrivate {
            category: category.to_string(),
        })
    } else if scan.was_inconclusive(category) {
        Some(MissingRequirement::ScanInconclusive {
            category: category.to_string(),
            asset_id,
        })
    } else {
        Some(MissingRequirement::AssetNotOwned {
            category: category.to_string(),
            asset_id,
        })
    }
}
