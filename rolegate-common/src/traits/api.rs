use async_trait::async_trait;
use mockall::automock;

use crate::error::Error;
use crate::models::inventory::{InventoryItem, SortOrder};
use crate::models::roblox::{GroupMembership, PlayerProfile};

/// The game-platform calls the bot depends on.
///
/// Implementations classify failures into `Error::Forbidden`,
/// `Error::BadRequest` and `Error::RateLimited` where the platform reports
/// those conditions, and normalize response shapes before returning.
#[automock]
#[async_trait]
pub trait GamePlatformClient: Send + Sync {
    /// `Ok(None)` when no account has this username.
    async fn resolve_username(&self, username: &str) -> Result<Option<u64>, Error>;

    async fn get_profile(&self, account_id: u64) -> Result<PlayerProfile, Error>;

    /// One page of the `category` section of an account's inventory.
    async fn get_inventory_page(
        &self,
        account_id: u64,
        category: &str,
        sort_order: SortOrder,
        limit: u32,
    ) -> Result<Vec<InventoryItem>, Error>;

    /// Asset ids of what the avatar is wearing right now.
    async fn get_current_worn_items(&self, account_id: u64) -> Result<Vec<u64>, Error>;

    /// `Ok(None)` when the account is not a member of the group.
    async fn get_group_rank(&self, account_id: u64, group_id: u64) -> Result<Option<GroupMembership>, Error>;

    async fn set_group_rank(&self, account_id: u64, group_id: u64, role_id: u64) -> Result<(), Error>;

    /// Account the bot itself is logged in as.
    async fn get_current_bot_account_id(&self) -> Result<u64, Error>;

    async fn get_avatar_headshot_url(&self, account_id: u64) -> Result<Option<String>, Error>;
}

/// Guild role lookups and mutation, as needed by the access flow.
#[automock]
#[async_trait]
pub trait GuildMemberApi: Send + Sync {
    /// Name of `role_id` in the guild, `None` if the guild has no such role.
    async fn role_name(&self, guild_id: u64, role_id: u64) -> Result<Option<String>, Error>;

    async fn add_role(&self, guild_id: u64, user_id: u64, role_id: u64) -> Result<(), Error>;
}
