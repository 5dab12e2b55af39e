// File: rolegate-core/src/services/discord/member_api.rs

use std::sync::Arc;

use async_trait::async_trait;
use twilight_http::Client as HttpClient;
use twilight_model::id::Id;

use rolegate_common::error::Error;
use rolegate_common::traits::api::GuildMemberApi;

/// Non-zero raw id to a typed snowflake.
pub fn snowflake<T>(raw: u64, what: &str) -> Result<Id<T>, Error> {
    Id::new_checked(raw).ok_or_else(|| Error::Parse(format!("{what} id must be non-zero")))
}

/// Guild role access over the twilight REST client.
pub struct TwilightGuildMembers {
    http: Arc<HttpClient>,
}

impl TwilightGuildMembers {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GuildMemberApi for TwilightGuildMembers {
    async fn role_name(&self, guild_id: u64, role_id: u64) -> Result<Option<String>, Error> {
        let roles = self
            .http
            .roles(snowflake(guild_id, "guild")?)
            .await
            .map_err(|e| Error::Platform(format!("Error fetching guild roles: {e}")))?
            .models()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing guild roles: {e}")))?;

        Ok(roles
            .into_iter()
            .find(|role| role.id.get() == role_id)
            .map(|role| role.name))
    }

    async fn add_role(&self, guild_id: u64, user_id: u64, role_id: u64) -> Result<(), Error> {
        self.http
            .add_guild_member_role(
                snowflake(guild_id, "guild")?,
                snowflake(user_id, "user")?,
                snowflake(role_id, "role")?,
            )
            .await
            .map_err(|e| Error::Platform(format!("Error adding role {role_id} to {user_id}: {e}")))?;
        Ok(())
    }
}
