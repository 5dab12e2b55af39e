// File: rolegate-core/src/services/discord/slashcommands/mod.rs

pub mod access;
pub mod check_inventory;

use std::sync::Arc;

use twilight_http::Client as HttpClient;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::id::marker::ApplicationMarker;
use twilight_model::id::Id;
use tracing::info;

use rolegate_common::error::Error;
use rolegate_common::models::access::AccessTier;

use crate::services::discord::member_api::snowflake;

pub const USERNAME_OPTION: &str = "username";

/// Every command the bot answers: one per tier plus `check-inventory`.
pub fn build_commands(tiers: &[AccessTier]) -> Vec<Command> {
    let mut commands: Vec<Command> = tiers.iter().map(access::create_access_command).collect();
    commands.push(check_inventory::create_check_inventory_command());
    commands
}

/// Overwrites the guild's command set.
pub async fn register_guild_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    guild_id: u64,
    tiers: &[AccessTier],
) -> Result<(), Error> {
    let commands = build_commands(tiers);

    http.interaction(application_id)
        .set_guild_commands(snowflake(guild_id, "guild")?, &commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register guild slash commands: {e}")))?;

    info!("Registered {} slash commands in guild {}", commands.len(), guild_id);
    Ok(())
}

/// The trimmed `username` option, if present and non-empty.
pub fn username_option(command: &CommandData) -> Option<String> {
    command
        .options
        .iter()
        .find(|opt| opt.name == USERNAME_OPTION)
        .and_then(|opt| match &opt.value {
            CommandOptionValue::String(value) => Some(value.trim().to_string()),
            _ => None,
        })
        .filter(|value| !value.is_empty())
}
