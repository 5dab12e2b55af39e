// File: rolegate-core/src/services/discord/slashcommands/access.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::application::interaction::Interaction;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use rolegate_common::error::Error;
use rolegate_common::models::access::{AccessRequest, AccessTier};

use crate::services::discord::embeds::{outcome_embed, system_error_embed};
use crate::services::discord::router::InteractionRouter;

use super::{username_option, USERNAME_OPTION};

pub fn create_access_command(tier: &AccessTier) -> Command {
    CommandBuilder::new(tier.command_name.as_str(), tier.description.as_str(), CommandType::ChatInput)
        .option(StringBuilder::new(USERNAME_OPTION, "Your Roblox username").required(true))
        .build()
}

/// `/<tier> username:<name>`
pub async fn handle_access_command(
    router: &InteractionRouter,
    tier: &AccessTier,
    interaction: &Interaction,
    command: &CommandData,
) -> Result<(), Error> {
    router.defer(interaction).await?;

    let username = username_option(command).unwrap_or_default();
    let (Some(guild_id), Some(user_id)) = (interaction.guild_id, interaction.author_id()) else {
        let embed = system_error_embed(&username, "This command can only be used inside the server.");
        return router.edit_original(&interaction.token, &[embed], None).await;
    };

    let request = AccessRequest {
        requester_id: user_id.get(),
        guild_id: guild_id.get(),
        member_role_ids: interaction
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default(),
        username,
    };

    let outcome = router.access.request_access(tier, &request).await;
    let headshot = match outcome.account() {
        Some(account) => router.headshot(account.account_id).await,
        None => None,
    };

    let embed = outcome_embed(tier, request.requester_id, &outcome, headshot.as_deref());
    router.edit_original(&interaction.token, &[embed], None).await
}
