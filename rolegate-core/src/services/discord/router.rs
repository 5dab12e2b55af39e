// File: rolegate-core/src/services/discord/router.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::component::Component;
use twilight_model::channel::message::{Embed, MessageFlags};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType};
use twilight_model::id::marker::ApplicationMarker;
use twilight_model::id::Id;

use rolegate_common::error::Error;
use rolegate_common::models::access::AccessTier;
use rolegate_common::traits::api::GamePlatformClient;
use rolegate_common::traits::clock::Clock;

use crate::config::CHECK_INVENTORY_COMMAND;
use crate::platforms::discord::InteractionHandler;
use crate::presenter::SessionRegistry;
use crate::services::discord::embeds::InventoryView;
use crate::services::discord::slashcommands::{access, check_inventory};
use crate::services::{AccessService, InventoryService};

/// Dispatches slash commands and pagination buttons, and owns the REST
/// helpers they answer through.
pub struct InteractionRouter {
    pub(crate) http: Arc<HttpClient>,
    pub(crate) application_id: Id<ApplicationMarker>,
    pub(crate) access: Arc<AccessService>,
    pub(crate) inventory: Arc<InventoryService>,
    pub(crate) platform: Arc<dyn GamePlatformClient>,
    pub(crate) tiers: Vec<AccessTier>,
    pub(crate) sessions: Arc<SessionRegistry<InventoryView>>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl InteractionRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: Arc<HttpClient>,
        application_id: Id<ApplicationMarker>,
        access: Arc<AccessService>,
        inventory: Arc<InventoryService>,
        platform: Arc<dyn GamePlatformClient>,
        tiers: Vec<AccessTier>,
        sessions: Arc<SessionRegistry<InventoryView>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            application_id,
            access,
            inventory,
            platform,
            tiers,
            sessions,
            clock,
        }
    }

    async fn respond(&self, interaction: &Interaction, response: InteractionResponse) -> Result<(), Error> {
        self.http
            .interaction(self.application_id)
            .create_response(interaction.id, &interaction.token, &response)
            .await
            .map_err(|e| Error::Platform(format!("Error responding to interaction: {e}")))?;
        Ok(())
    }

    /// Acknowledges now, answers later through `edit_original`.
    pub(crate) async fn defer(&self, interaction: &Interaction) -> Result<(), Error> {
        self.respond(
            interaction,
            InteractionResponse {
                kind: InteractionResponseType::DeferredChannelMessageWithSource,
                data: None,
            },
        )
        .await
    }

    pub(crate) async fn edit_original(
        &self,
        token: &str,
        embeds: &[Embed],
        components: Option<&[Component]>,
    ) -> Result<(), Error> {
        let client = self.http.interaction(self.application_id);
        let mut update = client.update_response(token).content(None).embeds(Some(embeds));
        if let Some(components) = components {
            update = update.components(Some(components));
        }
        update
            .await
            .map_err(|e| Error::Platform(format!("Error editing interaction response: {e}")))?;
        Ok(())
    }

    /// Strips the buttons from a message, leaving its embed in place.
    pub(crate) async fn remove_controls(&self, token: &str) -> Result<(), Error> {
        let none: &[Component] = &[];
        self.http
            .interaction(self.application_id)
            .update_response(token)
            .components(Some(none))
            .await
            .map_err(|e| Error::Platform(format!("Error removing buttons: {e}")))?;
        Ok(())
    }

    pub(crate) async fn reply_ephemeral(&self, interaction: &Interaction, text: &str) -> Result<(), Error> {
        self.respond(
            interaction,
            InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    content: Some(text.to_string()),
                    flags: Some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            },
        )
        .await
    }

    pub(crate) async fn followup_ephemeral(&self, token: &str, text: &str) -> Result<(), Error> {
        self.http
            .interaction(self.application_id)
            .create_followup(token)
            .content(text)
            .flags(MessageFlags::EPHEMERAL)
            .await
            .map_err(|e| Error::Platform(format!("Error sending followup: {e}")))?;
        Ok(())
    }

    /// Replaces the message a button sits on.
    pub(crate) async fn update_message(
        &self,
        interaction: &Interaction,
        embeds: Vec<Embed>,
        components: Vec<Component>,
    ) -> Result<(), Error> {
        self.respond(
            interaction,
            InteractionResponse {
                kind: InteractionResponseType::UpdateMessage,
                data: Some(InteractionResponseData {
                    embeds: Some(embeds),
                    components: Some(components),
                    ..Default::default()
                }),
            },
        )
        .await
    }

    /// Avatar headshot, or `None` if it cannot be fetched.
    pub(crate) async fn headshot(&self, account_id: u64) -> Option<String> {
        match self.platform.get_avatar_headshot_url(account_id).await {
            Ok(url) => url,
            Err(e) => {
                debug!("No headshot for {}: {}", account_id, e);
                None
            }
        }
    }

    /// Drops idle inventory sessions and removes their buttons. Returns how
    /// many were dropped.
    pub async fn sweep_sessions(&self) -> usize {
        let expired = self.sessions.purge_expired(self.clock.now());
        for (id, view) in &expired {
            if let Err(e) = self.remove_controls(&view.token).await {
                // interaction tokens die after 15 minutes
                debug!("Could not disable buttons of session {}: {}", id, e);
            }
        }
        expired.len()
    }
}

#[async_trait]
impl InteractionHandler for InteractionRouter {
    async fn handle_interaction(&self, interaction: Interaction) {
        let result = match &interaction.data {
            Some(InteractionData::ApplicationCommand(command)) => {
                let name = command.name.as_str();
                if name == CHECK_INVENTORY_COMMAND {
                    check_inventory::handle_check_inventory(self, &interaction, command).await
                } else if let Some(tier) = self.tiers.iter().find(|t| t.command_name == name) {
                    access::handle_access_command(self, tier, &interaction, command).await
                } else {
                    self.reply_ephemeral(&interaction, &format!("Unrecognized command: {name}"))
                        .await
                }
            }
            Some(InteractionData::MessageComponent(component)) => {
                check_inventory::handle_page_button(self, &interaction, &component.custom_id).await
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            warn!("Dropped response for interaction {}: {}", interaction.id, e);
        }
    }
}
