// File: rolegate-core/src/services/discord/slashcommands/check_inventory.rs

use async_trait::async_trait;
use tracing::{debug, info, warn};
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::Embed;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use rolegate_common::error::Error;
use rolegate_common::models::inventory::ScanProgress;

use crate::config::CHECK_INVENTORY_COMMAND;
use crate::inventory::ScanObserver;
use crate::presenter::{AdvanceRejected, PresentationSession};
use crate::services::discord::embeds::{
    empty_inventory_embed, inventory_page_embed, not_found_embed, pagination_controls, parse_custom_id,
    progress_embed, system_error_embed, InventoryView,
};
use crate::services::discord::router::InteractionRouter;
use crate::services::inventory_service::InventoryLookup;

use super::{username_option, USERNAME_OPTION};

const NOT_YOURS: &str = "❌ These buttons aren't for you!";
const EXPIRED: &str = "⌛ This inventory view has expired. Run /check-inventory again.";

pub fn create_check_inventory_command() -> Command {
    CommandBuilder::new(
        CHECK_INVENTORY_COMMAND,
        "Check what items are in a user's inventory",
        CommandType::ChatInput,
    )
    .option(StringBuilder::new(USERNAME_OPTION, "Roblox username to check").required(true))
    .build()
}

/// Rewrites the deferred reply with scan progress.
struct ProgressEditor<'a> {
    router: &'a InteractionRouter,
    token: &'a str,
    username: &'a str,
}

#[async_trait]
impl ScanObserver for ProgressEditor<'_> {
    async fn on_progress(&self, progress: &ScanProgress) {
        let embed = progress_embed(self.username, progress);
        if let Err(e) = self.router.edit_original(self.token, &[embed], None).await {
            warn!("Could not post scan progress for {}: {}", self.username, e);
        }
    }
}

pub async fn handle_check_inventory(
    router: &InteractionRouter,
    interaction: &Interaction,
    command: &CommandData,
) -> Result<(), Error> {
    router.defer(interaction).await?;

    let username = username_option(command).unwrap_or_default();
    let Some(owner) = interaction.author_id() else {
        let embed = system_error_embed(&username, "Could not tell who ran this command.");
        return router.edit_original(&interaction.token, &[embed], None).await;
    };

    let observer = ProgressEditor {
        router,
        token: &interaction.token,
        username: &username,
    };
    let (account, scan) = match router.inventory.lookup(&username, Some(&observer)).await {
        Ok(InventoryLookup::Scanned { account, scan }) => (account, scan),
        Ok(InventoryLookup::NotFound { username }) => {
            return router
                .edit_original(&interaction.token, &[not_found_embed(&username)], None)
                .await;
        }
        Err(e) => {
            warn!("Inventory scan for {:?} failed: {}", username, e);
            let embed = system_error_embed(&username, &e.to_string());
            return router.edit_original(&interaction.token, &[embed], Some(&[])).await;
        }
    };

    let headshot = router.headshot(account.account_id).await;
    let view = InventoryView::from_scan(owner.get(), account, headshot, interaction.token.clone(), &scan);

    if scan.items.is_empty() {
        let embed = empty_inventory_embed(&view, &scan.categories_succeeded);
        return router.edit_original(&interaction.token, &[embed], Some(&[])).await;
    }

    info!(
        "{} items found for {} across {} categories",
        scan.items.len(),
        view.account.username,
        scan.categories_succeeded.len()
    );

    let session = PresentationSession::new(view.owner_id, scan.items, router.clock.now());
    let page = session.current();
    let embed = inventory_page_embed(&view, &page);
    let session_id = router.sessions.open(session, view);
    let controls = pagination_controls(session_id, &page);

    router
        .edit_original(&interaction.token, &[embed], Some(&controls))
        .await
}

/// Back/Next on an inventory message.
pub async fn handle_page_button(
    router: &InteractionRouter,
    interaction: &Interaction,
    custom_id: &str,
) -> Result<(), Error> {
    let Some((direction, session_id)) = parse_custom_id(custom_id) else {
        debug!("Ignoring component {:?}", custom_id);
        return Ok(());
    };
    let actor = interaction.author_id().map(|id| id.get()).unwrap_or_default();

    match router.sessions.advance(session_id, actor, direction, router.clock.now()) {
        Ok((page, mut view)) => {
            view.token = interaction.token.clone();
            let token = view.token.clone();
            router.sessions.update_context(session_id, |ctx| ctx.token = token);

            let embed = inventory_page_embed(&view, &page);
            let controls = pagination_controls(session_id, &page);
            router.update_message(interaction, vec![embed], controls).await
        }
        Err(AdvanceRejected::NotOwner) => router.reply_ephemeral(interaction, NOT_YOURS).await,
        Err(AdvanceRejected::Expired | AdvanceRejected::Unknown) => {
            let embeds: Vec<Embed> = interaction
                .message
                .as_ref()
                .map(|m| m.embeds.clone())
                .unwrap_or_default();
            router.update_message(interaction, embeds, Vec::new()).await?;
            router.followup_ephemeral(&interaction.token, EXPIRED).await
        }
    }
}
