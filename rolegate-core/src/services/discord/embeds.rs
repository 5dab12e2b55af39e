// File: rolegate-core/src/services/discord/embeds.rs

use std::str::FromStr;

use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder, ImageSource};
use uuid::Uuid;

use rolegate_common::models::access::{AccessOutcome, AccessTier, MissingRequirement, RankUpdate};
use rolegate_common::models::inventory::{ScanProgress, ScanResult};
use rolegate_common::models::roblox::AccountRef;

use crate::presenter::{Direction, Page};

pub const COLOR_ERROR: u32 = 0xFF0000;
pub const COLOR_INVENTORY: u32 = 0x0099FF;
pub const COLOR_PROGRESS: u32 = 0xFFFF00;

const BANNER_URL: &str = "https://i.ibb.co/mrRHYC1w/roblox-logo-q0l1nrm00k6r29kz.jpg";
const PRIVACY_URL: &str = "https://www.roblox.com/my/account#!/privacy";
const CUSTOM_ID_PREFIX: &str = "inventory";

// Discord caps a field value at 1024 characters.
const FIELD_LIMIT: usize = 1024;

/// What a pagination session needs to redraw its message.
#[derive(Debug, Clone)]
pub struct InventoryView {
    pub owner_id: u64,
    pub account: AccountRef,
    pub headshot: Option<String>,
    /// Latest interaction token that can edit the message.
    pub token: String,
    /// Categories that were read successfully.
    pub categories_scanned: usize,
    pub categories_invalid: Vec<String>,
    pub categories_rate_limited: Vec<String>,
    pub categories_restricted: Vec<String>,
}

impl InventoryView {
    pub fn from_scan(
        owner_id: u64,
        account: AccountRef,
        headshot: Option<String>,
        token: String,
        scan: &ScanResult,
    ) -> Self {
        Self {
            owner_id,
            account,
            headshot,
            token,
            categories_scanned: scan.categories_succeeded.len(),
            categories_invalid: scan.categories_invalid.clone(),
            categories_rate_limited: scan.categories_rate_limited.clone(),
            categories_restricted: scan.categories_restricted.clone(),
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn with_images(mut builder: EmbedBuilder, thumbnail: Option<&str>, banner: bool) -> EmbedBuilder {
    if let Some(source) = thumbnail.and_then(|url| ImageSource::url(url).ok()) {
        builder = builder.thumbnail(source);
    }
    if banner {
        if let Ok(source) = ImageSource::url(BANNER_URL) {
            builder = builder.image(source);
        }
    }
    builder
}

fn missing_line(missing: &MissingRequirement) -> String {
    match missing {
        MissingRequirement::DisplayName { text } => {
            format!("• Your **display name** must contain **{text}**.")
        }
        MissingRequirement::NotWearing { label, asset_ids } => {
            let ids: Vec<String> = asset_ids.iter().map(u64::to_string).collect();
            format!("• You must be wearing one of the **{label}** (IDs: {}).", ids.join(", "))
        }
        MissingRequirement::AssetNotOwned { category, asset_id } => format!(
            "• You don't own the required **{category}** (ID: {asset_id}). \
             [Get it here](https://www.roblox.com/catalog/{asset_id})"
        ),
        MissingRequirement::InventoryPrivate { category } => format!(
            "• Your **{category}** inventory is private. Open [privacy settings]({PRIVACY_URL}), \
             set **Who can see my inventory?** to **Everyone**, then run the command again."
        ),
        MissingRequirement::ScanInconclusive { category, asset_id } => format!(
            "• Could not check your **{category}** inventory for item {asset_id} right now. \
             Please wait a few minutes and try again."
        ),
    }
}

fn rank_line(rank: &RankUpdate) -> Option<String> {
    match rank {
        RankUpdate::NotConfigured => None,
        RankUpdate::Updated { .. } => Some("🎯 **Roblox rank updated successfully!**".into()),
        RankUpdate::SkippedBotAccount => Some("🤖 **Bot account detected - Discord role given!**".into()),
        RankUpdate::NotInGroup => Some("ℹ️ Join the group on Roblox to receive your group rank.".into()),
        RankUpdate::AlreadyAtRank => Some("🎯 Your Roblox rank is already up to date.".into()),
        RankUpdate::Failed { .. } => Some("⚠️ **Discord role given, but Roblox ranking failed.**".into()),
    }
}

fn not_found_builder(username: &str) -> EmbedBuilder {
    EmbedBuilder::new()
        .title("❌ User Not Found")
        .color(COLOR_ERROR)
        .description(format!(
            "Could not find a Roblox user named **{username}**.\n\nPlease check the spelling and try again."
        ))
}

fn system_error_builder(username: &str, detail: &str) -> EmbedBuilder {
    EmbedBuilder::new()
        .title("❌ Something Went Wrong")
        .color(COLOR_ERROR)
        .description(format!(
            "An error occurred while processing your request for **{username}**.\n\n\
             Please make sure the username is correct and try again later."
        ))
        .field(EmbedFieldBuilder::new("Error", truncate(detail, FIELD_LIMIT)))
}

pub fn not_found_embed(username: &str) -> Embed {
    not_found_builder(username).build()
}

pub fn system_error_embed(username: &str, detail: &str) -> Embed {
    system_error_builder(username, detail).build()
}

/// The single embed answering a verification-gated command.
pub fn outcome_embed(
    tier: &AccessTier,
    requester_id: u64,
    outcome: &AccessOutcome,
    headshot: Option<&str>,
) -> Embed {
    let footer = EmbedFooterBuilder::new(format!("{} • Verification", tier.command_name));

    let builder = match outcome {
        AccessOutcome::NotFound { username } => not_found_builder(username),

        AccessOutcome::ChallengeIssued { account, ticket } => {
            let title = if ticket.is_new {
                "🔐 Account Verification Required"
            } else {
                "⏳ Verification Pending"
            };
            let builder = EmbedBuilder::new()
                .title(title)
                .color(tier.color)
                .description(format!(
                    "To prove you own **{}**, add the code below to your Roblox profile.\n\n\
                     **1.** Copy the verification code\n\
                     **2.** Open your [Roblox profile]({}) and paste it into your **About** section\n\
                     **3.** Save, then run `/{} {}` again\n\n\
                     *The code only has to stay there until you are verified.*",
                    account.username,
                    account.profile_url(),
                    tier.command_name,
                    account.username
                ))
                .field(EmbedFieldBuilder::new("Verification Code", format!("```{}```", ticket.code)))
                .field(
                    EmbedFieldBuilder::new("Expires In", format!("{} minute(s)", ticket.minutes_remaining))
                        .inline(),
                )
                .field(EmbedFieldBuilder::new("Roblox Account", format!("{} ({})", account.username, account.account_id)).inline());
            with_images(builder, headshot, false)
        }

        AccessOutcome::RequirementNotMet { account, missing } => {
            let lines: Vec<String> = missing.iter().map(missing_line).collect();
            let builder = EmbedBuilder::new()
                .title("⚠️ Requirements Not Met")
                .color(COLOR_ERROR)
                .description(format!(
                    "**{}** does not meet the requirements yet:\n\n{}",
                    account.username,
                    lines.join("\n")
                ));
            with_images(builder, headshot, false)
        }

        AccessOutcome::AlreadyHasRole { account, role_name } => {
            let builder = EmbedBuilder::new()
                .title("✅ Already Have Access")
                .color(tier.color)
                .description(format!(
                    "**You already have the {role_name} role!**\n\n\
                     👤 **Discord:** <@{requester_id}>\n\
                     🎮 **Roblox:** {} ({})",
                    account.username, account.account_id
                ));
            with_images(builder, headshot, true)
        }

        AccessOutcome::Granted { account, role_name, rank } => {
            let mut description = format!(
                "**Welcome, {}!**\n\n\
                 👤 **Discord:** <@{requester_id}>\n\
                 🎮 **Roblox:** [{}]({}) ({})\n\
                 🎭 **Role:** {role_name}",
                account.username,
                account.username,
                account.profile_url(),
                account.account_id
            );
            if tier.verify_ownership {
                description.push_str("\n🔐 **Account Verified:** ✅");
            }
            if let Some(line) = rank_line(rank) {
                description.push('\n');
                description.push_str(&line);
            }
            if tier.verify_ownership {
                description.push_str("\n\n*You can now remove the verification code from your Roblox profile.*");
            }
            let builder = EmbedBuilder::new()
                .title("✅ Access Granted!")
                .color(tier.color)
                .description(description);
            with_images(builder, headshot, true)
        }

        AccessOutcome::SystemError { username, detail } => system_error_builder(username, detail),
    };

    builder.footer(footer).build()
}

pub fn progress_embed(username: &str, progress: &ScanProgress) -> Embed {
    let mut description = format!(
        "Checking **{username}**'s inventory...\n\n\
         📂 Category {}/{}: **{}**\n\
         🎒 Items found so far: **{}**",
        progress.position, progress.total, progress.current_category, progress.items_found
    );
    if progress.rate_limited > 0 {
        description.push_str(&format!("\n⏳ Rate limited categories: **{}**", progress.rate_limited));
    }
    EmbedBuilder::new()
        .title("🔍 Scanning Inventory")
        .color(COLOR_PROGRESS)
        .description(description)
        .build()
}

fn list_or_none(categories: &[String]) -> String {
    if categories.is_empty() {
        "None".to_string()
    } else {
        truncate(&categories.join(", "), FIELD_LIMIT)
    }
}

/// Status message for a scan that found nothing. Tells a confirmed-empty
/// inventory apart from an obstructed scan.
pub fn empty_inventory_embed(view: &InventoryView, categories_checked: &[String]) -> Embed {
    let obstructed = !view.categories_invalid.is_empty() || !view.categories_rate_limited.is_empty();
    let (title, description) = if obstructed {
        (
            "⚠️ No Items Found (Scan Incomplete)",
            format!(
                "No items were found for **{}**, but some categories could not be checked. \
                 Try again in a few minutes.",
                view.account.username
            ),
        )
    } else if !view.categories_restricted.is_empty() && categories_checked.is_empty() {
        (
            "🔒 Inventory Private",
            format!(
                "**{}**'s inventory is private. They can make it public in [privacy settings]({PRIVACY_URL}).",
                view.account.username
            ),
        )
    } else {
        (
            "📭 Inventory Empty",
            format!("**{}** has no items in any checked category.", view.account.username),
        )
    };

    let mut builder = EmbedBuilder::new()
        .title(title)
        .url(view.account.profile_url())
        .color(COLOR_INVENTORY)
        .description(description)
        .field(EmbedFieldBuilder::new("Checked", list_or_none(categories_checked)));
    if !view.categories_invalid.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Invalid", list_or_none(&view.categories_invalid)));
    }
    if !view.categories_rate_limited.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Rate Limited", list_or_none(&view.categories_rate_limited)));
    }
    if !view.categories_restricted.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Private", list_or_none(&view.categories_restricted)));
    }

    with_images(builder, view.headshot.as_deref(), false)
        .footer(EmbedFooterBuilder::new(format!("Scanned: {} types", view.categories_scanned)))
        .build()
}

pub fn inventory_page_embed(view: &InventoryView, page: &Page) -> Embed {
    let description = if page.is_empty() {
        "No items to show.".to_string()
    } else {
        let lines: Vec<String> = page
            .items
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                format!(
                    "`{}.` **{}** ({}) • ID {}",
                    page.first_position + offset,
                    item.item_name,
                    item.category,
                    item.item_id
                )
            })
            .collect();
        format!(
            "**{}** owns **{}** item(s) across {} categories.\n\n{}",
            view.account.username,
            page.total_items,
            page.category_count,
            lines.join("\n")
        )
    };

    let mut builder = EmbedBuilder::new()
        .title(format!("🎒 {}'s Inventory", view.account.username))
        .url(view.account.profile_url())
        .color(COLOR_INVENTORY)
        .description(truncate(&description, 4096));

    if !page.summary.is_empty() {
        let summary: Vec<String> = page
            .summary
            .iter()
            .map(|c| format!("**{}**: {}", c.category, c.count))
            .collect();
        builder = builder.field(EmbedFieldBuilder::new("Top Categories", summary.join("\n")));
    }

    if !view.categories_invalid.is_empty() || !view.categories_rate_limited.is_empty() {
        let mut status = Vec::new();
        if !view.categories_invalid.is_empty() {
            status.push(format!("Invalid: {}", view.categories_invalid.join(", ")));
        }
        if !view.categories_rate_limited.is_empty() {
            status.push(format!("Rate limited: {}", view.categories_rate_limited.join(", ")));
        }
        builder = builder.field(EmbedFieldBuilder::new("Scan Status", truncate(&status.join("\n"), FIELD_LIMIT)));
    }

    with_images(builder, view.headshot.as_deref(), false)
        .footer(EmbedFooterBuilder::new(format!(
            "Page {} of {} | Scanned: {} types",
            page.number(),
            page.total_pages,
            view.categories_scanned
        )))
        .build()
}

pub fn custom_id(direction: Direction, session_id: Uuid) -> String {
    format!("{CUSTOM_ID_PREFIX}:{}:{session_id}", direction.as_str())
}

/// Inverse of [`custom_id`].
pub fn parse_custom_id(raw: &str) -> Option<(Direction, Uuid)> {
    let mut parts = raw.splitn(3, ':');
    if parts.next()? != CUSTOM_ID_PREFIX {
        return None;
    }
    let direction = Direction::from_str(parts.next()?).ok()?;
    let session_id = Uuid::parse_str(parts.next()?).ok()?;
    Some((direction, session_id))
}

/// Back/Next buttons, each disabled at its bound. Single-page results get no
/// controls at all.
pub fn pagination_controls(session_id: Uuid, page: &Page) -> Vec<Component> {
    if page.total_pages <= 1 {
        return Vec::new();
    }
    let button = |direction: Direction, label: &str, disabled: bool| {
        Component::Button(Button {
            custom_id: Some(custom_id(direction, session_id)),
            disabled,
            emoji: None,
            label: Some(label.to_string()),
            style: ButtonStyle::Primary,
            url: None,
            sku_id: None,
        })
    };
    vec![Component::ActionRow(ActionRow {
        components: vec![
            button(Direction::Back, "◀ Back", page.is_first()),
            button(Direction::Next, "Next ▶", page.is_last()),
        ],
    })]
}
