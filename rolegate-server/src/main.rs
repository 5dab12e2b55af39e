// File: rolegate-server/src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use rolegate_common::traits::api::{GamePlatformClient, GuildMemberApi};
use rolegate_common::traits::clock::{Clock, SystemClock};
use rolegate_core::config::{default_tiers, load_tiers, BotConfig};
use rolegate_core::inventory::{InventoryScanner, ScanConfig};
use rolegate_core::platforms::discord::DiscordPlatform;
use rolegate_core::platforms::roblox::RobloxClient;
use rolegate_core::presenter::SessionRegistry;
use rolegate_core::services::discord::slashcommands::register_guild_slash_commands;
use rolegate_core::services::discord::{InteractionRouter, TwilightGuildMembers};
use rolegate_core::services::{AccessService, InventoryService};
use rolegate_core::tasks::session_sweep::SESSION_SWEEP_INTERVAL;
use rolegate_core::tasks::verification_sweep::VERIFICATION_SWEEP_INTERVAL;
use rolegate_core::tasks::{spawn_session_sweep_task, spawn_verification_sweep_task};
use rolegate_core::verification::{JsonFilePersistence, VerificationStore, VerificationWorkflow};

#[derive(Parser, Debug, Clone)]
#[command(name = "rolegate")]
#[command(author, version, about = "RoleGate - Discord roles for verified Roblox item owners")]
struct Args {
    /// Directory holding the verification maps
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSON file with access tiers. Built-in tiers are used when omitted.
    #[arg(long)]
    tiers: Option<PathBuf>,

    /// Overwrite the guild's slash commands on startup
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    register_commands: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("rolegate=info".parse().unwrap_or_default())
        .add_directive("rolegate_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("RoleGate stopped: {:#}", e);
        return Err(e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let tiers = match &args.tiers {
        Some(path) => load_tiers(path)?,
        None => default_tiers(),
    };
    let config = BotConfig::from_env(args.data_dir.clone(), tiers)?;
    info!(
        "RoleGate starting. guild={}, tiers={}, data_dir={}",
        config.guild_id,
        config.tiers.len(),
        config.data_dir.display()
    );

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Cannot create {}", config.data_dir.display()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut stores = Vec::new();
    let mut workflows = Vec::new();
    for tier in config.tiers.iter().filter(|t| t.verify_ownership) {
        let persistence = Arc::new(JsonFilePersistence::for_kind(&config.data_dir, tier.kind));
        let store = Arc::new(VerificationStore::new(tier.kind, persistence, clock.clone()));
        let kept = store.load().await;
        info!("Loaded {} pending {}-access verifications", kept, tier.kind);
        workflows.push(Arc::new(VerificationWorkflow::new(store.clone())));
        stores.push(store);
    }

    if config.roblox_cookie.is_none() {
        warn!("ROBLOX_COOKIE is not set; group ranking disabled");
    }
    let roblox: Arc<dyn GamePlatformClient> = Arc::new(RobloxClient::new(config.roblox_cookie.as_deref())?);
    let scanner = Arc::new(InventoryScanner::new(roblox.clone(), ScanConfig::default()));

    let mut discord = DiscordPlatform::new(config.discord_token.clone());
    let http = discord.http();
    let application_id = discord.application_id().await?;
    let members: Arc<dyn GuildMemberApi> = Arc::new(TwilightGuildMembers::new(http.clone()));

    let access = Arc::new(AccessService::new(
        roblox.clone(),
        members,
        workflows,
        scanner.clone(),
        config.ranking_group_id(),
    ));
    let inventory = Arc::new(InventoryService::new(roblox.clone(), scanner));

    let router = Arc::new(InteractionRouter::new(
        http.clone(),
        application_id,
        access,
        inventory,
        roblox,
        config.tiers.clone(),
        Arc::new(SessionRegistry::new()),
        clock,
    ));

    if args.register_commands {
        register_guild_slash_commands(&http, application_id, config.guild_id, &config.tiers).await?;
    }

    discord.connect(router.clone()).await?;

    let verification_task = spawn_verification_sweep_task(stores, VERIFICATION_SWEEP_INTERVAL);
    let session_task = spawn_session_sweep_task(router, SESSION_SWEEP_INTERVAL);

    tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
    info!("Shutting down");

    verification_task.abort();
    session_task.abort();
    discord.disconnect().await?;
    Ok(())
}
