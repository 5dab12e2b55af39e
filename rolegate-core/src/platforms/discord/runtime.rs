use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard, StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::Interaction;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::gateway::payload::outgoing::update_presence::UpdatePresencePayload;
use twilight_model::gateway::presence::{Activity, ActivityType, MinimalActivity, Status};
use twilight_model::id::marker::ApplicationMarker;
use twilight_model::id::Id;

use crate::Error;
use crate::platforms::ConnectionStatus;

pub const PRESENCE_TEXT: &str = "Roblox Inventory";

/// Receives every interaction the gateway delivers. Each call runs in its
/// own task.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle_interaction(&self, interaction: Interaction);
}

/// Listens on one shard and hands interactions to `handler`.
async fn shard_runner(mut shard: Shard, handler: Arc<dyn InteractionHandler>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    let wanted = EventTypeFlags::READY | EventTypeFlags::INTERACTION_CREATE;
    while let Some(item) = shard.next_event(wanted).await {
        match item {
            Ok(Event::Ready(ready)) => {
                let data: &ReadyPayload = ready.as_ref();
                info!(
                    "Shard {shard_id} => READY as {} (ID={}) in {} guild(s)",
                    data.user.name,
                    data.user.id,
                    data.guilds.len()
                );
            }
            Ok(Event::InteractionCreate(event)) => {
                let interaction = event.0;
                debug!("Shard {shard_id} => interaction {} ({:?})", interaction.id, interaction.kind);
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler.handle_interaction(interaction).await;
                });
            }
            Ok(other) => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

fn watching_presence() -> Result<UpdatePresencePayload, Error> {
    let activity = MinimalActivity {
        kind: ActivityType::Watching,
        name: PRESENCE_TEXT.to_string(),
        url: None,
    };
    UpdatePresencePayload::new(vec![Activity::from(activity)], false, None::<u64>, Status::Online)
        .map_err(|e| Error::Platform(format!("Invalid presence: {e}")))
}

/// Discord connection: one REST client plus the gateway shards.
pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    http: Arc<HttpClient>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http,
        }
    }

    pub fn http(&self) -> Arc<HttpClient> {
        self.http.clone()
    }

    pub async fn application_id(&self) -> Result<Id<ApplicationMarker>, Error> {
        let app = self
            .http
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("Error fetching application info: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing application info: {e}")))?;
        Ok(app.id)
    }

    /// Opens the recommended number of shards with a "Watching" presence and
    /// starts dispatching interactions.
    pub async fn connect(&mut self, handler: Arc<dyn InteractionHandler>) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }

        let presence = watching_presence()?;
        let config = Config::new(self.token.clone(), Intents::GUILDS);

        let shards = gateway::create_recommended(&self.http, config, move |_, builder| {
            builder.presence(presence.clone()).build()
        })
        .await
        .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let handler = handler.clone();
            self.shard_tasks.push(tokio::spawn(shard_runner(shard, handler)));
        }

        self.connection_status = ConnectionStatus::Connected;
        info!("(DiscordPlatform) Connected with {} shard(s)", self.shard_tasks.len());
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        // the runners return once their shard reports the close
        for task in self.shard_tasks.drain(..) {
            let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
        }
        self.shard_senders.clear();
        Ok(())
    }
}
