//! Événements Discord reçus par le bot

use std::sync::Arc;
use serenity::{
    all::{Command, CreateCommand, Guild, GuildChannel, Interaction, Message, Ready},
    async_trait,
    client::{Context, EventHandler},
    model::id::GuildId,
};

use crate::components::tickets::{
    gateway::Gateway,
    interaction::SETUP_COMMAND,
    session::MemorySessionStore,
    setup,
    Tickets,
};
use crate::discord::{self, SerenityGateway};
use crate::{log_error, log_info, log_warn};

pub type BotTickets = Tickets<SerenityGateway, MemorySessionStore>;

pub struct Handler {
    tickets: Arc<BotTickets>,
    gateway: Arc<SerenityGateway>,
    /// Serveur où enregistrer les commandes, sinon elles sont globales.
    command_guild: Option<GuildId>,
}

impl Handler {
    pub fn new(tickets: Arc<BotTickets>, gateway: Arc<SerenityGateway>, command_guild: Option<GuildId>) -> Self {
        Self {
            tickets,
            gateway,
            command_guild,
        }
    }
}

fn setup_command() -> CreateCommand {
    CreateCommand::new(SETUP_COMMAND)
        .description("Configurer le système de tickets")
        .dm_permission(false)
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log_info!("{} is connected!", ready.user.name);
        let registered = match self.command_guild {
            Some(guild_id) => guild_id.create_command(&ctx.http, setup_command()).await,
            None => Command::create_global_command(&ctx.http, setup_command()).await,
        };
        match registered {
            Ok(command) => log_info!("Command /{} registered", command.name),
            Err(e) => log_error!("Unable to register the /{} command: {}", SETUP_COMMAND, e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        discord::dispatch(&ctx.http, &self.tickets, interaction).await;
    }

    async fn channel_delete(&self, _ctx: Context, channel: GuildChannel, _messages: Option<Vec<Message>>) {
        self.tickets.reconcile_channel_removal(channel.id).await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }
        log_info!("Joined guild {} ({})", guild.name, guild.id);
        let channel_id = match guild.system_channel_id {
            Some(channel_id) => channel_id,
            None => return,
        };
        if let Err(e) = self.gateway.send_message(channel_id, setup::greeting()).await {
            log_warn!("Unable to greet guild {}: {}", guild.id, e);
        }
    }
}
