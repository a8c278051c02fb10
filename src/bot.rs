//! Core de l'application.
//! L'initialisation du bot et de ses composants se fait dans ce module.

use std::{sync::Arc, time::Duration};
use serenity::{
    http::Http,
    model::id::GuildId,
    prelude::GatewayIntents,
    Client,
};

use crate::components::tickets::{
    session::{MemorySessionStore, SessionStore},
    Tickets,
};
use crate::{config::Config, db, discord::SerenityGateway, event::Handler};
use crate::{log_debug, log_info};

/// Intervalle de purge des sessions expirées
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("discord: {0}")]
    Serenity(#[from] serenity::Error),
    #[error("database: {0}")]
    Database(#[from] sea_orm::DbErr),
}

type Result<T> = std::result::Result<T, Error>;

/// Structure du bot.
///
/// Il s'agit de la classe mère de l'application. Elle relie le client
/// serenity au composant de tickets.
pub struct Bot {
    /// Client discord de serenity
    client: Client,
}

impl Bot {
    /// Crée un nouveau bot et l'initialise.
    pub async fn new(config: &Config) -> Result<Bot> {
        let database = Arc::new(db::start_db(&config.database).await?);
        let http = Arc::new(Http::new(&config.token));
        let bot_user = http.get_current_user().await?;
        log_info!("Logged in as {}", bot_user.name);

        let gateway = Arc::new(SerenityGateway::new(http, bot_user.id));
        let sessions = Arc::new(MemorySessionStore::new(config.wizard_timeout()));
        spawn_session_purge(sessions.clone());
        let tickets = Arc::new(Tickets::new(database, gateway.clone(), sessions));

        let command_guild = config.command_guild.filter(|id| *id != 0).map(GuildId::new);
        let client = Client::builder(&config.token, GatewayIntents::GUILDS)
            .event_handler(Handler::new(tickets, gateway, command_guild))
            .await?;
        Ok(Bot { client })
    }
    /// Lance le bot.
    pub async fn start(&mut self) -> Result<()> {
        Ok(self.client.start().await?)
    }
}

fn spawn_session_purge(sessions: Arc<MemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                log_debug!("{} expired setup session(s) purged, {} left", purged, sessions.len().await);
            }
        }
    });
}
