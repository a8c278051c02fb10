//! Accès à la plateforme Discord
//!
//! Le composant de tickets ne parle à Discord qu'au travers du trait
//! [`Gateway`]. L'implémentation serenity se trouve dans [`crate::discord`].

use chrono::{DateTime, Utc};
use serenity::{
    async_trait,
    model::id::{ChannelId, GuildId, MessageId, UserId},
};

use super::permissions::{Overwrite, Principal};
use crate::components::utils::message::Message;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("discord: {0}")]
    Serenity(serenity::Error),
    /// Ressource inconnue de Discord (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),
    /// Requête refusée par Discord (HTTP 400), par exemple un nom de salon invalide
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<serenity::Error> for GatewayError {
    fn from(e: serenity::Error) -> Self {
        let status = match &e {
            serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()),
            _ => None,
        };
        match status {
            Some(404) => GatewayError::NotFound(e.to_string()),
            Some(400) => GatewayError::Rejected(e.to_string()),
            _ => GatewayError::Serenity(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Salon texte à créer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub guild_id: GuildId,
    pub name: String,
    /// Catégorie Discord parente
    pub parent_id: ChannelId,
    pub overwrites: Vec<Overwrite>,
}

/// Message lu dans l'historique d'un salon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: MessageId,
    /// Tag de l'auteur (`nom#0000` ou `nom`)
    pub author: String,
    pub content: String,
    /// URL des pièces jointes
    pub attachments: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Identifiant du bot
    fn bot_id(&self) -> UserId;
    async fn create_text_channel(&self, channel: NewChannel) -> Result<ChannelId>;
    async fn delete_channel(&self, channel_id: ChannelId) -> Result<()>;
    /// `Ok(false)` si le salon a été supprimé.
    async fn channel_exists(&self, channel_id: ChannelId) -> Result<bool>;
    async fn send_message(&self, channel_id: ChannelId, message: Message) -> Result<MessageId>;
    async fn edit_message(&self, channel_id: ChannelId, message_id: MessageId, message: Message) -> Result<()>;
    /// Crée ou remplace la permission d'un membre ou d'un rôle sur le salon.
    async fn set_permission(&self, channel_id: ChannelId, overwrite: Overwrite) -> Result<()>;
    async fn remove_permission(&self, channel_id: ChannelId, principal: Principal) -> Result<()>;
    /// Messages du plus récent au plus ancien, antérieurs à `before` si précisé.
    async fn fetch_messages(&self, channel_id: ChannelId, before: Option<MessageId>, limit: u8) -> Result<Vec<HistoryMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_without_http_status_stay_serenity_errors() {
        match GatewayError::from(serenity::Error::Other("no status")) {
            GatewayError::Serenity(serenity::Error::Other(msg)) => assert_eq!(msg, "no status"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
