//! Panel d'ouverture des tickets
//!
//! Le panel est un message avec un menu listant les catégories. Son
//! emplacement est enregistré dans les paramètres du serveur pour pouvoir
//! le mettre à jour quand les catégories changent.

use sea_orm::DbConn;
use serenity::model::id::{ChannelId, GuildId, MessageId};

use super::{
    error::*,
    gateway::Gateway,
    interaction::ControlId,
    wizard::MAX_CATEGORIES,
};
use crate::components::utils::message::{self, ActionRow, Embed, Message, SelectKind, SelectMenu, SelectOption};
use crate::db::{
    controller::{category as db_category, guild as db_guild},
    model::ticket::category,
};
use crate::{log_info, log_warn};

/// Contenu du panel pour les catégories données.
pub fn render(categories: &[category::Model]) -> Message {
    if categories.is_empty() {
        return Message::new().add_embed(Embed::default()
            .description("Le système de tickets n'est pas actif.")
            .color(message::COLOR_WARN));
    }
    let options = categories.iter()
        .map(|c| SelectOption {
            label: c.name.clone(),
            value: c.id.clone(),
            emoji: c.emoji.clone(),
        })
        .collect();
    Message::new()
        .add_embed(Embed::default()
            .title("Tickets")
            .description("Choisis une catégorie ci-dessous pour ouvrir un ticket.")
            .color(message::COLOR_INFO))
        .add_row(ActionRow::Select(SelectMenu::new(ControlId::TicketPanel, SelectKind::String(options))
            .placeholder("Choisis une catégorie")))
}

/// Met à jour le panel enregistré du serveur.
///
/// Les erreurs sont journalisées et ignorées.
pub async fn synchronize<G: Gateway + ?Sized>(db: &DbConn, gateway: &G, guild_id: GuildId) {
    let settings = match db_guild::get_or_create_guild_settings(db, guild_id).await {
        Ok(settings) => settings,
        Err(e) => {
            log_warn!("Unable to read settings of guild {} for panel update: {}", guild_id, e);
            return;
        }
    };
    let (channel_id, message_id) = match (settings.panel_channel_id, settings.panel_message_id) {
        (Some(channel_id), Some(message_id)) => (ChannelId::new(channel_id as u64), MessageId::new(message_id as u64)),
        _ => return,
    };
    let categories = match db_category::list_categories(db, guild_id).await {
        Ok(categories) => categories,
        Err(e) => {
            log_warn!("Unable to list categories of guild {} for panel update: {}", guild_id, e);
            return;
        }
    };
    if let Err(e) = gateway.edit_message(channel_id, message_id, render(&categories)).await {
        log_warn!("Unable to update the panel of guild {}: {}", guild_id, e);
    }
}

/// Envoie le panel dans le salon et enregistre son emplacement.
pub async fn publish<G: Gateway + ?Sized>(db: &DbConn, gateway: &G, guild_id: GuildId, channel_id: ChannelId) -> Result<MessageId> {
    let categories = db_category::list_categories(db, guild_id).await?;
    if categories.is_empty() {
        return Err(TicketError::validation(PANEL_NEEDS_CATEGORY));
    }
    if categories.len() > MAX_CATEGORIES {
        return Err(TicketError::validation(TOO_MANY_CATEGORIES));
    }
    let message_id = gateway.send_message(channel_id, render(&categories)).await?;
    db_guild::set_panel_location(db, guild_id, channel_id, message_id).await?;
    log_info!("Panel of guild {} sent in {}", guild_id, channel_id);
    Ok(message_id)
}
