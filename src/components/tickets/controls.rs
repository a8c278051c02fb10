//! Messages postés dans les salons de ticket

use chrono::{DateTime, Utc};
use serenity::model::id::{RoleId, UserId};

use super::interaction::ControlId;
use crate::components::utils::message::{self, ActionRow, Button, ButtonStyle, Embed, Message, SelectKind, SelectMenu};

/// Message d'accueil: mention des rôles et informations du ticket
pub fn ticket_intro(ticket_number: i64, category_name: &str, opener: UserId, roles: &[RoleId], created_at: DateTime<Utc>) -> Message {
    let mentions = roles.iter()
        .map(|r| format!("<@&{}>", r))
        .collect::<Vec<_>>()
        .join(" ");
    Message::with_text(mentions).add_embed(Embed::default()
        .color(message::COLOR_INFO)
        .field("Ticket", ticket_number, true)
        .field("Catégorie", category_name, true)
        .field("Ouvert par", format!("<@{}>", opener), false)
        .field("Ouvert le", format!("<t:{}:F>", created_at.timestamp()), false))
}

/// Boutons d'un ticket ouvert
pub fn open_controls() -> Message {
    Message::new().add_row(ActionRow::Buttons(vec![
        Button::new(ControlId::TicketClose, "Fermer le ticket", ButtonStyle::Danger).emoji("🔒"),
        Button::new(ControlId::TicketAdd, "Ajouter", ButtonStyle::Secondary).emoji("➕"),
        Button::new(ControlId::TicketRemove, "Retirer", ButtonStyle::Secondary).emoji("➖"),
    ]))
}

/// Boutons d'un ticket fermé
pub fn closed_controls() -> Message {
    Message::with_text("Le ticket est fermé.").add_row(ActionRow::Buttons(vec![
        Button::new(ControlId::TicketDelete, "Supprimer le ticket", ButtonStyle::Danger).emoji("🗑️"),
        Button::new(ControlId::TicketReopen, "Rouvrir le ticket", ButtonStyle::Success).emoji("🔓"),
    ]))
}

pub fn reopened_controls() -> Message {
    Message {
        content: "Le ticket a été rouvert.".to_string(),
        ..open_controls()
    }
}

/// Menus d'ajout de membres et de rôles au ticket
pub fn add_staff_menus() -> Message {
    Message::with_text("Choisis les membres et/ou les rôles à ajouter.")
        .add_row(ActionRow::Select(SelectMenu::new(ControlId::TicketAddUsers, SelectKind::User)
            .placeholder("Membres à ajouter")
            .values(1, 25)))
        .add_row(ActionRow::Select(SelectMenu::new(ControlId::TicketAddRoles, SelectKind::Role)
            .placeholder("Rôles à ajouter")
            .values(1, 25)))
        .set_ephemeral(true)
}

/// Menus de retrait de membres et de rôles du ticket
pub fn remove_staff_menus() -> Message {
    Message::with_text("Choisis les membres et/ou les rôles à retirer.")
        .add_row(ActionRow::Select(SelectMenu::new(ControlId::TicketRemoveUsers, SelectKind::User)
            .placeholder("Membres à retirer")
            .values(1, 25)))
        .add_row(ActionRow::Select(SelectMenu::new(ControlId::TicketRemoveRoles, SelectKind::Role)
            .placeholder("Rôles à retirer")
            .values(1, 25)))
        .set_ephemeral(true)
}
