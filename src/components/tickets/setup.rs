//! Écrans de la commande `/setup`

use serenity::model::id::RoleId;

use super::interaction::{ControlId, FIELD_EMOJI, FIELD_FORM, FIELD_NAME};
use crate::components::utils::message::{
    self, ActionRow, Button, ButtonStyle, ChannelFilter, Embed, Message, Modal, SelectKind, SelectMenu,
    SelectOption, TextInput, TextInputStyle,
};
use crate::db::model::{guild::NamingMode, ticket::category};

/// Menu principal, avec un message optionnel au-dessus.
pub fn main_menu(notice: Option<&str>) -> Message {
    use ControlId::*;
    let button = |id: ControlId, label: &str, style: ButtonStyle| Button::new(id, label, style);
    Message::with_text(notice.unwrap_or_default())
        .add_embed(Embed::default()
            .title("Configuration des tickets")
            .description("Choisis une action.")
            .color(message::COLOR_INFO))
        .add_row(ActionRow::Buttons(vec![
            button(SetupPanel, "Panel", ButtonStyle::Primary),
            button(SetupAdminRoles, "Rôles administrateurs", ButtonStyle::Secondary),
            button(SetupNaming, "Nom des salons", ButtonStyle::Secondary),
        ]))
        .add_row(ActionRow::Buttons(vec![
            button(SetupCategoryAdd, "Ajouter une catégorie", ButtonStyle::Success),
            button(SetupCategoryEdit, "Modifier une catégorie", ButtonStyle::Secondary),
            button(SetupCategoryRoles, "Rôles d'une catégorie", ButtonStyle::Secondary),
            button(SetupCategoryDelete, "Supprimer une catégorie", ButtonStyle::Danger),
            button(SetupCategoryList, "Liste des catégories", ButtonStyle::Secondary),
        ]))
        .add_row(ActionRow::Buttons(vec![
            button(SetupCloseAll, "Fermer tous les tickets", ButtonStyle::Danger),
        ]))
        .set_ephemeral(true)
}

fn back_row() -> ActionRow {
    ActionRow::Buttons(vec![Button::new(ControlId::SetupBack, "Retour", ButtonStyle::Secondary)])
}

fn screen(text: &str, menu: SelectMenu) -> Message {
    Message::with_text(text)
        .add_row(ActionRow::Select(menu))
        .add_row(back_row())
        .set_ephemeral(true)
}

/// Choix du salon où envoyer le panel
pub fn panel_channel_screen() -> Message {
    screen(
        "Choisis le salon où envoyer le panel.",
        SelectMenu::new(ControlId::SetupPanelChannel, SelectKind::Channel(ChannelFilter::Text))
            .placeholder("Salon du panel"),
    )
}

pub fn admin_roles_screen() -> Message {
    screen(
        "Choisis les rôles autorisés à configurer le bot.",
        SelectMenu::new(ControlId::SetupAdminRolesSelect, SelectKind::Role)
            .placeholder("Rôles administrateurs")
            .values(1, 25),
    )
}

pub fn naming_screen(mode: NamingMode, notice: Option<&str>) -> Message {
    let mode_text = match mode {
        NamingMode::Number => "ticket-numéro",
        NamingMode::User => "nom de la personne",
    };
    Message::with_text(notice.unwrap_or_default())
        .add_embed(Embed::default()
            .description(format!("Nom des salons de ticket: **{}**", mode_text))
            .color(message::COLOR_INFO))
        .add_row(ActionRow::Buttons(vec![
            Button::new(ControlId::SetupNamingUser, "Nom de la personne", ButtonStyle::Primary),
            Button::new(ControlId::SetupNamingNumber, "Ticket-numéro", ButtonStyle::Primary),
            Button::new(ControlId::SetupBack, "Retour", ButtonStyle::Secondary),
        ]))
        .set_ephemeral(true)
}

/// Choix de la catégorie Discord parente
pub fn parent_screen(id: ControlId, text: &str) -> Message {
    screen(
        text,
        SelectMenu::new(id, SelectKind::Channel(ChannelFilter::Category))
            .placeholder("Catégorie Discord"),
    )
}

/// Choix des rôles autorisés d'une catégorie
pub fn roles_screen(id: ControlId, text: &str) -> Message {
    screen(
        text,
        SelectMenu::new(id, SelectKind::Role)
            .placeholder("Rôles autorisés")
            .values(1, 25),
    )
}

fn category_option(category: &category::Model) -> SelectOption {
    SelectOption {
        label: category.name.clone(),
        value: category.id.clone(),
        emoji: category.emoji.clone(),
    }
}

/// Choix d'une catégorie existante
pub fn category_pick_screen(id: ControlId, text: &str, categories: &[category::Model]) -> Message {
    let options = categories.iter().map(category_option).collect();
    screen(
        text,
        SelectMenu::new(id, SelectKind::String(options)).placeholder("Catégorie"),
    )
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Formulaire de catégorie.
///
/// En modification, les champs sont facultatifs et montrent la valeur
/// actuelle en indication.
pub fn category_modal(id: ControlId, existing: Option<&category::Model>) -> Modal {
    let input = |custom_id: &str, label: &str, style: TextInputStyle, required: bool, max_length: u16, placeholder: Option<String>| TextInput {
        custom_id: custom_id.to_string(),
        label: label.to_string(),
        style,
        required,
        placeholder,
        max_length: Some(max_length),
    };
    match existing {
        None => Modal {
            custom_id: id.to_string(),
            title: "Ajouter une catégorie".to_string(),
            inputs: vec![
                input(FIELD_NAME, "Nom de la catégorie", TextInputStyle::Short, true, 100, None),
                input(FIELD_EMOJI, "Emoji (facultatif)", TextInputStyle::Short, false, 64, None),
                input(FIELD_FORM, "Message / questions du formulaire", TextInputStyle::Paragraph, true, 2000, None),
            ],
        },
        Some(category) => Modal {
            custom_id: id.to_string(),
            title: "Modifier une catégorie".to_string(),
            inputs: vec![
                input(FIELD_NAME, "Nom (vide = inchangé)", TextInputStyle::Short, false, 100, Some(truncate(&category.name, 100))),
                input(FIELD_EMOJI, "Emoji (vide = inchangé)", TextInputStyle::Short, false, 64, category.emoji.clone()),
                input(FIELD_FORM, "Formulaire (vide = inchangé)", TextInputStyle::Paragraph, false, 2000, Some(truncate(&category.form_text, 100))),
            ],
        },
    }
}

/// Message envoyé à l'arrivée du bot sur un serveur
pub fn greeting() -> Message {
    message::info("Merci de m'avoir ajouté ! Un administrateur peut utiliser la commande `/setup` pour configurer les tickets.")
}

/// Écran de liste des catégories
pub fn category_list_screen(categories: &[(category::Model, Vec<RoleId>)]) -> Message {
    Message::new()
        .add_embed(Embed::default()
            .title("Catégories")
            .description(category_list(categories))
            .color(message::COLOR_INFO))
        .add_row(back_row())
        .set_ephemeral(true)
}

/// Taille maximale de la description d'un embed Discord
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;
/// Rôles affichés par catégorie dans la liste
const LISTED_ROLES: usize = 10;

fn category_entry(category: &category::Model, roles: &[RoleId]) -> String {
    let mut mentions = roles.iter()
        .take(LISTED_ROLES)
        .map(|r| format!("<@&{}>", r))
        .collect::<Vec<_>>()
        .join(" ");
    if roles.is_empty() {
        mentions.push('-');
    } else if roles.len() > LISTED_ROLES {
        mentions.push_str(&format!(" (+{})", roles.len() - LISTED_ROLES));
    }
    format!(
        "ID: {}\nNom: {}\nEmoji: {}\nCatégorie Discord: <#{}>\nRôles: {}\n",
        category.id,
        category.name,
        category.emoji.as_deref().unwrap_or("-"),
        category.parent_category_id,
        mentions,
    )
}

/// Description des catégories pour l'écran de liste
///
/// Les catégories qui ne tiennent pas dans [`EMBED_DESCRIPTION_LIMIT`] sont
/// comptées à la fin de la liste.
pub fn category_list(categories: &[(category::Model, Vec<RoleId>)]) -> String {
    // place gardée pour la ligne des catégories non affichées
    const RESERVED: usize = 64;
    let mut description = String::new();
    let mut length = 0;
    for (shown, (category, roles)) in categories.iter().enumerate() {
        let entry = category_entry(category, roles);
        let separator = if shown == 0 { 0 } else { 1 };
        let entry_length = entry.chars().count() + separator;
        if length + entry_length > EMBED_DESCRIPTION_LIMIT - RESERVED {
            description.push_str(&format!("\n... et {} autre(s) catégorie(s)", categories.len() - shown));
            break;
        }
        if separator == 1 {
            description.push('\n');
        }
        description.push_str(&entry);
        length += entry_length;
    }
    description
}
