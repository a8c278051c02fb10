//! Interface de création de message
//!
//! Décrit un message (texte, embeds, composants, fichiers) sans dépendre des
//! builders serenity. La conversion vers l'API Discord se fait dans
//! [`crate::discord`].

use serenity::model::Colour;

pub const COLOR_INFO: Colour = Colour(0x00C9FF);
pub const COLOR_SUCCESS: Colour = Colour(0x1ed760);
pub const COLOR_ERROR: Colour = Colour(0xFF0000);
pub const COLOR_WARN: Colour = Colour(0xFFB800);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<Colour>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn title<S: ToString>(mut self, title: S) -> Self {
        self.title = Some(title.to_string());
        self
    }
    pub fn description<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn color(mut self, color: Colour) -> Self {
        self.color = Some(color);
        self
    }
    pub fn field<S1: ToString, S2: ToString>(mut self, name: S1, value: S2, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.to_string(),
            value: value.to_string(),
            inline,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub emoji: Option<String>,
}

impl Button {
    pub fn new<S1: ToString, S2: ToString>(custom_id: S1, label: S2, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.to_string(),
            label: label.to_string(),
            style,
            emoji: None,
        }
    }
    pub fn emoji<S: ToString>(mut self, emoji: S) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub emoji: Option<String>,
}

/// Type de salon proposé par un menu de sélection de salon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFilter {
    Text,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectKind {
    String(Vec<SelectOption>),
    Role,
    User,
    Channel(ChannelFilter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub kind: SelectKind,
    pub min_values: u8,
    pub max_values: u8,
}

impl SelectMenu {
    /// Menu à choix unique
    pub fn new<S: ToString>(custom_id: S, kind: SelectKind) -> Self {
        Self {
            custom_id: custom_id.to_string(),
            placeholder: None,
            kind,
            min_values: 1,
            max_values: 1,
        }
    }
    pub fn placeholder<S: ToString>(mut self, placeholder: S) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
    pub fn values(mut self, min: u8, max: u8) -> Self {
        self.min_values = min;
        self.max_values = max;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRow {
    Buttons(Vec<Button>),
    Select(SelectMenu),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Message à envoyer ou à éditer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub content: String,
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
    pub attachments: Vec<Attachment>,
    /// Visible uniquement par l'auteur de l'interaction
    pub ephemeral: bool,
}

impl Message {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn with_text<S: ToString>(content: S) -> Self {
        Message {
            content: content.to_string(),
            ..Default::default()
        }
    }
    pub fn set_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }
    pub fn add_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }
    pub fn add_attachment<S: ToString>(mut self, filename: S, data: Vec<u8>) -> Self {
        self.attachments.push(Attachment {
            filename: filename.to_string(),
            data,
        });
        self
    }
    /// Identifiants de tous les composants du message
    pub fn custom_ids(&self) -> Vec<&str> {
        self.components.iter().flat_map(|row| match row {
            ActionRow::Buttons(buttons) => buttons.iter().map(|b| b.custom_id.as_str()).collect::<Vec<_>>(),
            ActionRow::Select(menu) => vec![menu.custom_id.as_str()],
        }).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub required: bool,
    pub placeholder: Option<String>,
    pub max_length: Option<u16>,
}

/// Formulaire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// Génère un message d'erreur
pub fn error<S: ToString>(error_message: S) -> Message {
    custom_embed("Erreur", error_message, COLOR_ERROR)
}
/// Génère un message d'avertissement
pub fn warn<S: ToString>(warn_message: S) -> Message {
    custom_embed("Attention", warn_message, COLOR_WARN)
}
/// Génère un message de succès
pub fn success<S: ToString>(success_message: S) -> Message {
    custom_embed("Effectué", success_message, COLOR_SUCCESS)
}
/// Génère un message d'information
pub fn info<S: ToString>(info_message: S) -> Message {
    custom_embed("Information", info_message, COLOR_INFO)
}
/// Génère un message personnalisé
pub fn custom_embed<S1, S2>(title: S1, message: S2, color: Colour) -> Message
    where
    S1: ToString,
    S2: ToString,
{
    Message::new().add_embed(Embed::default()
        .title(title)
        .description(message)
        .color(color))
}
