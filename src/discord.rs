//! Liaison avec serenity
//!
//! Implémente [`Gateway`] avec l'API HTTP de Discord, convertit les messages
//! du bot en builders serenity et décode les interactions reçues.

use std::{collections::HashMap, sync::Arc};
use serenity::{
    all::{
        ActionRowComponent, ButtonStyle as DiscordButtonStyle, ChannelType, CommandInteraction, ComponentInteraction,
        ComponentInteractionDataKind, CreateActionRow, CreateAttachment, CreateButton, CreateChannel, CreateEmbed,
        CreateInputText, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, CreateModal,
        CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, EditInteractionResponse, EditMessage,
        GetMessages, InputTextStyle, Interaction, Member, ModalInteraction, PermissionOverwrite,
        PermissionOverwriteType, ReactionType, User,
    },
    async_trait,
    http::Http,
    model::id::{ChannelId, MessageId, UserId},
};

use crate::components::{
    tickets::{
        auth::Actor,
        error::SOMETHING_WENT_WRONG,
        gateway::{self, Gateway, GatewayError, HistoryMessage, NewChannel},
        interaction::{Action, Payload},
        permissions::{Overwrite, Principal},
        session::SessionStore,
        InteractionContext, Origin, Response, Tickets,
    },
    utils::message::{self, ActionRow, ButtonStyle, ChannelFilter, Embed, Message, Modal, SelectKind, TextInputStyle},
};
use crate::{log_debug, log_error, log_warn};

/// Accès à Discord par l'API HTTP
pub struct SerenityGateway {
    http: Arc<Http>,
    bot_id: UserId,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, bot_id: UserId) -> Self {
        Self { http, bot_id }
    }
    #[inline]
    fn http(&self) -> &Http {
        &self.http
    }
}

fn overwrite_kind(principal: Principal) -> PermissionOverwriteType {
    match principal {
        Principal::Role(id) => PermissionOverwriteType::Role(id),
        Principal::Member(id) => PermissionOverwriteType::Member(id),
    }
}

impl From<Overwrite> for PermissionOverwrite {
    fn from(overwrite: Overwrite) -> Self {
        PermissionOverwrite {
            allow: overwrite.allow,
            deny: overwrite.deny,
            kind: overwrite_kind(overwrite.principal),
        }
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }
    async fn create_text_channel(&self, channel: NewChannel) -> gateway::Result<ChannelId> {
        let builder = CreateChannel::new(channel.name)
            .kind(ChannelType::Text)
            .category(channel.parent_id)
            .permissions(channel.overwrites.into_iter().map(PermissionOverwrite::from));
        Ok(channel.guild_id.create_channel(self.http(), builder).await?.id)
    }
    async fn delete_channel(&self, channel_id: ChannelId) -> gateway::Result<()> {
        channel_id.delete(self.http()).await?;
        Ok(())
    }
    async fn channel_exists(&self, channel_id: ChannelId) -> gateway::Result<bool> {
        match self.http.get_channel(channel_id).await.map_err(GatewayError::from) {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
    async fn send_message(&self, channel_id: ChannelId, message: Message) -> gateway::Result<MessageId> {
        Ok(channel_id.send_message(self.http(), to_create_message(message)).await?.id)
    }
    async fn edit_message(&self, channel_id: ChannelId, message_id: MessageId, message: Message) -> gateway::Result<()> {
        let builder = EditMessage::new()
            .content(message.content)
            .embeds(message.embeds.into_iter().map(to_embed).collect())
            .components(to_components(message.components));
        channel_id.edit_message(self.http(), message_id, builder).await?;
        Ok(())
    }
    async fn set_permission(&self, channel_id: ChannelId, overwrite: Overwrite) -> gateway::Result<()> {
        Ok(channel_id.create_permission(self.http(), overwrite.into()).await?)
    }
    async fn remove_permission(&self, channel_id: ChannelId, principal: Principal) -> gateway::Result<()> {
        Ok(channel_id.delete_permission(self.http(), overwrite_kind(principal)).await?)
    }
    async fn fetch_messages(&self, channel_id: ChannelId, before: Option<MessageId>, limit: u8) -> gateway::Result<Vec<HistoryMessage>> {
        let mut request = GetMessages::new().limit(limit);
        if let Some(before) = before {
            request = request.before(before);
        }
        let messages = channel_id.messages(self.http(), request).await?;
        Ok(messages.into_iter()
            .map(|msg| HistoryMessage {
                id: msg.id,
                author: msg.author.tag(),
                content: msg.content,
                attachments: msg.attachments.into_iter().map(|a| a.url).collect(),
                timestamp: *msg.timestamp,
            })
            .collect())
    }
}

/* Conversion des messages */

fn to_reaction(emoji: &str) -> ReactionType {
    ReactionType::try_from(emoji).unwrap_or_else(|_| ReactionType::Unicode(emoji.to_string()))
}

fn to_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    if let Some(color) = embed.color {
        builder = builder.colour(color);
    }
    builder.fields(embed.fields.into_iter().map(|f| (f.name, f.value, f.inline)))
}

fn to_components(rows: Vec<ActionRow>) -> Vec<CreateActionRow> {
    rows.into_iter().map(|row| match row {
        ActionRow::Buttons(buttons) => CreateActionRow::Buttons(buttons.into_iter().map(|button| {
            let style = match button.style {
                ButtonStyle::Primary => DiscordButtonStyle::Primary,
                ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
                ButtonStyle::Success => DiscordButtonStyle::Success,
                ButtonStyle::Danger => DiscordButtonStyle::Danger,
            };
            let mut builder = CreateButton::new(button.custom_id).label(button.label).style(style);
            if let Some(emoji) = button.emoji {
                builder = builder.emoji(to_reaction(&emoji));
            }
            builder
        }).collect()),
        ActionRow::Select(menu) => {
            let kind = match menu.kind {
                SelectKind::String(options) => CreateSelectMenuKind::String {
                    options: options.into_iter().map(|option| {
                        let builder = CreateSelectMenuOption::new(option.label, option.value);
                        match option.emoji {
                            Some(emoji) => builder.emoji(to_reaction(&emoji)),
                            None => builder,
                        }
                    }).collect(),
                },
                SelectKind::Role => CreateSelectMenuKind::Role { default_roles: None },
                SelectKind::User => CreateSelectMenuKind::User { default_users: None },
                SelectKind::Channel(filter) => CreateSelectMenuKind::Channel {
                    channel_types: Some(vec![match filter {
                        ChannelFilter::Text => ChannelType::Text,
                        ChannelFilter::Category => ChannelType::Category,
                    }]),
                    default_channels: None,
                },
            };
            let mut builder = CreateSelectMenu::new(menu.custom_id, kind)
                .min_values(menu.min_values)
                .max_values(menu.max_values);
            if let Some(placeholder) = menu.placeholder {
                builder = builder.placeholder(placeholder);
            }
            CreateActionRow::SelectMenu(builder)
        }
    }).collect()
}

fn to_attachments(message: &mut Message) -> Vec<CreateAttachment> {
    std::mem::take(&mut message.attachments).into_iter()
        .map(|a| CreateAttachment::bytes(a.data, a.filename))
        .collect()
}

fn to_create_message(mut message: Message) -> CreateMessage {
    let files = to_attachments(&mut message);
    let mut builder = CreateMessage::new()
        .embeds(message.embeds.into_iter().map(to_embed).collect())
        .components(to_components(message.components))
        .add_files(files);
    if !message.content.is_empty() {
        builder = builder.content(message.content);
    }
    builder
}

fn to_response_message(mut message: Message) -> CreateInteractionResponseMessage {
    let files = to_attachments(&mut message);
    CreateInteractionResponseMessage::new()
        .content(message.content)
        .embeds(message.embeds.into_iter().map(to_embed).collect())
        .components(to_components(message.components))
        .add_files(files)
        .ephemeral(message.ephemeral)
}

fn to_edit_response(message: Message) -> EditInteractionResponse {
    EditInteractionResponse::new()
        .content(message.content)
        .embeds(message.embeds.into_iter().map(to_embed).collect())
        .components(to_components(message.components))
}

fn to_modal(modal: Modal) -> CreateModal {
    let rows = modal.inputs.into_iter().map(|input| {
        let style = match input.style {
            TextInputStyle::Short => InputTextStyle::Short,
            TextInputStyle::Paragraph => InputTextStyle::Paragraph,
        };
        let mut builder = CreateInputText::new(style, input.label, input.custom_id).required(input.required);
        if let Some(placeholder) = input.placeholder {
            builder = builder.placeholder(placeholder);
        }
        if let Some(max_length) = input.max_length {
            builder = builder.max_length(max_length);
        }
        CreateActionRow::InputText(builder)
    }).collect();
    CreateModal::new(modal.custom_id, modal.title).components(rows)
}

/* Décodage des interactions */

/// Auteur d'une interaction depuis son profil de membre.
pub fn actor_from_member(user: &User, member: Option<&Member>) -> Actor {
    Actor {
        user_id: user.id,
        name: user.name.clone(),
        roles: member.map(|m| m.roles.clone()).unwrap_or_default(),
        administrator: member
            .and_then(|m| m.permissions)
            .map_or(false, |p| p.administrator()),
    }
}

fn component_payload(kind: &ComponentInteractionDataKind) -> Option<Payload> {
    Some(match kind {
        ComponentInteractionDataKind::Button => Payload::Button,
        ComponentInteractionDataKind::StringSelect { values } => Payload::StringSelect(values.clone()),
        ComponentInteractionDataKind::RoleSelect { values } => Payload::RoleSelect(values.clone()),
        ComponentInteractionDataKind::UserSelect { values } => Payload::UserSelect(values.clone()),
        ComponentInteractionDataKind::ChannelSelect { values } => Payload::ChannelSelect(values.clone()),
        _ => return None,
    })
}

fn modal_payload(modal: &ModalInteraction) -> Payload {
    let fields: HashMap<String, String> = modal.data.components.iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => Some((input.custom_id.clone(), input.value.clone().unwrap_or_default())),
            _ => None,
        })
        .collect();
    Payload::Modal(fields)
}

/// Interaction reçue, à laquelle il faut répondre
enum Source<'a> {
    Command(&'a CommandInteraction),
    Component(&'a ComponentInteraction),
    Modal(&'a ModalInteraction),
}

impl Source<'_> {
    async fn create_response(&self, http: &Http, response: CreateInteractionResponse) -> serenity::Result<()> {
        match self {
            Source::Command(i) => i.create_response(http, response).await,
            Source::Component(i) => i.create_response(http, response).await,
            Source::Modal(i) => i.create_response(http, response).await,
        }
    }
    async fn edit_response(&self, http: &Http, response: EditInteractionResponse) -> serenity::Result<()> {
        match self {
            Source::Command(i) => i.edit_response(http, response).await,
            Source::Component(i) => i.edit_response(http, response).await,
            Source::Modal(i) => i.edit_response(http, response).await,
        }.map(|_| ())
    }
}

/// Décode une interaction. Les interactions hors serveur ou inconnues sont ignorées.
fn decode(interaction: &Interaction) -> Option<(Source<'_>, InteractionContext, Action)> {
    let decoded = match interaction {
        Interaction::Command(command) => {
            let ctx = InteractionContext {
                guild_id: command.guild_id?,
                channel_id: command.channel_id,
                actor: actor_from_member(&command.user, command.member.as_deref()),
                origin: Origin::Command,
            };
            Action::from_command(&command.data.name).map(|action| (Source::Command(command), ctx, action))
        }
        Interaction::Component(component) => {
            let ctx = InteractionContext {
                guild_id: component.guild_id?,
                channel_id: component.channel_id,
                actor: actor_from_member(&component.user, component.member.as_ref()),
                origin: Origin::Component,
            };
            let payload = component_payload(&component.data.kind)?;
            Action::decode(&component.data.custom_id, payload).map(|action| (Source::Component(component), ctx, action))
        }
        Interaction::Modal(modal) => {
            let ctx = InteractionContext {
                guild_id: modal.guild_id?,
                channel_id: modal.channel_id,
                actor: actor_from_member(&modal.user, modal.member.as_ref()),
                origin: Origin::Modal,
            };
            Action::decode(&modal.data.custom_id, modal_payload(modal)).map(|action| (Source::Modal(modal), ctx, action))
        }
        _ => return None,
    };
    match decoded {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            log_debug!("Ignored interaction: {}", e);
            None
        }
    }
}

/// Traite une interaction et envoie la réponse.
///
/// Les actions longues sont différées: Discord laisse 3 secondes pour
/// répondre à une interaction.
pub async fn dispatch<G: Gateway, S: SessionStore>(http: &Http, tickets: &Tickets<G, S>, interaction: Interaction) {
    let (source, ctx, action) = match decode(&interaction) {
        Some(decoded) => decoded,
        None => return,
    };
    log_debug!("Interaction from {} in guild {}: {:?}", ctx.actor.user_id, ctx.guild_id, action);
    if action.is_slow() {
        let defer = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true));
        if let Err(e) = source.create_response(http, defer).await {
            log_error!("Unable to defer the interaction: {}", e);
            return;
        }
        let msg = match tickets.handle(&ctx, action).await {
            Response::Reply(msg) | Response::Update(msg) => msg,
            Response::Modal(_) => message::error(SOMETHING_WENT_WRONG),
        };
        if let Err(e) = source.edit_response(http, to_edit_response(msg)).await {
            // Le salon du ticket peut avoir été supprimé par l'action.
            log_warn!("Unable to edit the deferred response: {}", e);
        }
        return;
    }
    let response = match tickets.handle(&ctx, action).await {
        Response::Reply(msg) => CreateInteractionResponse::Message(to_response_message(msg)),
        Response::Update(msg) => CreateInteractionResponse::UpdateMessage(to_response_message(msg)),
        Response::Modal(modal) => CreateInteractionResponse::Modal(to_modal(modal)),
    };
    if let Err(e) = source.create_response(http, response).await {
        log_error!("Unable to respond to the interaction: {}", e);
    }
}
