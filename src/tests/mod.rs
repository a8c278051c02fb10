//! Tests du composant de tickets sur une base SQLite en mémoire et un
//! Discord simulé.

mod lifecycle;
mod scenario;

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use chrono::{TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DbConn};
use serenity::{
    async_trait,
    model::{
        id::{ChannelId, GuildId, MessageId, RoleId, UserId},
        permissions::Permissions,
    },
};

use crate::components::{
    tickets::{
        auth::Actor,
        gateway::{self, Gateway, GatewayError, HistoryMessage, NewChannel},
        permissions::{Overwrite, Principal},
    },
    utils::message::Message,
};
use crate::db::{
    self,
    controller::category::{self as db_category, NewCategory},
    model::ticket::category,
};

pub const BOT_ID: u64 = 1;
pub const GUILD_ID: u64 = 500;
pub const PARENT_ID: u64 = 600;

pub fn guild() -> GuildId {
    GuildId::new(GUILD_ID)
}

pub fn role(id: u64) -> RoleId {
    RoleId::new(id)
}

pub fn user(id: u64) -> UserId {
    UserId::new(id)
}

/// Membre sans permission administrateur
pub fn member(id: u64, roles: &[u64]) -> Actor {
    Actor {
        user_id: UserId::new(id),
        name: format!("membre{}", id),
        roles: roles.iter().map(|r| RoleId::new(*r)).collect(),
        administrator: false,
    }
}

pub fn administrator(id: u64) -> Actor {
    Actor {
        administrator: true,
        ..member(id, &[])
    }
}

/// Base SQLite vide, en mémoire
pub async fn database() -> Arc<DbConn> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    db::check_tables(&db).await.unwrap();
    Arc::new(db)
}

pub async fn add_category(db: &DbConn, id: &str, name: &str, roles: &[u64]) -> category::Model {
    let new_category = NewCategory {
        id: id.to_string(),
        guild_id: guild(),
        name: name.to_string(),
        emoji: None,
        parent_category_id: ChannelId::new(PARENT_ID),
        form_text: format!("Formulaire {}", name),
    };
    let roles: Vec<RoleId> = roles.iter().map(|r| RoleId::new(*r)).collect();
    db_category::create_category(db, new_category, &roles).await.unwrap()
}

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub id: MessageId,
    pub message: Message,
    pub history: HistoryMessage,
}

#[derive(Debug, Clone, Default)]
pub struct FakeChannel {
    pub name: String,
    pub parent_id: Option<ChannelId>,
    pub overwrites: Vec<Overwrite>,
    pub messages: Vec<FakeMessage>,
}

impl FakeChannel {
    pub fn overwrite(&self, principal: Principal) -> Option<&Overwrite> {
        self.overwrites.iter().find(|o| o.principal == principal)
    }
    /// Membres et rôles autorisés à voir le salon
    pub fn viewers(&self) -> HashSet<Principal> {
        self.overwrites.iter()
            .filter(|o| o.allow.contains(Permissions::VIEW_CHANNEL))
            .map(|o| o.principal)
            .collect()
    }
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last().map(|m| &m.message)
    }
    pub fn attachments(&self) -> Vec<(String, String)> {
        self.messages.iter()
            .flat_map(|m| m.message.attachments.iter())
            .map(|a| (a.filename.clone(), String::from_utf8_lossy(&a.data).into_owned()))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    next_id: u64,
    pub channels: HashMap<ChannelId, FakeChannel>,
    pub deleted: Vec<ChannelId>,
    pub edits: Vec<(ChannelId, MessageId, Message)>,
    /// Nombre de créations de salon qui vont échouer
    pub failing_creations: usize,
    /// Identifiant imposé au prochain salon créé
    pub forced_channel_id: Option<ChannelId>,
}

/// Discord simulé, qui enregistre tous les appels
pub struct FakeGateway {
    pub state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeGateway {
            state: Mutex::new(FakeState {
                next_id: 10_000,
                ..Default::default()
            }),
        })
    }
    pub fn channel(&self, channel_id: ChannelId) -> FakeChannel {
        self.state.lock().unwrap().channels.get(&channel_id).cloned().unwrap_or_default()
    }
    pub fn deleted(&self) -> Vec<ChannelId> {
        self.state.lock().unwrap().deleted.clone()
    }
    pub fn fail_next_creations(&self, count: usize) {
        self.state.lock().unwrap().failing_creations = count;
    }
    pub fn force_next_channel_id(&self, channel_id: ChannelId) {
        self.state.lock().unwrap().forced_channel_id = Some(channel_id);
    }
    /// Supprime un salon sans passer par le bot.
    pub fn remove_channel(&self, channel_id: ChannelId) {
        self.state.lock().unwrap().channels.remove(&channel_id);
    }
    /// Message d'un membre dans le salon
    pub fn post(&self, channel_id: ChannelId, author: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.push_message(channel_id, author, Message::with_text(content));
    }
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
    fn push_message(&mut self, channel_id: ChannelId, author: &str, message: Message) -> MessageId {
        let id = MessageId::new(self.next_id());
        let history = HistoryMessage {
            id,
            author: author.to_string(),
            content: message.content.clone(),
            attachments: message.attachments.iter().map(|a| format!("https://cdn.test/{}", a.filename)).collect(),
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000 + id.get() as i64).unwrap(),
        };
        self.channels.entry(channel_id).or_default().messages.push(FakeMessage { id, message, history });
        id
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    fn bot_id(&self) -> UserId {
        UserId::new(BOT_ID)
    }
    async fn create_text_channel(&self, channel: NewChannel) -> gateway::Result<ChannelId> {
        let mut state = self.state.lock().unwrap();
        if state.failing_creations > 0 {
            state.failing_creations -= 1;
            return Err(GatewayError::Rejected(format!("invalid channel name {}", channel.name)));
        }
        let channel_id = match state.forced_channel_id.take() {
            Some(channel_id) => channel_id,
            None => ChannelId::new(state.next_id()),
        };
        state.channels.insert(channel_id, FakeChannel {
            name: channel.name,
            parent_id: Some(channel.parent_id),
            overwrites: channel.overwrites,
            messages: Vec::new(),
        });
        Ok(channel_id)
    }
    async fn delete_channel(&self, channel_id: ChannelId) -> gateway::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.channels.remove(&channel_id);
        state.deleted.push(channel_id);
        Ok(())
    }
    async fn channel_exists(&self, channel_id: ChannelId) -> gateway::Result<bool> {
        Ok(self.state.lock().unwrap().channels.contains_key(&channel_id))
    }
    async fn send_message(&self, channel_id: ChannelId, message: Message) -> gateway::Result<MessageId> {
        Ok(self.state.lock().unwrap().push_message(channel_id, "Tickets#0000", message))
    }
    async fn edit_message(&self, channel_id: ChannelId, message_id: MessageId, message: Message) -> gateway::Result<()> {
        let mut state = self.state.lock().unwrap();
        let existing = state.channels.get_mut(&channel_id)
            .and_then(|c| c.messages.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| GatewayError::NotFound(format!("message {}", message_id)))?;
        existing.message = message.clone();
        state.edits.push((channel_id, message_id, message));
        Ok(())
    }
    async fn set_permission(&self, channel_id: ChannelId, overwrite: Overwrite) -> gateway::Result<()> {
        let mut state = self.state.lock().unwrap();
        let channel = state.channels.get_mut(&channel_id)
            .ok_or_else(|| GatewayError::NotFound(format!("channel {}", channel_id)))?;
        channel.overwrites.retain(|o| o.principal != overwrite.principal);
        channel.overwrites.push(overwrite);
        Ok(())
    }
    async fn remove_permission(&self, channel_id: ChannelId, principal: Principal) -> gateway::Result<()> {
        let mut state = self.state.lock().unwrap();
        let channel = state.channels.get_mut(&channel_id)
            .ok_or_else(|| GatewayError::NotFound(format!("channel {}", channel_id)))?;
        channel.overwrites.retain(|o| o.principal != principal);
        Ok(())
    }
    async fn fetch_messages(&self, channel_id: ChannelId, before: Option<MessageId>, limit: u8) -> gateway::Result<Vec<HistoryMessage>> {
        let state = self.state.lock().unwrap();
        let channel = state.channels.get(&channel_id)
            .ok_or_else(|| GatewayError::NotFound(format!("channel {}", channel_id)))?;
        Ok(channel.messages.iter()
            .rev()
            .filter(|m| before.map_or(true, |before| m.id < before))
            .take(limit as usize)
            .map(|m| m.history.clone())
            .collect())
    }
}
