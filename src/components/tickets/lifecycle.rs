//! Cycle de vie des tickets
//!
//! Un ticket est `open` ou `closed`. Un ticket fermé peut être rouvert autant
//! de fois que nécessaire. La suppression retire seulement le salon, la
//! ligne reste en base avec son dernier état.

use std::{collections::HashMap, sync::Arc};
use sea_orm::DbConn;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    archive,
    auth::{self, Actor},
    controls,
    error::*,
    gateway::{Gateway, NewChannel},
    permissions::{self, Overwrite, Principal, TicketAccess},
};
use crate::components::utils::message::Message;
use crate::db::{
    controller::{self, category as db_category, guild as db_guild, ticket as db_ticket},
    model::{guild::NamingMode, ticket},
};
use crate::{log_error, log_info, log_warn};

/// Nom de salon utilisé quand le nom calculé est vide ou refusé
pub const FALLBACK_CHANNEL_NAME: &str = "ticket";
const MAX_CHANNEL_NAME: usize = 90;

lazy_static::lazy_static!(
    static ref RE_SPACES: regex::Regex = regex::Regex::new(r"\s+").unwrap();
    static ref RE_INVALID: regex::Regex = regex::Regex::new(r"[^a-z0-9-]").unwrap();
    static ref RE_DASHES: regex::Regex = regex::Regex::new(r"-+").unwrap();
);

/// Nom de salon Discord valide: minuscules, chiffres et tirets.
///
/// Renvoie `None` s'il ne reste rien.
pub fn normalize_channel_name(input: &str) -> Option<String> {
    let lower = input.to_lowercase();
    let dashed = RE_SPACES.replace_all(&lower, "-");
    let cleaned = RE_INVALID.replace_all(&dashed, "");
    let collapsed = RE_DASHES.replace_all(&cleaned, "-");
    let name: String = collapsed.trim_matches('-').chars().take(MAX_CHANNEL_NAME).collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub fn channel_name(mode: NamingMode, ticket_number: i64, opener_name: &str) -> String {
    let preferred = match mode {
        NamingMode::Number => normalize_channel_name(&format!("ticket-{}", ticket_number)),
        NamingMode::User => normalize_channel_name(opener_name),
    };
    preferred.unwrap_or_else(|| FALLBACK_CHANNEL_NAME.to_string())
}

/// Verrous de création de ticket, un par (serveur, membre).
///
/// Tenu entre la vérification "pas de ticket ouvert" et l'enregistrement du
/// ticket.
#[derive(Default)]
pub struct CreationLocks {
    locks: Mutex<HashMap<(GuildId, UserId), Arc<Mutex<()>>>>,
}

impl CreationLocks {
    pub async fn acquire(&self, guild_id: GuildId, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry((guild_id, user_id)).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Ticket créé
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedTicket {
    pub ticket_number: i64,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// Le salon n'existait plus, le ticket a seulement été marqué fermé.
    MissingChannel,
}

/// Bilan d'une fermeture de tous les tickets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseAllReport {
    pub closed: usize,
    pub missing_channel: usize,
    pub failed: usize,
}

#[inline]
fn user_id(id: i64) -> UserId {
    UserId::new(id as u64)
}
#[inline]
fn channel_id(id: i64) -> ChannelId {
    ChannelId::new(id as u64)
}

pub struct Lifecycle<G> {
    db: Arc<DbConn>,
    gateway: Arc<G>,
    locks: CreationLocks,
}

impl<G: Gateway> Lifecycle<G> {
    pub fn new(db: Arc<DbConn>, gateway: Arc<G>) -> Self {
        Self {
            db,
            gateway,
            locks: CreationLocks::default(),
        }
    }

    async fn send_or_warn(&self, channel: ChannelId, message: Message, what: &str) {
        if let Err(e) = self.gateway.send_message(channel, message).await {
            log_warn!("Unable to send the {} in {}: {}", what, channel, e);
        }
    }

    /// Ouvre un ticket dans la catégorie pour l'auteur de l'interaction.
    pub async fn create(&self, guild_id: GuildId, actor: &Actor, category_id: &str) -> Result<CreatedTicket> {
        let guard = self.locks.acquire(guild_id, actor.user_id).await;
        if db_ticket::get_open_ticket_for_user(&self.db, guild_id, actor.user_id).await?.is_some() {
            return Err(TicketError::validation(EXISTING_TICKET));
        }
        let category = db_category::get_category(&self.db, guild_id, category_id).await?
            .ok_or_else(|| TicketError::validation(CATEGORY_NOT_FOUND))?;
        let roles = db_category::get_category_roles(&self.db, &category.id).await?;
        if roles.is_empty() {
            return Err(TicketError::validation(NO_AUTHORIZED_ROLE));
        }
        let settings = db_guild::get_or_create_guild_settings(&self.db, guild_id).await?;
        let ticket_number = db_guild::allocate_next_ticket_number(&self.db, guild_id).await?;

        let overwrites = permissions::ticket_overwrites(&TicketAccess {
            guild_id,
            bot_id: self.gateway.bot_id(),
            opener: actor.user_id,
            category_roles: &roles,
            extra_users: &[],
            extra_roles: &[],
        });
        let mut new_channel = NewChannel {
            guild_id,
            name: channel_name(settings.ticket_channel_naming, ticket_number, &actor.name),
            parent_id: channel_id(category.parent_category_id),
            overwrites,
        };
        let channel = match self.gateway.create_text_channel(new_channel.clone()).await {
            Ok(channel) => channel,
            Err(e) => {
                log_warn!("Unable to create channel `{}`, retrying with `{}`: {}", new_channel.name, FALLBACK_CHANNEL_NAME, e);
                new_channel.name = FALLBACK_CHANNEL_NAME.to_string();
                self.gateway.create_text_channel(new_channel).await?
            }
        };

        let created_at = chrono::Utc::now();
        let new_ticket = db_ticket::NewTicket {
            guild_id,
            ticket_number,
            user_id: actor.user_id,
            channel_id: channel,
            category_id: category.id.clone(),
            created_at: created_at.timestamp_millis(),
        };
        if let Err(e) = db_ticket::create_ticket(&self.db, new_ticket).await {
            log_error!("Unable to save ticket #{} of guild {}, removing channel {}: {}", ticket_number, guild_id, channel, e);
            if let Err(e) = self.gateway.delete_channel(channel).await {
                log_warn!("Unable to remove orphan channel {}: {}", channel, e);
            }
            return Err(e.into());
        }
        drop(guard);

        let everyone = permissions::everyone(guild_id);
        let staff_roles: Vec<RoleId> = roles.iter().copied().filter(|r| *r != everyone).collect();
        let intro = controls::ticket_intro(ticket_number, &category.name, actor.user_id, &staff_roles, created_at);
        self.send_or_warn(channel, intro, "ticket introduction").await;
        self.send_or_warn(channel, Message::with_text(&category.form_text), "category form").await;
        self.send_or_warn(channel, controls::open_controls(), "ticket controls").await;
        Ok(CreatedTicket { ticket_number, channel_id: channel })
    }

    async fn ticket_in(&self, channel: ChannelId) -> Result<ticket::Model> {
        db_ticket::get_ticket_by_channel(&self.db, channel).await?
            .ok_or_else(|| TicketError::validation(NOT_A_TICKET))
    }

    async fn is_staff(&self, ticket: &ticket::Model, actor: &Actor) -> Result<(bool, Vec<RoleId>)> {
        let settings = db_guild::get_or_create_guild_settings(&self.db, GuildId::new(ticket.guild_id as u64)).await?;
        let roles = db_category::get_category_roles(&self.db, &ticket.category_id).await?;
        Ok((auth::is_ticket_staff(actor, &settings, &roles), roles))
    }

    /// Ticket du salon, si l'auteur en fait partie du staff.
    async fn staff_ticket(&self, channel: ChannelId, actor: &Actor) -> Result<(ticket::Model, Vec<RoleId>)> {
        let ticket = self.ticket_in(channel).await?;
        match self.is_staff(&ticket, actor).await? {
            (true, roles) => Ok((ticket, roles)),
            (false, _) => Err(TicketError::Unauthorized),
        }
    }

    /// Ferme le ticket du salon. Réservé à son auteur et au staff.
    pub async fn close(&self, channel: ChannelId, actor: &Actor) -> Result<CloseOutcome> {
        let ticket = self.ticket_in(channel).await?;
        if !ticket.is_open() {
            return Err(TicketError::validation(ALREADY_CLOSED));
        }
        let is_opener = user_id(ticket.user_id) == actor.user_id;
        if !is_opener && !self.is_staff(&ticket, actor).await?.0 {
            return Err(TicketError::Unauthorized);
        }
        self.close_record(&ticket).await
    }

    /// Transcrit, masque le salon à l'auteur et marque le ticket fermé.
    async fn close_record(&self, ticket: &ticket::Model) -> Result<CloseOutcome> {
        let channel = channel_id(ticket.channel_id);
        match self.gateway.channel_exists(channel).await {
            Ok(true) => (),
            Ok(false) => {
                db_ticket::set_ticket_closed(&self.db, ticket, controller::now_ms()).await?;
                return Ok(CloseOutcome::MissingChannel);
            }
            Err(e) => log_warn!("Unable to check channel {}: {}", channel, e),
        }
        let transcript = archive::assemble(self.gateway.as_ref(), channel).await;
        db_ticket::save_transcript(&self.db, ticket, transcript.clone(), controller::now_ms()).await?;

        let opener = Principal::Member(user_id(ticket.user_id));
        if let Err(e) = self.gateway.set_permission(channel, Overwrite::hide(opener)).await {
            log_warn!("Unable to hide ticket #{} from its opener: {}", ticket.ticket_number, e);
        }
        let file = Message::new().add_attachment(archive::file_name(ticket.ticket_number), transcript.into_bytes());
        self.send_or_warn(channel, file, "transcript").await;

        db_ticket::set_ticket_closed(&self.db, ticket, controller::now_ms()).await?;
        self.send_or_warn(channel, controls::closed_controls(), "closed ticket controls").await;
        Ok(CloseOutcome::Closed)
    }

    /// Rouvre le ticket du salon. Réservé au staff.
    pub async fn reopen(&self, channel: ChannelId, actor: &Actor) -> Result<()> {
        let ticket = self.ticket_in(channel).await?;
        if ticket.is_open() {
            return Err(TicketError::validation(ALREADY_OPEN));
        }
        if !self.is_staff(&ticket, actor).await?.0 {
            return Err(TicketError::Unauthorized);
        }
        db_ticket::set_ticket_open(&self.db, &ticket).await?;
        let opener = Principal::Member(user_id(ticket.user_id));
        if let Err(e) = self.gateway.set_permission(channel, Overwrite::grant(opener)).await {
            log_warn!("Unable to restore access of ticket #{} to its opener: {}", ticket.ticket_number, e);
        }
        self.send_or_warn(channel, controls::reopened_controls(), "ticket controls").await;
        Ok(())
    }

    /// Supprime le salon du ticket. Réservé au staff.
    pub async fn delete(&self, channel: ChannelId, actor: &Actor) -> Result<()> {
        let (ticket, _) = self.staff_ticket(channel, actor).await?;
        self.gateway.delete_channel(channel).await?;
        log_info!("Channel of ticket #{} (guild {}) deleted by {}", ticket.ticket_number, ticket.guild_id, actor.user_id);
        Ok(())
    }

    /// Ferme tous les tickets ouverts du serveur, indépendamment les uns des autres.
    pub async fn close_all(&self, guild_id: GuildId) -> Result<CloseAllReport> {
        let mut report = CloseAllReport::default();
        for ticket in db_ticket::list_open_tickets(&self.db, guild_id).await? {
            match self.close_record(&ticket).await {
                Ok(CloseOutcome::Closed) => report.closed += 1,
                Ok(CloseOutcome::MissingChannel) => report.missing_channel += 1,
                Err(e) => {
                    log_error!("Unable to close ticket #{} of guild {}: {}", ticket.ticket_number, guild_id, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Le salon a été supprimé en dehors du bot: le ticket ouvert est marqué fermé.
    pub async fn reconcile_channel_removal(&self, channel: ChannelId) -> Result<bool> {
        match db_ticket::get_ticket_by_channel(&self.db, channel).await? {
            Some(ticket) if ticket.is_open() => {
                db_ticket::set_ticket_closed(&self.db, &ticket, controller::now_ms()).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /* Membres supplémentaires */

    pub async fn show_add_staff(&self, channel: ChannelId, actor: &Actor) -> Result<Message> {
        self.staff_ticket(channel, actor).await?;
        Ok(controls::add_staff_menus())
    }

    pub async fn show_remove_staff(&self, channel: ChannelId, actor: &Actor) -> Result<Message> {
        self.staff_ticket(channel, actor).await?;
        Ok(controls::remove_staff_menus())
    }

    async fn grant_all(&self, channel: ChannelId, principals: impl Iterator<Item = Principal>) {
        for principal in principals {
            if let Err(e) = self.gateway.set_permission(channel, Overwrite::grant(principal)).await {
                log_warn!("Unable to grant {:?} access to {}: {}", principal, channel, e);
            }
        }
    }

    async fn revoke_all(&self, channel: ChannelId, principals: impl Iterator<Item = Principal>) {
        for principal in principals {
            if let Err(e) = self.gateway.remove_permission(channel, principal).await {
                log_warn!("Unable to remove {:?} from {}: {}", principal, channel, e);
            }
        }
    }

    pub async fn add_users(&self, channel: ChannelId, actor: &Actor, users: &[UserId]) -> Result<()> {
        let (ticket, _) = self.staff_ticket(channel, actor).await?;
        db_ticket::add_extra_users(&self.db, &ticket, users).await?;
        self.grant_all(channel, users.iter().map(|u| Principal::Member(*u))).await;
        Ok(())
    }

    pub async fn add_roles(&self, channel: ChannelId, actor: &Actor, roles: &[RoleId]) -> Result<()> {
        let (ticket, _) = self.staff_ticket(channel, actor).await?;
        let everyone = permissions::everyone(GuildId::new(ticket.guild_id as u64));
        let roles: Vec<RoleId> = roles.iter().copied().filter(|r| *r != everyone).collect();
        db_ticket::add_extra_roles(&self.db, &ticket, &roles).await?;
        self.grant_all(channel, roles.into_iter().map(Principal::Role)).await;
        Ok(())
    }

    /// L'auteur du ticket garde son accès.
    pub async fn remove_users(&self, channel: ChannelId, actor: &Actor, users: &[UserId]) -> Result<()> {
        let (ticket, _) = self.staff_ticket(channel, actor).await?;
        db_ticket::remove_extra_users(&self.db, &ticket, users).await?;
        let opener = user_id(ticket.user_id);
        self.revoke_all(channel, users.iter().filter(|u| **u != opener).map(|u| Principal::Member(*u))).await;
        Ok(())
    }

    /// Les rôles de la catégorie gardent leur accès, `@everyone` reste masqué.
    pub async fn remove_roles(&self, channel: ChannelId, actor: &Actor, roles: &[RoleId]) -> Result<()> {
        let (ticket, category_roles) = self.staff_ticket(channel, actor).await?;
        db_ticket::remove_extra_roles(&self.db, &ticket, roles).await?;
        let everyone = permissions::everyone(GuildId::new(ticket.guild_id as u64));
        self.revoke_all(channel, roles.iter()
            .filter(|r| **r != everyone && !category_roles.contains(r))
            .map(|r| Principal::Role(*r))).await;
        Ok(())
    }
}
