//! Permissions des salons de ticket

use std::collections::BTreeMap;
use serenity::model::{
    id::{GuildId, RoleId, UserId},
    permissions::Permissions,
};

/// Membre ou rôle visé par une permission de salon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    Role(RoleId),
    Member(UserId),
}

impl Principal {
    fn sort_key(&self) -> (u8, u64) {
        match self {
            Principal::Role(id) => (0, id.get()),
            Principal::Member(id) => (1, id.get()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overwrite {
    pub principal: Principal,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl Overwrite {
    /// Accès complet au salon
    pub fn grant(principal: Principal) -> Self {
        Self {
            principal,
            allow: access(),
            deny: Permissions::empty(),
        }
    }
    /// Retire la vue du salon
    pub fn hide(principal: Principal) -> Self {
        Self {
            principal,
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
        }
    }
}

/// Permissions accordées aux participants d'un ticket
#[inline]
pub fn access() -> Permissions {
    Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY
}

/// Rôle `@everyone` du serveur, de même identifiant que lui
#[inline]
pub fn everyone(guild_id: GuildId) -> RoleId {
    RoleId::new(guild_id.get())
}

/// Participants d'un ticket
#[derive(Debug, Clone, Copy)]
pub struct TicketAccess<'a> {
    pub guild_id: GuildId,
    pub bot_id: UserId,
    pub opener: UserId,
    pub category_roles: &'a [RoleId],
    pub extra_users: &'a [UserId],
    pub extra_roles: &'a [RoleId],
}

/// Permissions d'un salon de ticket.
///
/// `@everyone` (rôle du même identifiant que le serveur) ne voit pas le
/// salon, le bot, l'auteur du ticket et les rôles/membres autorisés y ont
/// accès. `@everyone` n'est jamais autorisé, même s'il fait partie des rôles
/// du ticket. Une seule entrée par membre ou rôle, triée rôles d'abord puis
/// par identifiant. Une autorisation l'emporte sur un refus.
pub fn ticket_overwrites(ticket: &TicketAccess) -> Vec<Overwrite> {
    let mut entries: BTreeMap<(u8, u64), Overwrite> = BTreeMap::new();
    let mut push = |overwrite: Overwrite| {
        entries.entry(overwrite.principal.sort_key())
            .and_modify(|e| {
                e.allow |= overwrite.allow;
                e.deny |= overwrite.deny;
            })
            .or_insert(overwrite);
    };
    let everyone = everyone(ticket.guild_id);
    push(Overwrite::hide(Principal::Role(everyone)));
    push(Overwrite::grant(Principal::Member(ticket.bot_id)));
    push(Overwrite::grant(Principal::Member(ticket.opener)));
    for role in ticket.category_roles.iter().chain(ticket.extra_roles).filter(|r| **r != everyone) {
        push(Overwrite::grant(Principal::Role(*role)));
    }
    for user in ticket.extra_users {
        push(Overwrite::grant(Principal::Member(*user)));
    }
    entries.into_values()
        .map(|mut e| {
            e.deny.remove(e.allow);
            e
        })
        .collect()
}
