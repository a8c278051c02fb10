//! Droits des membres sur la configuration et les tickets

use serenity::model::id::{RoleId, UserId};
use crate::db::model::guild;

/// Auteur d'une interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    /// Nom d'utilisateur, utilisé pour nommer les salons
    pub name: String,
    pub roles: Vec<RoleId>,
    /// Permission administrateur sur le serveur
    pub administrator: bool,
}

impl Actor {
    #[inline]
    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

/// Si des rôles administrateurs sont configurés, seuls eux peuvent configurer
/// le bot. Sinon, il faut la permission administrateur.
pub fn can_configure(actor: &Actor, settings: &guild::Model) -> bool {
    let admin_roles = settings.admin_roles();
    if admin_roles.is_empty() {
        actor.administrator
    } else {
        actor.has_any_role(&admin_roles)
    }
}

/// Staff d'un ticket: configurateur ou membre d'un rôle de la catégorie.
pub fn is_ticket_staff(actor: &Actor, settings: &guild::Model, category_roles: &[RoleId]) -> bool {
    can_configure(actor, settings) || actor.has_any_role(category_roles)
}
