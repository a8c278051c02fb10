use sea_orm::entity::prelude::*;
use serenity::model::id::RoleId;

use crate::db::IDType;

/// Mode de nommage des salons de ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum NamingMode {
    /// `ticket-<numéro>`
    #[sea_orm(string_value = "number")]
    Number,
    /// Nom de la personne qui ouvre le ticket
    #[sea_orm(string_value = "user")]
    User,
}

/// Paramètres d'un serveur
///
/// Une ligne par serveur, créée au premier accès.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "guild_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: IDType,
    /// Rôles autorisés à configurer le bot, en tableau JSON
    pub admin_role_ids: String,
    pub panel_channel_id: Option<IDType>,
    pub panel_message_id: Option<IDType>,
    /// Dernier numéro de ticket attribué
    pub ticket_counter: i64,
    pub ticket_channel_naming: NamingMode,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel 
{}

impl Model {
    /// Rôles administrateurs du serveur.
    ///
    /// Une valeur illisible en base est traitée comme une liste vide.
    pub fn admin_roles(&self) -> Vec<RoleId> {
        decode_role_list(&self.admin_role_ids)
    }
}

pub fn encode_role_list(roles: &[RoleId]) -> String {
    let ids = roles.iter().map(|r| r.get().to_string()).collect::<Vec<_>>();
    serde_json::Value::from(ids).to_string()
}

pub fn decode_role_list(value: &str) -> Vec<RoleId> {
    let ids: Vec<serde_json::Value> = match serde_json::from_str(value) {
        Ok(ids) => ids,
        Err(_) => return Vec::new(),
    };
    ids.into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => s.parse::<u64>().ok(),
            serde_json::Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .filter(|id| *id != 0)
        .map(RoleId::new)
        .collect()
}
