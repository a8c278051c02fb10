use sea_orm::entity::prelude::*;
use crate::db::IDType;

/// Transcription d'un ticket, écrasée à chaque fermeture.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ticket_transcript")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: IDType,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ticket_number: i64,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Horodatage en millisecondes
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel 
{}
