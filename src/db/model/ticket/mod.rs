pub mod category;
pub mod category_role;
pub mod extra_user;
pub mod extra_role;

pub use category::Entity as Category;
pub use category_role::Entity as CategoryRole;
pub use extra_user::Entity as ExtraUser;
pub use extra_role::Entity as ExtraRole;
pub use Entity as Ticket;

use sea_orm::entity::prelude::*;
use crate::db::IDType;

/// État d'un ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TicketStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ticket")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: IDType,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ticket_number: i64,

    /// Personne qui a ouvert le ticket
    pub user_id: IDType,
    /// Un salon ne peut appartenir qu'à un seul ticket
    #[sea_orm(unique)]
    pub channel_id: IDType,
    /// La catégorie peut avoir été supprimée depuis
    pub category_id: String,
    pub status: TicketStatus,
    /// Horodatages en millisecondes
    pub created_at: i64,
    pub closed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel 
{}

impl Model {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }
}
