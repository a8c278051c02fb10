use sea_orm::entity::prelude::*;

use crate::db::IDType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ticket_category")]
pub struct Model {
    /// UUID v4 généré à la création
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub guild_id: IDType,
    /// Nom affiché dans le panel
    pub name: String, 
    pub emoji: Option<String>,
    /// Catégorie Discord sous laquelle les salons de ticket sont créés
    pub parent_category_id: IDType,
    /// Message posté à l'ouverture d'un ticket
    #[sea_orm(column_type = "Text")]
    pub form_text: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation 
{
    #[sea_orm(has_many = "super::category_role::Entity")]
    Roles
}

impl Related<super::category_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel 
{}
