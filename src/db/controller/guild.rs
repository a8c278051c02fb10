use sea_orm::{
    entity::*,
    query::*,
    sea_query::{Expr, OnConflict},
    ConnectionTrait,
    DbConn,
    TransactionTrait,
};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId};

use crate::db::{
    model::guild::{self, NamingMode},
    model::GuildSettings,
    controller::{Error, Result},
    IDType,
};

async fn ensure_guild<C: ConnectionTrait>(db: &C, guild_id: GuildId) -> Result<()> {
    let active_model = guild::ActiveModel {
        guild_id: Set(guild_id.get() as IDType),
        admin_role_ids: Set("[]".to_string()),
        panel_channel_id: Set(None),
        panel_message_id: Set(None),
        ticket_counter: Set(0),
        ticket_channel_naming: Set(NamingMode::Number),
    };
    GuildSettings::insert(active_model)
        .on_conflict(OnConflict::column(guild::Column::GuildId).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn find_guild<C: ConnectionTrait>(db: &C, guild_id: GuildId) -> Result<guild::Model> {
    GuildSettings::find_by_id(guild_id.get() as IDType)
        .one(db)
        .await?
        .ok_or_else(|| Error::Custom(format!("guild {} settings missing", guild_id)))
}

/// Paramètres du serveur, créés avec les valeurs par défaut s'ils n'existent pas.
pub async fn get_or_create_guild_settings(db: &DbConn, guild_id: GuildId) -> Result<guild::Model> {
    ensure_guild(db, guild_id).await?;
    find_guild(db, guild_id).await
}

pub async fn set_admin_roles(db: &DbConn, guild_id: GuildId, roles: &[RoleId]) -> Result<guild::Model> {
    ensure_guild(db, guild_id).await?;
    GuildSettings::update_many()
        .col_expr(guild::Column::AdminRoleIds, Expr::value(guild::encode_role_list(roles)))
        .filter(guild::Column::GuildId.eq(guild_id.get() as IDType))
        .exec(db)
        .await?;
    find_guild(db, guild_id).await
}

pub async fn set_panel_location(db: &DbConn, guild_id: GuildId, channel_id: ChannelId, message_id: MessageId) -> Result<guild::Model> {
    ensure_guild(db, guild_id).await?;
    GuildSettings::update_many()
        .col_expr(guild::Column::PanelChannelId, Expr::value(channel_id.get() as IDType))
        .col_expr(guild::Column::PanelMessageId, Expr::value(message_id.get() as IDType))
        .filter(guild::Column::GuildId.eq(guild_id.get() as IDType))
        .exec(db)
        .await?;
    find_guild(db, guild_id).await
}

pub async fn set_ticket_naming(db: &DbConn, guild_id: GuildId, mode: NamingMode) -> Result<guild::Model> {
    ensure_guild(db, guild_id).await?;
    let mut active_model = find_guild(db, guild_id).await?.into_active_model();
    active_model.ticket_channel_naming = Set(mode);
    Ok(active_model.update(db).await?)
}

/// Incrémente le compteur de tickets du serveur et renvoie la nouvelle valeur.
///
/// L'incrément et la lecture sont faits dans la même transaction.
pub async fn allocate_next_ticket_number(db: &DbConn, guild_id: GuildId) -> Result<i64> {
    ensure_guild(db, guild_id).await?;
    let txn = db.begin().await?;
    GuildSettings::update_many()
        .col_expr(guild::Column::TicketCounter, Expr::col(guild::Column::TicketCounter).add(1))
        .filter(guild::Column::GuildId.eq(guild_id.get() as IDType))
        .exec(&txn)
        .await?;
    let settings = find_guild(&txn, guild_id).await?;
    txn.commit().await?;
    Ok(settings.ticket_counter)
}
