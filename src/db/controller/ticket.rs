use sea_orm::{
    entity::*,
    query::*,
    sea_query::OnConflict,
    DbConn,
};
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};

use crate::db::{
    model::{
        ticket::{self, extra_role, extra_user, TicketStatus},
        transcript,
        ExtraRole, ExtraUser, Ticket, Transcript,
    },
    controller::{Error, Result},
    IDType,
};
use crate::log_info;

/// Ticket à enregistrer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub guild_id: GuildId,
    pub ticket_number: i64,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub category_id: String,
    pub created_at: i64,
}

pub async fn get_open_ticket_for_user(db: &DbConn, guild_id: GuildId, user_id: UserId) -> Result<Option<ticket::Model>> {
    Ok(Ticket::find()
        .filter(ticket::Column::GuildId.eq(guild_id.get() as IDType))
        .filter(ticket::Column::UserId.eq(user_id.get() as IDType))
        .filter(ticket::Column::Status.eq(TicketStatus::Open))
        .one(db)
        .await?)
}

/// Tickets ouverts du serveur, du plus ancien au plus récent.
pub async fn list_open_tickets(db: &DbConn, guild_id: GuildId) -> Result<Vec<ticket::Model>> {
    Ok(Ticket::find()
        .filter(ticket::Column::GuildId.eq(guild_id.get() as IDType))
        .filter(ticket::Column::Status.eq(TicketStatus::Open))
        .order_by_asc(ticket::Column::CreatedAt)
        .order_by_asc(ticket::Column::TicketNumber)
        .all(db)
        .await?)
}

pub async fn get_ticket_by_channel(db: &DbConn, channel_id: ChannelId) -> Result<Option<ticket::Model>> {
    Ok(Ticket::find()
        .filter(ticket::Column::ChannelId.eq(channel_id.get() as IDType))
        .one(db)
        .await?)
}

pub async fn create_ticket(db: &DbConn, new_ticket: NewTicket) -> Result<ticket::Model> {
    log_info!("Creating ticket #{} in guild {}", new_ticket.ticket_number, new_ticket.guild_id);
    let active_model = ticket::ActiveModel {
        guild_id: Set(new_ticket.guild_id.get() as IDType),
        ticket_number: Set(new_ticket.ticket_number),
        user_id: Set(new_ticket.user_id.get() as IDType),
        channel_id: Set(new_ticket.channel_id.get() as IDType),
        category_id: Set(new_ticket.category_id),
        status: Set(TicketStatus::Open),
        created_at: Set(new_ticket.created_at),
        closed_at: Set(None),
    };
    Ok(active_model.insert(db).await?)
}

async fn set_status(db: &DbConn, ticket: &ticket::Model, status: TicketStatus, closed_at: Option<i64>) -> Result<ticket::Model> {
    let mut active_model = Ticket::find_by_id((ticket.guild_id, ticket.ticket_number))
        .one(db)
        .await?
        .ok_or_else(|| Error::Custom(format!("ticket #{} not found", ticket.ticket_number)))?
        .into_active_model();
    active_model.status = Set(status);
    active_model.closed_at = Set(closed_at);
    Ok(active_model.update(db).await?)
}

pub async fn set_ticket_closed(db: &DbConn, ticket: &ticket::Model, closed_at: i64) -> Result<ticket::Model> {
    log_info!("Closing ticket #{} in guild {}", ticket.ticket_number, ticket.guild_id);
    set_status(db, ticket, TicketStatus::Closed, Some(closed_at)).await
}

pub async fn set_ticket_open(db: &DbConn, ticket: &ticket::Model) -> Result<ticket::Model> {
    log_info!("Reopening ticket #{} in guild {}", ticket.ticket_number, ticket.guild_id);
    set_status(db, ticket, TicketStatus::Open, None).await
}

pub async fn add_extra_users(db: &DbConn, ticket: &ticket::Model, users: &[UserId]) -> Result<()> {
    if users.is_empty() {
        return Ok(());
    }
    let models = users.iter().map(|user| extra_user::ActiveModel {
        guild_id: Set(ticket.guild_id),
        ticket_number: Set(ticket.ticket_number),
        user_id: Set(user.get() as IDType),
    });
    ExtraUser::insert_many(models)
        .on_conflict(
            OnConflict::columns([extra_user::Column::GuildId, extra_user::Column::TicketNumber, extra_user::Column::UserId])
                .do_nothing()
                .to_owned()
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn add_extra_roles(db: &DbConn, ticket: &ticket::Model, roles: &[RoleId]) -> Result<()> {
    if roles.is_empty() {
        return Ok(());
    }
    let models = roles.iter().map(|role| extra_role::ActiveModel {
        guild_id: Set(ticket.guild_id),
        ticket_number: Set(ticket.ticket_number),
        role_id: Set(role.get() as IDType),
    });
    ExtraRole::insert_many(models)
        .on_conflict(
            OnConflict::columns([extra_role::Column::GuildId, extra_role::Column::TicketNumber, extra_role::Column::RoleId])
                .do_nothing()
                .to_owned()
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn remove_extra_users(db: &DbConn, ticket: &ticket::Model, users: &[UserId]) -> Result<()> {
    if users.is_empty() {
        return Ok(());
    }
    ExtraUser::delete_many()
        .filter(extra_user::Column::GuildId.eq(ticket.guild_id))
        .filter(extra_user::Column::TicketNumber.eq(ticket.ticket_number))
        .filter(extra_user::Column::UserId.is_in(users.iter().map(|u| u.get() as IDType)))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn remove_extra_roles(db: &DbConn, ticket: &ticket::Model, roles: &[RoleId]) -> Result<()> {
    if roles.is_empty() {
        return Ok(());
    }
    ExtraRole::delete_many()
        .filter(extra_role::Column::GuildId.eq(ticket.guild_id))
        .filter(extra_role::Column::TicketNumber.eq(ticket.ticket_number))
        .filter(extra_role::Column::RoleId.is_in(roles.iter().map(|r| r.get() as IDType)))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn list_extra_users(db: &DbConn, ticket: &ticket::Model) -> Result<Vec<UserId>> {
    let users = ExtraUser::find()
        .filter(extra_user::Column::GuildId.eq(ticket.guild_id))
        .filter(extra_user::Column::TicketNumber.eq(ticket.ticket_number))
        .order_by_asc(extra_user::Column::UserId)
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| UserId::new(u.user_id as u64)).collect())
}

pub async fn list_extra_roles(db: &DbConn, ticket: &ticket::Model) -> Result<Vec<RoleId>> {
    let roles = ExtraRole::find()
        .filter(extra_role::Column::GuildId.eq(ticket.guild_id))
        .filter(extra_role::Column::TicketNumber.eq(ticket.ticket_number))
        .order_by_asc(extra_role::Column::RoleId)
        .all(db)
        .await?;
    Ok(roles.into_iter().map(|r| RoleId::new(r.role_id as u64)).collect())
}

/// Enregistre la transcription du ticket en remplaçant la précédente.
pub async fn save_transcript(db: &DbConn, ticket: &ticket::Model, content: String, created_at: i64) -> Result<()> {
    let active_model = transcript::ActiveModel {
        guild_id: Set(ticket.guild_id),
        ticket_number: Set(ticket.ticket_number),
        content: Set(content),
        created_at: Set(created_at),
    };
    Transcript::insert(active_model)
        .on_conflict(
            OnConflict::columns([transcript::Column::GuildId, transcript::Column::TicketNumber])
                .update_columns([transcript::Column::Content, transcript::Column::CreatedAt])
                .to_owned()
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn get_transcript(db: &DbConn, guild_id: GuildId, ticket_number: i64) -> Result<Option<transcript::Model>> {
    Ok(Transcript::find_by_id((guild_id.get() as IDType, ticket_number))
        .one(db)
        .await?)
}
