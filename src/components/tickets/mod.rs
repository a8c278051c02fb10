//! Gestionnaire de tickets
//!
//! Reçoit les actions décodées depuis Discord ([`interaction::Action`]),
//! vérifie les droits de l'auteur et renvoie la réponse à afficher.

pub mod archive;
pub mod auth;
pub mod controls;
pub mod error;
pub mod gateway;
pub mod interaction;
pub mod lifecycle;
pub mod panel;
pub mod permissions;
pub mod session;
pub mod setup;
pub mod wizard;

use std::sync::Arc;
use sea_orm::DbConn;
use serenity::model::id::{ChannelId, GuildId};

use self::{
    auth::Actor,
    error::*,
    gateway::Gateway,
    interaction::{Action, ControlId, SetupAction, TicketAction},
    lifecycle::{CloseOutcome, Lifecycle},
    session::{SessionKey, SessionStore},
    wizard::Wizard,
};
use crate::components::utils::message::{self, Message, Modal};
use crate::db::controller::{category as db_category, guild as db_guild};
use crate::{log_error, log_info};

/// Origine d'une interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Command,
    Component,
    /// Formulaire ouvert depuis un composant
    Modal,
}

#[derive(Debug, Clone)]
pub struct InteractionContext {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub actor: Actor,
    pub origin: Origin,
}

impl InteractionContext {
    #[inline]
    fn session_key(&self) -> SessionKey {
        SessionKey::new(self.guild_id, self.actor.user_id)
    }
    /// Un écran remplace le message du composant, ou répond à la commande.
    fn screen(&self, msg: Message) -> Response {
        match self.origin {
            Origin::Command => Response::Reply(msg),
            Origin::Component | Origin::Modal => Response::Update(msg),
        }
    }
}

/// Réponse à une interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Nouveau message
    Reply(Message),
    /// Remplace le message portant le composant
    Update(Message),
    Modal(Modal),
}

/// Le composant de gestion des tickets
pub struct Tickets<G, S> {
    db: Arc<DbConn>,
    gateway: Arc<G>,
    lifecycle: Lifecycle<G>,
    wizard: Wizard<S>,
}

impl<G: Gateway, S: SessionStore> Tickets<G, S> {
    pub fn new(db: Arc<DbConn>, gateway: Arc<G>, sessions: Arc<S>) -> Self {
        Self {
            lifecycle: Lifecycle::new(db.clone(), gateway.clone()),
            wizard: Wizard::new(db.clone(), sessions),
            db,
            gateway,
        }
    }

    pub async fn handle(&self, ctx: &InteractionContext, action: Action) -> Response {
        match action {
            Action::Setup(action) => match self.handle_setup(ctx, action).await {
                Ok(response) => response,
                Err(TicketError::Unauthorized) => denied(),
                Err(e) => {
                    log_failure(ctx, &e);
                    ctx.screen(setup::main_menu(Some(e.user_message())))
                }
            },
            Action::Ticket(action) => match self.handle_ticket(ctx, action).await {
                Ok(response) => response,
                Err(e) => {
                    log_failure(ctx, &e);
                    Response::Reply(message::error(e.user_message()).set_ephemeral(true))
                }
            },
        }
    }

    async fn synchronize_panel(&self, guild_id: GuildId) {
        panel::synchronize(self.db.as_ref(), self.gateway.as_ref(), guild_id).await
    }

    async fn handle_setup(&self, ctx: &InteractionContext, action: SetupAction) -> Result<Response> {
        let settings = db_guild::get_or_create_guild_settings(&self.db, ctx.guild_id).await?;
        if !auth::can_configure(&ctx.actor, &settings) {
            return Err(TicketError::Unauthorized);
        }
        let key = ctx.session_key();
        let response = match action {
            SetupAction::Open => ctx.screen(setup::main_menu(None)),
            SetupAction::Back => {
                self.wizard.cancel(key).await;
                ctx.screen(setup::main_menu(None))
            }
            SetupAction::Panel => ctx.screen(setup::panel_channel_screen()),
            SetupAction::PanelChannel(channel_id) => {
                panel::publish(self.db.as_ref(), self.gateway.as_ref(), ctx.guild_id, channel_id).await?;
                ctx.screen(setup::main_menu(Some(&format!("Panel envoyé dans <#{}>.", channel_id))))
            }
            SetupAction::AdminRoles => ctx.screen(setup::admin_roles_screen()),
            SetupAction::AdminRolesSave(roles) => {
                db_guild::set_admin_roles(&self.db, ctx.guild_id, &roles).await?;
                log_info!("Admin roles of guild {} set by {}", ctx.guild_id, ctx.actor.user_id);
                ctx.screen(setup::main_menu(Some("Rôles administrateurs mis à jour.")))
            }
            SetupAction::Naming => ctx.screen(setup::naming_screen(settings.ticket_channel_naming, None)),
            SetupAction::NamingSet(mode) => {
                db_guild::set_ticket_naming(&self.db, ctx.guild_id, mode).await?;
                ctx.screen(setup::naming_screen(mode, Some("Nom des salons mis à jour.")))
            }
            SetupAction::CategoryAdd => {
                self.wizard.start_create(key).await?;
                ctx.screen(setup::parent_screen(
                    ControlId::SetupCategoryAddParent,
                    "Choisis la catégorie Discord où seront créés les tickets.",
                ))
            }
            SetupAction::CategoryAddParent(parent) => {
                self.wizard.choose_parent(key, parent).await?;
                Response::Modal(setup::category_modal(ControlId::SetupCategoryAddModal, None))
            }
            SetupAction::CategoryAddForm(form) => {
                self.wizard.submit_create_form(key, form).await?;
                ctx.screen(setup::roles_screen(
                    ControlId::SetupCategoryRolesCreate,
                    "Choisis les rôles autorisés à voir les tickets de cette catégorie.",
                ))
            }
            SetupAction::CategoryAddRoles(roles) => {
                let category = self.wizard.commit_create(key, roles).await?;
                self.synchronize_panel(ctx.guild_id).await;
                ctx.screen(setup::main_menu(Some(&format!("Catégorie **{}** créée.", category.name))))
            }
            SetupAction::CategoryEdit => self.pick_screen(ctx, ControlId::SetupCategoryEditSelect, "Choisis la catégorie à modifier.").await?,
            SetupAction::CategoryEditPick(category_id) => {
                let category = self.wizard.start_edit(key, &category_id).await?;
                Response::Modal(setup::category_modal(ControlId::SetupCategoryEditModal, Some(&category)))
            }
            SetupAction::CategoryEditForm(form) => {
                self.wizard.submit_edit_form(key, form).await?;
                ctx.screen(setup::parent_screen(
                    ControlId::SetupCategoryEditParent,
                    "Choisis la catégorie Discord parente.",
                ))
            }
            SetupAction::CategoryEditParent(parent) => {
                let category = self.wizard.commit_edit(key, parent).await?;
                self.synchronize_panel(ctx.guild_id).await;
                ctx.screen(setup::main_menu(Some(&format!("Catégorie **{}** modifiée.", category.name))))
            }
            SetupAction::CategoryRoles => self.pick_screen(ctx, ControlId::SetupCategoryRolesSelect, "Choisis la catégorie dont modifier les rôles.").await?,
            SetupAction::CategoryRolesPick(category_id) => {
                let category = self.wizard.start_role_update(key, &category_id).await?;
                ctx.screen(setup::roles_screen(
                    ControlId::SetupCategoryRolesUpdate,
                    &format!("Choisis les nouveaux rôles autorisés de **{}**.", category.name),
                ))
            }
            SetupAction::CategoryRolesSave(roles) => {
                let category = self.wizard.commit_role_update(key, roles).await?;
                self.synchronize_panel(ctx.guild_id).await;
                ctx.screen(setup::main_menu(Some(&format!("Rôles de **{}** mis à jour.", category.name))))
            }
            SetupAction::CategoryDelete => self.pick_screen(ctx, ControlId::SetupCategoryDeleteSelect, "Choisis la catégorie à supprimer.").await?,
            SetupAction::CategoryDeletePick(category_id) => {
                if !db_category::delete_category(&self.db, ctx.guild_id, &category_id).await? {
                    return Err(TicketError::validation(CATEGORY_NOT_FOUND));
                }
                log_info!("Category {} of guild {} deleted by {}", category_id, ctx.guild_id, ctx.actor.user_id);
                self.synchronize_panel(ctx.guild_id).await;
                ctx.screen(setup::main_menu(Some("Catégorie supprimée.")))
            }
            SetupAction::CategoryList => {
                let categories = db_category::list_categories(&self.db, ctx.guild_id).await?;
                if categories.is_empty() {
                    return Err(TicketError::validation(NO_CATEGORY));
                }
                let mut listed = Vec::with_capacity(categories.len());
                for category in categories {
                    let roles = db_category::get_category_roles(&self.db, &category.id).await?;
                    listed.push((category, roles));
                }
                ctx.screen(setup::category_list_screen(&listed))
            }
            SetupAction::CloseAll => {
                let report = self.lifecycle.close_all(ctx.guild_id).await?;
                log_info!("Close all tickets of guild {}: {:?}", ctx.guild_id, report);
                ctx.screen(setup::main_menu(Some(&format!(
                    "Tickets fermés: {}. Salons introuvables: {}. Échecs: {}.",
                    report.closed, report.missing_channel, report.failed
                ))))
            }
        };
        Ok(response)
    }

    async fn pick_screen(&self, ctx: &InteractionContext, id: ControlId, text: &str) -> Result<Response> {
        let categories = db_category::list_categories(&self.db, ctx.guild_id).await?;
        if categories.is_empty() {
            return Err(TicketError::validation(NO_CATEGORY));
        }
        Ok(ctx.screen(setup::category_pick_screen(id, text, &categories)))
    }

    async fn handle_ticket(&self, ctx: &InteractionContext, action: TicketAction) -> Result<Response> {
        let (channel, actor) = (ctx.channel_id, &ctx.actor);
        let done = |text: &str| ctx.screen(message::success(text).set_ephemeral(true));
        let response = match action {
            TicketAction::Open(category_id) => {
                let created = self.lifecycle.create(ctx.guild_id, actor, &category_id).await?;
                log_info!("Ticket #{} opened by {} in guild {}", created.ticket_number, actor.user_id, ctx.guild_id);
                Response::Reply(message::success(format!("Ton ticket a été créé: <#{}>", created.channel_id)).set_ephemeral(true))
            }
            TicketAction::Close => {
                let msg = match self.lifecycle.close(channel, actor).await? {
                    CloseOutcome::Closed => message::success("Ticket fermé."),
                    CloseOutcome::MissingChannel => message::warn("Le salon du ticket n'existe plus, le ticket a été marqué fermé."),
                };
                Response::Reply(msg.set_ephemeral(true))
            }
            TicketAction::Reopen => {
                self.lifecycle.reopen(channel, actor).await?;
                Response::Reply(message::success("Ticket rouvert.").set_ephemeral(true))
            }
            TicketAction::Delete => {
                self.lifecycle.delete(channel, actor).await?;
                Response::Reply(message::success("Ticket supprimé.").set_ephemeral(true))
            }
            TicketAction::AddMenu => Response::Reply(self.lifecycle.show_add_staff(channel, actor).await?),
            TicketAction::RemoveMenu => Response::Reply(self.lifecycle.show_remove_staff(channel, actor).await?),
            TicketAction::AddUsers(users) => {
                self.lifecycle.add_users(channel, actor, &users).await?;
                done("Membres ajoutés au ticket.")
            }
            TicketAction::AddRoles(roles) => {
                self.lifecycle.add_roles(channel, actor, &roles).await?;
                done("Rôles ajoutés au ticket.")
            }
            TicketAction::RemoveUsers(users) => {
                self.lifecycle.remove_users(channel, actor, &users).await?;
                done("Membres retirés du ticket.")
            }
            TicketAction::RemoveRoles(roles) => {
                self.lifecycle.remove_roles(channel, actor, &roles).await?;
                done("Rôles retirés du ticket.")
            }
        };
        Ok(response)
    }

    /// Appelé quand un salon est supprimé sur Discord.
    pub async fn reconcile_channel_removal(&self, channel_id: ChannelId) {
        match self.lifecycle.reconcile_channel_removal(channel_id).await {
            Ok(true) => log_info!("Ticket of deleted channel {} marked as closed", channel_id),
            Ok(false) => (),
            Err(e) => log_error!("Unable to reconcile deleted channel {}: {}", channel_id, e),
        }
    }
}

fn denied() -> Response {
    Response::Reply(message::error(PERMISSION_DENIED).set_ephemeral(true))
}

fn log_failure(ctx: &InteractionContext, e: &TicketError) {
    match e {
        TicketError::Unavailable(_) | TicketError::Persistence(_) => log_error!(
            "Interaction of {} in guild {} (channel {}) failed: {}",
            ctx.actor.user_id, ctx.guild_id, ctx.channel_id, e
        ),
        TicketError::Validation(_) | TicketError::Unauthorized => (),
    }
}
