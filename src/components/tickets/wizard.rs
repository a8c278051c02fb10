//! Assistants de configuration des catégories
//!
//! Discord livre chaque geste (choix dans un menu, envoi d'un formulaire)
//! comme une interaction séparée. Le brouillon de l'opération est gardé dans
//! le [`SessionStore`] entre deux interactions du même membre, puis écrit en
//! base en une fois.

use std::sync::Arc;
use sea_orm::DbConn;
use serenity::model::id::{ChannelId, RoleId};

use super::{
    error::*,
    session::{SessionKey, SessionStore},
};
use crate::db::{
    controller::category::{self as db_category, CategoryUpdate, NewCategory},
    model::ticket::category,
};
use crate::log_info;

/// Nombre maximum d'options d'un menu de sélection Discord
pub const MAX_CATEGORIES: usize = 25;

/// Champs du formulaire de catégorie, tels que saisis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
    pub emoji: String,
    pub form_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDraft {
    pub parent: Option<ChannelId>,
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub form_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub category_id: String,
    pub updates: CategoryUpdate,
    pub form_submitted: bool,
}

/// Brouillon d'une session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    CategoryCreate(CreateDraft),
    CategoryEdit(EditDraft),
    CategoryRoleUpdate { category_id: String },
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub struct Wizard<S> {
    db: Arc<DbConn>,
    sessions: Arc<S>,
}

impl<S: SessionStore> Wizard<S> {
    pub fn new(db: Arc<DbConn>, sessions: Arc<S>) -> Self {
        Self { db, sessions }
    }

    /// Abandonne la session en cours, sans effet sur la base.
    pub async fn cancel(&self, key: SessionKey) {
        self.sessions.remove(key).await;
    }

    async fn create_draft(&self, key: SessionKey) -> Result<CreateDraft> {
        match self.sessions.get(key).await {
            Some(Draft::CategoryCreate(draft)) => Ok(draft),
            _ => Err(TicketError::validation(NO_PENDING_OPERATION)),
        }
    }
    async fn edit_draft(&self, key: SessionKey) -> Result<EditDraft> {
        match self.sessions.get(key).await {
            Some(Draft::CategoryEdit(draft)) => Ok(draft),
            _ => Err(TicketError::validation(NO_PENDING_OPERATION)),
        }
    }
    async fn existing_category(&self, key: SessionKey, category_id: &str) -> Result<category::Model> {
        db_category::get_category(&self.db, key.guild_id, category_id).await?
            .ok_or_else(|| TicketError::validation(CATEGORY_NOT_FOUND))
    }
    async fn check_capacity(&self, key: SessionKey) -> Result<()> {
        let count = db_category::list_categories(&self.db, key.guild_id).await?.len();
        if count >= MAX_CATEGORIES {
            return Err(TicketError::validation(TOO_MANY_CATEGORIES));
        }
        Ok(())
    }

    /* Création */

    pub async fn start_create(&self, key: SessionKey) -> Result<()> {
        self.check_capacity(key).await?;
        self.sessions.put(key, Draft::CategoryCreate(CreateDraft::default())).await;
        Ok(())
    }
    pub async fn choose_parent(&self, key: SessionKey, parent: ChannelId) -> Result<()> {
        let mut draft = self.create_draft(key).await?;
        draft.parent = Some(parent);
        self.sessions.put(key, Draft::CategoryCreate(draft)).await;
        Ok(())
    }
    pub async fn submit_create_form(&self, key: SessionKey, form: CategoryForm) -> Result<()> {
        let mut draft = self.create_draft(key).await?;
        if draft.parent.is_none() {
            return Err(TicketError::validation(NO_PENDING_OPERATION));
        }
        draft.name = non_blank(&form.name);
        draft.emoji = non_blank(&form.emoji);
        draft.form_text = Some(form.form_text).filter(|t| !t.trim().is_empty());
        self.sessions.put(key, Draft::CategoryCreate(draft)).await;
        Ok(())
    }
    /// Enregistre la catégorie avec ses rôles et termine la session.
    pub async fn commit_create(&self, key: SessionKey, roles: Vec<RoleId>) -> Result<category::Model> {
        let draft = self.create_draft(key).await?;
        if let Err(e) = self.check_capacity(key).await {
            self.sessions.remove(key).await;
            return Err(e);
        }
        let (parent, name, form_text) = match (draft.parent, draft.name, draft.form_text) {
            (Some(parent), Some(name), Some(form_text)) => (parent, name, form_text),
            _ => return Err(TicketError::validation(INCOMPLETE_CATEGORY)),
        };
        if roles.is_empty() {
            return Err(TicketError::validation(NO_AUTHORIZED_ROLE));
        }
        let new_category = NewCategory {
            id: uuid::Uuid::new_v4().to_string(),
            guild_id: key.guild_id,
            name,
            emoji: draft.emoji,
            parent_category_id: parent,
            form_text,
        };
        let model = db_category::create_category(&self.db, new_category, &roles).await?;
        self.sessions.remove(key).await;
        log_info!("Category {} created by {}", model.id, key.user_id);
        Ok(model)
    }

    /* Modification */

    pub async fn start_edit(&self, key: SessionKey, category_id: &str) -> Result<category::Model> {
        let category = self.existing_category(key, category_id).await?;
        self.sessions.put(key, Draft::CategoryEdit(EditDraft {
            category_id: category.id.clone(),
            updates: CategoryUpdate::default(),
            form_submitted: false,
        })).await;
        Ok(category)
    }
    /// Un champ laissé vide garde sa valeur actuelle.
    pub async fn submit_edit_form(&self, key: SessionKey, form: CategoryForm) -> Result<()> {
        let mut draft = self.edit_draft(key).await?;
        draft.updates = CategoryUpdate {
            name: non_blank(&form.name),
            emoji: non_blank(&form.emoji),
            parent_category_id: None,
            form_text: Some(form.form_text).filter(|t| !t.trim().is_empty()),
        };
        draft.form_submitted = true;
        self.sessions.put(key, Draft::CategoryEdit(draft)).await;
        Ok(())
    }
    pub async fn commit_edit(&self, key: SessionKey, parent: ChannelId) -> Result<category::Model> {
        let draft = self.edit_draft(key).await?;
        if !draft.form_submitted {
            return Err(TicketError::validation(NO_PENDING_OPERATION));
        }
        let update = CategoryUpdate {
            parent_category_id: Some(parent),
            ..draft.updates
        };
        let updated = db_category::update_category(&self.db, key.guild_id, &draft.category_id, update).await?;
        self.sessions.remove(key).await;
        updated.ok_or_else(|| TicketError::validation(CATEGORY_NOT_FOUND))
    }

    /* Rôles */

    pub async fn start_role_update(&self, key: SessionKey, category_id: &str) -> Result<category::Model> {
        let category = self.existing_category(key, category_id).await?;
        self.sessions.put(key, Draft::CategoryRoleUpdate { category_id: category.id.clone() }).await;
        Ok(category)
    }
    /// Remplace l'ensemble des rôles de la catégorie.
    pub async fn commit_role_update(&self, key: SessionKey, roles: Vec<RoleId>) -> Result<category::Model> {
        let category_id = match self.sessions.get(key).await {
            Some(Draft::CategoryRoleUpdate { category_id }) => category_id,
            _ => return Err(TicketError::validation(NO_PENDING_OPERATION)),
        };
        if roles.is_empty() {
            return Err(TicketError::validation(NO_AUTHORIZED_ROLE));
        }
        let category = match self.existing_category(key, &category_id).await {
            Ok(category) => category,
            Err(e) => {
                self.sessions.remove(key).await;
                return Err(e);
            }
        };
        db_category::replace_category_roles(&self.db, &category.id, &roles).await?;
        self.sessions.remove(key).await;
        Ok(category)
    }
}
