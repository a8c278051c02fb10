use sea_orm::{
    entity::*,
    query::*,
    sea_query::OnConflict,
    ConnectionTrait,
    DbConn,
    TransactionTrait,
};
use serenity::model::id::{ChannelId, GuildId, RoleId};

use crate::db::{
    model::ticket::{category, category_role},
    model::{Category, CategoryRole},
    controller::Result,
    IDType,
};
use crate::log_info;

/// Nouvelle catégorie de tickets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub id: String,
    pub guild_id: GuildId,
    pub name: String,
    pub emoji: Option<String>,
    pub parent_category_id: ChannelId,
    pub form_text: String,
}

/// Modification partielle d'une catégorie.
///
/// Les champs à `None` gardent leur valeur actuelle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub parent_category_id: Option<ChannelId>,
    pub form_text: Option<String>,
}

/// Catégories du serveur, triées par nom.
pub async fn list_categories(db: &DbConn, guild_id: GuildId) -> Result<Vec<category::Model>> {
    Ok(Category::find()
        .filter(category::Column::GuildId.eq(guild_id.get() as IDType))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_category(db: &DbConn, guild_id: GuildId, category_id: &str) -> Result<Option<category::Model>> {
    Ok(Category::find_by_id(category_id.to_string())
        .filter(category::Column::GuildId.eq(guild_id.get() as IDType))
        .one(db)
        .await?)
}

/// Rôles autorisés d'une catégorie
pub async fn get_category_roles(db: &DbConn, category_id: &str) -> Result<Vec<RoleId>> {
    let roles = CategoryRole::find()
        .filter(category_role::Column::CategoryId.eq(category_id))
        .order_by_asc(category_role::Column::RoleId)
        .all(db)
        .await?;
    Ok(roles.into_iter().map(|r| RoleId::new(r.role_id as u64)).collect())
}

async fn insert_roles<C: ConnectionTrait>(db: &C, category_id: &str, roles: &[RoleId]) -> Result<()> {
    if roles.is_empty() {
        return Ok(());
    }
    let models = roles.iter().map(|role| category_role::ActiveModel {
        category_id: Set(category_id.to_string()),
        role_id: Set(role.get() as IDType),
    });
    CategoryRole::insert_many(models)
        .on_conflict(
            OnConflict::columns([category_role::Column::CategoryId, category_role::Column::RoleId])
                .do_nothing()
                .to_owned()
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Enregistre une catégorie et ses rôles dans une même transaction.
pub async fn create_category(db: &DbConn, category: NewCategory, roles: &[RoleId]) -> Result<category::Model> {
    log_info!("Adding category {} ({})", category.name, category.id);
    let txn = db.begin().await?;
    let active_model = category::ActiveModel {
        id: Set(category.id.clone()),
        guild_id: Set(category.guild_id.get() as IDType),
        name: Set(category.name),
        emoji: Set(category.emoji),
        parent_category_id: Set(category.parent_category_id.get() as IDType),
        form_text: Set(category.form_text),
    };
    let model = active_model.insert(&txn).await?;
    insert_roles(&txn, &category.id, roles).await?;
    txn.commit().await?;
    Ok(model)
}

/// Applique une modification partielle.
///
/// Renvoie `None` si la catégorie n'existe pas.
pub async fn update_category(db: &DbConn, guild_id: GuildId, category_id: &str, update: CategoryUpdate) -> Result<Option<category::Model>> {
    let model = match get_category(db, guild_id, category_id).await? {
        Some(model) => model,
        None => return Ok(None),
    };
    let mut active_model = model.into_active_model();
    if let Some(name) = update.name {
        active_model.name = Set(name);
    }
    if let Some(emoji) = update.emoji {
        active_model.emoji = Set(Some(emoji));
    }
    if let Some(parent) = update.parent_category_id {
        active_model.parent_category_id = Set(parent.get() as IDType);
    }
    if let Some(form_text) = update.form_text {
        active_model.form_text = Set(form_text);
    }
    if !active_model.is_changed() {
        return get_category(db, guild_id, category_id).await;
    }
    Ok(Some(active_model.update(db).await?))
}

/// Remplace l'ensemble des rôles autorisés de la catégorie.
pub async fn replace_category_roles(db: &DbConn, category_id: &str, roles: &[RoleId]) -> Result<()> {
    let txn = db.begin().await?;
    CategoryRole::delete_many()
        .filter(category_role::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;
    insert_roles(&txn, category_id, roles).await?;
    txn.commit().await?;
    Ok(())
}

/// Supprime la catégorie et ses rôles.
///
/// Renvoie `false` si la catégorie n'existait pas.
pub async fn delete_category(db: &DbConn, guild_id: GuildId, category_id: &str) -> Result<bool> {
    if get_category(db, guild_id, category_id).await?.is_none() {
        return Ok(false);
    }
    log_info!("Removing category {}", category_id);
    let txn = db.begin().await?;
    CategoryRole::delete_many()
        .filter(category_role::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;
    let res = Category::delete_many()
        .filter(category::Column::Id.eq(category_id))
        .filter(category::Column::GuildId.eq(guild_id.get() as IDType))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(res.rows_affected > 0)
}
