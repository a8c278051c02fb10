//! Persistance du bot
//!
//! Les entités sea-orm sont dans [`model`], les requêtes dans [`controller`].

pub mod model;
pub mod controller;

use std::path::Path;
use sea_orm::{Database, ConnectOptions, DbConn, DbErr, Schema, ConnectionTrait, TransactionTrait};
use crate::log_info;

/// Type des identifiants Discord en base.
///
/// SQLite ne connait pas les entiers non signés, les snowflakes sont donc
/// stockés tels quels dans un `i64`.
pub type IDType = i64;

pub async fn start_db(url: &str) -> Result<DbConn, DbErr> {
    ensure_sqlite_dir(url).await;
    let mut options = ConnectOptions::new(url.to_string());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    check_tables(&db).await?;
    log_info!("Database ready");
    Ok(db)
}

/// Crée le dossier du fichier SQLite s'il n'existe pas encore.
async fn ensure_sqlite_dir(url: &str) {
    let path = match url.strip_prefix("sqlite://") {
        Some(path) => path.split('?').next().unwrap_or(path),
        None => return,
    };
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                crate::log_warn!("Unable to create {}: {}", parent.to_string_lossy(), e);
            }
        }
    }
}

pub(crate) async fn check_tables(db: &DbConn) -> Result<(), DbErr> {
    use model::*;
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let transaction = db.begin().await?;

    transaction.execute(builder.build(schema.create_table_from_entity(GuildSettings).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(Category).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(CategoryRole).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(Ticket).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(ExtraUser).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(ExtraRole).if_not_exists())).await?;
    transaction.execute(builder.build(schema.create_table_from_entity(Transcript).if_not_exists())).await?;
    transaction.commit().await?;

    Ok(())
}
