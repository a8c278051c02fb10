//! Requêtes sur la base de données
//!
//! Chaque fonction prend la connexion en paramètre et renvoie des modèles
//! sea-orm ou des identifiants serenity.

pub mod guild;
pub mod category;
pub mod ticket;

use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    SeaORM(#[from] DbErr),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Horodatage courant en millisecondes
#[inline]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
