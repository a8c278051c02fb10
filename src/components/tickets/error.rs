use crate::db::controller;
use super::gateway::GatewayError;

pub const PERMISSION_DENIED: &str = "Tu n'as pas la permission de faire cette action.";
pub const SOMETHING_WENT_WRONG: &str = "Une erreur s'est produite.";

pub const NO_PENDING_OPERATION: &str = "Aucune opération de configuration en attente.";
pub const TOO_MANY_CATEGORIES: &str = "Un panel ne peut pas contenir plus de 25 catégories.";
pub const CATEGORY_NOT_FOUND: &str = "Catégorie introuvable.";
pub const NO_CATEGORY: &str = "Aucune catégorie n'est configurée.";
pub const NO_AUTHORIZED_ROLE: &str = "Aucun rôle autorisé pour cette catégorie.";
pub const INCOMPLETE_CATEGORY: &str = "Les informations de la catégorie sont incomplètes.";
pub const PANEL_NEEDS_CATEGORY: &str = "Le panel nécessite au moins une catégorie.";
pub const EXISTING_TICKET: &str = "Ferme d'abord ton ticket existant.";
pub const NOT_A_TICKET: &str = "Ce salon n'est pas un ticket.";
pub const ALREADY_CLOSED: &str = "Ce ticket est déjà fermé.";
pub const ALREADY_OPEN: &str = "Ce ticket est déjà ouvert.";

/// Erreurs du composant de tickets
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    /// Règle métier non respectée, le message est destiné à l'utilisateur.
    #[error("{0}")]
    Validation(String),
    #[error("permission denied")]
    Unauthorized,
    /// Appel à Discord impossible à contourner
    #[error("discord unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Persistence(#[from] controller::Error),
}

impl TicketError {
    #[inline]
    pub fn validation<S: ToString>(msg: S) -> Self {
        TicketError::Validation(msg.to_string())
    }
    /// Message présentable à l'utilisateur
    pub fn user_message(&self) -> &str {
        match self {
            TicketError::Validation(msg) => msg,
            TicketError::Unauthorized => PERMISSION_DENIED,
            TicketError::Unavailable(_) | TicketError::Persistence(_) => SOMETHING_WENT_WRONG,
        }
    }
}

impl From<GatewayError> for TicketError {
    fn from(e: GatewayError) -> Self {
        TicketError::Unavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TicketError>;
