//! Entités de la base de données

pub mod guild;
pub mod ticket;
pub mod transcript;

pub use guild::Entity as GuildSettings;
pub use ticket::{
    Ticket,
    Category,
    CategoryRole,
    ExtraUser,
    ExtraRole,
};
pub use transcript::Entity as Transcript;
