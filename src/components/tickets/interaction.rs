//! Décodage des interactions
//!
//! Chaque composant envoyé par le bot porte un identifiant [`ControlId`].
//! Une interaction reçue est décodée en [`Action`] à partir de cet
//! identifiant et des valeurs transmises ([`Payload`]).

use std::{collections::HashMap, fmt, str::FromStr};
use serenity::model::id::{ChannelId, RoleId, UserId};

use super::wizard::CategoryForm;
use crate::db::model::guild::NamingMode;

/// Nom de la commande de configuration
pub const SETUP_COMMAND: &str = "setup";

/// Identifiants des champs du formulaire de catégorie
pub const FIELD_NAME: &str = "name";
pub const FIELD_EMOJI: &str = "emoji";
pub const FIELD_FORM: &str = "form";

macro_rules! control_ids {
    ($($variant:ident => $id:literal,)*) => {
        /// Identifiant d'un composant (bouton, menu, formulaire)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ControlId {
            $($variant,)*
        }
        impl ControlId {
            pub const ALL: &'static [ControlId] = &[$(ControlId::$variant,)*];
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ControlId::$variant => $id,)*
                }
            }
        }
        impl FromStr for ControlId {
            type Err = DecodeError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok(ControlId::$variant),)*
                    _ => Err(DecodeError::UnknownControl(s.to_string())),
                }
            }
        }
    };
}

control_ids! {
    SetupBack => "setup:back",
    SetupPanel => "setup:panel_send",
    SetupPanelChannel => "setup:panel_channel",
    SetupAdminRoles => "setup:admin_roles",
    SetupAdminRolesSelect => "setup:admin_roles_select",
    SetupNaming => "setup:ticket_channel_settings",
    SetupNamingUser => "setup:naming_user",
    SetupNamingNumber => "setup:naming_number",
    SetupCategoryAdd => "setup:category_add",
    SetupCategoryAddParent => "setup:category_add_parent",
    SetupCategoryAddModal => "setup:category_add_modal",
    SetupCategoryRolesCreate => "setup:category_roles_create",
    SetupCategoryEdit => "setup:category_edit",
    SetupCategoryEditSelect => "setup:category_edit_select",
    SetupCategoryEditModal => "setup:category_edit_modal",
    SetupCategoryEditParent => "setup:category_edit_parent",
    SetupCategoryRoles => "setup:category_roles",
    SetupCategoryRolesSelect => "setup:category_roles_select",
    SetupCategoryRolesUpdate => "setup:category_roles_update",
    SetupCategoryDelete => "setup:category_delete",
    SetupCategoryDeleteSelect => "setup:category_delete_select",
    SetupCategoryList => "setup:category_list",
    SetupCloseAll => "setup:close_all_tickets",
    TicketPanel => "ticket:panel",
    TicketClose => "ticket:close",
    TicketReopen => "ticket:reopen",
    TicketDelete => "ticket:delete",
    TicketAdd => "ticket:add",
    TicketRemove => "ticket:remove",
    TicketAddUsers => "ticket:add_users",
    TicketAddRoles => "ticket:add_roles",
    TicketRemoveUsers => "ticket:remove_users",
    TicketRemoveRoles => "ticket:remove_roles",
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valeurs transmises par une interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Button,
    StringSelect(Vec<String>),
    RoleSelect(Vec<RoleId>),
    UserSelect(Vec<UserId>),
    ChannelSelect(Vec<ChannelId>),
    /// Champs d'un formulaire, par identifiant
    Modal(HashMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown control `{0}`")]
    UnknownControl(String),
    #[error("unexpected payload for `{0}`")]
    UnexpectedPayload(ControlId),
    #[error("empty selection for `{0}`")]
    EmptySelection(ControlId),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

/// Actions du menu de configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupAction {
    /// Commande `/setup`
    Open,
    Back,
    Panel,
    PanelChannel(ChannelId),
    AdminRoles,
    AdminRolesSave(Vec<RoleId>),
    Naming,
    NamingSet(NamingMode),
    CategoryAdd,
    CategoryAddParent(ChannelId),
    CategoryAddForm(CategoryForm),
    CategoryAddRoles(Vec<RoleId>),
    CategoryEdit,
    CategoryEditPick(String),
    CategoryEditForm(CategoryForm),
    CategoryEditParent(ChannelId),
    CategoryRoles,
    CategoryRolesPick(String),
    CategoryRolesSave(Vec<RoleId>),
    CategoryDelete,
    CategoryDeletePick(String),
    CategoryList,
    CloseAll,
}

/// Actions sur les tickets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    /// Choix d'une catégorie dans le panel
    Open(String),
    Close,
    Reopen,
    Delete,
    AddMenu,
    RemoveMenu,
    AddUsers(Vec<UserId>),
    AddRoles(Vec<RoleId>),
    RemoveUsers(Vec<UserId>),
    RemoveRoles(Vec<RoleId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Setup(SetupAction),
    Ticket(TicketAction),
}

fn first<T>(id: ControlId, values: Vec<T>) -> Result<T, DecodeError> {
    values.into_iter().next().ok_or(DecodeError::EmptySelection(id))
}

fn form(fields: &HashMap<String, String>) -> CategoryForm {
    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    CategoryForm {
        name: field(FIELD_NAME),
        emoji: field(FIELD_EMOJI),
        form_text: field(FIELD_FORM),
    }
}

impl Action {
    /// Décode une commande slash.
    pub fn from_command(name: &str) -> Result<Action, DecodeError> {
        match name {
            SETUP_COMMAND => Ok(Action::Setup(SetupAction::Open)),
            _ => Err(DecodeError::UnknownCommand(name.to_string())),
        }
    }

    /// Décode l'interaction d'un composant ou d'un formulaire.
    pub fn decode(custom_id: &str, payload: Payload) -> Result<Action, DecodeError> {
        use ControlId as C;
        use Payload as P;
        use SetupAction as S;
        use TicketAction as T;
        let id = ControlId::from_str(custom_id)?;
        let action = match (id, payload) {
            (C::SetupBack, P::Button) => Action::Setup(S::Back),
            (C::SetupPanel, P::Button) => Action::Setup(S::Panel),
            (C::SetupPanelChannel, P::ChannelSelect(v)) => Action::Setup(S::PanelChannel(first(id, v)?)),
            (C::SetupAdminRoles, P::Button) => Action::Setup(S::AdminRoles),
            (C::SetupAdminRolesSelect, P::RoleSelect(v)) => Action::Setup(S::AdminRolesSave(v)),
            (C::SetupNaming, P::Button) => Action::Setup(S::Naming),
            (C::SetupNamingUser, P::Button) => Action::Setup(S::NamingSet(NamingMode::User)),
            (C::SetupNamingNumber, P::Button) => Action::Setup(S::NamingSet(NamingMode::Number)),
            (C::SetupCategoryAdd, P::Button) => Action::Setup(S::CategoryAdd),
            (C::SetupCategoryAddParent, P::ChannelSelect(v)) => Action::Setup(S::CategoryAddParent(first(id, v)?)),
            (C::SetupCategoryAddModal, P::Modal(fields)) => Action::Setup(S::CategoryAddForm(form(&fields))),
            (C::SetupCategoryRolesCreate, P::RoleSelect(v)) => Action::Setup(S::CategoryAddRoles(v)),
            (C::SetupCategoryEdit, P::Button) => Action::Setup(S::CategoryEdit),
            (C::SetupCategoryEditSelect, P::StringSelect(v)) => Action::Setup(S::CategoryEditPick(first(id, v)?)),
            (C::SetupCategoryEditModal, P::Modal(fields)) => Action::Setup(S::CategoryEditForm(form(&fields))),
            (C::SetupCategoryEditParent, P::ChannelSelect(v)) => Action::Setup(S::CategoryEditParent(first(id, v)?)),
            (C::SetupCategoryRoles, P::Button) => Action::Setup(S::CategoryRoles),
            (C::SetupCategoryRolesSelect, P::StringSelect(v)) => Action::Setup(S::CategoryRolesPick(first(id, v)?)),
            (C::SetupCategoryRolesUpdate, P::RoleSelect(v)) => Action::Setup(S::CategoryRolesSave(v)),
            (C::SetupCategoryDelete, P::Button) => Action::Setup(S::CategoryDelete),
            (C::SetupCategoryDeleteSelect, P::StringSelect(v)) => Action::Setup(S::CategoryDeletePick(first(id, v)?)),
            (C::SetupCategoryList, P::Button) => Action::Setup(S::CategoryList),
            (C::SetupCloseAll, P::Button) => Action::Setup(S::CloseAll),
            (C::TicketPanel, P::StringSelect(v)) => Action::Ticket(T::Open(first(id, v)?)),
            (C::TicketClose, P::Button) => Action::Ticket(T::Close),
            (C::TicketReopen, P::Button) => Action::Ticket(T::Reopen),
            (C::TicketDelete, P::Button) => Action::Ticket(T::Delete),
            (C::TicketAdd, P::Button) => Action::Ticket(T::AddMenu),
            (C::TicketRemove, P::Button) => Action::Ticket(T::RemoveMenu),
            (C::TicketAddUsers, P::UserSelect(v)) => Action::Ticket(T::AddUsers(v)),
            (C::TicketAddRoles, P::RoleSelect(v)) => Action::Ticket(T::AddRoles(v)),
            (C::TicketRemoveUsers, P::UserSelect(v)) => Action::Ticket(T::RemoveUsers(v)),
            (C::TicketRemoveRoles, P::RoleSelect(v)) => Action::Ticket(T::RemoveRoles(v)),
            (id, _) => return Err(DecodeError::UnexpectedPayload(id)),
        };
        Ok(action)
    }

    /// Actions longues: la réponse est différée avant leur traitement.
    pub fn is_slow(&self) -> bool {
        matches!(
            self,
            Action::Setup(SetupAction::CloseAll)
                | Action::Ticket(TicketAction::Open(_))
                | Action::Ticket(TicketAction::Close)
                | Action::Ticket(TicketAction::Delete)
        )
    }
}
