//! Parcours complet, tel que vécu depuis Discord

use std::time::Duration;

use super::*;
use crate::components::{
    tickets::{
        error,
        interaction::{Action, ControlId, Payload, SetupAction},
        session::MemorySessionStore,
        setup,
        InteractionContext, Origin, Response, Tickets,
    },
    utils::message::{ActionRow, Embed, SelectKind, SelectMenu},
};
use crate::db::{
    controller::{guild as db_guild, ticket as db_ticket},
    model::ticket::TicketStatus,
};

const PANEL_CHANNEL: u64 = 700;
const R1: u64 = 31;

struct Bot {
    db: Arc<DbConn>,
    gateway: Arc<FakeGateway>,
    tickets: Tickets<FakeGateway, MemorySessionStore>,
}

async fn bot() -> Bot {
    let db = database().await;
    let gateway = FakeGateway::new();
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(900)));
    Bot {
        tickets: Tickets::new(db.clone(), gateway.clone(), sessions),
        db,
        gateway,
    }
}

impl Bot {
    async fn act(&self, actor: &Actor, channel: u64, origin: Origin, action: Action) -> Response {
        let ctx = InteractionContext {
            guild_id: guild(),
            channel_id: ChannelId::new(channel),
            actor: actor.clone(),
            origin,
        };
        self.tickets.handle(&ctx, action).await
    }
    /// Décode puis traite l'interaction d'un composant.
    async fn click(&self, actor: &Actor, channel: u64, id: ControlId, payload: Payload) -> Response {
        let action = Action::decode(id.as_str(), payload).unwrap();
        let origin = match action {
            Action::Setup(SetupAction::CategoryAddForm(_)) | Action::Setup(SetupAction::CategoryEditForm(_)) => Origin::Modal,
            _ => Origin::Component,
        };
        self.act(actor, channel, origin, action).await
    }
}

fn text(response: &Response) -> String {
    let msg = match response {
        Response::Reply(msg) | Response::Update(msg) => msg,
        Response::Modal(modal) => panic!("unexpected modal {:?}", modal),
    };
    let descriptions = msg.embeds.iter().filter_map(|e: &Embed| e.description.clone());
    std::iter::once(msg.content.clone()).chain(descriptions).collect::<Vec<_>>().join("\n")
}

fn modal_fields(name: &str, form_text: &str) -> Payload {
    Payload::Modal(HashMap::from([
        ("name".to_string(), name.to_string()),
        ("emoji".to_string(), String::new()),
        ("form".to_string(), form_text.to_string()),
    ]))
}

#[tokio::test]
async fn setup_requires_permission() {
    let bot = bot().await;
    let response = bot.act(&member(5, &[]), 1, Origin::Command, Action::Setup(SetupAction::Open)).await;
    assert!(text(&response).contains(error::PERMISSION_DENIED));
    assert!(matches!(response, Response::Reply(ref msg) if msg.ephemeral));

    let response = bot.act(&administrator(5), 1, Origin::Command, Action::Setup(SetupAction::Open)).await;
    assert_eq!(response, Response::Reply(setup::main_menu(None)));

    // Les rôles administrateurs remplacent la permission administrateur.
    db_guild::set_admin_roles(&bot.db, guild(), &[role(10)]).await.unwrap();
    let response = bot.act(&administrator(5), 1, Origin::Component, Action::Setup(SetupAction::CategoryList)).await;
    assert!(text(&response).contains(error::PERMISSION_DENIED));
    let response = bot.act(&member(6, &[10]), 1, Origin::Component, Action::Setup(SetupAction::CategoryList)).await;
    assert!(text(&response).contains(error::NO_CATEGORY));
}

#[tokio::test]
async fn support_ticket_from_setup_to_reopen() {
    let bot = bot().await;
    let admin = administrator(1);
    let u42 = member(42, &[]);
    let staff = member(77, &[R1]);

    // Pas de panel sans catégorie.
    let response = bot.click(&admin, 1, ControlId::SetupPanelChannel, Payload::ChannelSelect(vec![ChannelId::new(PANEL_CHANNEL)])).await;
    assert!(text(&response).contains(error::PANEL_NEEDS_CATEGORY));

    // Création de la catégorie "Support".
    bot.click(&admin, 1, ControlId::SetupCategoryAdd, Payload::Button).await;
    let response = bot.click(&admin, 1, ControlId::SetupCategoryAddParent, Payload::ChannelSelect(vec![ChannelId::new(PARENT_ID)])).await;
    assert!(matches!(response, Response::Modal(ref modal) if modal.custom_id == ControlId::SetupCategoryAddModal.as_str()));
    bot.click(&admin, 1, ControlId::SetupCategoryAddModal, modal_fields("Support", "Describe your issue")).await;
    let response = bot.click(&admin, 1, ControlId::SetupCategoryRolesCreate, Payload::RoleSelect(vec![role(R1)])).await;
    assert!(text(&response).contains("Support"));

    // Le panel propose une seule option.
    let response = bot.click(&admin, 1, ControlId::SetupPanelChannel, Payload::ChannelSelect(vec![ChannelId::new(PANEL_CHANNEL)])).await;
    assert!(matches!(response, Response::Update(_)));
    let panel = bot.gateway.channel(ChannelId::new(PANEL_CHANNEL));
    let options = match &panel.last_message().unwrap().components[..] {
        [ActionRow::Select(SelectMenu { kind: SelectKind::String(options), .. })] => options.clone(),
        other => panic!("unexpected panel {:?}", other),
    };
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "Support");

    // U42 ouvre le ticket #1.
    let response = bot.click(&u42, PANEL_CHANNEL, ControlId::TicketPanel, Payload::StringSelect(vec![options[0].value.clone()])).await;
    let ticket = db_ticket::get_open_ticket_for_user(&bot.db, guild(), user(42)).await.unwrap().unwrap();
    assert_eq!(ticket.ticket_number, 1);
    assert!(text(&response).contains(&format!("<#{}>", ticket.channel_id)));
    let ticket_channel = ticket.channel_id as u64;
    assert_eq!(bot.gateway.channel(ChannelId::new(ticket_channel)).viewers(), HashSet::from([
        Principal::Member(user(BOT_ID)),
        Principal::Member(user(42)),
        Principal::Role(role(R1)),
    ]));

    // Un second ticket est refusé.
    let response = bot.click(&u42, PANEL_CHANNEL, ControlId::TicketPanel, Payload::StringSelect(vec![options[0].value.clone()])).await;
    assert!(text(&response).contains(error::EXISTING_TICKET));

    // Fermeture par le staff.
    bot.click(&staff, ticket_channel, ControlId::TicketClose, Payload::Button).await;
    assert!(db_ticket::get_transcript(&bot.db, guild(), 1).await.unwrap().is_some());
    let channel = bot.gateway.channel(ChannelId::new(ticket_channel));
    assert!(channel.last_message().unwrap().custom_ids().contains(&ControlId::TicketReopen.as_str()));
    assert!(!channel.viewers().contains(&Principal::Member(user(42))));

    // Réouverture par le staff.
    bot.click(&staff, ticket_channel, ControlId::TicketReopen, Payload::Button).await;
    let channel = bot.gateway.channel(ChannelId::new(ticket_channel));
    assert!(channel.viewers().contains(&Principal::Member(user(42))));
    assert!(channel.last_message().unwrap().custom_ids().contains(&ControlId::TicketClose.as_str()));
    let ticket = db_ticket::get_ticket_by_channel(&bot.db, ChannelId::new(ticket_channel)).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
}

#[tokio::test]
async fn panel_follows_category_changes() {
    let bot = bot().await;
    let admin = administrator(1);
    add_category(&bot.db, "support", "Support", &[R1]).await;
    bot.click(&admin, 1, ControlId::SetupPanelChannel, Payload::ChannelSelect(vec![ChannelId::new(PANEL_CHANNEL)])).await;

    bot.click(&admin, 1, ControlId::SetupCategoryEdit, Payload::Button).await;
    let response = bot.click(&admin, 1, ControlId::SetupCategoryEditSelect, Payload::StringSelect(vec!["support".to_string()])).await;
    assert!(matches!(response, Response::Modal(_)));
    bot.click(&admin, 1, ControlId::SetupCategoryEditModal, modal_fields("Assistance", "")).await;
    bot.click(&admin, 1, ControlId::SetupCategoryEditParent, Payload::ChannelSelect(vec![ChannelId::new(PARENT_ID)])).await;

    let panel = bot.gateway.channel(ChannelId::new(PANEL_CHANNEL));
    match &panel.last_message().unwrap().components[..] {
        [ActionRow::Select(SelectMenu { kind: SelectKind::String(options), .. })] => assert_eq!(options[0].label, "Assistance"),
        other => panic!("unexpected panel {:?}", other),
    }

    bot.click(&admin, 1, ControlId::SetupCategoryDelete, Payload::Button).await;
    let response = bot.click(&admin, 1, ControlId::SetupCategoryDeleteSelect, Payload::StringSelect(vec!["support".to_string()])).await;
    assert!(text(&response).contains("Catégorie supprimée."));
    let panel = bot.gateway.channel(ChannelId::new(PANEL_CHANNEL));
    assert!(panel.last_message().unwrap().components.is_empty());
    assert_eq!(bot.gateway.state.lock().unwrap().edits.len(), 2);
}

#[tokio::test]
async fn back_cancels_the_wizard() {
    let bot = bot().await;
    let admin = administrator(1);
    bot.click(&admin, 1, ControlId::SetupCategoryAdd, Payload::Button).await;
    let response = bot.click(&admin, 1, ControlId::SetupBack, Payload::Button).await;
    assert_eq!(response, Response::Update(setup::main_menu(None)));
    let response = bot.click(&admin, 1, ControlId::SetupCategoryAddParent, Payload::ChannelSelect(vec![ChannelId::new(PARENT_ID)])).await;
    assert_eq!(response, Response::Update(setup::main_menu(Some(error::NO_PENDING_OPERATION))));
}

#[tokio::test]
async fn close_all_from_setup() {
    let bot = bot().await;
    let admin = administrator(1);
    add_category(&bot.db, "support", "Support", &[R1]).await;
    for opener in [42, 43] {
        bot.click(&member(opener, &[]), PANEL_CHANNEL, ControlId::TicketPanel, Payload::StringSelect(vec!["support".to_string()])).await;
    }
    let response = bot.click(&admin, 1, ControlId::SetupCloseAll, Payload::Button).await;
    assert!(text(&response).contains("Tickets fermés: 2."));
    assert!(db_ticket::list_open_tickets(&bot.db, guild()).await.unwrap().is_empty());
}
