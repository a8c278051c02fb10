use sea_orm::{EntityTrait, PaginatorTrait};
use serenity::model::id::ChannelId;

use super::*;
use crate::components::tickets::{
    archive,
    error::{self, TicketError},
    interaction::ControlId,
    lifecycle::{CloseAllReport, CloseOutcome, CreatedTicket, Lifecycle, FALLBACK_CHANNEL_NAME},
    permissions,
};
use crate::db::{
    controller::{guild as db_guild, ticket as db_ticket},
    model::{guild::NamingMode, ticket::TicketStatus, Ticket},
};

const STAFF_ROLE: u64 = 20;

struct Setup {
    db: Arc<DbConn>,
    gateway: Arc<FakeGateway>,
    lifecycle: Lifecycle<FakeGateway>,
}

async fn setup() -> Setup {
    let db = database().await;
    let gateway = FakeGateway::new();
    add_category(&db, "support", "Support", &[STAFF_ROLE]).await;
    Setup {
        lifecycle: Lifecycle::new(db.clone(), gateway.clone()),
        db,
        gateway,
    }
}

fn staff() -> Actor {
    member(77, &[STAFF_ROLE])
}

fn assert_validation<T: std::fmt::Debug>(result: Result<T, TicketError>, expected: &str) {
    match result {
        Err(TicketError::Validation(msg)) => assert_eq!(msg, expected),
        other => panic!("expected validation error `{}`, got {:?}", expected, other),
    }
}

impl Setup {
    async fn open(&self, opener: u64) -> CreatedTicket {
        self.lifecycle.create(guild(), &member(opener, &[]), "support").await.unwrap()
    }
    async fn status(&self, created: CreatedTicket) -> TicketStatus {
        db_ticket::get_ticket_by_channel(&self.db, created.channel_id).await.unwrap().unwrap().status
    }
}

#[tokio::test]
async fn create_ticket() {
    let s = setup().await;
    let created = s.open(42).await;
    assert_eq!(created.ticket_number, 1);

    let ticket = db_ticket::get_open_ticket_for_user(&s.db, guild(), user(42)).await.unwrap().unwrap();
    assert_eq!(ticket.channel_id as u64, created.channel_id.get());
    assert_eq!(ticket.category_id, "support");

    let channel = s.gateway.channel(created.channel_id);
    assert_eq!(channel.name, "ticket-1");
    assert_eq!(channel.parent_id, Some(ChannelId::new(PARENT_ID)));
    assert_eq!(channel.viewers(), HashSet::from([
        Principal::Member(user(BOT_ID)),
        Principal::Member(user(42)),
        Principal::Role(role(STAFF_ROLE)),
    ]));
    let everyone = channel.overwrite(Principal::Role(role(GUILD_ID))).unwrap();
    assert!(everyone.deny.contains(Permissions::VIEW_CHANNEL));

    let messages: Vec<&Message> = channel.messages.iter().map(|m| &m.message).collect();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, format!("<@&{}>", STAFF_ROLE));
    assert_eq!(messages[1].content, "Formulaire Support");
    assert!(messages[2].custom_ids().contains(&ControlId::TicketClose.as_str()));
}

#[tokio::test]
async fn one_open_ticket_per_member() {
    let s = setup().await;
    s.open(42).await;
    let result = s.lifecycle.create(guild(), &member(42, &[]), "support").await;
    assert_validation(result, error::EXISTING_TICKET);

    let settings = db_guild::get_or_create_guild_settings(&s.db, guild()).await.unwrap();
    assert_eq!(settings.ticket_counter, 1);
    assert_eq!(Ticket::find().count(s.db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn create_rejects_bad_categories() {
    let s = setup().await;
    add_category(&s.db, "empty", "Sans rôle", &[]).await;
    assert_validation(s.lifecycle.create(guild(), &member(42, &[]), "unknown").await, error::CATEGORY_NOT_FOUND);
    assert_validation(s.lifecycle.create(guild(), &member(42, &[]), "empty").await, error::NO_AUTHORIZED_ROLE);
    assert!(s.gateway.state.lock().unwrap().channels.is_empty());
}

#[tokio::test]
async fn channel_named_after_member() {
    let s = setup().await;
    db_guild::set_ticket_naming(&s.db, guild(), NamingMode::User).await.unwrap();
    let mut opener = member(42, &[]);
    opener.name = "Jean Dupont".to_string();
    let created = s.lifecycle.create(guild(), &opener, "support").await.unwrap();
    assert_eq!(s.gateway.channel(created.channel_id).name, "jean-dupont");
}

#[tokio::test]
async fn channel_creation_retries_with_fallback_name() {
    let s = setup().await;
    s.gateway.fail_next_creations(1);
    let created = s.open(42).await;
    assert_eq!(s.gateway.channel(created.channel_id).name, FALLBACK_CHANNEL_NAME);

    s.gateway.fail_next_creations(2);
    match s.lifecycle.create(guild(), &member(43, &[]), "support").await {
        Err(TicketError::Unavailable(_)) => (),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(db_ticket::get_open_ticket_for_user(&s.db, guild(), user(43)).await.unwrap().is_none());
}

#[tokio::test]
async fn channel_removed_when_ticket_cannot_be_saved() {
    let s = setup().await;
    let first = s.open(42).await;
    // Le salon déjà associé à un ticket fait échouer l'enregistrement.
    s.gateway.force_next_channel_id(first.channel_id);
    match s.lifecycle.create(guild(), &member(43, &[]), "support").await {
        Err(TicketError::Persistence(_)) => (),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(s.gateway.deleted(), vec![first.channel_id]);
    assert!(db_ticket::get_open_ticket_for_user(&s.db, guild(), user(43)).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_creations_by_one_member() {
    let s = setup().await;
    let opener = member(42, &[]);
    let (a, b) = tokio::join!(
        s.lifecycle.create(guild(), &opener, "support"),
        s.lifecycle.create(guild(), &opener, "support"),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let failed = if a.is_ok() { b } else { a };
    assert_validation(failed, error::EXISTING_TICKET);
    assert_eq!(Ticket::find().count(s.db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_numbers() {
    let s = setup().await;
    let openers: Vec<Actor> = (42..48).map(|id| member(id, &[])).collect();
    let created = futures::future::join_all(openers.iter().map(|opener| s.lifecycle.create(guild(), opener, "support"))).await;
    let mut numbers: Vec<i64> = created.into_iter().map(|c| c.unwrap().ticket_number).collect();
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn close_ticket() {
    let s = setup().await;
    let created = s.open(42).await;
    s.gateway.post(created.channel_id, "membre42", "J'ai un problème");

    assert_eq!(s.lifecycle.close(created.channel_id, &staff()).await.unwrap(), CloseOutcome::Closed);
    assert_eq!(s.status(created).await, TicketStatus::Closed);

    let transcript = db_ticket::get_transcript(&s.db, guild(), 1).await.unwrap().unwrap();
    assert!(transcript.content.ends_with("membre42: J'ai un problème"));

    let channel = s.gateway.channel(created.channel_id);
    assert_eq!(channel.attachments(), vec![(archive::file_name(1), transcript.content)]);
    let opener = channel.overwrite(Principal::Member(user(42))).unwrap();
    assert!(opener.deny.contains(Permissions::VIEW_CHANNEL));
    assert!(opener.allow.is_empty());
    let controls = channel.last_message().unwrap().custom_ids();
    assert_eq!(controls, vec![ControlId::TicketDelete.as_str(), ControlId::TicketReopen.as_str()]);

    assert_validation(s.lifecycle.close(created.channel_id, &staff()).await, error::ALREADY_CLOSED);
}

#[tokio::test]
async fn close_permissions() {
    let s = setup().await;
    let created = s.open(42).await;
    match s.lifecycle.close(created.channel_id, &member(43, &[])).await {
        Err(TicketError::Unauthorized) => (),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(s.status(created).await, TicketStatus::Open);
    assert_validation(s.lifecycle.close(ChannelId::new(1234), &staff()).await, error::NOT_A_TICKET);

    assert!(s.lifecycle.close(created.channel_id, &member(42, &[])).await.is_ok());
}

#[tokio::test]
async fn close_ticket_without_channel() {
    let s = setup().await;
    let created = s.open(42).await;
    s.gateway.remove_channel(created.channel_id);
    assert_eq!(s.lifecycle.close(created.channel_id, &staff()).await.unwrap(), CloseOutcome::MissingChannel);
    assert_eq!(s.status(created).await, TicketStatus::Closed);
    assert!(db_ticket::get_transcript(&s.db, guild(), 1).await.unwrap().is_none());
}

#[tokio::test]
async fn reopen_ticket() {
    let s = setup().await;
    let created = s.open(42).await;
    assert_validation(s.lifecycle.reopen(created.channel_id, &staff()).await, error::ALREADY_OPEN);
    s.lifecycle.close(created.channel_id, &member(42, &[])).await.unwrap();

    match s.lifecycle.reopen(created.channel_id, &member(42, &[])).await {
        Err(TicketError::Unauthorized) => (),
        other => panic!("unexpected result {:?}", other),
    }
    s.lifecycle.reopen(created.channel_id, &staff()).await.unwrap();
    assert_eq!(s.status(created).await, TicketStatus::Open);

    let channel = s.gateway.channel(created.channel_id);
    assert_eq!(channel.overwrite(Principal::Member(user(42))).unwrap().allow, permissions::access());
    assert!(channel.last_message().unwrap().custom_ids().contains(&ControlId::TicketClose.as_str()));

    // Le membre peut de nouveau fermer son ticket, mais pas en ouvrir un autre.
    assert_validation(s.lifecycle.create(guild(), &member(42, &[]), "support").await, error::EXISTING_TICKET);
}

#[tokio::test]
async fn transcript_of_the_last_close_only() {
    let s = setup().await;
    let created = s.open(42).await;
    s.gateway.post(created.channel_id, "membre42", "premier message");
    s.lifecycle.close(created.channel_id, &staff()).await.unwrap();
    let first = db_ticket::get_transcript(&s.db, guild(), 1).await.unwrap().unwrap();

    s.lifecycle.reopen(created.channel_id, &staff()).await.unwrap();
    s.gateway.post(created.channel_id, "membre42", "second message");
    s.lifecycle.close(created.channel_id, &staff()).await.unwrap();

    let second = db_ticket::get_transcript(&s.db, guild(), 1).await.unwrap().unwrap();
    assert_ne!(first.content, second.content);
    assert!(second.content.ends_with("membre42: second message"));
    assert_eq!(s.gateway.channel(created.channel_id).attachments().last().map(|a| a.1.clone()), Some(second.content));
    assert_eq!(crate::db::model::Transcript::find().count(s.db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn transcript_is_stable() {
    let s = setup().await;
    let created = s.open(42).await;
    s.gateway.post(created.channel_id, "membre42", "bonjour");
    let first = archive::assemble(s.gateway.as_ref(), created.channel_id).await;
    let second = archive::assemble(s.gateway.as_ref(), created.channel_id).await;
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 4);
}

#[tokio::test]
async fn transcript_pages_through_history() {
    let s = setup().await;
    let created = s.open(42).await;
    for i in 0..250 {
        s.gateway.post(created.channel_id, "membre42", &format!("message {}", i));
    }
    let history = archive::collect_history(s.gateway.as_ref(), created.channel_id).await;
    assert_eq!(history.len(), 253);
    assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(history.last().unwrap().content, "message 249");
}

#[tokio::test]
async fn transcript_keeps_the_newest_messages() {
    let s = setup().await;
    let created = s.open(42).await;
    for i in 0..1250 {
        s.gateway.post(created.channel_id, "membre42", &format!("message {}", i));
    }
    let history = archive::collect_history(s.gateway.as_ref(), created.channel_id).await;
    assert_eq!(history.len(), archive::MAX_MESSAGES);
    assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(history.first().unwrap().content, "message 250");
    assert_eq!(history.last().unwrap().content, "message 1249");

    let transcript = archive::render(&history);
    assert_eq!(transcript.lines().count(), archive::MAX_MESSAGES);
    assert!(transcript.lines().next().unwrap().ends_with("membre42: message 250"));
}

#[tokio::test]
async fn delete_ticket() {
    let s = setup().await;
    let created = s.open(42).await;
    match s.lifecycle.delete(created.channel_id, &member(42, &[])).await {
        Err(TicketError::Unauthorized) => (),
        other => panic!("unexpected result {:?}", other),
    }
    s.lifecycle.delete(created.channel_id, &staff()).await.unwrap();
    assert_eq!(s.gateway.deleted(), vec![created.channel_id]);
    assert_eq!(s.status(created).await, TicketStatus::Open);

    assert!(s.lifecycle.reconcile_channel_removal(created.channel_id).await.unwrap());
    assert_eq!(s.status(created).await, TicketStatus::Closed);
    assert!(!s.lifecycle.reconcile_channel_removal(created.channel_id).await.unwrap());
    assert!(!s.lifecycle.reconcile_channel_removal(ChannelId::new(1234)).await.unwrap());
}

#[tokio::test]
async fn close_all_tickets() {
    let s = setup().await;
    let a = s.open(42).await;
    let b = s.open(43).await;
    let c = s.open(44).await;
    s.lifecycle.close(c.channel_id, &staff()).await.unwrap();
    s.gateway.remove_channel(b.channel_id);

    let report = s.lifecycle.close_all(guild()).await.unwrap();
    assert_eq!(report, CloseAllReport { closed: 1, missing_channel: 1, failed: 0 });
    assert_eq!(s.status(a).await, TicketStatus::Closed);
    assert_eq!(s.status(b).await, TicketStatus::Closed);
    assert!(db_ticket::list_open_tickets(&s.db, guild()).await.unwrap().is_empty());
}

#[tokio::test]
async fn extra_members() {
    let s = setup().await;
    let created = s.open(42).await;
    let channel = created.channel_id;
    match s.lifecycle.add_users(channel, &member(42, &[]), &[user(50)]).await {
        Err(TicketError::Unauthorized) => (),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(s.lifecycle.show_add_staff(channel, &staff()).await.unwrap().ephemeral);

    s.lifecycle.add_users(channel, &staff(), &[user(50)]).await.unwrap();
    s.lifecycle.add_roles(channel, &staff(), &[role(30)]).await.unwrap();
    let viewers = s.gateway.channel(channel).viewers();
    assert!(viewers.contains(&Principal::Member(user(50))));
    assert!(viewers.contains(&Principal::Role(role(30))));
    let ticket = db_ticket::get_ticket_by_channel(&s.db, channel).await.unwrap().unwrap();
    assert_eq!(db_ticket::list_extra_users(&s.db, &ticket).await.unwrap(), vec![user(50)]);

    s.lifecycle.remove_users(channel, &staff(), &[user(50), user(42)]).await.unwrap();
    s.lifecycle.remove_roles(channel, &staff(), &[role(30), role(STAFF_ROLE)]).await.unwrap();
    assert_eq!(s.gateway.channel(channel).viewers(), HashSet::from([
        Principal::Member(user(BOT_ID)),
        Principal::Member(user(42)),
        Principal::Role(role(STAFF_ROLE)),
    ]));
    assert!(db_ticket::list_extra_roles(&s.db, &ticket).await.unwrap().is_empty());
}

#[tokio::test]
async fn everyone_never_sees_the_ticket() {
    let s = setup().await;
    add_category(&s.db, "public", "Public", &[GUILD_ID, STAFF_ROLE]).await;
    let created = s.lifecycle.create(guild(), &member(42, &[]), "public").await.unwrap();
    let channel = created.channel_id;
    let everyone = Principal::Role(role(GUILD_ID));
    assert!(!s.gateway.channel(channel).viewers().contains(&everyone));
    assert_eq!(s.gateway.channel(channel).overwrite(everyone).unwrap().deny, Permissions::VIEW_CHANNEL);
    assert_eq!(s.gateway.channel(channel).messages[0].message.content, format!("<@&{}>", STAFF_ROLE));

    s.lifecycle.add_roles(channel, &staff(), &[role(GUILD_ID), role(30)]).await.unwrap();
    assert!(!s.gateway.channel(channel).viewers().contains(&everyone));
    let ticket = db_ticket::get_ticket_by_channel(&s.db, channel).await.unwrap().unwrap();
    assert_eq!(db_ticket::list_extra_roles(&s.db, &ticket).await.unwrap(), vec![role(30)]);

    s.lifecycle.remove_roles(channel, &staff(), &[role(GUILD_ID)]).await.unwrap();
    assert!(s.gateway.channel(channel).overwrite(everyone).is_some());
}
