//! Transcription des tickets
//!
//! L'historique du salon est lu du plus récent au plus ancien par pages, puis
//! remis dans l'ordre chronologique et rendu en texte, un message par ligne.

use chrono::SecondsFormat;
use serenity::model::id::ChannelId;

use super::gateway::{Gateway, HistoryMessage};
use crate::log_warn;

/// Taille d'une page d'historique (maximum de l'API Discord)
pub const PAGE_SIZE: u8 = 100;
/// Nombre maximum de messages transcrits
pub const MAX_MESSAGES: usize = 1000;

/// Lit l'historique du salon et le renvoie dans l'ordre chronologique.
///
/// La lecture s'arrête sur une page incomplète, une erreur ou quand
/// [`MAX_MESSAGES`] messages ont été lus.
pub async fn collect_history<G: Gateway + ?Sized>(gateway: &G, channel_id: ChannelId) -> Vec<HistoryMessage> {
    let mut messages: Vec<HistoryMessage> = Vec::new();
    let mut before = None;
    loop {
        let page = match gateway.fetch_messages(channel_id, before, PAGE_SIZE).await {
            Ok(page) => page,
            Err(e) => {
                log_warn!("Error getting messages while archiving channel {}: {}", channel_id, e);
                break;
            }
        };
        let page_len = page.len();
        if page_len == 0 {
            break;
        }
        before = page.last().map(|m| m.id);
        messages.extend(page);
        if page_len < PAGE_SIZE as usize || messages.len() >= MAX_MESSAGES {
            break;
        }
    }
    messages.truncate(MAX_MESSAGES);
    messages.reverse();
    messages
}

/// Une ligne par message: `[horodatage] auteur: contenu url...`
pub fn render(messages: &[HistoryMessage]) -> String {
    messages.iter()
        .map(|msg| {
            let mut line = format!(
                "[{}] {}: {}",
                msg.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                msg.author,
                msg.content
            );
            if !msg.attachments.is_empty() {
                line.push(' ');
                line.push_str(&msg.attachments.join(" "));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn assemble<G: Gateway + ?Sized>(gateway: &G, channel_id: ChannelId) -> String {
    render(&collect_history(gateway, channel_id).await)
}

/// Nom du fichier de transcription envoyé dans le salon
#[inline]
pub fn file_name(ticket_number: i64) -> String {
    format!("transcript-ticket-{}.txt", ticket_number)
}
