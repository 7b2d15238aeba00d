//! Terminal rendering helpers.

use colored::{ColoredString, Colorize};
use scribe_core::session::{Message, RequestState, Sender};

/// Formats seconds as `mm:ss` (or `h:mm:ss` past an hour).
pub fn timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub fn sender(sender: Sender) -> ColoredString {
    match sender {
        Sender::User => sender.label().green().bold(),
        Sender::Interlocutor => sender.label().cyan().bold(),
        Sender::Assistant => sender.label().magenta().bold(),
    }
}

pub fn request_state(state: Option<&RequestState>) -> Option<ColoredString> {
    match state? {
        RequestState::Pending => Some("pending".yellow()),
        RequestState::Fulfilled => None,
        RequestState::Failed { error } => Some(format!("failed: {}", error).red()),
    }
}

pub fn transcript_line(message: &Message) -> String {
    format!(
        "{} {}: {}",
        format!("[{}]", timestamp(message.timestamp)).dimmed(),
        sender(message.sender),
        message.text
    )
}
