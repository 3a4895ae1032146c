mod message;
mod slack;
mod trello;

use message::{compose, to_board_markdown};
pub use slack::SlackClient;
pub use trello::TrelloClient;

use crate::domain::Listing;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
}

/// A chat message and who it appears to come from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPost {
    pub channel: String,
    pub text: String,
    pub username: String,
    pub icon_emoji: String,
}

pub trait ChatSink {
    fn post_message(&self, post: &ChatPost) -> Result<(), NotifyError>;
}

pub trait BoardSink {
    fn create_card(&self, title: &str, description: &str) -> Result<(), NotifyError>;
}

/// Sends one listing to the chat channel and the board.
pub struct Notifier {
    chat: Box<dyn ChatSink>,
    board: Box<dyn BoardSink>,
    channel: String,
    work_addrs: [String; 2],
}

impl Notifier {
    pub fn new(
        chat: Box<dyn ChatSink>,
        board: Box<dyn BoardSink>,
        channel: impl Into<String>,
        work_addrs: [String; 2],
    ) -> Self {
        Self {
            chat,
            board,
            channel: channel.into(),
            work_addrs,
        }
    }

    pub fn notify(&self, listing: &Listing) -> Result<(), NotifyError> {
        info!("Notifying about {}...", listing.id);
        let message = compose(listing, &self.work_addrs);

        self.chat.post_message(&ChatPost {
            channel: self.channel.clone(),
            text: message.text.clone(),
            username: "propertybot".to_string(),
            icon_emoji: ":new:".to_string(),
        })?;
        self.board
            .create_card(&message.card_title, &to_board_markdown(&message.text))
    }
}
