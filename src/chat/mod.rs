//! # Chat Service Boundary
//!
//! Types exchanged with the chat service and the [`ChatInterface`] trait the
//! rest of the bot talks to. Transport and session handling live behind the
//! trait; [`console::ConsoleChat`] is a local implementation over stdin/stdout.

pub mod console;

use async_trait::async_trait;
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::config::BotConfig;

/// Chat servers the bot can log into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Display, EnumString)]
pub enum ChatSite {
    #[default]
    StackOverflow,
    StackExchange,
    MetaStackExchange,
}

impl ChatSite {
    pub fn chat_host(&self) -> &'static str {
        match self {
            ChatSite::StackOverflow => "chat.stackoverflow.com",
            ChatSite::StackExchange => "chat.stackexchange.com",
            ChatSite::MetaStackExchange => "chat.meta.stackexchange.com",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub site: ChatSite,
    pub message_id: u64,
    pub room_id: u64,
    pub room_name: String,
    pub user_id: u64,
    pub username: String,
    /// Message body, already stripped of the protocol envelope.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDescriptor {
    pub site: ChatSite,
    pub room_id: u64,
}

impl RoomDescriptor {
    pub fn new(site: ChatSite, room_id: u64) -> Self {
        Self { site, room_id }
    }

    pub fn url(&self) -> String {
        format!("https://{}/rooms/{}", self.site.chat_host(), self.room_id)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// Worth retrying on the next query.
    #[error("Transient chat failure: {message}")]
    Transient { message: String },
    #[error("Fatal chat failure: {message}")]
    Fatal { message: String },
    #[error("Chat connection closed")]
    Closed,
}

impl ChatError {
    pub fn transient<S: Into<String>>(message: S) -> Self {
        ChatError::Transient {
            message: message.into(),
        }
    }

    pub fn fatal<S: Into<String>>(message: S) -> Self {
        ChatError::Fatal {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Transient { .. })
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatInterface: Send + Sync {
    /// Returns `Ok(false)` when the service rejected the credentials.
    async fn login(&self, site: ChatSite, config: &BotConfig) -> ChatResult<bool>;

    async fn join_chat(&self, room: &RoomDescriptor) -> ChatResult<()>;

    async fn leave_chat(&self, room_id: u64) -> ChatResult<()>;

    /// Returns the messages received since the previous query.
    async fn query_messages(&self) -> ChatResult<Vec<ChatMessage>>;

    async fn send_message(&self, room_id: u64, text: &str) -> ChatResult<()>;
}
