use thiserror::Error;

use crate::chat::{ChatError, ChatSite};
use crate::command::CommandError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Login to {site} failed: {reason}")]
    LoginFailed { site: ChatSite, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
