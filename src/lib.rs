//! # roombot: a chat-room bot
//!
//! roombot logs into a chat service, polls for new messages on a fixed
//! schedule, dispatches command messages to registered handlers and renders
//! the replies.
//!
//! ## Message Processing Pipeline
//!
//! ```text
//! Chat service → Poller → Tokenizer → Trigger / Command registry → Renderer → Chat service
//! ```
//!
//! ### Tokenization
//!
//! The [`tokenizer`] splits a message body into words and markdown constructs
//! (code spans, emphasis, strikethrough, tag references, links). A construct is
//! always one token, so commands receive `` `some code` `` as a single argument.
//!
//! ### Dispatch
//!
//! The [`trigger`] recognizes command-directed messages from their first token,
//! and the [`command`] registry invokes the matching handler.
//!
//! ### Rendering
//!
//! The [`render`] module prefixes replies and splits long ones on token
//! boundaries.
//!
//! ## Runtime
//!
//! [`program::Program`] wires the [`chat`] boundary, the [`poller`] and the
//! [`bot`] together from a [`config::BotConfig`].

pub mod bot;
pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod poller;
pub mod program;
pub mod render;
pub mod tokenizer;
pub mod trigger;

// Re-exports
pub use error::*;
pub use tokenizer::tokenize;
