//! # Commands
//!
//! A [`CommandHandle`] binds a name to a handler. The [`CommandRegistry`] is
//! the dispatch table: it tokenizes an incoming message, checks the first token
//! against the [`Trigger`], and invokes the matching handler with the
//! remaining tokens as arguments.

use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;
use tracing::debug;

use crate::{chat::ChatMessage, tokenizer::tokenize, trigger::Trigger};

pub const HELP_COMMAND: &str = "help";

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Trigger prefix must not be empty")]
    EmptyTrigger,
    #[error("Invalid trigger pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A single command call.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub message: &'a ChatMessage,
    pub name: &'a str,
    /// Tokens after the command name; constructs stay whole.
    pub arguments: &'a [String],
}

impl Invocation<'_> {
    pub fn argument_text(&self) -> String {
        self.arguments.join(" ")
    }
}

pub type Handler = Arc<dyn Fn(&Invocation<'_>) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct CommandHandle {
    name: String,
    help: Option<String>,
    handler: Handler,
}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

impl CommandHandle {
    pub fn builder<S, F>(name: S, handler: F) -> CommandHandleBuilder
    where
        S: Into<String>,
        F: Fn(&Invocation<'_>) -> Option<String> + Send + Sync + 'static,
    {
        CommandHandleBuilder {
            name: name.into(),
            help: None,
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn execute(&self, invocation: &Invocation<'_>) -> Option<String> {
        (self.handler)(invocation)
    }
}

pub struct CommandHandleBuilder {
    name: String,
    help: Option<String>,
    handler: Handler,
}

impl CommandHandleBuilder {
    pub fn help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn build(self) -> CommandHandle {
        CommandHandle {
            name: self.name,
            help: self.help,
            handler: self.handler,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    trigger: Trigger,
    commands: BTreeMap<String, CommandHandle>,
}

impl CommandRegistry {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            commands: BTreeMap::new(),
        }
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Registers `handle`, returning the command it replaced.
    pub fn subscribe(&mut self, handle: CommandHandle) -> Option<CommandHandle> {
        debug!("command subscribed: {}", handle.name());
        self.commands.insert(handle.name.clone(), handle)
    }

    pub fn unsubscribe(&mut self, name: &str) -> Option<CommandHandle> {
        self.commands.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandHandle> {
        self.commands.values()
    }

    /// Returns the reply for `message`, or `None` when it is not a known command.
    #[tracing::instrument(level = "debug", skip(self, message), fields(message_id = message.message_id))]
    pub fn dispatch(&self, message: &ChatMessage) -> Option<String> {
        let tokens = tokenize(&message.message);
        let name = self.trigger.command_name(&tokens)?;

        let Some(handle) = self.commands.get(name) else {
            if name == HELP_COMMAND {
                return Some(self.help_text());
            }
            debug!("unknown command: {}", name);
            return None;
        };

        let invocation = Invocation {
            message,
            name,
            arguments: &tokens[1..],
        };
        handle.execute(&invocation)
    }

    pub fn help_text(&self) -> String {
        let commands = self
            .commands
            .values()
            .map(|handle| match handle.help() {
                Some(help) => format!("`{}{}` {}", self.trigger.prefix(), handle.name(), help),
                None => format!("`{}{}`", self.trigger.prefix(), handle.name()),
            })
            .collect::<Vec<_>>();

        if commands.is_empty() {
            "No commands available.".to_string()
        } else {
            format!("Available commands: {}", commands.join(", "))
        }
    }
}

/// Commands every bot instance answers to.
pub fn core_commands() -> Vec<CommandHandle> {
    vec![
        CommandHandle::builder("echo", |invocation| {
            let text = invocation.argument_text();
            (!text.is_empty()).then_some(text)
        })
        .help("repeats its arguments")
        .build(),
        CommandHandle::builder("tokens", |invocation| {
            if invocation.arguments.is_empty() {
                return None;
            }
            Some(format!(
                "{} tokens: {}",
                invocation.arguments.len(),
                invocation.arguments.join(" | ")
            ))
        })
        .help("shows how its arguments are split")
        .build(),
    ]
}
