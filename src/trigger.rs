use regex::Regex;

use crate::command::CommandError;

/// Command prefix compiled once from configuration.
///
/// The value is immutable; clone it into whatever needs to recognize
/// command-directed messages.
#[derive(Debug, Clone)]
pub struct Trigger {
    prefix: String,
    pattern: Regex,
}

impl Trigger {
    pub fn new<S: Into<String>>(prefix: S) -> Result<Self, CommandError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(CommandError::EmptyTrigger);
        }
        let pattern = Regex::new(&format!("^{}", regex::escape(&prefix)))?;
        Ok(Self { prefix, pattern })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_triggered(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Returns the text after the prefix, or `None` if `text` does not start with it.
    pub fn strip<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern.find(text).map(|m| &text[m.end()..])
    }

    /// Reads the command name from the first token only.
    pub fn command_name<'a>(&self, tokens: &'a [String]) -> Option<&'a str> {
        tokens
            .first()
            .and_then(|first| self.strip(first))
            .filter(|name| !name.is_empty())
    }
}
