//! Rendering of outgoing chat messages.
//!
//! Long replies are split on token boundaries, so a markdown construct is
//! never cut in half across two messages.

use crate::{chat::ChatMessage, tokenizer::tokenize};

/// Prefixes `text` with the reply marker for `message`.
pub fn reply(message: &ChatMessage, text: &str) -> String {
    format!(":{} {}", message.message_id, text)
}

/// Packs the tokens of `text` into chunks of at most `max_len` characters.
///
/// Tokens are joined by single spaces. A token longer than `max_len` is sent
/// as a chunk of its own rather than being cut.
pub fn chunk(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for token in tokenize(text) {
        let token_len = token.chars().count();
        if !current.is_empty() && current_len + 1 + token_len > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&token);
        current_len += token_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
