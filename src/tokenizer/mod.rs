//! # Message Tokenizer
//!
//! The tokenizer splits a raw chat message into an ordered sequence of tokens.
//! A token is either a plain word or a complete markdown construct of the chat
//! service's restricted dialect.
//!
//! ## Recognized Constructs
//!
//! * Bold-italic `***text***`, bold `**text**` and italic `*text*`
//! * Strikethrough `---text---`
//! * Inline code `` `text` ``
//! * Tag references `[tag:name]` and `[meta-tag:name]`
//! * Links `[text](target)` and `[text](target "title")`
//!
//! A construct is always a single token, however many words it spans.
//!
//! ## Scanning Strategy
//!
//! Words are separated by spaces. At the start of every word the construct
//! matchers are tried in precedence order:
//!
//! 1. Asterisk family, longest marker first (`***`, `**`, `*`)
//! 2. Strikethrough
//! 3. Inline code
//! 4. Link, then tag reference
//!
//! When a matcher succeeds the token extends to the end of the word holding the
//! closing marker. When none succeeds the word is emitted unchanged. Markers
//! inside a matched construct are literal content of that construct.
//!
//! ## Totality
//!
//! Tokenization never fails. Unterminated or malformed markers fall back to
//! plain words.
//!
//! ## Component Structure
//!
//! * [`token`]: Token types, the word scanner and [`tokenize`]
//! * [`markdown`]: Emphasis, strikethrough and code matchers
//! * [`reference`]: Tag reference and link matchers
//!
//! ## Usage Example
//!
//! ```rust
//! use roombot::tokenizer::tokenize;
//!
//! let parts = tokenize("testing `multiple words of code` for correct splitting");
//! assert_eq!(parts.len(), 5);
//! assert_eq!(parts[1], "`multiple words of code`");
//! ```

pub mod markdown;
pub mod reference;
pub mod token;

pub use token::{parse_construct, tokenize, Construct, Token, TokenSpan, Tokenizer};
