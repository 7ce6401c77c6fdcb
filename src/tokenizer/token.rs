use nom::{branch::alt, error::VerboseError, IResult};
use strum_macros::{Display, EnumIter};

use super::{
    markdown::{parse_bold, parse_bold_italic, parse_code, parse_italic, parse_strikethrough},
    reference::{parse_link, parse_tag},
};

/// Word separator of the chat dialect.
pub const SEPARATOR: char = ' ';

/// Markdown constructs that are kept together as one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Construct {
    /// `***text***`
    BoldItalic,
    /// `**text**`
    Bold,
    /// `*text*`
    Italic,
    /// `---text---`
    Strikethrough,
    /// `` `text` ``
    Code,
    /// `[tag:name]`
    Tag,
    /// `[text](target "title")`
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Construct { construct: Construct, text: String },
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(text) | Token::Construct { text, .. } => text,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Token::Word(text) | Token::Construct { text, .. } => text,
        }
    }

    pub fn construct(&self) -> Option<Construct> {
        match self {
            Token::Word(_) => None,
            Token::Construct { construct, .. } => Some(*construct),
        }
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }
}

/// A token together with its byte range in the original message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&self, input: &str) -> Vec<TokenSpan> {
        let mut tokens = Vec::new();
        let mut position = 0;

        while let Some(start) = next_word_start(input, position) {
            let remaining = &input[start..];

            let (end, token) = match parse_construct(remaining) {
                Ok((rest, construct)) => {
                    // the closing marker may be followed by trailing word characters
                    let end = word_end(input, start + (remaining.len() - rest.len()));
                    tracing::debug!(%construct, start, end, "construct matched");
                    (
                        end,
                        Token::Construct {
                            construct,
                            text: input[start..end].to_string(),
                        },
                    )
                }
                Err(_) => {
                    let end = word_end(input, start);
                    (end, Token::Word(input[start..end].to_string()))
                }
            };

            tokens.push(TokenSpan { token, start, end });
            position = end;
        }

        tokens
    }
}

/// Splits `message` into plain words and markdown constructs.
pub fn tokenize(message: &str) -> Vec<String> {
    Tokenizer::new()
        .tokenize(message)
        .into_iter()
        .map(|span| span.token.into_string())
        .collect()
}

/// Tries every construct matcher in precedence order.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_construct(input: &str) -> ParserResult<Construct> {
    alt((
        // Asterisk family, longest marker first
        parse_bold_italic,
        parse_bold,
        parse_italic,
        parse_strikethrough,
        parse_code,
        // Links win over tags
        parse_link,
        parse_tag,
    ))(input)
}

fn next_word_start(input: &str, from: usize) -> Option<usize> {
    input[from..]
        .find(|c: char| c != SEPARATOR)
        .map(|offset| from + offset)
}

fn word_end(input: &str, from: usize) -> usize {
    input[from..]
        .find(SEPARATOR)
        .map_or(input.len(), |offset| from + offset)
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;
