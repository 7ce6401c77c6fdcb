//! # Emphasis, Strikethrough and Code
//!
//! Matchers for the self-paired markers of the chat dialect. Each matcher
//! expects the opening marker at the start of its input and succeeds on the
//! nearest following occurrence of the same marker.
//!
//! ## Content Rules
//!
//! * Emphasis and strikethrough content is non-empty and neither begins nor
//!   ends with whitespace, so `* list`-style asterisks stay literal.
//! * Code content is non-empty and otherwise unrestricted.
//!
//! ## Precedence
//!
//! The asterisk family shares a marker character. The caller tries
//! [`parse_bold_italic`] before [`parse_bold`] before [`parse_italic`], so
//! `***text***` is bold-italic rather than italic around bold.

use nom::{
    bytes::complete::{tag, take_until},
    combinator::{value, verify},
    error::context,
    sequence::delimited,
};

use super::token::{Construct, ParserResult};

fn flanked(content: &str) -> bool {
    !content.is_empty()
        && !content.starts_with(char::is_whitespace)
        && !content.ends_with(char::is_whitespace)
}

fn non_empty(content: &str) -> bool {
    !content.is_empty()
}

fn self_paired<'a>(
    marker: &'static str,
    construct: Construct,
    accept: fn(&str) -> bool,
) -> impl FnMut(&'a str) -> ParserResult<'a, Construct> {
    value(
        construct,
        delimited(
            tag(marker),
            verify(take_until(marker), move |content: &str| accept(content)),
            tag(marker),
        ),
    )
}

/// Parses `***text***`.
///
/// # Examples
///
/// ```
/// # use roombot::tokenizer::markdown::parse_bold_italic;
/// # use roombot::tokenizer::Construct;
/// let (rest, construct) = parse_bold_italic("***both*** rest").unwrap();
/// assert_eq!(construct, Construct::BoldItalic);
/// assert_eq!(rest, " rest");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_bold_italic(input: &str) -> ParserResult<Construct> {
    context(
        "bold italic",
        self_paired("***", Construct::BoldItalic, flanked),
    )(input)
}

/// Parses `**text**`.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_bold(input: &str) -> ParserResult<Construct> {
    context("bold", self_paired("**", Construct::Bold, flanked))(input)
}

/// Parses `*text*`.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_italic(input: &str) -> ParserResult<Construct> {
    context("italic", self_paired("*", Construct::Italic, flanked))(input)
}

/// Parses `---text---`. The triple hyphen is a literal marker, not a range.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_strikethrough(input: &str) -> ParserResult<Construct> {
    context(
        "strikethrough",
        self_paired("---", Construct::Strikethrough, flanked),
    )(input)
}

/// Parses `` `text` ``.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_code(input: &str) -> ParserResult<Construct> {
    context("code", self_paired("`", Construct::Code, non_empty))(input)
}
