//! # Tag References and Links
//!
//! Both constructs open with `[`:
//!
//! * [`parse_tag`]: `[tag:name]`, where each half is made of alphanumerics,
//!   `-` and `_`. Any other bracketed content is left as plain text.
//! * [`parse_link`]: `[text](target)` with an optional double-quoted title
//!   `[text](target "title")`. Text and title may contain spaces.
//!
//! A `(` directly after the closing `]` makes the span a link, so
//! [`parse_link`] is tried before [`parse_tag`].

use nom::{
    bytes::complete::{is_not, take_till, take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{opt, value},
    error::context,
    sequence::{delimited, preceded, separated_pair, tuple},
};

use super::token::{Construct, ParserResult};

fn tag_half(input: &str) -> ParserResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_tag(input: &str) -> ParserResult<Construct> {
    context(
        "tag reference",
        value(
            Construct::Tag,
            delimited(
                char('['),
                separated_pair(tag_half, char(':'), tag_half),
                char(']'),
            ),
        ),
    )(input)
}

fn link_text(input: &str) -> ParserResult<&str> {
    context("link text", delimited(char('['), is_not("]"), char(']')))(input)
}

fn link_target(input: &str) -> ParserResult<&str> {
    context(
        "link target",
        take_till1(|c: char| c == ' ' || c == '\t' || c == ')'),
    )(input)
}

fn link_title(input: &str) -> ParserResult<&str> {
    context(
        "link title",
        preceded(
            space1,
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        ),
    )(input)
}

/// Parses a link with an optional title.
///
/// # Examples
///
/// ```
/// # use roombot::tokenizer::reference::parse_link;
/// # use roombot::tokenizer::Construct;
/// let (rest, construct) = parse_link(r#"[docs](https://example.com "the docs") next"#).unwrap();
/// assert_eq!(construct, Construct::Link);
/// assert_eq!(rest, " next");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_link(input: &str) -> ParserResult<Construct> {
    context(
        "link",
        value(
            Construct::Link,
            tuple((
                link_text,
                char('('),
                link_target,
                opt(link_title),
                space0,
                char(')'),
            )),
        ),
    )(input)
}
