//! `$TOKEN$` substitution for page and feed templates.
//!
//! Templates are plain text files with placeholders written as an upper-case
//! name between dollar signs (`$TITLE$`, `$BODY$`). A [`Substitution`] holds
//! the recognized tokens and their values and rewrites a template in a single
//! left-to-right pass:
//!
//! - every occurrence of a recognized token is replaced, unless the token was
//!   registered with [`Substitution::token_once`]
//! - unknown tokens and stray dollar signs are copied through untouched
//! - replacement values are never scanned again, so a document titled
//!   `$BODY$` keeps that title literally
//!
//! Values are inserted as-is. URL-valued tokens go through [`encode_uri`]
//! and time-valued tokens through [`iso_time`] or [`http_time`] before they
//! are registered.

use chrono::{DateTime, SecondsFormat, Utc};
use memchr::memchr;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::borrow::Cow;

/// Characters `encodeURI` leaves alone besides ASCII alphanumerics.
const URI_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Percent-encode a URL the way `encodeURI` does: reserved URL syntax stays,
/// spaces, quotes, brackets, `%` and non-ASCII are UTF-8 percent-encoded.
pub fn encode_uri(url: &str) -> String {
    utf8_percent_encode(url, URI_RESERVED).to_string()
}

/// ISO 8601 form used by `$BTIME$` / `$MTIME$`: `2024-03-09T14:05:00.000Z`.
pub fn iso_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Human-readable form used by `$PUBLISHED$` / `$UPDATED$`:
/// `Sat, 09 Mar 2024 14:05:00 GMT`.
pub fn http_time(at: &DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[derive(Debug, Clone)]
struct Token<'a> {
    name: &'static str,
    value: Cow<'a, str>,
    once: bool,
}

/// A set of recognized tokens and the values they expand to.
#[derive(Debug, Clone, Default)]
pub struct Substitution<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Substitution<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `$name$`, replaced at every occurrence.
    pub fn token(mut self, name: &'static str, value: impl Into<Cow<'a, str>>) -> Self {
        self.tokens.push(Token {
            name,
            value: value.into(),
            once: false,
        });
        self
    }

    /// Register `$name$`, replaced at its first occurrence only.
    pub fn token_once(mut self, name: &'static str, value: impl Into<Cow<'a, str>>) -> Self {
        self.tokens.push(Token {
            name,
            value: value.into(),
            once: true,
        });
        self
    }

    /// Rewrite `template`, expanding every recognized token.
    pub fn apply(&self, template: &str) -> String {
        let bytes = template.as_bytes();
        let mut out = String::with_capacity(template.len());
        let mut used = vec![false; self.tokens.len()];
        let mut copied = 0;
        let mut i = 0;

        while let Some(offset) = memchr(b'$', &bytes[i..]) {
            let dollar = i + offset;
            let rest = &template[dollar + 1..];
            let hit = self.tokens.iter().enumerate().find(|(idx, token)| {
                !(token.once && used[*idx])
                    && rest.starts_with(token.name)
                    && rest[token.name.len()..].starts_with('$')
            });
            match hit {
                Some((idx, token)) => {
                    out.push_str(&template[copied..dollar]);
                    out.push_str(&token.value);
                    used[idx] = true;
                    copied = dollar + token.name.len() + 2;
                    i = copied;
                }
                None => i = dollar + 1,
            }
        }
        out.push_str(&template[copied..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = Substitution::new()
            .token("TITLE", "Hi")
            .apply("<title>$TITLE$</title><h1>$TITLE$</h1>");
        assert_eq!(out, "<title>Hi</title><h1>Hi</h1>");
    }

    #[test]
    fn unknown_tokens_are_left_untouched() {
        let out = Substitution::new()
            .token("TITLE", "Hi")
            .apply("$TITLE$ costs $5 and $PRICE$");
        assert_eq!(out, "Hi costs $5 and $PRICE$");
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = Substitution::new()
            .token("TITLE", "$BODY$")
            .token("BODY", "body")
            .apply("$TITLE$|$BODY$");
        assert_eq!(out, "$BODY$|body");
    }

    #[test]
    fn replacement_patterns_are_literal() {
        let out = Substitution::new()
            .token("BODY", "price: $& and $$")
            .apply("[$BODY$]");
        assert_eq!(out, "[price: $& and $$]");
    }

    #[test]
    fn once_tokens_replace_first_occurrence_only() {
        let out = Substitution::new()
            .token_once("ENTRIES", "items")
            .apply("$ENTRIES$ / $ENTRIES$");
        assert_eq!(out, "items / $ENTRIES$");
    }

    #[test]
    fn dollar_before_token_is_kept() {
        let out = Substitution::new().token("URL", "u").apply("$$URL$$");
        assert_eq!(out, "$u$");
    }

    #[test]
    fn token_names_are_case_sensitive() {
        let out = Substitution::new().token("TITLE", "x").apply("$title$");
        assert_eq!(out, "$title$");
    }

    #[test]
    fn empty_template_stays_empty() {
        assert_eq!(Substitution::new().token("A", "b").apply(""), "");
    }

    #[test]
    fn non_ascii_text_survives() {
        let out = Substitution::new().token("T", "日本").apply("«$T$» €");
        assert_eq!(out, "«日本» €");
    }

    #[test]
    fn encode_uri_keeps_url_syntax() {
        assert_eq!(
            encode_uri("https://example.org/a/b?x=1&y=2#frag"),
            "https://example.org/a/b?x=1&y=2#frag"
        );
        assert_eq!(encode_uri("mailto:ada@example.org"), "mailto:ada@example.org");
    }

    #[test]
    fn encode_uri_escapes_spaces_and_non_ascii() {
        assert_eq!(
            encode_uri("https://example.org/my notes/café/"),
            "https://example.org/my%20notes/caf%C3%A9/"
        );
        assert_eq!(encode_uri("100%"), "100%25");
        assert_eq!(encode_uri("a\"b<c>"), "a%22b%3Cc%3E");
    }

    #[test]
    fn iso_time_has_milliseconds_and_z() {
        assert_eq!(iso_time(&at()), "2024-03-09T14:05:00.000Z");
    }

    #[test]
    fn http_time_format() {
        assert_eq!(http_time(&at()), "Sat, 09 Mar 2024 14:05:00 GMT");
    }
}
