//! Head/body boundary scanning for loosely-formed HTML.
//!
//! Source documents are hand-written HTML fragments. They may or may not carry
//! `<html>`, `<head>` and `<body>` tags, may open with a doctype, comments or
//! processing instructions, and are never validated. This module finds two
//! things in such a document without building a tree:
//!
//! - the text of the first `<title>` inside the head region ([`extract_title`])
//! - the byte range holding the body content ([`locate_body`])
//!
//! ## Head region
//!
//! HTML lets authors omit every structural tag, so the body does not start at
//! `<body>`; it starts wherever something that cannot live in a head shows up.
//! The scanner walks the document left to right with a single cursor:
//!
//! ```text
//!            ┌──────────── comment / doctype / PI / head-only tag ───┐
//!            ▼                                                       │
//!   ScanningHead ── <script> <style> <title> <noscript> ──► InRawText
//!            │                                                       │
//!            │  text, unknown tag, foreign end tag, <body>, EOF      │
//!            ▼                                                       │
//!        BodyFound ◄───────────────── skip raw content ──────────────┘
//! ```
//!
//! Head-only tags are `html`, `head`, `body`, `base`, `command`, `link`,
//! `meta`, `noscript`, `script`, `style` and `title`. The only end tags that
//! keep the scanner in the head are `head`, `noscript`, `script`, `style` and
//! `title`. The list is fixed: widening it changes where existing documents
//! start their body.
//!
//! ## Leniency
//!
//! Nothing here fails. An unterminated comment, processing instruction or tag
//! consumes the rest of the buffer; a missing title yields an empty string.
//! Titles are returned verbatim, entities and whitespace untouched.
//!
//! Offsets are byte offsets into the UTF-8 text and always land on char
//! boundaries, since the scanner only ever stops next to ASCII markup bytes.

use memchr::memchr;

/// Start tags allowed while the head region is still open.
const HEAD_ELEMENTS: &[&[u8]] = &[
    b"html", b"head", b"body", b"base", b"command", b"link", b"meta", b"noscript", b"script",
    b"style", b"title",
];

/// End tags consumed as part of the head region.
const HEAD_END_TAGS: &[&[u8]] = &[b"head", b"noscript", b"script", b"style", b"title"];

/// Text content of the first `<title>` inside the head region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TitleResult<'a> {
    /// Verbatim title text; empty when the document has no usable title.
    pub text: &'a str,
}

impl TitleResult<'_> {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Half-open byte interval `[start, end)` of the body content.
///
/// `0 <= start <= end <= text.len()` always holds for a range returned by
/// [`locate_body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRange {
    pub start: usize,
    pub end: usize,
}

impl BodyRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Borrow the body content out of the text this range was computed for.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Elements whose content is skipped rather than scanned as markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawText {
    Script,
    Style,
    Noscript,
    Title,
}

impl RawText {
    fn from_name(name: &[u8]) -> Option<Self> {
        if name.eq_ignore_ascii_case(b"script") {
            Some(Self::Script)
        } else if name.eq_ignore_ascii_case(b"style") {
            Some(Self::Style)
        } else if name.eq_ignore_ascii_case(b"noscript") {
            Some(Self::Noscript)
        } else if name.eq_ignore_ascii_case(b"title") {
            Some(Self::Title)
        } else {
            None
        }
    }
}

/// Scanner state. `BodyFound` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    ScanningHead,
    InRawText(RawText),
    BodyFound,
}

/// Result of one pass over the head region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadScan<'a> {
    pub title: TitleResult<'a>,
    /// Offset where body content begins.
    pub body_start: usize,
}

impl HeadScan<'_> {
    /// Body range of the scanned `text`, ending at the first closing
    /// `</body>` or `</html>` after the head region.
    pub fn body_range(&self, text: &str) -> BodyRange {
        BodyRange {
            start: self.body_start,
            end: find_body_end(text.as_bytes(), self.body_start),
        }
    }
}

/// Walk the head region of `text` once, collecting the title and the body start.
pub fn scan(text: &str) -> HeadScan<'_> {
    Scanner::new(text).run()
}

/// Text of the first `<title>` element that appears before the head region ends.
pub fn extract_title(text: &str) -> TitleResult<'_> {
    scan(text).title
}

/// Locate the body content of `text`.
///
/// `start` is where the head region ends. `end` is the first `</body>` or
/// `</html>` at or after `start` (ASCII case-insensitive, whitespace allowed
/// before `>`), or the end of the buffer.
pub fn locate_body(text: &str) -> BodyRange {
    scan(text).body_range(text)
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    title: Option<&'a str>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            state: ScanState::ScanningHead,
            title: None,
        }
    }

    fn run(mut self) -> HeadScan<'a> {
        loop {
            self.state = match self.state {
                ScanState::ScanningHead => self.step_head(),
                ScanState::InRawText(kind) => self.skip_raw_text(kind),
                ScanState::BodyFound => break,
            };
        }
        HeadScan {
            title: TitleResult {
                text: self.title.unwrap_or_default(),
            },
            body_start: self.pos,
        }
    }

    /// Dispatch on the construct under the cursor while still in the head.
    fn step_head(&mut self) -> ScanState {
        self.skip_whitespace();
        let bytes = self.bytes;
        if bytes.get(self.pos) != Some(&b'<') {
            return ScanState::BodyFound;
        }
        match bytes.get(self.pos + 1) {
            Some(b'!') => {
                self.skip_declaration();
                ScanState::ScanningHead
            }
            Some(b'?') => {
                self.skip_past_gt(self.pos + 2);
                ScanState::ScanningHead
            }
            Some(b'/') => self.end_tag(),
            _ => self.start_tag(),
        }
    }

    fn skip_whitespace(&mut self) {
        self.pos = self.text[self.pos..]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map_or(self.text.len(), |(offset, _)| self.pos + offset);
    }

    /// `<!-- ... -->` comments and bare `<!...>` declarations.
    fn skip_declaration(&mut self) {
        if self.bytes[self.pos..].starts_with(b"<!--") {
            self.pos = comment_end(self.bytes, self.pos + 4).unwrap_or(self.bytes.len());
        } else {
            self.skip_past_gt(self.pos + 2);
        }
    }

    fn skip_past_gt(&mut self, from: usize) {
        self.pos = memchr(b'>', &self.bytes[from.min(self.bytes.len())..])
            .map_or(self.bytes.len(), |offset| from + offset + 1);
    }

    /// Cursor sits on `</`.
    fn end_tag(&mut self) -> ScanState {
        let name_start = self.pos + 2;
        let name_end = name_end(self.bytes, name_start);
        let name = &self.bytes[name_start..name_end];
        if name.is_empty() || !matches_any(name, HEAD_END_TAGS) {
            // Anything else closing here means the body has already begun.
            return ScanState::BodyFound;
        }
        match tag_tail(self.bytes, name_end) {
            Some(tail) => {
                self.pos = tail.end;
                ScanState::ScanningHead
            }
            None => {
                self.pos = self.bytes.len();
                ScanState::BodyFound
            }
        }
    }

    /// Cursor sits on `<` followed by something other than `!`, `?` or `/`.
    fn start_tag(&mut self) -> ScanState {
        let name_start = self.pos + 1;
        let name_end = name_end(self.bytes, name_start);
        let name = &self.bytes[name_start..name_end];
        if name.is_empty() || !matches_any(name, HEAD_ELEMENTS) {
            return ScanState::BodyFound;
        }
        let Some(tail) = tag_tail(self.bytes, name_end) else {
            self.pos = self.bytes.len();
            return ScanState::BodyFound;
        };
        self.pos = tail.end;

        if name.eq_ignore_ascii_case(b"body") {
            return ScanState::BodyFound;
        }
        match RawText::from_name(name) {
            Some(kind) if !tail.self_closing => ScanState::InRawText(kind),
            _ => ScanState::ScanningHead,
        }
    }

    /// Move past the content of a raw-text element, leaving the cursor on its end tag.
    fn skip_raw_text(&mut self, kind: RawText) -> ScanState {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        match kind {
            RawText::Script | RawText::Style => {
                let name: &[u8] = if kind == RawText::Script {
                    b"script"
                } else {
                    b"style"
                };
                self.pos = find_end_tag(bytes, self.pos, name).unwrap_or(bytes.len());
            }
            RawText::Title => match memchr(b'<', rest) {
                Some(offset) => {
                    let lt = self.pos + offset;
                    if self.title.is_none() && is_end_tag_at(bytes, lt, b"title") {
                        self.title = Some(&self.text[self.pos..lt]);
                    }
                    self.pos = lt;
                }
                None => self.pos = bytes.len(),
            },
            RawText::Noscript => {
                self.pos = memchr(b'<', rest).map_or(bytes.len(), |offset| self.pos + offset);
            }
        }
        ScanState::ScanningHead
    }
}

/// Offset just past the terminator of a comment whose body starts at `from`.
///
/// Terminators are `-->` and `--!` (with a directly following `>` swallowed).
/// `<!-->` and `<!--->` close immediately, as browsers treat them.
fn comment_end(bytes: &[u8], from: usize) -> Option<usize> {
    let rest = &bytes[from.min(bytes.len())..];
    if rest.starts_with(b">") {
        return Some(from + 1);
    }
    if rest.starts_with(b"->") {
        return Some(from + 2);
    }
    let mut i = from;
    while let Some(offset) = memchr(b'-', &bytes[i..]) {
        let dash = i + offset;
        if bytes.get(dash + 1) == Some(&b'-') {
            match bytes.get(dash + 2) {
                Some(b'>') => return Some(dash + 3),
                Some(b'!') => {
                    let end = dash + 3;
                    return Some(if bytes.get(end) == Some(&b'>') {
                        end + 1
                    } else {
                        end
                    });
                }
                _ => {}
            }
        }
        i = dash + 1;
    }
    None
}

/// End of the ASCII alphanumeric tag name starting at `from`.
fn name_end(bytes: &[u8], from: usize) -> usize {
    let from = from.min(bytes.len());
    bytes[from..]
        .iter()
        .position(|b| !b.is_ascii_alphanumeric())
        .map_or(bytes.len(), |offset| from + offset)
}

fn matches_any(name: &[u8], set: &[&[u8]]) -> bool {
    set.iter().any(|candidate| name.eq_ignore_ascii_case(candidate))
}

/// Whether `</name` starts at `lt` and the name is not a prefix of a longer one.
fn is_end_tag_at(bytes: &[u8], lt: usize, name: &[u8]) -> bool {
    let name_start = lt + 2;
    bytes.get(lt + 1) == Some(&b'/')
        && name_end(bytes, name_start) == name_start + name.len()
        && bytes[name_start..name_start + name.len()].eq_ignore_ascii_case(name)
}

/// First `</name` at or after `from`.
fn find_end_tag(bytes: &[u8], from: usize, name: &[u8]) -> Option<usize> {
    let mut i = from;
    while let Some(offset) = memchr(b'<', &bytes[i..]) {
        let lt = i + offset;
        if is_end_tag_at(bytes, lt, name) {
            return Some(lt);
        }
        i = lt + 1;
    }
    None
}

/// Where the body content stops: the first `</body>` or `</html>` from `from` on.
fn find_body_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while let Some(offset) = memchr(b'<', &bytes[i..]) {
        let lt = i + offset;
        if is_end_tag_at(bytes, lt, b"body") || is_end_tag_at(bytes, lt, b"html") {
            // Both names are four bytes long.
            let after_name = lt + 6;
            let gt = bytes[after_name..]
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .map(|offset| after_name + offset);
            if gt.is_some_and(|gt| bytes[gt] == b'>') {
                return lt;
            }
        }
        i = lt + 1;
    }
    bytes.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagTail {
    /// Offset just past the closing `>`.
    end: usize,
    self_closing: bool,
}

/// Skip the attributes of a tag whose name ends at `from`.
///
/// Values may be double-quoted, single-quoted or bare; a `>` inside quotes does
/// not close the tag. Returns `None` when the buffer ends before the tag does.
fn tag_tail(bytes: &[u8], from: usize) -> Option<TagTail> {
    let len = bytes.len();
    let mut i = from;
    let mut self_closing = false;
    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => {
                return Some(TagTail {
                    end: i + 1,
                    self_closing,
                });
            }
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => self_closing = false,
        }

        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'/' | b'>' | b'=')
        {
            i += 1;
        }
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let close = memchr(quote, &bytes[i + 1..])?;
                i += close + 2;
            }
            _ => {
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
            }
        }
    }
}
