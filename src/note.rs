//! Note chunking – splits a section's free-text note into
//! paragraph-equivalent chunks, one expanded element per chunk.
//!
//! Two input shapes are supported:
//! - light block markup (the controlled subset rich-text note editors emit:
//!   `p`, `div`, `h1`–`h3`, `ul`/`ol`/`li`, `blockquote`, inline `span`/`b`/
//!   `strong`/`i`/`em`/`u`, `br`): one chunk per block-level element
//! - plain text: one chunk per blank-line-separated paragraph
//!
//! Empty and placeholder-only blocks (e.g. `<p><br></p>`) yield no chunk.

/// Split note text into non-empty paragraph chunks, preserving order.
pub fn split_note(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if looks_like_markup(trimmed) {
        split_markup(trimmed)
    } else {
        split_plain(trimmed)
    }
}

/// Plain text: paragraphs are separated by one or more blank lines.
fn split_plain(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            push_chunk(&mut chunks, &mut current);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line.trim_end());
        }
    }
    push_chunk(&mut chunks, &mut current);
    chunks
}

fn looks_like_markup(text: &str) -> bool {
    // A '<' immediately followed by a letter or '/' is treated as a tag; a
    // lone '<' in prose is not.
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'<'
            && bytes
                .get(i + 1)
                .is_some_and(|&n| n.is_ascii_alphabetic() || n == b'/')
    })
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "h1" | "h2" | "h3" | "li" | "blockquote"
    )
}

/// One chunk per block-level element. Container tags (`ul`, `ol`) only group;
/// inline tags are stripped; `br` becomes a line break within the chunk.
fn split_markup(text: &str) -> Vec<String> {
    let mut scanner = Scanner::new(text);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    loop {
        match scanner.next_token() {
            Token::Text(t) => {
                let decoded = decode_entities(t);
                let piece = decoded.trim_matches('\n');
                if !piece.trim().is_empty() {
                    if !current.is_empty() && !current.ends_with('\n') {
                        current.push(' ');
                    }
                    current.push_str(collapse_whitespace(piece).as_str());
                }
            }
            Token::Open(tag) => {
                if tag == "br" {
                    current.push('\n');
                } else if is_block_tag(&tag) {
                    push_chunk(&mut chunks, &mut current);
                }
            }
            Token::Close(tag) => {
                if is_block_tag(&tag) {
                    push_chunk(&mut chunks, &mut current);
                }
            }
            Token::Eof => break,
        }
    }
    push_chunk(&mut chunks, &mut current);
    chunks
}

fn collapse_whitespace(text: &str) -> String {
    // Runs of whitespace collapse to single spaces, but embedded newlines
    // produced by <br> are kept.
    text.split('\n')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String) {
    let chunk = std::mem::take(current);
    let chunk = chunk.trim_matches(|c: char| c.is_whitespace());
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

enum Token<'a> {
    Text(&'a str),
    Open(String),
    Close(String),
    Eof,
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_token(&mut self) -> Token<'a> {
        if self.eof() {
            return Token::Eof;
        }
        if self.rest().starts_with("<!--") {
            if let Some(end) = self.rest().find("-->") {
                self.pos += end + 3;
            } else {
                self.pos = self.input.len();
            }
            return self.next_token();
        }
        if self.rest().starts_with('<') {
            let rest = self.rest();
            let closing = rest[1..].starts_with('/');
            // A '<' with no '>' terminator is treated as literal text.
            let Some(end) = rest.find('>') else {
                let text = rest;
                self.pos = self.input.len();
                return Token::Text(text);
            };
            let inner = &rest[if closing { 2 } else { 1 }..end];
            let name: String = inner
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase();
            self.pos += end + 1;
            if name.is_empty() {
                return self.next_token();
            }
            if closing {
                Token::Close(name)
            } else {
                Token::Open(name)
            }
        } else {
            let end = self.rest().find('<').unwrap_or(self.rest().len());
            let text = &self.rest()[..end];
            self.pos += end;
            Token::Text(text)
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_note_yields_nothing() {
        assert!(split_note("").is_empty());
        assert!(split_note("   \n  ").is_empty());
    }

    #[test]
    fn plain_text_splits_on_blank_lines() {
        let chunks = split_note("First paragraph.\n\nSecond paragraph.\n\n\nThird.");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph.", "Third."]);
    }

    #[test]
    fn single_paragraph_is_one_chunk() {
        let chunks = split_note("Only one paragraph\nwith a soft break.");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("soft break"));
    }

    #[test]
    fn markup_splits_per_block_element() {
        let chunks = split_note("<p>Payment in 30 days.</p><p>Offer valid 15 days.</p>");
        assert_eq!(chunks, vec!["Payment in 30 days.", "Offer valid 15 days."]);
    }

    #[test]
    fn placeholder_only_block_yields_nothing() {
        assert!(split_note("<p><br></p>").is_empty());
        assert!(split_note("<p> </p><div></div>").is_empty());
    }

    #[test]
    fn inline_tags_are_stripped() {
        let chunks = split_note("<p>Pay <b>now</b> or <span>later</span>.</p>");
        assert_eq!(chunks, vec!["Pay now or later ."]);
    }

    #[test]
    fn list_items_become_chunks() {
        let chunks = split_note("<ul><li>One</li><li>Two</li></ul>");
        assert_eq!(chunks, vec!["One", "Two"]);
    }

    #[test]
    fn br_keeps_lines_within_one_chunk() {
        let chunks = split_note("<p>Line one<br>Line two</p>");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Line one\nLine two");
    }

    #[test]
    fn entities_are_decoded() {
        let chunks = split_note("<p>Terms &amp; conditions&nbsp;apply</p>");
        assert_eq!(chunks, vec!["Terms & conditions apply"]);
    }
}
