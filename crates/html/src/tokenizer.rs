//! Byte-scanning markup tokenizer.
//!
//! Tag names are ASCII `[A-Za-z0-9:_-]` and are lowercased. Attribute names are
//! more permissive so template markers (`@value`, `#checked`) and namespaced
//! names (`xlink:href`) survive: anything except ASCII whitespace, `/`, `>`,
//! `=`, quotes and `<`.
//!
//! `script` and `style` bodies are raw text; `textarea` and `title` bodies are
//! raw text with character references decoded. A missing close tag turns the
//! rest of the input into that element's body.
//!
//! The tokenizer never fails: stray `<` and malformed constructs degrade to text
//! or are skipped.
use crate::entities::decode_entities;
use crate::types::Token;
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_attribute_name_char(c: u8) -> bool {
    !(c.is_ascii_whitespace() || matches!(c, b'/' | b'>' | b'=' | b'"' | b'\'' | b'<'))
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextMode {
    Raw,
    Escapable,
}

fn text_mode(name: &str) -> Option<TextMode> {
    match name {
        "script" | "style" => Some(TextMode::Raw),
        "textarea" | "title" => Some(TextMode::Escapable),
        _ => None,
    }
}

/// Finds `</name` followed by optional ASCII whitespace and `>`, case-insensitively.
/// Returns `(start, end)` of the close tag relative to `haystack`.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = name.len();
    let mut i = 0;
    while i < len {
        i += memchr(b'<', &bytes[i..])?;
        if i + 2 + n > len {
            return None;
        }
        if bytes[i + 1] == b'/' && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes()) {
            let mut k = i + 2 + n;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            out: Vec::new(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn push_text(&mut self, text: &str) {
        let decoded = decode_entities(text);
        if decoded.is_empty() {
            return;
        }
        // Stray `<` produce separate text runs; keep them as one token.
        if let Some(Token::Text(prev)) = self.out.last_mut() {
            prev.push_str(&decoded);
        } else {
            self.out.push(Token::Text(decoded));
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        self.pos = match memchr(b'<', &self.bytes[start..]) {
            Some(rel) => start + rel,
            None => self.bytes.len(),
        };
        let input = self.input;
        self.push_text(&input[start..self.pos]);
    }

    fn comment(&mut self) {
        let body_start = self.pos + COMMENT_START.len();
        match self.input[body_start..].find(COMMENT_END) {
            Some(end) => {
                let body = &self.input[body_start..body_start + end];
                self.out.push(Token::Comment(body.to_string()));
                self.pos = body_start + end + COMMENT_END.len();
            }
            None => {
                self.out
                    .push(Token::Comment(self.input[body_start..].to_string()));
                self.pos = self.bytes.len();
            }
        }
    }

    fn doctype(&mut self) {
        let rest = &self.input[self.pos + 2..];
        match rest.find('>') {
            Some(end) => {
                self.out.push(Token::Doctype(rest[..end].trim().to_string()));
                self.pos += 2 + end + 1;
            }
            None => self.pos = self.bytes.len(),
        }
    }

    fn end_tag(&mut self) {
        let start = self.pos + 2;
        let mut j = start;
        while j < self.bytes.len() && is_tag_name_char(self.bytes[j]) {
            j += 1;
        }
        let name = self.input[start..j].to_ascii_lowercase();
        while j < self.bytes.len() && self.bytes[j] != b'>' {
            j += 1;
        }
        self.pos = (j + 1).min(self.bytes.len());
        if !name.is_empty() {
            self.out.push(Token::EndTag(name));
        }
    }

    fn attribute_value(&mut self) -> String {
        let len = self.bytes.len();
        if self.pos < len && (self.bytes[self.pos] == b'"' || self.bytes[self.pos] == b'\'') {
            let quote = self.bytes[self.pos];
            self.pos += 1;
            let start = self.pos;
            self.pos = match memchr(quote, &self.bytes[start..]) {
                Some(rel) => start + rel,
                None => len,
            };
            let raw = &self.input[start..self.pos];
            if self.pos < len {
                self.pos += 1;
            }
            return decode_entities(raw);
        }
        let start = self.pos;
        while self.pos < len && !self.bytes[self.pos].is_ascii_whitespace() && self.bytes[self.pos] != b'>' {
            if self.bytes[self.pos] == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>') {
                break;
            }
            self.pos += 1;
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn start_tag(&mut self) {
        let start = self.pos + 1;
        let mut j = start;
        while j < self.bytes.len() && is_tag_name_char(self.bytes[j]) {
            j += 1;
        }
        let name = self.input[start..j].to_ascii_lowercase();
        self.pos = j;

        let len = self.bytes.len();
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            if self.pos >= len {
                break;
            }
            match self.bytes[self.pos] {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'>') {
                        self_closing = true;
                        self.pos += 1;
                        break;
                    }
                    continue;
                }
                _ => {}
            }
            let name_start = self.pos;
            while self.pos < len && is_attribute_name_char(self.bytes[self.pos]) {
                self.pos += 1;
            }
            if name_start == self.pos {
                self.pos += 1;
                continue;
            }
            let attribute_name = self.input[name_start..self.pos].to_ascii_lowercase();
            self.skip_whitespace();
            let value = if self.pos < len && self.bytes[self.pos] == b'=' {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };
            // First occurrence wins, as in HTML.
            if !attributes.iter().any(|(k, _)| *k == attribute_name) {
                attributes.push((attribute_name, value));
            }
        }

        let self_closing = self_closing || is_void_element(&name);
        let mode = if self_closing { None } else { text_mode(&name) };
        self.out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if let Some(mode) = mode {
            self.raw_body(name, mode);
        }
    }

    fn raw_body(&mut self, name: String, mode: TextMode) {
        let body_start = self.pos;
        let rest = &self.input[body_start..];
        let (body, next) = match find_close_tag(rest, &name) {
            Some((close_start, close_end)) => (&rest[..close_start], body_start + close_end),
            None => (rest, self.bytes.len()),
        };
        if !body.is_empty() {
            let text = match mode {
                TextMode::Raw => body.to_string(),
                TextMode::Escapable => decode_entities(body),
            };
            self.out.push(Token::Text(text));
        }
        self.out.push(Token::EndTag(name));
        self.pos = next;
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' {
                self.text();
                continue;
            }
            let next = self.bytes.get(self.pos + 1).copied();
            if self.input[self.pos..].starts_with(COMMENT_START) {
                self.comment();
            } else if starts_with_ignore_ascii_case_at(self.bytes, self.pos, b"<!doctype") {
                self.doctype();
            } else if next == Some(b'/') {
                self.end_tag();
            } else if next.is_some_and(|b| b.is_ascii_alphabetic()) {
                self.start_tag();
            } else {
                // Not a tag opener: treat `<` as text.
                self.pos += 1;
                self.push_text("<");
            }
        }
        self.out
    }
}

/// Tokenizes markup into a flat token list.
pub fn tokenize(input: &str) -> Vec<Token> {
    Scanner::new(input).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attributes: &[(&str, &str)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn tokenizes_nested_elements_and_text() {
        let tokens = tokenize("<div class=box><span>hi</span></div>");
        assert_eq!(
            tokens,
            vec![
                start("div", &[("class", "box")]),
                start("span", &[]),
                Token::Text("hi".into()),
                Token::EndTag("span".into()),
                Token::EndTag("div".into()),
            ]
        );
    }

    #[test]
    fn keeps_template_marker_attribute_names() {
        let tokens = tokenize(r#"<input @value="x" #checked xlink:href='y'>"#);
        let Token::StartTag {
            attributes,
            self_closing,
            ..
        } = &tokens[0]
        else {
            panic!("expected start tag, got {tokens:?}");
        };
        assert!(*self_closing, "input is void");
        assert_eq!(
            attributes,
            &vec![
                ("@value".to_string(), "x".to_string()),
                ("#checked".to_string(), String::new()),
                ("xlink:href".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn lowercases_names_and_keeps_first_duplicate() {
        let tokens = tokenize("<DiV ID=one id=two></DIV>");
        assert_eq!(
            tokens,
            vec![start("div", &[("id", "one")]), Token::EndTag("div".into())]
        );
    }

    #[test]
    fn decodes_entities_in_text_and_quoted_values() {
        let tokens = tokenize(r#"<a title="a &amp; b">&lt;x&gt;</a>"#);
        assert_eq!(tokens[0], start("a", &[("title", "a & b")]));
        assert_eq!(tokens[1], Token::Text("<x>".into()));
    }

    #[test]
    fn script_body_is_raw_text_with_case_insensitive_close() {
        let tokens = tokenize("<script>if (a < b) {}</ScRiPt >after");
        assert_eq!(
            tokens,
            vec![
                start("script", &[]),
                Token::Text("if (a < b) {}".into()),
                Token::EndTag("script".into()),
                Token::Text("after".into()),
            ]
        );
    }

    #[test]
    fn unterminated_raw_text_consumes_rest_of_input() {
        let tokens = tokenize("<style>body{}</styl");
        assert_eq!(
            tokens,
            vec![
                start("style", &[]),
                Token::Text("body{}</styl".into()),
                Token::EndTag("style".into()),
            ]
        );
    }

    #[test]
    fn textarea_body_decodes_entities_without_parsing_tags() {
        let tokens = tokenize("<textarea><b>&amp;</textarea>");
        assert_eq!(tokens[1], Token::Text("<b>&".into()));
    }

    #[test]
    fn stray_angle_brackets_become_text() {
        let tokens = tokenize("a < b <3");
        assert_eq!(tokens, vec![Token::Text("a < b <3".into())]);
    }

    #[test]
    fn comments_and_doctype() {
        let tokens = tokenize("<!DOCTYPE html><!-- note --><p>x");
        assert_eq!(tokens[0], Token::Doctype("DOCTYPE html".into()));
        assert_eq!(tokens[1], Token::Comment(" note ".into()));
        assert_eq!(tokens[2], start("p", &[]));
    }

    #[test]
    fn unterminated_comment_runs_to_end() {
        let tokens = tokenize("<p></p><!-- open");
        assert_eq!(tokens.last(), Some(&Token::Comment(" open".into())));
    }

    #[test]
    fn handles_utf8_text_and_values() {
        let tokens = tokenize("¡Hola <b title=naïve>café</b> 😊");
        assert_eq!(tokens[0], Token::Text("¡Hola ".into()));
        assert_eq!(tokens[1], start("b", &[("title", "naïve")]));
        assert_eq!(tokens[2], Token::Text("café".into()));
        assert_eq!(tokens[4], Token::Text(" 😊".into()));
    }

    #[test]
    fn tons_of_angle_brackets_stay_linear() {
        let input = "<".repeat(100_000);
        let tokens = tokenize(&input);
        assert_eq!(tokens, vec![Token::Text(input)]);
    }
}
