//! Flat token view over an HTML5 parse of a scraped page.
//!
//! Parsing is done by `scraper` (html5ever underneath), so the input is
//! never rejected and unbalanced markup is repaired the way a browser would.
//! The parsed tree is walked back into a stream of open, close, text and
//! comment tokens. Offsets count characters of the normalized serialization
//! (`<name k="v">`, text, `</name>`), which keeps "how far after this table"
//! measurable. Comments stay opaque; callers that need tables shipped inside
//! `<!-- -->` re-tokenize the comment body. `<script>` and `<style>` bodies
//! are dropped.

use scraper::{ElementRef, Html, Node};

/// A token with its offset range in the normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Open(Tag),
    Close(String),
    /// Entity-decoded text.
    Text(String),
    Comment(String),
}

/// An opening tag. `name` and attribute names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c.eq_ignore_ascii_case(class))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Length of `<name k="v" ...>`.
    fn width(&self) -> usize {
        let attrs: usize = self.attrs.iter().map(|(k, v)| k.len() + v.len() + 4).sum();
        self.name.len() + attrs + 2
    }
}

impl Token {
    pub fn open_tag(&self) -> Option<&Tag> {
        match &self.kind {
            TokenKind::Open(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_open(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Open(tag) if tag.name == name)
    }

    pub fn is_close(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Close(n) if n == name)
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Comment(body) => Some(body),
            _ => None,
        }
    }
}

/// A located element: token indices of the open/close tags and the offset
/// range from the start of the open tag to the end of the close tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub open: usize,
    pub close: usize,
    pub start: usize,
    pub end: usize,
}

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

pub fn tokenize(html: &str) -> Vec<Token> {
    let document = Html::parse_document(html);
    let mut stream = TokenStream::default();
    stream.element(document.root_element());
    stream.tokens
}

#[derive(Default)]
struct TokenStream {
    tokens: Vec<Token>,
    offset: usize,
}

impl TokenStream {
    fn push(&mut self, kind: TokenKind, width: usize) {
        let start = self.offset;
        self.offset += width;
        self.tokens.push(Token {
            kind,
            start,
            end: self.offset,
        });
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let value = element.value();
        let tag = Tag {
            name: value.name().to_ascii_lowercase(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
        };
        let name = tag.name.clone();
        let width = tag.width();
        self.push(TokenKind::Open(tag), width);

        if !RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            for child in element.children() {
                match child.value() {
                    Node::Element(_) => {
                        if let Some(child) = ElementRef::wrap(child) {
                            self.element(child);
                        }
                    }
                    Node::Text(text) => {
                        let text: &str = text;
                        self.push(TokenKind::Text(text.to_string()), text.len());
                    }
                    Node::Comment(comment) => {
                        let body: &str = comment;
                        self.push(TokenKind::Comment(body.to_string()), body.len() + 7);
                    }
                    _ => {}
                }
            }
        }

        let width = name.len() + 3;
        self.push(TokenKind::Close(name), width);
    }
}

// =============================================================================
// Element lookup
// =============================================================================

/// First element at or after token `from` whose open tag is `name` and
/// satisfies `pred`. The element runs to its depth-matched close tag, or to
/// the end of the token stream when there is none.
pub fn find_element<F>(tokens: &[Token], from: usize, name: &str, pred: F) -> Option<Span>
where
    F: Fn(&Tag) -> bool,
{
    let open = tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, t)| matches!(t.open_tag(), Some(tag) if tag.is(name) && pred(tag)))
        .map(|(i, _)| i)?;

    Some(element_span(tokens, open, name))
}

/// All non-overlapping matching elements, in document order.
pub fn find_elements<F>(tokens: &[Token], name: &str, pred: F) -> Vec<Span>
where
    F: Fn(&Tag) -> bool,
{
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(span) = find_element(tokens, from, name, &pred) {
        from = span.close + 1;
        spans.push(span);
    }
    spans
}

fn element_span(tokens: &[Token], open: usize, name: &str) -> Span {
    let start = tokens[open].start;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_open(name) {
            depth += 1;
        } else if token.is_close(name) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Span { open, close: i, start, end: token.end };
            }
        }
    }

    let last = tokens.len().saturating_sub(1);
    Span {
        open,
        close: last,
        start,
        end: tokens.get(last).map(|t| t.end).unwrap_or(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tokenizes_tags_attrs_and_text() {
        let tokens = tokenize(r#"<div id="scores" class="a  b">Hi &amp; bye</div>"#);
        let span = find_element(&tokens, 0, "div", |t| t.attr("id") == Some("scores")).unwrap();

        let tag = tokens[span.open].open_tag().unwrap();
        assert!(tag.has_class("b"));
        assert_eq!(tag.classes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(texts(&tokens[span.open..=span.close]), vec!["Hi & bye"]);
        assert!(tokens[span.close].is_close("div"));
    }

    #[test]
    fn uppercase_and_unquoted_attributes() {
        let tokens = tokenize("<TD CLASS=right>7</TD>");
        let cell = find_element(&tokens, 0, "td", |t| t.has_class("right"));
        // A bare <td> outside a table is dropped by the HTML5 tree builder.
        assert!(cell.is_none());

        let tokens = tokenize("<TABLE><TR><TD CLASS=right>7</TD></TR></TABLE>");
        let span = find_element(&tokens, 0, "td", |t| t.has_class("right")).unwrap();
        assert_eq!(texts(&tokens[span.open..=span.close]), vec!["7"]);
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        let tokens = tokenize("<p>1 < 2 > 0</p>");
        assert_eq!(texts(&tokens), vec!["1 < 2 > 0"]);
    }

    #[test]
    fn comments_stay_opaque() {
        let tokens = tokenize(r#"<div><!-- <table id="line_score"></table> --></div>"#);
        assert!(find_element(&tokens, 0, "table", |_| true).is_none());

        let body = tokens.iter().find_map(Token::comment).unwrap();
        let inner = tokenize(body);
        assert!(find_element(&inner, 0, "table", |t| t.attr("id") == Some("line_score")).is_some());
    }

    #[test]
    fn script_and_style_bodies_are_dropped() {
        let tokens = tokenize(
            "<script>var s = '<table class=\"teams\"></div>';</script>\
             <style>td { color: red }</style><p>after</p>",
        );
        assert!(find_element(&tokens, 0, "table", |_| true).is_none());
        assert_eq!(texts(&tokens), vec!["after"]);
    }

    #[test]
    fn nested_elements_match_by_depth() {
        let tokens = tokenize("<div id=a><div>inner</div>tail</div><p>x</p>");
        let span = find_element(&tokens, 0, "div", |t| t.attr("id") == Some("a")).unwrap();
        assert!(tokens[span.close].is_close("div"));
        assert_eq!(texts(&tokens[span.open..=span.close]), vec!["inner", "tail"]);
        assert!(tokens[span.close + 1].is_open("p"));
    }

    #[test]
    fn unclosed_elements_are_closed_by_the_parser() {
        let tokens = tokenize("<div id=a><span>open");
        let span = find_element(&tokens, 0, "div", |_| true).unwrap();
        assert!(tokens[span.close].is_close("div"));
        assert_eq!(texts(&tokens[span.open..=span.close]), vec!["open"]);
    }

    #[test]
    fn offsets_follow_normalized_markup() {
        let tokens = tokenize(r#"<p class="x">ab</p>"#);
        let span = find_element(&tokens, 0, "p", |_| true).unwrap();
        let open = &tokens[span.open];
        assert_eq!(open.end - open.start, r#"<p class="x">"#.len());
        assert_eq!(span.end - span.start, r#"<p class="x">ab</p>"#.len());
    }

    #[test]
    fn find_elements_returns_each_match() {
        let tokens = tokenize("<table class=teams></table><table></table><table class='teams'></table>");
        let spans = find_elements(&tokens, "table", |t| t.has_class("teams"));
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
    }
}
