//! HTML parser – turns template markup into a small DOM tree that the
//! capture and text-extraction stages can address by element id.
//!
//! Only the subset emitted by [`crate::templates`] is recognised:
//! - Structural: header, main, section, div, p, h1-h3, ul, li
//! - Inline: span
//! - Styling via `class` and `style` attributes, addressing via `id`

use std::collections::HashMap;

/// Class marking elements that must not appear in exported output.
pub const NO_PRINT_CLASS: &str = "no-print";

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Header,
    Main,
    Section,
    Div,
    P,
    H1,
    H2,
    H3,
    Ul,
    Li,
    Span,
    /// Unrecognised tags are kept so their text survives extraction, but the
    /// style resolver hides them.
    Unknown(String),
}

impl Tag {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "header" => Tag::Header,
            "main" => Tag::Main,
            "section" => Tag::Section,
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "ul" => Tag::Ul,
            "li" => Tag::Li,
            "span" => Tag::Span,
            other => Tag::Unknown(other.to_string()),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span)
    }

    /// Elements whose inline children are merged into one wrapped text run.
    pub fn is_text_block(&self) -> bool {
        matches!(self, Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::Li)
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(String::as_str)
    }

    /// True when the inline style switches the element off.
    pub fn is_hidden(&self) -> bool {
        self.inline_style().is_some_and(|s| {
            s.split(';').any(|decl| {
                let mut kv = decl.splitn(2, ':');
                matches!(
                    (kv.next().map(str::trim), kv.next().map(str::trim)),
                    (Some("display"), Some("none"))
                )
            })
        })
    }
}

/// Address of an element: child indices from the tree's top-level list.
pub type NodePath = Vec<usize>;

/// A parsed document: the top-level nodes of one template rendering.
#[derive(Debug, Clone, Default)]
pub struct DomTree {
    pub nodes: Vec<DomNode>,
}

impl DomTree {
    pub fn parse(html: &str) -> Self {
        Self {
            nodes: parse_html(html),
        }
    }

    pub fn find_path_by_id(&self, id: &str) -> Option<NodePath> {
        let mut path = Vec::new();
        find_id(&self.nodes, id, &mut path).then_some(path)
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&ElementNode> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get(*first)? {
            DomNode::Element(e) => e,
            DomNode::Text(_) => return None,
        };
        for idx in rest {
            current = match current.children.get(*idx)? {
                DomNode::Element(e) => e,
                DomNode::Text(_) => return None,
            };
        }
        Some(current)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get_mut(*first)? {
            DomNode::Element(e) => e,
            DomNode::Text(_) => return None,
        };
        for idx in rest {
            current = match current.children.get_mut(*idx)? {
                DomNode::Element(e) => e,
                DomNode::Text(_) => return None,
            };
        }
        Some(current)
    }

    /// Paths of every element under `root` (inclusive) carrying `class`.
    pub fn paths_with_class(&self, root: &[usize], class: &str) -> Vec<NodePath> {
        let mut out = Vec::new();
        if let Some(el) = self.element_at(root) {
            let mut path = root.to_vec();
            collect_class(el, class, &mut path, &mut out);
        }
        out
    }
}

fn find_id(nodes: &[DomNode], id: &str, path: &mut NodePath) -> bool {
    for (i, node) in nodes.iter().enumerate() {
        if let DomNode::Element(e) = node {
            path.push(i);
            if e.id() == Some(id) || find_id(&e.children, id, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

fn collect_class(el: &ElementNode, class: &str, path: &mut NodePath, out: &mut Vec<NodePath>) {
    if el.has_class(class) {
        out.push(path.clone());
    }
    for (i, child) in el.children.iter().enumerate() {
        if let DomNode::Element(c) = child {
            path.push(i);
            collect_class(c, class, path, out);
            path.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

/// Rendered plain text of an element, roughly what a browser's `innerText`
/// yields: block boundaries become line breaks, whitespace collapses, and
/// hidden elements contribute nothing.
pub fn text_content(element: &ElementNode) -> String {
    let mut lines: Vec<String> = vec![String::new()];
    collect_text(element, &mut lines);
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: &ElementNode, lines: &mut Vec<String>) {
    if element.is_hidden() {
        return;
    }
    let block = !element.tag.is_inline();
    if block {
        lines.push(String::new());
    }
    for child in &element.children {
        match child {
            DomNode::Text(t) => {
                let words: Vec<&str> = t.split_whitespace().collect();
                if words.is_empty() {
                    continue;
                }
                if let Some(line) = lines.last_mut() {
                    if !line.is_empty() && !line.ends_with(' ') && t.starts_with(char::is_whitespace)
                    {
                        line.push(' ');
                    }
                    line.push_str(&words.join(" "));
                    if t.ends_with(char::is_whitespace) {
                        line.push(' ');
                    }
                }
            }
            DomNode::Element(e) => collect_text(e, lines),
        }
    }
    if block {
        lines.push(String::new());
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent over the controlled subset
// ---------------------------------------------------------------------------

pub fn parse_html(html: &str) -> Vec<DomNode> {
    Parser { input: html, pos: 0 }.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_inter_element_whitespace();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        let end = self.input[start..]
            .find('<')
            .map_or(self.input.len(), |off| start + off);
        self.pos = end;
        DomNode::Text(decode_entities(&self.input[start..end]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let name = self.parse_name();
        let mut elem = ElementNode::new(Tag::parse(&name));

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character inside a tag; skip it rather than loop.
                self.advance_char();
                continue;
            }
            elem.attributes.insert(key, value);
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.skip_past(">");
        }
        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = self.input[start..]
                    .find(q)
                    .map_or(self.input.len(), |off| start + off);
                self.pos = (end + 1).min(self.input.len());
                decode_entities(&self.input[start..end])
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.advance_char();
                }
                self.input[start..self.pos].to_string()
            }
        };
        (key, value)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    /// Skip whitespace-only runs between tags; text that starts with
    /// whitespace is left intact.
    fn skip_inter_element_whitespace(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, marker: &str) {
        self.pos = self.input[self.pos..]
            .find(marker)
            .map_or(self.input.len(), |off| self.pos + off + marker.len());
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

/// Escape text for inclusion in markup; the inverse of the parser's decoding.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
