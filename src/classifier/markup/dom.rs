//! Lenient markup document model.
//!
//! Ill-formed input never fails to parse. Unclosed elements are closed at the
//! end of their parent, closing tags with no open element become text nodes,
//! and a `<` that starts no construct is plain text. Every problem bumps the
//! document's error count, which is what well-formedness sniffing looks at.
//! All ranges are byte offsets into the parsed text.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Xml,
    /// Case-insensitive names, void elements and raw-text `script`/`style`.
    Html,
}

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

const HTML_RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Value without its quotes, `None` for a bare attribute.
    pub value: Option<Range<usize>>,
}

impl Attribute {
    pub fn value<'s>(&self, source: &'s str) -> &'s str {
        self.value.clone().map_or("", |r| &source[r])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// From the `<` of the start tag to the end of the closing tag.
    pub range: Range<usize>,
    /// Where the content starts (just after the start tag).
    pub content_start: usize,
}

impl Element {
    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.local_name().eq_ignore_ascii_case(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn attribute_value<'s>(&self, name: &str, source: &'s str) -> Option<&'s str> {
        self.attribute(name).map(|a| a.value(source))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Range<usize>),
    /// Comment content, without `<!--` and `-->`.
    Comment(Range<usize>),
    /// CDATA content, without `<![CDATA[` and `]]>`.
    CData(Range<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
    pub errors: usize,
}

impl Document {
    pub fn parse(text: &str, mode: ParseMode) -> Self {
        Parser::new(text, mode).run()
    }

    /// One root element, no stray text, no recovered errors.
    pub fn is_well_formed(&self) -> bool {
        let roots = self
            .children
            .iter()
            .filter(|n| matches!(n, Node::Element(_)))
            .count();
        self.errors == 0 && roots == 1
    }

    pub fn root(&self) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }
}

struct Parser<'t> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
    mode: ParseMode,
    stack: Vec<Element>,
    root: Vec<Node>,
    errors: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

impl<'t> Parser<'t> {
    fn new(text: &'t str, mode: ParseMode) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            mode,
            stack: Vec::new(),
            root: Vec::new(),
            errors: 0,
        }
    }

    fn run(mut self) -> Document {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'<' {
                self.markup();
            } else {
                self.text_run();
            }
        }

        while let Some(mut element) = self.stack.pop() {
            self.errors += 1;
            element.range.end = self.text.len();
            self.append(Node::Element(element));
        }

        Document {
            children: self.root,
            errors: self.errors,
        }
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        match self.mode {
            ParseMode::Xml => a == b,
            ParseMode::Html => a.eq_ignore_ascii_case(b),
        }
    }

    fn append(&mut self, node: Node) {
        if let Node::Text(range) = &node {
            if self.stack.is_empty() && !self.text[range.clone()].trim().is_empty() {
                self.errors += 1;
            }
        }

        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };

        // contiguous text runs (e.g. a literal `<`) form one node
        if let (Some(Node::Text(prev)), Node::Text(next)) = (siblings.last_mut(), &node) {
            if prev.end == next.start {
                prev.end = next.end;
                return;
            }
        }
        siblings.push(node);
    }

    fn starts_with(&self, s: &str) -> bool {
        self.text[self.pos..].starts_with(s)
    }

    fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        self.text[from..].find(needle).map(|i| from + i)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        let len = self.text[start..]
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map_or(self.text.len() - start, |(i, _)| i);
        self.pos += len;
        self.text[start..self.pos].to_string()
    }

    fn text_run(&mut self) {
        let start = self.pos;
        self.pos = self.find_from(start, "<").unwrap_or(self.text.len());
        self.append(Node::Text(start..self.pos));
    }

    /// Content up to `terminator`, or to the end of input (counted as an error).
    fn delimited(&mut self, open_len: usize, terminator: &str) -> Range<usize> {
        let start = self.pos + open_len;
        match self.find_from(start, terminator) {
            Some(end) => {
                self.pos = end + terminator.len();
                start..end
            }
            None => {
                self.errors += 1;
                self.pos = self.text.len();
                start..self.text.len()
            }
        }
    }

    fn markup(&mut self) {
        if self.starts_with("<!--") {
            let content = self.delimited(4, "-->");
            self.append(Node::Comment(content));
        } else if self.starts_with("<![CDATA[") {
            let content = self.delimited(9, "]]>");
            self.append(Node::CData(content));
        } else if self.starts_with("<?") {
            self.delimited(2, "?>");
        } else if self.starts_with("<!") {
            self.delimited(2, ">");
        } else if self.starts_with("</") {
            self.end_tag();
        } else if self.text[self.pos + 1..]
            .chars()
            .next()
            .is_some_and(is_name_start)
        {
            self.start_tag();
        } else {
            self.errors += 1;
            let start = self.pos;
            self.pos += 1;
            self.append(Node::Text(start..self.pos));
        }
    }

    fn start_tag(&mut self) {
        let tag_start = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let Some(&b) = self.bytes.get(self.pos) else {
                self.errors += 1;
                break;
            };

            match b {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    self_closing = true;
                    break;
                }
                b'<' => {
                    self.errors += 1;
                    break;
                }
                _ => {
                    let attr_name = self.read_name();
                    if attr_name.is_empty() {
                        self.errors += 1;
                        self.pos += self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
                        continue;
                    }
                    let value = self.attribute_value();
                    attributes.push(Attribute {
                        name: attr_name,
                        value,
                    });
                }
            }
        }

        let element = Element {
            name,
            attributes,
            children: Vec::new(),
            range: tag_start..self.pos,
            content_start: self.pos,
        };

        let is_html = self.mode == ParseMode::Html;
        let lower = element.name.to_ascii_lowercase();

        if self_closing || (is_html && HTML_VOID_ELEMENTS.contains(&lower.as_str())) {
            self.append(Node::Element(element));
        } else if is_html && HTML_RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
            self.raw_text_element(element, &lower);
        } else {
            self.stack.push(element);
        }
    }

    fn attribute_value(&mut self) -> Option<Range<usize>> {
        let save = self.pos;
        self.skip_whitespace();

        if self.bytes.get(self.pos) != Some(&b'=') {
            self.pos = save;
            if self.mode == ParseMode::Xml {
                self.errors += 1;
            }
            return None;
        }

        self.pos += 1;
        self.skip_whitespace();

        match self.bytes.get(self.pos) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let quote = if q == b'"' { "\"" } else { "'" };
                Some(self.delimited(1, quote))
            }
            Some(_) => {
                if self.mode == ParseMode::Xml {
                    self.errors += 1;
                }
                let start = self.pos;
                while self.pos < self.bytes.len()
                    && !self.bytes[self.pos].is_ascii_whitespace()
                    && self.bytes[self.pos] != b'>'
                {
                    self.pos += 1;
                }
                Some(start..self.pos)
            }
            None => {
                self.errors += 1;
                None
            }
        }
    }

    fn raw_text_element(&mut self, mut element: Element, lower_name: &str) {
        let body_start = self.pos;
        let closing = format!("</{}", lower_name);
        let body_end = self.text[body_start..]
            .to_ascii_lowercase()
            .find(&closing)
            .map_or(self.text.len(), |i| body_start + i);

        if body_end > body_start {
            element.children.push(Node::Text(body_start..body_end));
        }

        self.pos = body_end;
        if self.pos < self.text.len() {
            self.pos = self
                .find_from(self.pos, ">")
                .map_or(self.text.len(), |i| i + 1);
        } else {
            self.errors += 1;
        }

        element.range.end = self.pos;
        self.append(Node::Element(element));
    }

    fn end_tag(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let name = self.read_name();
        match self.find_from(self.pos, ">") {
            Some(i) => self.pos = i + 1,
            None => {
                self.errors += 1;
                self.pos = self.text.len();
            }
        }

        let open = self
            .stack
            .iter()
            .rposition(|e| self.names_match(&e.name, &name));

        let Some(index) = open else {
            // stray closing tag, kept as text like forgiving HTML parsers do
            self.errors += 1;
            self.append(Node::Text(start..self.pos));
            return;
        };

        while self.stack.len() > index + 1 {
            if let Some(mut unclosed) = self.stack.pop() {
                self.errors += 1;
                unclosed.range.end = start;
                self.append(Node::Element(unclosed));
            }
        }

        if let Some(mut element) = self.stack.pop() {
            element.range.end = self.pos;
            self.append(Node::Element(element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_well_formed_xml() {
        let src = r#"<?xml version="1.0"?><root a="1"><child>text</child><!-- note --></root>"#;
        let doc = Document::parse(src, ParseMode::Xml);

        assert!(doc.is_well_formed());
        let root = doc.root().unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.attribute_value("a", src), Some("1"));
        assert_eq!(root.children.len(), 2);

        let child = element(&root.children[0]);
        let text_at = src.find("text").unwrap();
        assert_eq!(child.children, vec![Node::Text(text_at..text_at + 4)]);

        match &root.children[1] {
            Node::Comment(r) => assert_eq!(&src[r.clone()], " note "),
            other => panic!("expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_cdata() {
        let src = "<a><![CDATA[x < y]]></a>";
        let doc = Document::parse(src, ParseMode::Xml);
        let root = doc.root().unwrap();
        assert_eq!(root.children, vec![Node::CData(12..17)]);
        assert!(doc.is_well_formed());
    }

    #[test]
    fn test_plain_text_is_not_well_formed() {
        assert!(!Document::parse("just some words", ParseMode::Xml).is_well_formed());
        assert!(!Document::parse("<a><b></a>", ParseMode::Xml).is_well_formed());
        assert!(!Document::parse("<a/><b/>", ParseMode::Xml).is_well_formed());
    }

    #[test]
    fn test_unclosed_elements_recover() {
        let src = "<div><p>one<p>two</div>after";
        let doc = Document::parse(src, ParseMode::Html);
        assert!(doc.errors > 0);

        let div = doc.root().unwrap();
        assert_eq!(div.name, "div");
        let p = element(&div.children[0]);
        assert_eq!(p.children.len(), 2);
        assert!(matches!(doc.children.last(), Some(Node::Text(r)) if &src[r.clone()] == "after"));
    }

    #[test]
    fn test_stray_closing_tag_becomes_text() {
        let src = "<p>text</b></p>";
        let doc = Document::parse(src, ParseMode::Html);
        let p = doc.root().unwrap();
        assert_eq!(p.children, vec![Node::Text(3..11)]);
    }

    #[test]
    fn test_html_void_and_raw_text() {
        let src = "<p>a<br>b<script type=\"text/javascript\">if (a < b) {}</SCRIPT></p>";
        let doc = Document::parse(src, ParseMode::Html);
        let p = doc.root().unwrap();

        assert!(p.range.end == src.len());
        let script = p
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(e) if e.is_named("script") => Some(e),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(script.attribute_value("TYPE", src), Some("text/javascript"));
        match &script.children[0] {
            Node::Text(r) => assert_eq!(&src[r.clone()], "if (a < b) {}"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_unquoted_and_bare_attributes() {
        let src = "<input value=hello disabled title='x y'>";
        let doc = Document::parse(src, ParseMode::Html);
        let input = doc.root().unwrap();

        assert_eq!(input.attribute_value("value", src), Some("hello"));
        assert_eq!(input.attribute("disabled").unwrap().value, None);
        assert_eq!(input.attribute_value("title", src), Some("x y"));
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let src = "<a>1 < 2</a>";
        let doc = Document::parse(src, ParseMode::Xml);
        let a = doc.root().unwrap();
        assert_eq!(a.children, vec![Node::Text(3..8)]);
    }

    #[test]
    fn test_local_name() {
        let src = "<x:Name/>";
        let doc = Document::parse(src, ParseMode::Xml);
        let e = doc.root().unwrap();
        assert_eq!(e.local_name(), "Name");
        assert!(e.is_named("name"));
    }
}
