//! Markup classifiers share one tree walker.
//!
//! Format differences are expressed as a [`MarkupPolicy`]: which elements to
//! skip outright, how to neutralize boilerplate inside comments, and which parts
//! of a text node to keep. Callers may hand the walker a "parse text" that is the
//! source with some regions blanked to spaces; spans are always cut from the
//! original source and never cross a blanked region.

pub mod dom;
pub mod html;
pub mod markdown;
pub mod report;
pub mod resource;
pub mod xml;

use crate::classifier::reconcile::filter_ignored;
use crate::classifier::span::{Classification, SpellCheckSpan};
use crate::classifier::text_buffer::TextBuffer;
use crate::classifier::{ClassifierSettings, TextClassifier};
use dom::{Document, Element, Node, ParseMode};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;

lazy_static! {
    static ref CLOSING_TAG: Regex = Regex::new(r"</[^<>]*>").unwrap();
}

/// Which parts of a text node to spell check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerText {
    Whole,
    /// Ranges within the entity-decoded text.
    Parts(Vec<Range<usize>>),
}

/// Format-specific hooks for the markup walker.
#[derive(Clone, Copy)]
pub struct MarkupPolicy {
    /// Skip the element and its whole subtree. Receives the parsed text.
    pub skip_element: fn(&Element, &str) -> bool,
    /// Return the comment with boilerplate replaced by equal-length whitespace.
    pub adjust_comment: fn(&str) -> Cow<'_, str>,
    /// Restrict a text node to some of its parts, given its parent element.
    pub inner_text: fn(Option<&Element>, &str) -> InnerText,
}

fn never_skip(_: &Element, _: &str) -> bool {
    false
}

fn comment_as_is(text: &str) -> Cow<'_, str> {
    Cow::Borrowed(text)
}

fn whole_text(_: Option<&Element>, _: &str) -> InnerText {
    InnerText::Whole
}

impl Default for MarkupPolicy {
    fn default() -> Self {
        Self {
            skip_element: never_skip,
            adjust_comment: comment_as_is,
            inner_text: whole_text,
        }
    }
}

/// Body of a `<script>` element found while walking HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub body: Range<usize>,
    pub type_attr: Option<String>,
    pub language_attr: Option<String>,
}

#[derive(Debug, Default)]
pub struct Walk {
    pub spans: Vec<SpellCheckSpan>,
    pub scripts: Vec<ScriptBlock>,
}

/// Replace `range` with spaces, keeping line breaks and byte length.
pub(crate) fn blank_range(text: &mut String, range: Range<usize>) {
    let blanked: String = text[range.clone()]
        .chars()
        .map(|c| match c {
            '\r' | '\n' => c.to_string(),
            _ => " ".repeat(c.len_utf8()),
        })
        .collect();
    text.replace_range(range, &blanked);
}

/// Trimmed, non-blank runs where `original` and `parsed` agree, relative to their start.
pub(crate) fn unblanked_pieces(original: &str, parsed: &str) -> Vec<Range<usize>> {
    let a = original.as_bytes();
    let b = parsed.as_bytes();
    let mut pieces = Vec::new();
    let mut i = 0;

    while i < a.len() {
        if a[i] != b[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < a.len() && a[i] == b[i] {
            i += 1;
        }

        let run = &original[start..i];
        let trimmed = run.trim();
        if !trimmed.is_empty() {
            let lead = run.len() - run.trim_start().len();
            pieces.push(start + lead..start + lead + trimmed.len());
        }
    }

    pieces
}

struct WalkState<'s> {
    source: &'s str,
    parse_text: &'s str,
    buffer: TextBuffer<'s>,
    walk: Walk,
}

impl WalkState<'_> {
    fn push(&mut self, range: Range<usize>, classification: Classification) {
        let span = SpellCheckSpan::from_source(self.source, range, classification);
        debug_assert_eq!(&self.source[span.range()], span.text);
        self.walk.spans.push(span);
    }

    /// Push every unblanked piece of `range`.
    fn push_pieces(&mut self, range: Range<usize>, classification: Classification) {
        let pieces = unblanked_pieces(&self.source[range.clone()], &self.parse_text[range.clone()]);
        for piece in pieces {
            self.push(range.start + piece.start..range.start + piece.end, classification);
        }
    }
}

/// Walks a lenient document tree and emits comment, CDATA, attribute and text spans.
#[derive(Clone, Copy)]
pub struct MarkupWalker<'a> {
    mode: ParseMode,
    policy: MarkupPolicy,
    settings: &'a ClassifierSettings,
}

impl<'a> MarkupWalker<'a> {
    pub fn new(mode: ParseMode, policy: MarkupPolicy, settings: &'a ClassifierSettings) -> Self {
        Self {
            mode,
            policy,
            settings,
        }
    }

    pub fn walk(&self, source: &str, parse_text: &str) -> Walk {
        debug_assert_eq!(source.len(), parse_text.len());

        let document = Document::parse(parse_text, self.mode);
        if document.errors > 0 {
            tracing::debug!("Recovered from {} markup errors", document.errors);
        }

        let mut state = WalkState {
            source,
            parse_text,
            buffer: TextBuffer::new(source),
            walk: Walk::default(),
        };
        self.visit(&document.children, None, &mut state);

        state.walk.spans.sort_by_key(|s| s.start);
        state.walk
    }

    fn visit(&self, nodes: &[Node], parent: Option<&Element>, state: &mut WalkState<'_>) {
        for node in nodes {
            match node {
                Node::Element(element) => self.visit_element(element, state),
                Node::Comment(range) => self.visit_comment(range.clone(), state),
                Node::CData(range) => state.push_pieces(range.clone(), Classification::XmlFileCData),
                Node::Text(range) => self.visit_text(range.clone(), parent, state),
            }
        }
    }

    fn visit_element(&self, element: &Element, state: &mut WalkState<'_>) {
        if self
            .settings
            .ignores_element(&element.name, self.mode == ParseMode::Html)
            || (self.policy.skip_element)(element, state.parse_text)
        {
            return;
        }

        for attribute in &element.attributes {
            if let Some(value) = &attribute.value {
                if self.settings.checks_attribute(&attribute.name) {
                    state.push_pieces(value.clone(), Classification::AttributeValue);
                }
            }
        }

        if self.mode == ParseMode::Html && element.is_named("script") {
            let body = element.children.iter().find_map(|n| match n {
                Node::Text(r) => Some(r.clone()),
                _ => None,
            });
            if let Some(body) = body {
                let attr = |name: &str| {
                    element
                        .attribute_value(name, state.parse_text)
                        .map(str::to_string)
                };
                let block = ScriptBlock {
                    body,
                    type_attr: attr("type"),
                    language_attr: attr("language"),
                };
                state.walk.scripts.push(block);
            }
            return;
        }

        self.visit(&element.children, Some(element), state);
    }

    fn visit_comment(&self, range: Range<usize>, state: &mut WalkState<'_>) {
        let (source, parse_text) = (state.source, state.parse_text);
        let raw = &parse_text[range.clone()];
        let adjusted = (self.policy.adjust_comment)(raw);

        let adjusted: &str = if adjusted.len() == raw.len() {
            &adjusted
        } else {
            tracing::debug!("Comment adjustment changed the text length, ignoring it");
            raw
        };

        let pieces = unblanked_pieces(&source[range.clone()], adjusted);
        for piece in pieces {
            state.push(range.start + piece.start..range.start + piece.end, Classification::XmlFileComment);
        }
    }

    fn visit_text(&self, range: Range<usize>, parent: Option<&Element>, state: &mut WalkState<'_>) {
        let (source, parse_text) = (state.source, state.parse_text);
        let pieces = unblanked_pieces(&source[range.clone()], &parse_text[range.clone()]);

        for piece in pieces {
            let piece_start = range.start + piece.start;
            let piece_text = &source[piece_start..range.start + piece.end];

            // stray closing tags the lenient parser kept as text
            let mut cursor = 0;
            let mut parts = Vec::new();
            for m in CLOSING_TAG.find_iter(piece_text) {
                parts.push(cursor..m.start());
                cursor = m.end();
            }
            parts.push(cursor..piece_text.len());

            for part in parts {
                let text = &piece_text[part.clone()];
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let lead = text.len() - text.trim_start().len();
                let start = piece_start + part.start + lead;
                self.emit_inner_text(start..start + trimmed.len(), parent, state);
            }
        }
    }

    fn emit_inner_text(&self, range: Range<usize>, parent: Option<&Element>, state: &mut WalkState<'_>) {
        let source = state.source;
        let text = &source[range.clone()];
        let decoded = html_escape::decode_html_entities(text);

        match (self.policy.inner_text)(parent, &decoded) {
            InnerText::Whole => state.push(range, Classification::InnerText),
            InnerText::Parts(parts) => {
                for part in parts {
                    let Some(literal) = decoded.get(part.clone()) else {
                        continue;
                    };
                    let literal = literal.trim();
                    if literal.is_empty() {
                        continue;
                    }

                    // decoded offsets run short of the raw text wherever an entity was expanded
                    let approx = range.start + part.start;
                    let start = state.buffer.adjusted_offset(approx, literal);
                    let end = start + literal.len();

                    if end <= range.end && source.get(start..end) == Some(literal) {
                        state.push(start..end, Classification::InnerText);
                    } else {
                        tracing::debug!("Could not locate `{}` near offset {}", literal, approx);
                    }
                }
            }
        }
    }
}

/// XML-style classifier parameterized by a policy; used by the XML, resource and
/// report variants.
pub struct MarkupClassifier<'a> {
    walker: MarkupWalker<'a>,
    settings: &'a ClassifierSettings,
}

impl<'a> MarkupClassifier<'a> {
    pub fn new(mode: ParseMode, policy: MarkupPolicy, settings: &'a ClassifierSettings) -> Self {
        Self {
            walker: MarkupWalker::new(mode, policy, settings),
            settings,
        }
    }
}

impl TextClassifier for MarkupClassifier<'_> {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        let walk = self.walker.walk(text, text);
        filter_ignored(walk.spans, &self.settings.ignored_classifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_range_keeps_length_and_newlines() {
        let mut text = String::from("a `co\r\nde ☃` b");
        let len = text.len();
        let end = text.len() - 2;
        blank_range(&mut text, 2..end);
        assert_eq!(text.len(), len);
        assert!(text.contains("\r\n"));
        assert!(text.starts_with("a "));
        assert!(text.ends_with(" b"));
        assert!(text[2..len - 2].chars().all(|c| c.is_whitespace()));
    }

    #[test]
    fn test_unblanked_pieces() {
        let original = "one `two` three";
        let mut parsed = original.to_string();
        blank_range(&mut parsed, 4..9);

        let pieces = unblanked_pieces(original, &parsed);
        assert_eq!(pieces, vec![0..3, 10..15]);
    }

    #[test]
    fn test_walker_emits_comments_cdata_text() {
        let settings = ClassifierSettings::default();
        let walker = MarkupWalker::new(ParseMode::Xml, MarkupPolicy::default(), &settings);
        let src = "<root><!-- a note --><![CDATA[raw data]]>  <p>Some text</p></root>";

        let walk = walker.walk(src, src);
        let got: Vec<_> = walk
            .spans
            .iter()
            .map(|s| (s.text.as_str(), s.classification))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a note", Classification::XmlFileComment),
                ("raw data", Classification::XmlFileCData),
                ("Some text", Classification::InnerText),
            ]
        );
    }

    #[test]
    fn test_ignored_elements_skip_subtree() {
        let settings = ClassifierSettings::default();
        let walker = MarkupWalker::new(ParseMode::Xml, MarkupPolicy::default(), &settings);
        let src = "<doc><code>let x = 1;<b>bold</b></code><p>kept</p></doc>";

        let walk = walker.walk(src, src);
        assert_eq!(walk.spans.len(), 1);
        assert_eq!(walk.spans[0].text, "kept");
    }

    #[test]
    fn test_attribute_allow_list() {
        let settings = ClassifierSettings::default();
        let walker = MarkupWalker::new(ParseMode::Xml, MarkupPolicy::default(), &settings);
        let src = r#"<Button Title="Clik here" Name="btnOkay" ToolTip="   " />"#;

        let walk = walker.walk(src, src);
        assert_eq!(walk.spans.len(), 1);
        assert_eq!(walk.spans[0].classification, Classification::AttributeValue);
        assert_eq!(walk.spans[0].text, "Clik here");
    }

    #[test]
    fn test_stray_closing_tags_are_not_text() {
        let settings = ClassifierSettings::default();
        let walker = MarkupWalker::new(ParseMode::Html, MarkupPolicy::default(), &settings);
        let src = "<p>before</b>after</p>";

        let walk = walker.walk(src, src);
        let texts: Vec<_> = walk.spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["before", "after"]);
    }

    #[test]
    fn test_inner_text_parts_follow_entities() {
        fn quoted(_: Option<&Element>, text: &str) -> InnerText {
            match (text.find('"'), text.rfind('"')) {
                (Some(a), Some(b)) if b > a => InnerText::Parts(vec![a + 1..b]),
                _ => InnerText::Whole,
            }
        }

        let settings = ClassifierSettings::default();
        let policy = MarkupPolicy {
            inner_text: quoted,
            ..Default::default()
        };
        let walker = MarkupWalker::new(ParseMode::Xml, policy, &settings);
        let src = "<v>a &amp; b \"Tottal\"</v>";

        let walk = walker.walk(src, src);
        assert_eq!(walk.spans.len(), 1);
        assert_eq!(walk.spans[0].text, "Tottal");
        assert_eq!(&src[walk.spans[0].range()], "Tottal");
    }
}
