//! Source code classification.
//!
//! The regex rule engine finds comments and string literals; this module
//! sub-divides them (verbatim/interpolated strings, quad-slash and doc comments),
//! applies the per-language switches, and re-parses doc comments as markup so
//! only their prose is checked.

use crate::classifier::markup::dom::ParseMode;
use crate::classifier::markup::{blank_range, MarkupPolicy, MarkupWalker};
use crate::classifier::reconcile::filter_ignored;
use crate::classifier::regex_rules::{RegexRule, RegexRuleEngine};
use crate::classifier::span::{Classification, SpellCheckSpan};
use crate::classifier::text_buffer::TextBuffer;
use crate::classifier::{ClassifierSettings, CodeOptions, TextClassifier};

/// Comment prefixes that mark the documentation comment sub-kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDelimiters {
    /// e.g. `///` or `'''`
    pub xml_doc: Option<String>,
    /// e.g. `////`, commented-out code rather than prose
    pub quad_slash: Option<String>,
    /// e.g. `/**`
    pub old_style_doc: Option<String>,
}

fn string_prefix(text: &str) -> &str {
    let quote = text.find(['"', '\'', '`']).unwrap_or(0);
    &text[..quote]
}

/// Re-tag one span by its leading characters.
pub fn reclassify(span: &mut SpellCheckSpan, delimiters: &CommentDelimiters) {
    match span.classification {
        Classification::NormalStringLiteral => {
            let prefix = string_prefix(&span.text);
            if span.text.starts_with('`') || prefix.contains(['$', 'f', 'F']) {
                span.classification = Classification::InterpolatedStringLiteral;
            } else if prefix.contains(['@', 'r', 'R']) {
                span.classification = Classification::VerbatimStringLiteral;
            }
        }
        Classification::SingleLineComment => {
            let trimmed = span.text.trim_start();
            let starts = |d: &Option<String>| d.as_deref().is_some_and(|d| trimmed.starts_with(d));

            if starts(&delimiters.quad_slash) {
                span.classification = Classification::QuadSlashComment;
            } else if starts(&delimiters.xml_doc) {
                span.classification = Classification::XmlDocComments;
            }
        }
        Classification::DelimitedComments => {
            if let Some(d) = delimiters.old_style_doc.as_deref() {
                // `/**/` and `/***` banners are not doc comments
                let after = span.text.strip_prefix(d).and_then(|rest| rest.chars().next());
                if after.is_some_and(|c| c != '*' && c != '/') {
                    span.classification = Classification::XmlDocComments;
                }
            }
        }
        _ => {}
    }
}

pub struct CodeClassifier<'a> {
    engine: RegexRuleEngine,
    options: CodeOptions,
    delimiters: CommentDelimiters,
    doc_walker: MarkupWalker<'a>,
    settings: &'a ClassifierSettings,
}

impl<'a> CodeClassifier<'a> {
    /// `apply_options` says whether the comment/string switches of
    /// `settings.code` apply to this language.
    pub fn new(
        rules: Vec<RegexRule>,
        delimiters: CommentDelimiters,
        settings: &'a ClassifierSettings,
        apply_options: bool,
    ) -> Self {
        let hook_delimiters = delimiters.clone();
        let engine = RegexRuleEngine::new(rules, settings.ignored_classifications.clone())
            .with_post_process(Box::new(move |span| reclassify(span, &hook_delimiters)));

        let options = if apply_options {
            settings.code.clone()
        } else {
            CodeOptions::default()
        };

        Self {
            engine,
            options,
            delimiters,
            doc_walker: MarkupWalker::new(ParseMode::Xml, MarkupPolicy::default(), settings),
            settings,
        }
    }

    /// The doc comment with its comment markers blanked, same length as `text`.
    fn doc_comment_body(&self, text: &str) -> String {
        let mut body = text.to_string();

        if let Some(open) = self.delimiters.old_style_doc.as_deref() {
            if text.starts_with(open) {
                blank_range(&mut body, 0..open.len());
                if text.len() >= open.len() + 2 && text.ends_with("*/") {
                    blank_range(&mut body, text.len() - 2..text.len());
                }

                // leading `*` on continuation lines
                let mut offset = 0;
                for line in text.split_inclusive('\n') {
                    if offset > 0 {
                        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
                        let rest = &line[indent..];
                        if rest.starts_with('*') && !rest.starts_with("*/") {
                            blank_range(&mut body, offset + indent..offset + indent + 1);
                        }
                    }
                    offset += line.len();
                }
                return body;
            }
        }

        if let Some(marker) = self.delimiters.xml_doc.as_deref() {
            let mut offset = 0;
            for line in text.split_inclusive('\n') {
                let indent = line.len() - line.trim_start().len();
                if line[indent..].starts_with(marker) {
                    blank_range(&mut body, offset + indent..offset + indent + marker.len());
                }
                offset += line.len();
            }
        }

        body
    }

    /// Markup spans of a doc comment, in the containing file's coordinates.
    fn expand_doc_comment(&self, buffer: &TextBuffer<'_>, span: &SpellCheckSpan) -> Vec<SpellCheckSpan> {
        let body = self.doc_comment_body(&span.text);
        let local = TextBuffer::new(&span.text);
        let origin = buffer.position_of(span.start);

        self.doc_walker
            .walk(&span.text, &body)
            .spans
            .into_iter()
            .filter_map(|inner| {
                let pos = local.position_of(inner.start);
                let start = buffer.offset_of_local(pos.line, pos.column, origin);
                let end = start + inner.len();

                if buffer.text().get(start..end) == Some(inner.text.as_str()) {
                    Some(SpellCheckSpan { start, ..inner })
                } else {
                    tracing::debug!("Dropping doc comment span `{}` at {}", inner.text, start);
                    None
                }
            })
            .collect()
    }
}

impl TextClassifier for CodeClassifier<'_> {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        let buffer = TextBuffer::new(text);
        let mut spans = Vec::new();

        for span in self.engine.classify(text) {
            if self.options.ignores(span.classification) {
                continue;
            }

            if span.classification == Classification::XmlDocComments {
                spans.extend(self.expand_doc_comment(&buffer, &span));
            } else {
                spans.push(span);
            }
        }

        filter_ignored(spans, &self.settings.ignored_classifications)
    }
}
