//! HTML and server pages (ASP.NET, classic ASP, PHP).
//!
//! Server code blocks are classified with the page's code classifier and then
//! blanked out of the text handed to the markup walker. `<script>` bodies found
//! by the walker are routed the same way.

use super::dom::{Element, ParseMode};
use super::{blank_range, MarkupPolicy, MarkupWalker};
use crate::classifier::reconcile::filter_ignored;
use crate::classifier::span::{Classification, SpellCheckSpan};
use crate::classifier::{ClassifierSettings, TextClassifier};
use crate::dispatch::rules::ClassifierDefinition;
use crate::dispatch::ClassifierRegistry;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

const DEFAULT_VB_SCRIPT: &str = "VB";
const DEFAULT_C_STYLE_SCRIPT: &str = "JavaScript";

lazy_static! {
    static ref PAGE_LANGUAGE: Regex =
        Regex::new(r#"(?i)<%@\s*(?:Page|Control|Master)\b[^>]*?\bLanguage\s*=\s*["']?(\w+)"#).unwrap();
    static ref SERVER_BLOCK: Regex = Regex::new(r"(?s)<%(.*?)%>").unwrap();
    static ref PROCESSING_BLOCK: Regex = Regex::new(r"(?s)<\?(.*?)(?:\?>|\z)").unwrap();
    static ref CONDITIONAL_MARKER: Regex = Regex::new(r"(?i)^\s*\[if[^\]]*\]>|<!\[endif\]\s*$").unwrap();
}

/// Family of an embedded script, which picks the classifier that parses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    VisualBasic,
    CStyle,
}

impl ScriptLanguage {
    /// From a `type`, `language` or page `Language` value.
    pub fn from_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("vb") {
            ScriptLanguage::VisualBasic
        } else {
            ScriptLanguage::CStyle
        }
    }
}

fn skip_style(element: &Element, _: &str) -> bool {
    element.is_named("style")
}

/// Conditional-comment markers and server-side includes are not prose.
fn blank_directives(comment: &str) -> Cow<'_, str> {
    if comment.trim_start().starts_with('#') {
        let mut blanked = comment.to_string();
        blank_range(&mut blanked, 0..comment.len());
        return Cow::Owned(blanked);
    }

    if !CONDITIONAL_MARKER.is_match(comment) {
        return Cow::Borrowed(comment);
    }

    let mut blanked = comment.to_string();
    for m in CONDITIONAL_MARKER.find_iter(comment) {
        blank_range(&mut blanked, m.range());
    }
    Cow::Owned(blanked)
}

pub struct HtmlClassifier<'a> {
    walker: MarkupWalker<'a>,
    settings: &'a ClassifierSettings,
    registry: &'a ClassifierRegistry,
    vb_script: String,
    c_style_script: String,
    scripts: HashMap<ScriptLanguage, Box<dyn TextClassifier + 'a>>,
}

impl<'a> HtmlClassifier<'a> {
    pub fn new(
        definition: &ClassifierDefinition,
        settings: &'a ClassifierSettings,
        registry: &'a ClassifierRegistry,
    ) -> Self {
        let policy = MarkupPolicy {
            skip_element: skip_style,
            adjust_comment: blank_directives,
            ..Default::default()
        };

        Self {
            walker: MarkupWalker::new(ParseMode::Html, policy, settings),
            settings,
            registry,
            vb_script: definition
                .vb_script_classifier
                .clone()
                .unwrap_or_else(|| DEFAULT_VB_SCRIPT.to_string()),
            c_style_script: definition
                .c_style_script_classifier
                .clone()
                .unwrap_or_else(|| DEFAULT_C_STYLE_SCRIPT.to_string()),
            scripts: HashMap::new(),
        }
    }

    /// Nested classifiers are created on first use and kept for the rest of the file.
    fn script_classifier(
        &mut self,
        language: ScriptLanguage,
    ) -> Option<&mut Box<dyn TextClassifier + 'a>> {
        if !self.scripts.contains_key(&language) {
            let id = match language {
                ScriptLanguage::VisualBasic => &self.vb_script,
                ScriptLanguage::CStyle => &self.c_style_script,
            };

            match self.registry.create(id, "", self.settings) {
                Ok(classifier) => {
                    self.scripts.insert(language, classifier);
                }
                Err(e) => {
                    tracing::warn!("No classifier for embedded script: {}", e);
                    return None;
                }
            }
        }

        self.scripts.get_mut(&language)
    }

    /// Classify `code` (a slice of the parse text) and map spans back into `source`.
    fn route(
        &mut self,
        language: ScriptLanguage,
        source: &str,
        parse_text: &str,
        range: Range<usize>,
    ) -> Vec<SpellCheckSpan> {
        let Some(classifier) = self.script_classifier(language) else {
            return Vec::new();
        };

        classifier
            .parse(&parse_text[range.clone()])
            .into_iter()
            .map(|span| span.offset_by(range.start))
            .filter(|span| {
                let matches = source.get(span.range()) == Some(span.text.as_str());
                if !matches {
                    tracing::debug!("Dropping embedded span at {} that crosses server code", span.start);
                }
                matches
            })
            .collect()
    }

    /// Classify `source` using `parse_text`, an equal-length copy in which callers
    /// may have blanked regions that must not be classified.
    pub fn classify(&mut self, source: &str, parse_text: &str) -> Vec<SpellCheckSpan> {
        debug_assert_eq!(source.len(), parse_text.len());

        let page_language = PAGE_LANGUAGE
            .captures(parse_text)
            .and_then(|c| c.get(1))
            .map(|m| ScriptLanguage::from_name(m.as_str()));

        let mut blanked = parse_text.to_string();
        let mut spans = Vec::new();

        for caps in SERVER_BLOCK.captures_iter(parse_text) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let content = body.as_str();

            if let Some(inner) = content.strip_prefix("--") {
                // <%-- server comment --%>
                let inner_len = inner.strip_suffix("--").map_or(inner.len(), str::len);
                let start = body.start() + 2;
                spans.extend(comment_pieces(source, start..start + inner_len));
            } else if !content.starts_with('@') {
                let skip = usize::from(content.starts_with(['=', ':', '#', '$']));
                let language = page_language.unwrap_or(ScriptLanguage::CStyle);
                spans.extend(self.route(language, source, parse_text, body.start() + skip..body.end()));
            }

            blank_range(&mut blanked, whole.range());
        }

        // server blocks are already blanked, so a `<?` inside one is not seen again
        let blocks: Vec<(Range<usize>, Range<usize>)> = PROCESSING_BLOCK
            .captures_iter(&blanked)
            .filter_map(|c| Some((c.get(0)?.range(), c.get(1)?.range())))
            .collect();

        for (whole, body) in blocks {
            let content = &blanked[body.clone()];
            let starts = |prefix: &str| content.get(..prefix.len()).is_some_and(|p| p.eq_ignore_ascii_case(prefix));
            if starts("xml") {
                continue;
            }

            let skip = if starts("php") {
                3
            } else {
                usize::from(content.starts_with('='))
            };
            spans.extend(self.route(ScriptLanguage::CStyle, source, &blanked, body.start + skip..body.end));

            blank_range(&mut blanked, whole);
        }

        let walk = self.walker.walk(source, &blanked);
        spans.extend(walk.spans);

        for script in walk.scripts {
            let language = script
                .type_attr
                .as_deref()
                .or(script.language_attr.as_deref())
                .map(ScriptLanguage::from_name)
                .or(page_language)
                .unwrap_or(ScriptLanguage::CStyle);
            spans.extend(self.route(language, source, &blanked, script.body));
        }

        spans.sort_by_key(|s| s.start);
        filter_ignored(spans, &self.settings.ignored_classifications)
    }
}

fn comment_pieces(source: &str, range: Range<usize>) -> Vec<SpellCheckSpan> {
    let text = &source[range.clone()];
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let lead = text.len() - text.trim_start().len();
    let start = range.start + lead;
    vec![SpellCheckSpan::from_source(
        source,
        start..start + trimmed.len(),
        Classification::XmlFileComment,
    )]
}

impl TextClassifier for HtmlClassifier<'_> {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        self.classify(text, text)
    }
}
