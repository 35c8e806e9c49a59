//! Markdown is classified as HTML after code, link targets and math are blanked.

use super::blank_range;
use super::html::HtmlClassifier;
use crate::classifier::span::SpellCheckSpan;
use crate::classifier::{ClassifierSettings, TextClassifier};
use crate::dispatch::rules::ClassifierDefinition;
use crate::dispatch::ClassifierRegistry;
use lazy_static::lazy_static;
use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref DISPLAY_MATH: Regex = Regex::new(r"(?s)\$\$.+?\$\$").unwrap();
    static ref INLINE_MATH: Regex = Regex::new(r"\$[^\s$](?:[^$\r\n]*[^\s$])?\$").unwrap();
}

/// Ranges of inline code, code blocks and link/image destinations.
fn code_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => ranges.push(range),
            Event::Start(Tag::Link { dest_url, .. }) | Event::Start(Tag::Image { dest_url, .. }) => {
                if dest_url.is_empty() {
                    continue;
                }
                if let Some(at) = text[range.clone()].rfind(dest_url.as_ref()) {
                    let start = range.start + at;
                    ranges.push(start..start + dest_url.len());
                }
            }
            _ => {}
        }
    }

    ranges
}

/// `text` with everything that is not prose or HTML replaced by whitespace.
pub fn blank_non_prose(text: &str) -> String {
    let mut blanked = text.to_string();
    for range in code_ranges(text) {
        blank_range(&mut blanked, range);
    }

    for pattern in [&*DISPLAY_MATH, &*INLINE_MATH] {
        let found: Vec<_> = pattern.find_iter(&blanked).map(|m| m.range()).collect();
        for range in found {
            blank_range(&mut blanked, range);
        }
    }

    blanked
}

pub struct MarkdownClassifier<'a> {
    html: HtmlClassifier<'a>,
}

impl<'a> MarkdownClassifier<'a> {
    pub fn new(
        definition: &ClassifierDefinition,
        settings: &'a ClassifierSettings,
        registry: &'a ClassifierRegistry,
    ) -> Self {
        Self {
            html: HtmlClassifier::new(definition, settings, registry),
        }
    }
}

impl TextClassifier for MarkdownClassifier<'_> {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        let parse_text = blank_non_prose(text);
        self.html.classify(text, &parse_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;

    const DOC: &str = "# Titel

Some prose with `inline code` and a [lnk](https://example.com/pagee).

```rust
let x = \"not prose\";
```

Math $x^2$ and $$
E = mc^2
$$ done.

<!-- hiden note -->
<div title=\"Tooltp\">Inside html</div>
";

    #[test]
    fn test_code_and_math_are_blanked() {
        let blanked = blank_non_prose(DOC);
        assert_eq!(blanked.len(), DOC.len());
        assert!(!blanked.contains("inline code"));
        assert!(!blanked.contains("not prose"));
        assert!(!blanked.contains("example.com"));
        assert!(!blanked.contains("mc^2"));
        assert!(!blanked.contains("x^2"));
        assert!(blanked.contains("[lnk]("));
        assert!(blanked.contains("done."));
    }

    #[test]
    fn test_markdown_spans() {
        let settings = ClassifierSettings::default();
        let registry = ClassifierRegistry::builtin();
        let definition = registry.definition("Markdown").unwrap();
        let spans = MarkdownClassifier::new(definition, &settings, registry).parse(DOC);

        for s in &spans {
            assert_eq!(&DOC[s.range()], s.text);
        }

        let prose: String = spans
            .iter()
            .filter(|s| s.classification == Classification::InnerText)
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(prose.contains("Titel"));
        assert!(prose.contains("Some prose with"));
        assert!(prose.contains("Inside html"));
        assert!(!prose.contains("inline code"));
        assert!(!prose.contains("not prose"));

        let find = |class: Classification| {
            spans
                .iter()
                .find(|s| s.classification == class)
                .map(|s| s.text.as_str())
        };
        assert_eq!(find(Classification::XmlFileComment), Some("hiden note"));
        assert_eq!(find(Classification::AttributeValue), Some("Tooltp"));
    }

    #[test]
    fn test_dollar_amounts_are_not_math() {
        let text = "It costs $5 and $10 today.";
        assert_eq!(blank_non_prose(text), text);
    }
}
