pub mod code;
pub mod markup;
pub mod plaintext;
pub mod reconcile;
pub mod regex_rules;
pub mod span;
pub mod text_buffer;

pub use span::{Classification, SpellCheckSpan};
pub use text_buffer::{Position, TextBuffer};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Turns one file's text into the spans worth spell checking.
///
/// Instances are cheap and meant for one file at a time; they may cache
/// nested classifiers between calls, so they are not shared across threads.
pub trait TextClassifier {
    /// Spans sorted by start offset, already filtered by the ignored classifications.
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan>;
}

/// Per-language switches for comments and string literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeOptions {
    pub ignore_xml_doc_comments: bool,
    pub ignore_delimited_comments: bool,
    pub ignore_standard_single_line_comments: bool,
    pub ignore_quadruple_slash_comments: bool,
    pub ignore_normal_strings: bool,
    pub ignore_verbatim_strings: bool,
    pub ignore_interpolated_strings: bool,
    /// Apply the switches to every C-style language, not only C#.
    pub apply_to_all_c_style_languages: bool,
}

impl CodeOptions {
    /// Whether spans of `classification` are switched off.
    pub fn ignores(&self, classification: Classification) -> bool {
        match classification {
            Classification::XmlDocComments => self.ignore_xml_doc_comments,
            Classification::DelimitedComments => self.ignore_delimited_comments,
            Classification::SingleLineComment => self.ignore_standard_single_line_comments,
            Classification::QuadSlashComment => self.ignore_quadruple_slash_comments,
            Classification::NormalStringLiteral => self.ignore_normal_strings,
            Classification::VerbatimStringLiteral => self.ignore_verbatim_strings,
            Classification::InterpolatedStringLiteral => self.ignore_interpolated_strings,
            _ => false,
        }
    }
}

fn default_ignored_xml_elements() -> BTreeSet<String> {
    [
        "c",
        "code",
        "codeEntityReference",
        "codeInline",
        "codeReference",
        "command",
        "environmentVariable",
        "fictitiousUri",
        "foreignPhrase",
        "link",
        "linkTarget",
        "linkUri",
        "localUri",
        "pre",
        "replaceable",
        "see",
        "seeAlso",
        "style",
        "token",
        "unmanagedCodeEntityReference",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_spell_checked_attributes() -> BTreeSet<String> {
    [
        "alt",
        "altText",
        "caption",
        "content",
        "header",
        "label",
        "lead",
        "placeholder",
        "summary",
        "text",
        "title",
        "toolTip",
        "watermark",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// The read-only slice of user configuration the classifiers consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub ignored_classifications: HashSet<Classification>,
    pub ignored_xml_elements: BTreeSet<String>,
    pub spell_checked_attributes: BTreeSet<String>,
    pub code: CodeOptions,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            ignored_classifications: HashSet::new(),
            ignored_xml_elements: default_ignored_xml_elements(),
            spell_checked_attributes: default_spell_checked_attributes(),
            code: CodeOptions::default(),
        }
    }
}

impl ClassifierSettings {
    /// Element names match with or without a namespace prefix. XML names are
    /// case-sensitive, so `ignore_case` is only set for HTML.
    pub fn ignores_element(&self, name: &str, ignore_case: bool) -> bool {
        let local = name.rsplit(':').next().unwrap_or(name);
        let same = |a: &str, b: &str| if ignore_case { a.eq_ignore_ascii_case(b) } else { a == b };
        self.ignored_xml_elements
            .iter()
            .any(|e| same(e, name) || same(e, local))
    }

    pub fn checks_attribute(&self, name: &str) -> bool {
        let local = name.rsplit(':').next().unwrap_or(name);
        self.spell_checked_attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(name) || a.eq_ignore_ascii_case(local))
    }

    pub fn ignores(&self, classification: Classification) -> bool {
        self.ignored_classifications.contains(&classification)
    }
}
