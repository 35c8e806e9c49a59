use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// The semantic kind of text inside a span.
///
/// Each classification maps to one user-configurable "ignore this kind of
/// content" switch applied downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    /// Sentinel used while splitting spans; never produced by a rule table.
    Undefined,
    PlainText,
    XmlFileComment,
    XmlFileCData,
    AttributeValue,
    InnerText,
    DelimitedComments,
    SingleLineComment,
    XmlDocComments,
    QuadSlashComment,
    NormalStringLiteral,
    VerbatimStringLiteral,
    InterpolatedStringLiteral,
    RegionDirective,
}

impl Classification {
    pub const ALL: [Classification; 14] = [
        Classification::Undefined,
        Classification::PlainText,
        Classification::XmlFileComment,
        Classification::XmlFileCData,
        Classification::AttributeValue,
        Classification::InnerText,
        Classification::DelimitedComments,
        Classification::SingleLineComment,
        Classification::XmlDocComments,
        Classification::QuadSlashComment,
        Classification::NormalStringLiteral,
        Classification::VerbatimStringLiteral,
        Classification::InterpolatedStringLiteral,
        Classification::RegionDirective,
    ];

    pub fn is_string_literal(self) -> bool {
        matches!(
            self,
            Classification::NormalStringLiteral
                | Classification::VerbatimStringLiteral
                | Classification::InterpolatedStringLiteral
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            Classification::DelimitedComments
                | Classification::SingleLineComment
                | Classification::XmlDocComments
                | Classification::QuadSlashComment
                | Classification::XmlFileComment
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Classification::Undefined => "Undefined",
            Classification::PlainText => "PlainText",
            Classification::XmlFileComment => "XmlFileComment",
            Classification::XmlFileCData => "XmlFileCData",
            Classification::AttributeValue => "AttributeValue",
            Classification::InnerText => "InnerText",
            Classification::DelimitedComments => "DelimitedComments",
            Classification::SingleLineComment => "SingleLineComment",
            Classification::XmlDocComments => "XmlDocComments",
            Classification::QuadSlashComment => "QuadSlashComment",
            Classification::NormalStringLiteral => "NormalStringLiteral",
            Classification::VerbatimStringLiteral => "VerbatimStringLiteral",
            Classification::InterpolatedStringLiteral => "InterpolatedStringLiteral",
            Classification::RegionDirective => "RegionDirective",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown classification: {}", s))
    }
}

/// A contiguous byte range of a file's text, its literal text and its classification.
///
/// `text` always equals `source[start..start + len]` for the buffer the span was
/// produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCheckSpan {
    pub start: usize,
    pub text: String,
    pub classification: Classification,
}

impl SpellCheckSpan {
    /// Build a span from a range of `source`.
    ///
    /// Panics if `range` is not on char boundaries of `source`; callers derive
    /// ranges from the same buffer.
    pub fn from_source(source: &str, range: Range<usize>, classification: Classification) -> Self {
        Self {
            start: range.start,
            text: source[range].to_string(),
            classification,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// True when the two spans share at least one byte.
    pub fn intersects(&self, other: &SpellCheckSpan) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// True when `other` lies entirely inside this span.
    pub fn contains(&self, other: &SpellCheckSpan) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Shift the span into a containing document's coordinate space.
    pub fn offset_by(mut self, delta: usize) -> Self {
        self.start += delta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_round_trips_through_names() {
        for c in Classification::ALL {
            assert_eq!(c.name().parse::<Classification>().unwrap(), c);
        }
        assert_eq!(
            "xmldoccomments".parse::<Classification>().unwrap(),
            Classification::XmlDocComments
        );
        assert!("Nonsense".parse::<Classification>().is_err());
    }

    #[test]
    fn test_classification_families() {
        assert!(Classification::VerbatimStringLiteral.is_string_literal());
        assert!(!Classification::RegionDirective.is_string_literal());
        assert!(Classification::QuadSlashComment.is_comment());
        assert!(Classification::XmlFileComment.is_comment());
        assert!(!Classification::InnerText.is_comment());
    }

    #[test]
    fn test_span_geometry() {
        let src = "hello world";
        let a = SpellCheckSpan::from_source(src, 0..5, Classification::PlainText);
        let b = SpellCheckSpan::from_source(src, 3..11, Classification::PlainText);
        let c = SpellCheckSpan::from_source(src, 1..3, Classification::PlainText);

        assert_eq!(a.end(), 5);
        assert!(a.intersects(&b));
        assert!(a.contains(&c));
        assert!(!b.contains(&a));
        assert_eq!(a.clone().offset_by(4).start, 4);
    }
}
