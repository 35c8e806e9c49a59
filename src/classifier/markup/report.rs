//! Report definitions (`.rdl`, `.rdlc`).
//!
//! Data plumbing and layout elements are skipped. Expression values (text
//! starting with `=`) only contribute their string literals, and the embedded
//! `<Code>` block contributes its string literals and comments.

use super::dom::{Element, ParseMode};
use super::{InnerText, MarkupClassifier, MarkupPolicy};
use crate::classifier::ClassifierSettings;
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

const SKIPPED_ELEMENTS: &[&str] = &[
    "DataSources",
    "DataSets",
    "Style",
    "EmbeddedImages",
    "CodeModules",
    "Classes",
    "Language",
    "ReportID",
    "ReportUnitType",
    "DataSourceID",
    "ConnectionProperties",
    "ReportParametersLayout",
];

lazy_static! {
    static ref STRING_LITERAL: Regex = Regex::new(r#""((?:[^"]|"")*)""#).unwrap();
    static ref CODE_COMMENT: Regex = Regex::new(r"(?im)(?:'|\bREM\b)([^\r\n]*)").unwrap();
}

fn skip_element(element: &Element, _: &str) -> bool {
    SKIPPED_ELEMENTS.iter().any(|name| element.is_named(name))
}

fn string_literals(text: &str) -> Vec<Range<usize>> {
    STRING_LITERAL
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.range())
        .collect()
}

fn expression_parts(parent: Option<&Element>, text: &str) -> InnerText {
    if parent.is_some_and(|p| p.is_named("Code")) {
        let literals = string_literals(text);
        let inside = |ranges: &[Range<usize>], at: usize| ranges.iter().any(|r| r.start <= at && at < r.end);

        // a quote inside a literal is not a comment
        let comments: Vec<_> = CODE_COMMENT
            .captures_iter(text)
            .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.range())))
            .filter(|(start, _)| !inside(&literals, *start))
            .map(|(_, body)| body)
            .collect();

        // and a literal inside a comment is already part of its body
        let mut parts: Vec<_> = literals
            .into_iter()
            .filter(|l| !inside(&comments, l.start))
            .collect();
        parts.extend(comments);
        parts.sort_by_key(|p| p.start);

        return InnerText::Parts(parts);
    }

    if text.starts_with('=') {
        InnerText::Parts(string_literals(text))
    } else {
        InnerText::Whole
    }
}

pub fn classifier(settings: &ClassifierSettings) -> MarkupClassifier<'_> {
    let policy = MarkupPolicy {
        skip_element,
        inner_text: expression_parts,
        ..Default::default()
    };
    MarkupClassifier::new(ParseMode::Xml, policy, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TextClassifier;
    use pretty_assertions::assert_eq;

    const RDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report xmlns:rd="http://schemas.microsoft.com/SQLServer/reporting/reportdesigner">
  <DataSources>
    <DataSource Name="Sales">
      <ConnectionProperties><ConnectString>Data Sorce=.</ConnectString></ConnectionProperties>
    </DataSource>
  </DataSources>
  <Body>
    <ReportItems>
      <Textbox Name="Title"><Value>Quartrly report</Value></Textbox>
      <Textbox Name="Total"><Value>="Grand tottal: " &amp; Sum(Fields!Amount.Value)</Value></Textbox>
      <Textbox Name="Amount"><Value>=Fields!Amount.Value</Value></Textbox>
    </ReportItems>
    <Style><FontFamily>Arial</FontFamily></Style>
  </Body>
  <Code>Public Function Greet() As String
    ' Retuns a greeting
    Return "Helo, it's me"
  End Function</Code>
  <rd:ReportID>4f1c9d2e</rd:ReportID>
</Report>"#;

    #[test]
    fn test_report_parts() {
        let settings = ClassifierSettings::default();
        let spans = classifier(&settings).parse(RDL);
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(
            texts,
            vec!["Quartrly report", "Grand tottal:", "Retuns a greeting", "Helo, it's me"]
        );
        for s in &spans {
            assert_eq!(&RDL[s.range()], s.text);
        }
    }

    #[test]
    fn test_code_block_is_walked_once() {
        let settings = ClassifierSettings::default();
        let src = r#"<Report><Code>' say "Helo" now</Code></Report>"#;
        let spans = classifier(&settings).parse(src);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, r#"say "Helo" now"#);
        assert_eq!(spans[0].start, 16);
    }

    #[test]
    fn test_literal_inside_code_comment_is_not_repeated() {
        let settings = ClassifierSettings::default();
        let src = r#"<Report><Code>Return "a" ' keep "b" here</Code></Report>"#;
        let spans = classifier(&settings).parse(src);
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(texts, vec!["a", r#"keep "b" here"#]);
    }

    #[test]
    fn test_expression_without_literals_yields_nothing() {
        assert_eq!(expression_parts(None, "=Fields!Amount.Value"), InnerText::Parts(vec![]));
        assert_eq!(expression_parts(None, "Plain words"), InnerText::Whole);
    }
}
