//! Managed resource files (`.resx`, `.resw`).
//!
//! Only string resources and their comments carry prose. Typed and binary
//! entries, designer metadata, headers and the schema are skipped, and the
//! standard header comment has its format boilerplate blanked out.

use super::dom::{Element, ParseMode};
use super::{blank_range, MarkupClassifier, MarkupPolicy};
use crate::classifier::ClassifierSettings;
use aho_corasick::{AhoCorasick, MatchKind};
use lazy_static::lazy_static;
use std::borrow::Cow;

const SKIPPED_ELEMENTS: &[&str] = &["metadata", "resheader", "assembly", "schema"];

const BOILERPLATE_TOKENS: &[&str] = &[
    "application/x-microsoft.net.object.binary.base64",
    "application/x-microsoft.net.object.soap.base64",
    "application/x-microsoft.net.object.bytearray.base64",
    "text/microsoft-resx",
    "System.Runtime.Serialization.Formatters.Binary.BinaryFormatter",
    "System.Runtime.Serialization.Formatters.Soap.SoapFormatter",
    "System.ComponentModel.TypeConverter",
    "ResXResourceReader",
    "ResXResourceWriter",
    "BinaryFormatter",
    "SoapFormatter",
    "TypeConverter",
    "resmimetype",
    "mimetype",
    "resheader",
    "bytearray",
    "base64",
];

lazy_static! {
    static ref BOILERPLATE: AhoCorasick = AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(BOILERPLATE_TOKENS)
        .unwrap();
}

fn skip_element(element: &Element, text: &str) -> bool {
    if element.is_named("data") {
        return element.attribute("type").is_some()
            || element.attribute("mimetype").is_some()
            || element
                .attribute_value("name", text)
                .is_some_and(|name| html_escape::decode_html_entities(name).starts_with(">>"));
    }

    SKIPPED_ELEMENTS.iter().any(|name| element.is_named(name))
}

fn blank_boilerplate(comment: &str) -> Cow<'_, str> {
    if !BOILERPLATE.is_match(comment) {
        return Cow::Borrowed(comment);
    }

    let mut blanked = comment.to_string();
    for m in BOILERPLATE.find_iter(comment) {
        blank_range(&mut blanked, m.start()..m.end());
    }
    Cow::Owned(blanked)
}

pub fn classifier(settings: &ClassifierSettings) -> MarkupClassifier<'_> {
    let policy = MarkupPolicy {
        skip_element,
        adjust_comment: blank_boilerplate,
        ..Default::default()
    };
    MarkupClassifier::new(ParseMode::Xml, policy, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, TextClassifier};
    use pretty_assertions::assert_eq;

    const RESX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <!-- Use the ResXResourceWriter to write resmimetype values -->
  <xsd:schema id="root" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
    <xsd:element name="root" msdata:IsDataSet="true" />
  </xsd:schema>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Helo world</value>
    <comment>Shown on the start paeg</comment>
  </data>
  <data name="Logo" type="System.Drawing.Bitmap, System.Drawing" mimetype="application/x-microsoft.net.object.bytearray.base64">
    <value>iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB</value>
  </data>
  <data name="&gt;&gt;button1.Name" xml:space="preserve">
    <value>button1</value>
  </data>
  <metadata name="toolTip1.TrayLocation" type="System.Drawing.Point">
    <value>17, 17</value>
  </metadata>
</root>"#;

    #[test]
    fn test_string_resources_only() {
        let settings = ClassifierSettings::default();
        let spans = classifier(&settings).parse(RESX);
        let got: Vec<_> = spans
            .iter()
            .map(|s| (s.text.as_str(), s.classification))
            .collect();

        assert_eq!(
            got,
            vec![
                ("Use the", Classification::XmlFileComment),
                ("to write", Classification::XmlFileComment),
                ("values", Classification::XmlFileComment),
                ("Helo world", Classification::InnerText),
                ("Shown on the start paeg", Classification::InnerText),
            ]
        );
    }

    #[test]
    fn test_designer_names_are_skipped() {
        let settings = ClassifierSettings::default();
        let src = r#"<root><data name=">>label.Text"><value>lable</value></data></root>"#;
        assert!(classifier(&settings).parse(src).is_empty());
    }

    #[test]
    fn test_boilerplate_blanking_keeps_length() {
        let comment = " uses MIMETYPE and base64 ";
        let blanked = blank_boilerplate(comment);
        assert_eq!(blanked.len(), comment.len());
        assert_eq!(blanked.split_whitespace().collect::<Vec<_>>(), vec!["uses", "and"]);
        assert!(matches!(blank_boilerplate("plain prose"), Cow::Borrowed(_)));
    }
}
