use crate::classifier::span::{Classification, SpellCheckSpan};
use crate::classifier::{ClassifierSettings, TextClassifier};

/// The whole file is prose.
pub struct PlainTextClassifier<'a> {
    settings: &'a ClassifierSettings,
}

impl<'a> PlainTextClassifier<'a> {
    pub fn new(settings: &'a ClassifierSettings) -> Self {
        Self { settings }
    }
}

impl TextClassifier for PlainTextClassifier<'_> {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        if text.is_empty() || self.settings.ignores(Classification::PlainText) {
            return Vec::new();
        }

        vec![SpellCheckSpan {
            start: 0,
            text: text.to_string(),
            classification: Classification::PlainText,
        }]
    }
}
