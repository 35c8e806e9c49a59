use super::dom::ParseMode;
use super::{MarkupClassifier, MarkupPolicy};
use crate::classifier::ClassifierSettings;

/// Plain XML: comments, CDATA, allow-listed attributes and inner text.
pub fn classifier(settings: &ClassifierSettings) -> MarkupClassifier<'_> {
    MarkupClassifier::new(ParseMode::Xml, MarkupPolicy::default(), settings)
}
