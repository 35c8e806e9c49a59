//! Classifier selection.
//!
//! The registry owns the merged rule table and maps each implementation kind to
//! a factory. Building one is the only setup step; after that it is read-only
//! and can be shared between threads. Classifier instances it hands out are
//! per-file.

pub mod rules;

use crate::classifier::code::CodeClassifier;
use crate::classifier::markup::dom::{Document, ParseMode};
use crate::classifier::markup::html::HtmlClassifier;
use crate::classifier::markup::markdown::MarkdownClassifier;
use crate::classifier::markup::{report, resource, xml};
use crate::classifier::plaintext::PlainTextClassifier;
use crate::classifier::regex_rules::{compile_rules, RegexClassifier, RegexRule, RegexRuleEngine};
use crate::classifier::{ClassifierSettings, TextClassifier};
use crate::error::{ClassifyError, Result};
use rules::{normalize_extension, ClassifierDefinition, ClassifierKind, RuleTable, NO_CLASSIFIER};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

/// Classifier used for well-formed markup with an unmapped extension.
pub const SNIFFED_MARKUP: &str = "XML";
/// Classifier used when nothing else applies.
pub const FALLBACK: &str = "PlainText";

/// Everything a factory needs to build one classifier instance.
pub struct ClassifierContext<'a> {
    pub id: &'a str,
    /// Lowercase extension of the file being classified, empty for embedded code.
    pub extension: String,
    pub definition: &'a ClassifierDefinition,
    pub rules: &'a [RegexRule],
    pub settings: &'a ClassifierSettings,
    pub registry: &'a ClassifierRegistry,
}

pub type ClassifierFactory = for<'a> fn(&ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a>;

fn code_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    let apply_options = ctx.extension == "cs"
        || ctx.id == "CSharp"
        || (ctx.settings.code.apply_to_all_c_style_languages && ctx.definition.c_style);

    Box::new(CodeClassifier::new(
        ctx.rules.to_vec(),
        ctx.definition.comment_delimiters(),
        ctx.settings,
        apply_options,
    ))
}

fn regex_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    let engine = RegexRuleEngine::new(ctx.rules.to_vec(), ctx.settings.ignored_classifications.clone());
    Box::new(RegexClassifier::new(engine))
}

fn xml_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(xml::classifier(ctx.settings))
}

fn resource_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(resource::classifier(ctx.settings))
}

fn report_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(report::classifier(ctx.settings))
}

fn html_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(HtmlClassifier::new(ctx.definition, ctx.settings, ctx.registry))
}

fn markdown_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(MarkdownClassifier::new(ctx.definition, ctx.settings, ctx.registry))
}

fn plain_text_factory<'a>(ctx: &ClassifierContext<'a>) -> Box<dyn TextClassifier + 'a> {
    Box::new(PlainTextClassifier::new(ctx.settings))
}

pub struct ClassifierRegistry {
    table: RuleTable,
    compiled: BTreeMap<String, Vec<RegexRule>>,
    factories: HashMap<ClassifierKind, ClassifierFactory>,
}

impl ClassifierRegistry {
    /// Compiles every rule list once; broken expressions are dropped with a warning.
    pub fn new(table: RuleTable) -> Self {
        let compiled = table
            .classifiers
            .iter()
            .map(|(id, def)| (id.clone(), compile_rules(&def.rules)))
            .collect();

        let mut registry = Self {
            table,
            compiled,
            factories: HashMap::new(),
        };

        registry.register(ClassifierKind::Code, code_factory);
        registry.register(ClassifierKind::Regex, regex_factory);
        registry.register(ClassifierKind::Xml, xml_factory);
        registry.register(ClassifierKind::Html, html_factory);
        registry.register(ClassifierKind::Markdown, markdown_factory);
        registry.register(ClassifierKind::Resource, resource_factory);
        registry.register(ClassifierKind::Report, report_factory);
        registry.register(ClassifierKind::PlainText, plain_text_factory);
        registry
    }

    /// Registry over the built-in rules, built on first use.
    pub fn builtin() -> &'static ClassifierRegistry {
        static BUILTIN: OnceLock<ClassifierRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| ClassifierRegistry::new(RuleTable::builtin()))
    }

    /// Built-in rules overlaid with an optional user rule file.
    pub fn load(overrides: Option<&Path>) -> Result<Self> {
        let mut table = RuleTable::builtin();
        if let Some(path) = overrides {
            tracing::debug!("Loading classifier rules from {}", path.display());
            table = table.merge(RuleTable::from_file(path)?);
        }
        table.validate()?;
        Ok(Self::new(table))
    }

    pub fn register(&mut self, kind: ClassifierKind, factory: ClassifierFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn definition(&self, id: &str) -> Option<&ClassifierDefinition> {
        self.table.classifiers.get(id)
    }

    pub fn extensions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table
            .extensions
            .iter()
            .map(|(ext, id)| (ext.as_str(), id.as_str()))
    }

    /// Classifier ID for a file, or `None` when the file must be skipped.
    ///
    /// Unmapped extensions are sniffed: well-formed markup is classified as XML,
    /// anything else as plain text.
    pub fn classifier_id_for(&self, path: &Path, content: &str) -> Option<String> {
        let extension = extension_of(path);

        if let Some(id) = self.table.extensions.get(&extension) {
            return (id != NO_CLASSIFIER).then(|| id.clone());
        }

        let looks_like_markup = content.trim_start().starts_with('<')
            && Document::parse(content, ParseMode::Xml).is_well_formed();

        let id = if looks_like_markup { SNIFFED_MARKUP } else { FALLBACK };
        tracing::trace!("No rule for `{}`, sniffed as {}", path.display(), id);
        Some(id.to_string())
    }

    /// A fresh classifier instance for `id`.
    pub fn create<'a>(
        &'a self,
        id: &str,
        extension: &str,
        settings: &'a ClassifierSettings,
    ) -> Result<Box<dyn TextClassifier + 'a>> {
        let (id, definition) = self
            .table
            .classifiers
            .get_key_value(id)
            .ok_or_else(|| ClassifyError::UnknownClassifier(id.to_string()))?;

        let factory = self
            .factories
            .get(&definition.kind)
            .ok_or_else(|| ClassifyError::UnknownClassifier(id.clone()))?;

        let ctx = ClassifierContext {
            id,
            extension: normalize_extension(extension),
            definition,
            rules: self.compiled.get(id).map(Vec::as_slice).unwrap_or(&[]),
            settings,
            registry: self,
        };
        Ok(factory(&ctx))
    }

    /// The classifier ID and a classifier instance for a file, or `None` to skip it.
    pub fn classifier_for<'a>(
        &'a self,
        path: &Path,
        content: &str,
        settings: &'a ClassifierSettings,
    ) -> Result<Option<(String, Box<dyn TextClassifier + 'a>)>> {
        let Some(id) = self.classifier_id_for(path, content) else {
            return Ok(None);
        };
        let classifier = self.create(&id, &extension_of(path), settings)?;
        Ok(Some((id, classifier)))
    }

    pub fn is_c_style(&self, id: &str) -> bool {
        self.definition(id).is_some_and(|d| d.c_style)
    }

    pub fn supports_old_style_doc_comments(&self, id: &str) -> bool {
        self.definition(id)
            .is_some_and(|d| d.old_style_doc_comment_delimiter.is_some())
    }

    pub fn escapes_apostrophes(&self, id: &str) -> bool {
        self.definition(id).is_some_and(|d| d.escape_apostrophes)
    }

    /// Accelerator-key marker, `&` unless the classifier says otherwise.
    pub fn mnemonic(&self, id: &str) -> char {
        self.definition(id).map_or('&', |d| d.mnemonic)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}
