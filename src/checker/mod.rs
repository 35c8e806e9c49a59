pub mod dictionary;
pub mod suggestions;
pub mod tokenizer;

use crate::classifier::{ClassifierSettings, SpellCheckSpan, TextBuffer};
use crate::directives::InlineIgnoredWords;
use crate::dispatch::ClassifierRegistry;
use crate::{CheckResult, ClassifiedFile, Config, SpellError};
use anyhow::{Context, Result};
use dictionary::Dictionary;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::ops::Range;
use std::path::Path;
use tokenizer::WordOptions;

const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Word lookup and suggestions, whatever backs them.
pub trait SpellingEngine: Send + Sync {
    fn is_correct(&self, word: &str) -> bool;

    fn suggest(&self, word: &str, max: usize) -> Vec<String>;

    /// Accept `word` for the lifetime of the engine without touching any file.
    fn add_runtime_word(&mut self, word: &str);
}

/// Classifies files and checks the words of every span.
///
/// Shared by reference across threads; each file gets its own classifier.
pub struct SpellChecker {
    engine: Box<dyn SpellingEngine>,
    registry: ClassifierRegistry,
    settings: ClassifierSettings,
    ignore_patterns: Vec<Regex>,
    max_suggestions: usize,
}

impl SpellChecker {
    pub fn new(config: &Config) -> Result<Self> {
        let registry = ClassifierRegistry::load(config.classifier_rules.as_deref())
            .context("Failed to load classifier rules")?;
        let dictionary = Dictionary::load(config.dictionary.as_deref())?;

        Ok(Self::with_engine(config, registry, Box::new(dictionary)))
    }

    pub fn with_engine(
        config: &Config,
        registry: ClassifierRegistry,
        mut engine: Box<dyn SpellingEngine>,
    ) -> Self {
        for word in &config.ignored_words {
            engine.add_runtime_word(word);
        }

        let mut ignore_patterns = Vec::new();
        for pattern in &config.ignore_patterns {
            match RegexBuilder::new(pattern).size_limit(PATTERN_SIZE_LIMIT).build() {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e),
            }
        }

        Self {
            engine,
            registry,
            settings: config.classification.clone(),
            ignore_patterns,
            max_suggestions: config.max_suggestions,
        }
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    pub fn add_word(&mut self, word: &str) {
        self.engine.add_runtime_word(word);
    }

    /// Spans of `content`, or `None` when files like `path` are not classified.
    pub fn classify_text(&self, path: &Path, content: &str) -> Result<Option<ClassifiedFile>> {
        let Some((id, mut classifier)) =
            self.registry.classifier_for(path, content, &self.settings)?
        else {
            tracing::debug!("Skipping {}: no classifier", path.display());
            return Ok(None);
        };

        tracing::debug!("Classifying {} as {}", path.display(), id);
        let spans = classifier.parse(content);

        Ok(Some(ClassifiedFile {
            path: path.to_path_buf(),
            classifier: id,
            spans,
        }))
    }

    pub fn classify_file(&self, path: &Path) -> Result<Option<ClassifiedFile>> {
        match read_text(path)? {
            Some(content) => self.classify_text(path, &content),
            None => Ok(None),
        }
    }

    pub fn check_text(&self, path: &Path, content: &str) -> Result<Option<CheckResult>> {
        let Some(classified) = self.classify_text(path, content)? else {
            return Ok(None);
        };

        let directives = InlineIgnoredWords::scan(content);
        let buffer = TextBuffer::new(content);
        let options = WordOptions {
            mnemonic: self.registry.mnemonic(&classified.classifier),
            escaped_apostrophes: self.registry.escapes_apostrophes(&classified.classifier),
        };

        let mut errors = Vec::new();

        for span in &classified.spans {
            let excluded = self.excluded_ranges(span);

            for word in tokenizer::words(span, options) {
                if directives.in_directive(word.start)
                    || excluded.iter().any(|r| r.contains(&word.start))
                    || self.should_ignore(&word.text)
                    || directives.is_ignored(&word.text)
                    || self.engine.is_correct(&word.text)
                {
                    continue;
                }

                let position = buffer.position_of(word.start);
                errors.push(SpellError {
                    suggestions: self.engine.suggest(&word.text, self.max_suggestions),
                    context: line_text(content, word.start).to_string(),
                    offset: word.start,
                    line: position.line,
                    column: position.column,
                    classification: span.classification,
                    word: word.text,
                });
            }
        }

        Ok(Some(CheckResult {
            path: classified.path,
            classifier: classified.classifier,
            errors,
        }))
    }

    pub fn check_file(&self, path: &Path) -> Result<Option<CheckResult>> {
        match read_text(path)? {
            Some(content) => self.check_text(path, &content),
            None => Ok(None),
        }
    }

    /// File ranges inside `span` matched by an ignore pattern (URLs, hashes, ...).
    fn excluded_ranges(&self, span: &SpellCheckSpan) -> Vec<Range<usize>> {
        self.ignore_patterns
            .iter()
            .flat_map(|p| p.find_iter(&span.text))
            .map(|m| span.start + m.start()..span.start + m.end())
            .collect()
    }

    fn should_ignore(&self, word: &str) -> bool {
        // Skip single characters
        if word.chars().count() <= 1 {
            return true;
        }

        // Skip anything with digits: versions, hex, identifiers
        if word.chars().any(|c| c.is_numeric()) {
            return true;
        }

        self.ignore_patterns.iter().any(|p| p.is_match(word))
    }
}

/// File text, or `None` for content that is not UTF-8.
fn read_text(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            tracing::debug!("Skipping {}: not UTF-8 text", path.display());
            Ok(None)
        }
    }
}

/// The trimmed line around `offset`.
fn line_text(content: &str, offset: usize) -> &str {
    let start = content[..offset].rfind(['\n', '\r']).map_or(0, |i| i + 1);
    let end = content[offset..]
        .find(['\n', '\r'])
        .map_or(content.len(), |i| offset + i);
    content[start..end].trim()
}
