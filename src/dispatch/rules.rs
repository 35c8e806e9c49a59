//! Declarative classifier rules: extension → classifier ID, and classifier ID →
//! implementation kind plus its configuration.

use crate::classifier::code::CommentDelimiters;
use crate::classifier::span::Classification;
use crate::error::{ClassifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("classifiers.toml");

/// Classifier ID for files that must not be classified at all.
pub const NO_CLASSIFIER: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Code,
    Regex,
    Xml,
    Html,
    Markdown,
    Resource,
    Report,
    PlainText,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassifierKind::Code => "code",
            ClassifierKind::Regex => "regex",
            ClassifierKind::Xml => "xml",
            ClassifierKind::Html => "html",
            ClassifierKind::Markdown => "markdown",
            ClassifierKind::Resource => "resource",
            ClassifierKind::Report => "report",
            ClassifierKind::PlainText => "plain_text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexOption {
    IgnoreCase,
    MultiLine,
    SingleLine,
    IgnoreWhitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub expression: String,
    #[serde(default)]
    pub options: Vec<RegexOption>,
    pub classification: Classification,
}

fn default_mnemonic() -> char {
    '&'
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierDefinition {
    pub kind: ClassifierKind,

    /// Accelerator-key marker stripped from words before checking.
    #[serde(default = "default_mnemonic")]
    pub mnemonic: char,

    #[serde(default)]
    pub c_style: bool,

    #[serde(default)]
    pub escape_apostrophes: bool,

    #[serde(default)]
    pub xml_doc_comment_delimiter: Option<String>,

    #[serde(default)]
    pub quad_slash_delimiter: Option<String>,

    #[serde(default)]
    pub old_style_doc_comment_delimiter: Option<String>,

    /// Classifier used for Visual Basic-like embedded script.
    #[serde(default)]
    pub vb_script_classifier: Option<String>,

    /// Classifier used for C-style embedded script.
    #[serde(default)]
    pub c_style_script_classifier: Option<String>,

    #[serde(default, rename = "match")]
    pub rules: Vec<MatchRule>,
}

impl ClassifierDefinition {
    pub fn comment_delimiters(&self) -> CommentDelimiters {
        CommentDelimiters {
            xml_doc: self.xml_doc_comment_delimiter.clone(),
            quad_slash: self.quad_slash_delimiter.clone(),
            old_style_doc: self.old_style_doc_comment_delimiter.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, ClassifierDefinition>,
}

impl RuleTable {
    /// The rules compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_RULES).expect("built-in classifier rules must parse")
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let mut table: RuleTable = toml::from_str(text)?;
        table.extensions = table
            .extensions
            .into_iter()
            .map(|(ext, id)| (normalize_extension(&ext), id))
            .collect();
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ClassifyError::ReadRules {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Overlay `other`; its entries replace same-keyed entries of `self`.
    pub fn merge(mut self, other: RuleTable) -> Self {
        self.extensions.extend(other.extensions);
        self.classifiers.extend(other.classifiers);
        self
    }

    /// Every extension must name a defined classifier and every mnemonic must be `&` or `_`.
    pub fn validate(&self) -> Result<()> {
        for (ext, id) in &self.extensions {
            if id != NO_CLASSIFIER && !self.classifiers.contains_key(id) {
                return Err(ClassifyError::InvalidDefinition {
                    id: id.clone(),
                    field: "extension mapping",
                    reason: format!("extension `{}` maps to an undefined classifier", ext),
                });
            }
        }

        for (id, def) in &self.classifiers {
            if def.mnemonic != '&' && def.mnemonic != '_' {
                return Err(ClassifyError::InvalidDefinition {
                    id: id.clone(),
                    field: "mnemonic",
                    reason: format!("`{}` is not `&` or `_`", def.mnemonic),
                });
            }
        }

        Ok(())
    }
}

pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::regex_rules::compile_rules;

    #[test]
    fn test_builtin_rules_are_valid() {
        let table = RuleTable::builtin();
        table.validate().unwrap();

        assert_eq!(table.extensions["cs"], "CSharp");
        assert_eq!(table.extensions["resx"], "Resource");
        assert_eq!(table.classifiers["XAML"].mnemonic, '_');
        assert!(table.classifiers["CSharp"].c_style);

        // every built-in expression compiles
        for (id, def) in &table.classifiers {
            assert_eq!(compile_rules(&def.rules).len(), def.rules.len(), "{}", id);
        }
    }

    #[test]
    fn test_override_merges_per_key() {
        let user = RuleTable::from_toml(
            r#"
            [extensions]
            ".CS" = "PlainText"
            "foo" = "Custom"

            [classifiers.Custom]
            kind = "regex"
            mnemonic = "_"

            [[classifiers.Custom.match]]
            expression = '#[^\n]*'
            classification = "SingleLineComment"
            "#,
        )
        .unwrap();

        let merged = RuleTable::builtin().merge(user);
        merged.validate().unwrap();

        assert_eq!(merged.extensions["cs"], "PlainText");
        assert_eq!(merged.extensions["foo"], "Custom");
        assert_eq!(merged.extensions["vb"], "VB");
        assert_eq!(merged.classifiers["Custom"].rules.len(), 1);
    }

    #[test]
    fn test_validation_rejects_dangling_ids() {
        let table = RuleTable::from_toml(
            r#"
            [extensions]
            abc = "Missing"
            "#,
        )
        .unwrap();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_mnemonic() {
        let table = RuleTable::from_toml(
            r##"
            [classifiers.Bad]
            kind = "plain_text"
            mnemonic = "#"
            "##,
        )
        .unwrap();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_unknown_classification_is_an_error() {
        let err = RuleTable::from_toml(
            r#"
            [classifiers.Bad]
            kind = "regex"
            [[classifiers.Bad.match]]
            expression = "x"
            classification = "NotAThing"
            "#,
        );
        assert!(matches!(err, Err(ClassifyError::InvalidRules(_))));
    }
}
