use crate::classifier::ClassifierSettings;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "spellclass";
const LOCAL_CONFIG: &str = ".spellclass.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What the classifiers skip: classifications, markup elements, code options.
    pub classification: ClassifierSettings,

    /// Words matching any of these are never reported.
    pub ignore_patterns: Vec<String>,

    /// Words accepted in every file, without regard to case.
    pub ignored_words: Vec<String>,

    pub max_suggestions: usize,

    /// Word list (`.txt`) or compiled set (`.fst`); the built-in list when unset.
    pub dictionary: Option<PathBuf>,

    /// Rule file merged over the built-in classifier rules.
    pub classifier_rules: Option<PathBuf>,
}

fn default_max_suggestions() -> usize {
    5
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        r"https?://\S+".to_string(),         // URLs
        r"\b[a-fA-F0-9]{32,}\b".to_string(), // Hashes
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(), // Emails
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classification: ClassifierSettings::default(),
            ignore_patterns: default_ignore_patterns(),
            ignored_words: Vec::new(),
            max_suggestions: default_max_suggestions(),
            dictionary: None,
            classifier_rules: None,
        }
    }
}

/// Values given on the command line; they beat every config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub dictionary: Option<PathBuf>,
    pub classifier_rules: Option<PathBuf>,
    pub ignore_patterns: Vec<String>,
    pub ignored_words: Vec<String>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(cli: CliOverrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                tracing::debug!("Loading global config from {}", global_path.display());
                config = config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = cli.config_file.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG));
        if local_path.exists() {
            tracing::debug!("Loading config from {}", local_path.display());
            config = config.merge(Self::from_file(&local_path)?);
        }

        if cli.dictionary.is_some() {
            config.dictionary = cli.dictionary;
        }
        if cli.classifier_rules.is_some() {
            config.classifier_rules = cli.classifier_rules;
        }
        config.ignore_patterns.extend(cli.ignore_patterns);
        config.ignored_words.extend(cli.ignored_words);

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Fields of `other` that differ from the defaults replace ours.
    fn merge(mut self, other: Self) -> Self {
        let defaults = Self::default();

        if other.classification != defaults.classification {
            self.classification = other.classification;
        }
        if other.ignore_patterns != defaults.ignore_patterns {
            self.ignore_patterns = other.ignore_patterns;
        }
        if !other.ignored_words.is_empty() {
            self.ignored_words = other.ignored_words;
        }
        if other.max_suggestions != defaults.max_suggestions {
            self.max_suggestions = other.max_suggestions;
        }
        if other.dictionary.is_some() {
            self.dictionary = other.dictionary;
        }
        if other.classifier_rules.is_some() {
            self.classifier_rules = other.classifier_rules;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
