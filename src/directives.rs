//! Inline `ignore spelling:` directives.
//!
//! A directive names words that are correct for the rest of the file, e.g.
//! `// Ignore spelling: qux, frobnicate /matchCase`. Words match without regard
//! to case unless the directive ends with `/matchCase`.

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref DIRECTIVE: Regex = Regex::new(r"(?i)\bignore\s+spelling:([^\r\n]*)").unwrap();
    static ref TOKEN: Regex = Regex::new(r"[^,\s]+").unwrap();
}

const MATCH_CASE: &str = "/matchcase";

/// Tokens that close the comment the directive lives in.
const COMMENT_CLOSERS: &[&str] = &["*/", "-->", "--%>", "%>", "#>", "'''"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredWord {
    pub word: String,
    pub match_case: bool,
}

impl IgnoredWord {
    pub fn matches(&self, word: &str) -> bool {
        if self.match_case {
            self.word == word
        } else {
            self.word.to_lowercase() == word.to_lowercase()
        }
    }
}

/// All directives of one file.
#[derive(Debug, Clone, Default)]
pub struct InlineIgnoredWords {
    words: Vec<IgnoredWord>,
    directives: Vec<Range<usize>>,
}

impl InlineIgnoredWords {
    pub fn scan(text: &str) -> Self {
        let mut found = Self::default();

        for caps in DIRECTIVE.captures_iter(text) {
            let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let mut tokens = Vec::new();
            let mut match_case = false;
            let mut end = list.start();

            for token in TOKEN.find_iter(list.as_str()) {
                let text = token.as_str();
                if COMMENT_CLOSERS.iter().any(|closer| text.starts_with(closer)) {
                    break;
                }
                end = list.start() + token.end();

                if text.eq_ignore_ascii_case(MATCH_CASE) {
                    match_case = true;
                } else if text.chars().any(char::is_alphanumeric) {
                    tokens.push(text.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''));
                }
            }

            tracing::trace!("Found ignore directive with {} words", tokens.len());
            found.directives.push(whole.start()..end);
            found.words.extend(tokens.into_iter().filter(|t| !t.is_empty()).map(|word| IgnoredWord {
                word: word.to_string(),
                match_case,
            }));
        }

        found
    }

    pub fn is_ignored(&self, word: &str) -> bool {
        self.words.iter().any(|w| w.matches(word))
    }

    /// Whether `offset` lies inside a directive, whose own words are never checked.
    pub fn in_directive(&self, offset: usize) -> bool {
        self.directives.iter().any(|d| d.contains(&offset))
    }

    pub fn words(&self) -> &[IgnoredWord] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
