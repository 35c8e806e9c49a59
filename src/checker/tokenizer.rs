//! Candidate words from classified spans.
//!
//! Before segmentation the span text is cleaned the same way the reader sees
//! it: character entities are decoded (`&amp;` is not the word `amp`),
//! accelerator-key mnemonics are removed (`&File` reads as `File`), doubled
//! apostrophes collapse where the language escapes them that way, and the
//! seams of concatenated literals disappear (`"Spel" + "ling"` reads as
//! `"Spelling"`). Every word keeps the file offset of its first character.

use crate::classifier::span::SpellCheckSpan;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    static ref LITERAL_SEAM: Regex =
        Regex::new(r#"["']\s*(?:\+|&|\|\||\.)\s*(?:_\s*)?[$@]{0,2}["']"#).unwrap();
    static ref ENTITY: Regex = Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// File offset of the first character.
    pub start: usize,
}

/// How the owning classifier writes text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordOptions {
    pub mnemonic: char,
    pub escaped_apostrophes: bool,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            mnemonic: '&',
            escaped_apostrophes: false,
        }
    }
}

fn is_mnemonic(text: &str, at: usize, mnemonic: char) -> bool {
    let rest = &text[at + mnemonic.len_utf8()..];
    let Some(next) = rest.chars().next() else {
        return false;
    };
    if !next.is_alphabetic() {
        return false;
    }
    !text[..at].ends_with(mnemonic)
}

/// Characters of the span as read, each with its offset inside the span.
fn visible_chars(span: &SpellCheckSpan, options: WordOptions) -> Vec<(usize, char)> {
    let text = span.text.as_str();
    let seams: Vec<_> = if span.classification.is_string_literal() {
        LITERAL_SEAM.find_iter(text).map(|m| m.range()).collect()
    } else {
        Vec::new()
    };

    let mut chars = Vec::with_capacity(text.len());
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if let Some(seam) = seams.iter().find(|s| s.start == i) {
            while iter.next_if(|&(j, _)| j < seam.end).is_some() {}
            continue;
        }
        if c == '&' {
            if let Some(entity) = ENTITY.find(&text[i..]) {
                let decoded = html_escape::decode_html_entities(entity.as_str());
                if decoded == entity.as_str() {
                    chars.push((i, ' '));
                } else {
                    chars.extend(decoded.chars().map(|d| (i, d)));
                }
                while iter.next_if(|&(j, _)| j < i + entity.end()).is_some() {}
                continue;
            }
        }
        if c == options.mnemonic && is_mnemonic(text, i, c) {
            continue;
        }
        if options.escaped_apostrophes && c == '\'' && iter.peek().is_some_and(|&(_, n)| n == '\'') {
            continue;
        }
        chars.push((i, c));
    }

    chars
}

/// Split identifiers into their parts: `camelCase`, `HTMLParser`, `snake_case`.
///
/// Offsets are relative to `word`.
pub fn split_compound_word(word: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let chars: Vec<(usize, char)> = word.char_indices().collect();

    for (idx, &(i, ch)) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' {
            if let Some(s) = start.take() {
                parts.push((s, &word[s..i]));
            }
            continue;
        }

        let Some(s) = start else {
            start = Some(i);
            continue;
        };

        let prev = chars[idx - 1].1;
        let next = chars.get(idx + 1).map(|&(_, c)| c);
        let boundary = ch.is_uppercase()
            && (prev.is_lowercase()
                || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)));

        if boundary {
            parts.push((s, &word[s..i]));
            start = Some(i);
        }
    }

    if let Some(s) = start {
        parts.push((s, &word[s..]));
    }

    parts
}

/// Words of `span`, in order, with their file offsets.
pub fn words(span: &SpellCheckSpan, options: WordOptions) -> Vec<Word> {
    let chars = visible_chars(span, options);

    let mut joined = String::with_capacity(span.text.len());
    let mut origin = Vec::with_capacity(span.text.len());
    for &(i, c) in &chars {
        joined.push(c);
        origin.extend(std::iter::repeat(i).take(c.len_utf8()));
    }

    let mut words = Vec::new();
    for (at, token) in joined.split_word_bound_indices() {
        if !token.chars().any(char::is_alphabetic) {
            continue;
        }

        for (offset, part) in split_compound_word(token) {
            let trimmed = part.trim_start_matches(['\'', '\u{2019}']);
            let lead = part.len() - trimmed.len();
            let trimmed = trimmed.trim_end_matches(['\'', '\u{2019}']);
            if !trimmed.chars().any(char::is_alphabetic) {
                continue;
            }

            words.push(Word {
                text: trimmed.to_string(),
                start: span.start + origin[at + offset + lead],
            });
        }
    }

    words
}
