use super::{suggestions, SpellingEngine};
use anyhow::{Context, Result};
use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Small general-purpose word list used when no dictionary is configured.
const BASIC_WORDS: &str = include_str!("words.txt");

/// Lower-cased word list in an fst set, plus words added at runtime.
pub struct Dictionary {
    set: Set<Vec<u8>>,
    runtime_words: HashSet<String>,
}

impl Dictionary {
    /// The configured dictionary, or the built-in word list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        Self::from_words(BASIC_WORDS.lines())
    }

    /// Load a compiled `.fst` set, or a plain word list with one word per line.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "fst") {
            let set = Set::new(bytes).context("Failed to parse dictionary")?;
            tracing::debug!("Loaded {} words from {}", set.len(), path.display());
            return Ok(Self {
                set,
                runtime_words: HashSet::new(),
            });
        }

        let text = String::from_utf8(bytes)
            .with_context(|| format!("Dictionary is not UTF-8: {}", path.display()))?;
        Self::from_words(text.lines())
    }

    /// Build an in-memory dictionary. Blank lines and `#` comments are skipped.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted = normalize(words);
        let set = Set::from_iter(&sorted).context("Failed to build dictionary")?;

        Ok(Self {
            set,
            runtime_words: HashSet::new(),
        })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes()) || self.runtime_words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.set.len() + self.runtime_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all words with a given prefix
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut stream = self
            .set
            .search(fst::automaton::Str::new(prefix).starts_with())
            .into_stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = std::str::from_utf8(key) {
                results.push(word.to_string());
            }
        }

        results.extend(
            self.runtime_words
                .iter()
                .filter(|w| w.starts_with(prefix))
                .cloned(),
        );
        results
    }

    /// Every word, in no particular order. Walks the whole set.
    pub fn all_words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(self.len());
        let mut stream = self.set.stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = std::str::from_utf8(key) {
                words.push(word.to_string());
            }
        }

        words.extend(self.runtime_words.iter().cloned());
        words
    }

    /// Compile a word list into an `.fst` file that [`load_from_path`](Self::load_from_path) reads back.
    pub fn build_from_words<S: AsRef<str>>(words: &[S], output_path: &Path) -> Result<usize> {
        let sorted = normalize(words);

        let file = File::create(output_path)
            .with_context(|| format!("Failed to create dictionary: {}", output_path.display()))?;

        let writer = BufWriter::new(file);
        let mut builder = SetBuilder::new(writer).context("Failed to create FST builder")?;

        for word in &sorted {
            builder
                .insert(word.as_bytes())
                .context("Failed to insert word into dictionary")?;
        }

        builder.finish().context("Failed to finalize dictionary")?;

        Ok(sorted.len())
    }
}

fn normalize<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty() && !w.starts_with('#'))
        .collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

impl SpellingEngine for Dictionary {
    fn is_correct(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        if self.contains(&lower) {
            return true;
        }

        lower
            .strip_suffix("'s")
            .or_else(|| lower.strip_suffix("\u{2019}s"))
            .is_some_and(|stem| self.contains(stem))
    }

    fn suggest(&self, word: &str, max: usize) -> Vec<String> {
        suggestions::generate(&word.to_lowercase(), self, max)
    }

    fn add_runtime_word(&mut self, word: &str) {
        let word = word.trim();
        if !word.is_empty() {
            self.runtime_words.insert(word.to_lowercase());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_and_load_dictionary() {
        let dir = tempdir().unwrap();
        let dict_path = dir.path().join("test.fst");

        let words = vec!["hello", "World", "test", "hello"];
        let written = Dictionary::build_from_words(&words, &dict_path).unwrap();
        assert_eq!(written, 3);

        let dict = Dictionary::load_from_path(&dict_path).unwrap();
        assert!(dict.contains("hello"));
        assert!(dict.contains("world"));
        assert!(!dict.contains("notfound"));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_plain_word_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "# project words\nfrobnicate\n\nQux\n").unwrap();

        let dict = Dictionary::load(Some(&path)).unwrap();
        assert!(dict.is_correct("Frobnicate"));
        assert!(dict.is_correct("QUX"));
        assert!(!dict.is_correct("project"));
    }

    #[test]
    fn test_embedded_words_and_case() {
        let dict = Dictionary::embedded().unwrap();
        assert!(dict.is_correct("Hello"));
        assert!(dict.is_correct("WORLD"));
        assert!(dict.is_correct("user's"));
        assert!(!dict.is_correct("helo"));
    }

    #[test]
    fn test_runtime_words() {
        let mut dict = Dictionary::from_words(["alpha", "beta"]).unwrap();
        assert!(!dict.is_correct("gamma"));

        dict.add_runtime_word("Gamma");
        assert!(dict.is_correct("gamma"));
        assert!(dict.words_with_prefix("ga").contains(&"gamma".to_string()));
        assert_eq!(dict.all_words().len(), 3);
    }

    #[test]
    fn test_suggestions_come_from_the_word_list() {
        let dict = Dictionary::embedded().unwrap();
        let suggestions = dict.suggest("Wrold", 5);
        assert!(suggestions.contains(&"world".to_string()));
    }
}
