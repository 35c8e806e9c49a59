use crate::checker::dictionary::Dictionary;

/// Single-letter swaps that account for most vowel and voicing typos.
const COMMON_REPLACEMENTS: &[(char, char)] = &[
    ('a', 'e'),
    ('e', 'i'),
    ('i', 'o'),
    ('o', 'u'),
    ('b', 'v'),
    ('c', 'k'),
    ('f', 'v'),
    ('g', 'j'),
    ('m', 'n'),
    ('s', 'z'),
    ('t', 'd'),
];

/// Collects distinct candidates up to a limit.
struct Candidates {
    words: Vec<String>,
    max: usize,
}

impl Candidates {
    fn full(&self) -> bool {
        self.words.len() >= self.max
    }

    /// Returns true once the limit is reached.
    fn push(&mut self, word: String) -> bool {
        if !self.full() && !self.words.contains(&word) {
            self.words.push(word);
        }
        self.full()
    }
}

/// The first `n` characters of `word`.
fn char_prefix(word: &str, n: usize) -> &str {
    word.char_indices().nth(n).map_or(word, |(i, _)| &word[..i])
}

/// Words sharing the first `n` characters, closest first, within `max_distance` edits.
fn by_prefix(word: &str, dictionary: &Dictionary, n: usize, max_distance: usize) -> Vec<String> {
    let mut scored: Vec<_> = dictionary
        .words_with_prefix(char_prefix(word, n))
        .into_iter()
        .map(|w| (edit_distance(word, &w), w))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, w)| w).collect()
}

/// Suggestions for a lower-cased `word`, cheapest strategies first.
pub fn generate(word: &str, dictionary: &Dictionary, max_suggestions: usize) -> Vec<String> {
    let mut found = Candidates {
        words: Vec::new(),
        max: max_suggestions,
    };
    if max_suggestions == 0 || word.is_empty() {
        return found.words;
    }

    let length = word.chars().count();

    if length >= 3 {
        for candidate in by_prefix(word, dictionary, 3, 2) {
            if found.push(candidate) {
                return found.words;
            }
        }
    }

    for transform in generate_transformations(word) {
        if dictionary.contains(&transform) && found.push(transform) {
            return found.words;
        }
    }

    if length >= 2 {
        for candidate in by_prefix(word, dictionary, 2, 3) {
            if found.push(candidate) {
                return found.words;
            }
        }
    }

    // Short words rarely share a prefix with their correction, so scan a
    // bounded slice of the whole list.
    if length <= 3 {
        let mut scored: Vec<_> = dictionary
            .all_words()
            .into_iter()
            .filter(|w| w.chars().count().abs_diff(length) <= 1)
            .take(100)
            .map(|w| (edit_distance(word, &w), w))
            .filter(|(d, _)| *d <= 2)
            .collect();
        scored.sort();

        for (_, candidate) in scored {
            if found.push(candidate) {
                break;
            }
        }
    }

    found.words
}

/// Levenshtein distance over chars.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Deletions, adjacent transpositions and common single-letter replacements.
fn generate_transformations(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut transformations = Vec::new();

    for i in 0..chars.len() {
        let mut new_word = chars.clone();
        new_word.remove(i);
        transformations.push(new_word.into_iter().collect());
    }

    for i in 0..chars.len().saturating_sub(1) {
        let mut new_word = chars.clone();
        new_word.swap(i, i + 1);
        transformations.push(new_word.into_iter().collect());
    }

    for (i, &ch) in chars.iter().enumerate() {
        for &(from, to) in COMMON_REPLACEMENTS {
            if ch == from {
                let mut new_word = chars.clone();
                new_word[i] = to;
                transformations.push(new_word.into_iter().collect());
            }
        }
    }

    transformations
}
