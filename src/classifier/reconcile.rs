//! Overlap reconciliation for spans produced by independent matchers.
//!
//! The sweep consumes a sorted work-list and builds a new sequence; it never
//! edits the input in place. Order of the phases matters: reconcile first, then
//! join concatenated literals, then drop ignored classifications. Filtering
//! earlier would hide adjacency across an ignored span.

use crate::classifier::span::{Classification, SpellCheckSpan};
use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};
use std::ops::Range;

/// What to do with the last accepted span (`prev`) and the next candidate (`cur`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    KeepBoth,
    DropCurrent,
    DropPrevious,
    Merge(Range<usize>),
    /// `prev` contains `cur` and one of them is `Undefined`.
    SplitPrevious,
}

fn resolve(prev: &SpellCheckSpan, cur: &SpellCheckSpan) -> Resolution {
    let undefined = prev.classification == Classification::Undefined
        || cur.classification == Classification::Undefined;

    if prev.intersects(cur) {
        if prev.contains(cur) {
            return if undefined {
                Resolution::SplitPrevious
            } else {
                Resolution::DropCurrent
            };
        }

        if cur.contains(prev) {
            return Resolution::DropPrevious;
        }

        if prev.classification == cur.classification {
            return Resolution::Merge(prev.start.min(cur.start)..prev.end().max(cur.end()));
        }

        // comment-like text inside a literal (URLs, XPath) is not a comment
        if prev.classification.is_string_literal() && cur.classification.is_comment() {
            return Resolution::DropCurrent;
        }

        return Resolution::KeepBoth;
    }

    if prev.end() == cur.start && prev.classification == cur.classification {
        return Resolution::Merge(prev.start..cur.end());
    }

    Resolution::KeepBoth
}

/// Sort, merge, split and discard intersecting spans.
///
/// Empty spans are dropped up front. The result is sorted by start offset and
/// running it through `reconcile` again changes nothing.
pub fn reconcile(spans: Vec<SpellCheckSpan>, source: &str) -> Vec<SpellCheckSpan> {
    let mut sorted: Vec<SpellCheckSpan> = spans.into_iter().filter(|s| !s.is_empty()).collect();
    sorted.sort_by_key(|s| (s.start, Reverse(s.end())));

    let mut pending: VecDeque<SpellCheckSpan> = sorted.into();
    let mut out: Vec<SpellCheckSpan> = Vec::with_capacity(pending.len());

    while let Some(cur) = pending.pop_front() {
        let Some(prev) = out.last() else {
            out.push(cur);
            continue;
        };

        match resolve(prev, &cur) {
            Resolution::KeepBoth => out.push(cur),
            Resolution::DropCurrent => {}
            Resolution::DropPrevious => {
                out.pop();
                pending.push_front(cur);
            }
            Resolution::Merge(range) => {
                if let Some(last) = out.last_mut() {
                    *last = SpellCheckSpan::from_source(source, range, last.classification);
                }
            }
            Resolution::SplitPrevious => {
                let Some(outer) = out.pop() else { continue };

                let left = outer.start..cur.start;
                let right = cur.end()..outer.end();

                if !left.is_empty() {
                    out.push(SpellCheckSpan::from_source(source, left, outer.classification));
                }
                if !right.is_empty() {
                    let piece = SpellCheckSpan::from_source(source, right, outer.classification);
                    let at = pending.partition_point(|s| s.start <= piece.start);
                    pending.insert(at, piece);
                }
                pending.push_front(cur);
            }
        }
    }

    merge_concatenated_literals(out, source)
}

/// Characters allowed between two string literals that are joined into one.
fn is_concatenation_gap(gap: &str) -> bool {
    gap.chars()
        .all(|c| c.is_whitespace() || matches!(c, '+' | '&' | '_' | '@' | '$'))
}

/// Join string literals of the same kind separated only by whitespace and
/// concatenation operators.
///
/// Generated code often splits one word across two literals (`"Spel" + "ling"`);
/// joining them lets a misspelling across the seam still be found.
pub fn merge_concatenated_literals(spans: Vec<SpellCheckSpan>, source: &str) -> Vec<SpellCheckSpan> {
    let mut out: Vec<SpellCheckSpan> = Vec::with_capacity(spans.len());

    for cur in spans {
        if let Some(prev) = out.last_mut() {
            if prev.classification.is_string_literal()
                && prev.classification == cur.classification
                && prev.end() <= cur.start
                && is_concatenation_gap(&source[prev.end()..cur.start])
            {
                *prev = SpellCheckSpan::from_source(source, prev.start..cur.end(), prev.classification);
                continue;
            }
        }
        out.push(cur);
    }

    out
}

/// Drop every span whose classification the caller ignores.
pub fn filter_ignored(
    spans: Vec<SpellCheckSpan>,
    ignored: &HashSet<Classification>,
) -> Vec<SpellCheckSpan> {
    if ignored.is_empty() {
        return spans;
    }
    spans
        .into_iter()
        .filter(|s| !ignored.contains(&s.classification))
        .collect()
}
