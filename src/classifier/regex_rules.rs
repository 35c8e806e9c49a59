use crate::classifier::reconcile::{filter_ignored, reconcile};
use crate::classifier::span::{Classification, SpellCheckSpan};
use crate::classifier::TextClassifier;
use crate::dispatch::rules::{MatchRule, RegexOption};
use crate::error::{ClassifyError, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

/// Compiled-program ceiling for configured expressions. The regex crate matches in
/// linear time, so this bounds memory instead of a matching timeout.
const EXPRESSION_SIZE_LIMIT: usize = 4 * 1024 * 1024;

/// Re-tags one span after all rules ran and before reconciliation.
pub type PostProcess = Box<dyn Fn(&mut SpellCheckSpan) + Send + Sync>;

/// A compiled pattern and the classification given to each of its matches.
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: Regex,
    classification: Classification,
}

impl RegexRule {
    pub fn new(pattern: Regex, classification: Classification) -> Self {
        Self {
            pattern,
            classification,
        }
    }

    pub fn compile(
        expression: &str,
        options: &[RegexOption],
        classification: Classification,
    ) -> Result<Self> {
        let mut builder = RegexBuilder::new(expression);
        builder
            .size_limit(EXPRESSION_SIZE_LIMIT)
            .dfa_size_limit(EXPRESSION_SIZE_LIMIT);

        for option in options {
            match option {
                RegexOption::IgnoreCase => builder.case_insensitive(true),
                RegexOption::MultiLine => builder.multi_line(true),
                RegexOption::SingleLine => builder.dot_matches_new_line(true),
                RegexOption::IgnoreWhitespace => builder.ignore_whitespace(true),
            };
        }

        let pattern = builder
            .build()
            .map_err(|source| ClassifyError::InvalidExpression {
                expression: expression.to_string(),
                source,
            })?;

        Ok(Self::new(pattern, classification))
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Compile configured rules, dropping (and logging) any that fail.
pub fn compile_rules(rules: &[MatchRule]) -> Vec<RegexRule> {
    rules
        .iter()
        .filter_map(
            |rule| match RegexRule::compile(&rule.expression, &rule.options, rule.classification) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!("Dropping classifier rule: {}", e);
                    None
                }
            },
        )
        .collect()
}

/// Applies an ordered rule list to a whole buffer, then reconciles and filters.
pub struct RegexRuleEngine {
    rules: Vec<RegexRule>,
    ignored: HashSet<Classification>,
    post_process: Option<PostProcess>,
}

impl fmt::Debug for RegexRuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexRuleEngine")
            .field("rules", &self.rules)
            .field("ignored", &self.ignored)
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

impl RegexRuleEngine {
    pub fn new(rules: Vec<RegexRule>, ignored: HashSet<Classification>) -> Self {
        Self {
            rules,
            ignored,
            post_process: None,
        }
    }

    pub fn with_post_process(mut self, hook: PostProcess) -> Self {
        self.post_process = Some(hook);
        self
    }

    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Raw rule matches in rule order, post-processed but not reconciled.
    ///
    /// String literals are found first. Any other rule that matches from inside a
    /// literal resumes at the literal's end, so `"http://x"; // note` still
    /// yields the trailing comment.
    pub fn matches(&self, text: &str) -> Vec<SpellCheckSpan> {
        let found: Vec<Vec<Range<usize>>> = self
            .rules
            .iter()
            .map(|rule| {
                if rule.classification.is_string_literal() {
                    rule.pattern.find_iter(text).map(|m| m.range()).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();
        let literals: Vec<Range<usize>> = found.iter().flatten().cloned().collect();

        let mut spans = Vec::new();
        for (rule, ranges) in self.rules.iter().zip(found) {
            let ranges = if rule.classification.is_string_literal() {
                ranges
            } else {
                find_outside(&rule.pattern, text, &literals)
            };

            spans.extend(
                ranges
                    .into_iter()
                    .filter(|r| !r.is_empty())
                    .map(|r| SpellCheckSpan::from_source(text, r, rule.classification)),
            );
        }

        if let Some(hook) = &self.post_process {
            spans.iter_mut().for_each(|span| hook(span));
        }

        spans
    }

    /// classify -> reconcile -> filter
    pub fn classify(&self, text: &str) -> Vec<SpellCheckSpan> {
        let spans = reconcile(self.matches(text), text);
        filter_ignored(spans, &self.ignored)
    }
}

/// Non-overlapping matches of `pattern` that do not start inside any of `literals`.
fn find_outside(pattern: &Regex, text: &str, literals: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut at = 0;

    while at <= text.len() {
        let Some(m) = pattern.find_at(text, at) else {
            break;
        };

        let covering = literals
            .iter()
            .filter(|l| l.start < m.start() && m.start() < l.end)
            .map(|l| l.end)
            .max();
        if let Some(end) = covering {
            at = end;
            continue;
        }

        at = if m.is_empty() {
            m.end() + text[m.end()..].chars().next().map_or(1, char::len_utf8)
        } else {
            m.end()
        };
        ranges.push(m.range());
    }

    ranges
}

/// Classifier for file types described entirely by a rule list.
#[derive(Debug)]
pub struct RegexClassifier {
    engine: RegexRuleEngine,
}

impl RegexClassifier {
    pub fn new(engine: RegexRuleEngine) -> Self {
        Self { engine }
    }
}

impl TextClassifier for RegexClassifier {
    fn parse(&mut self, text: &str) -> Vec<SpellCheckSpan> {
        self.engine.classify(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(expression: &str, classification: Classification) -> MatchRule {
        MatchRule {
            expression: expression.to_string(),
            options: Vec::new(),
            classification,
        }
    }

    #[test]
    fn test_broken_rule_is_dropped() {
        let rules = vec![
            rule(r"//[^\n]*", Classification::SingleLineComment),
            rule(r"(unclosed", Classification::DelimitedComments),
        ];

        let compiled = compile_rules(&rules);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].classification(), Classification::SingleLineComment);
    }

    #[test]
    fn test_options_are_applied() {
        let rule = RegexRule::compile(
            r"^rem\b.*$",
            &[RegexOption::IgnoreCase, RegexOption::MultiLine],
            Classification::SingleLineComment,
        )
        .unwrap();

        let engine = RegexRuleEngine::new(vec![rule], HashSet::new());
        let spans = engine.classify("x = 1\nREM a remark\ny = 2");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "REM a remark");
    }

    #[test]
    fn test_post_process_runs_before_reconcile() {
        let rules = compile_rules(&[rule(r#""[^"]*""#, Classification::NormalStringLiteral)]);
        let engine = RegexRuleEngine::new(rules, HashSet::new()).with_post_process(Box::new(|span| {
            if span.text.contains("ignore") {
                span.classification = Classification::Undefined;
            }
        }));

        let spans = engine.classify(r#"a("keep me") b("ignore me")"#);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].classification, Classification::Undefined);
    }

    #[test]
    fn test_comment_after_url_in_string_is_kept() {
        let rules = compile_rules(&[
            rule(r#""[^"\r\n]*""#, Classification::NormalStringLiteral),
            rule(r"//[^\r\n]*", Classification::SingleLineComment),
        ]);
        let engine = RegexRuleEngine::new(rules, HashSet::new());

        let src = r#"var u = "http://example.com"; // Explian the link"#;
        let spans = engine.classify(src);
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec![r#""http://example.com""#, "// Explian the link"]);
        assert_eq!(spans[1].classification, Classification::SingleLineComment);
    }

    #[test]
    fn test_literal_inside_comment_is_still_dropped() {
        let rules = compile_rules(&[
            rule(r#""[^"\r\n]*""#, Classification::NormalStringLiteral),
            rule(r"//[^\r\n]*", Classification::SingleLineComment),
        ]);
        let engine = RegexRuleEngine::new(rules, HashSet::new());

        let spans = engine.classify(r#"// say "hi" // twice"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, r#"// say "hi" // twice"#);
    }

    #[test]
    fn test_ignored_plain_text_yields_nothing() {
        let rules = compile_rules(&[rule(r"(?s).+", Classification::PlainText)]);
        let ignored: HashSet<_> = [Classification::PlainText].into_iter().collect();
        let engine = RegexRuleEngine::new(rules, ignored);

        assert!(engine.classify("hello wrold").is_empty());
    }
}
