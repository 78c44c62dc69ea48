//! Trigger-pattern matching for event blocks.
//!
//! Patterns are registered once per event block and evaluated against each
//! incoming stimulus. A malformed regex is caught at registration time and
//! surfaces as a [`ValidationIssue`]; at match time such a pattern is simply
//! skipped.

use crate::condition::Value;
use crate::validate::{IssueCategory, Severity, ValidationIssue};
use ahash::AHashMap;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};

/// Matching strategies, in decreasing order of specificity for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    Regex,
    Compound,
    Custom,
    Contains,
    Fuzzy,
}

impl MatchStrategy {
    pub fn parse(s: &str) -> MatchStrategy {
        match s {
            "exact" => MatchStrategy::Exact,
            "regex" => MatchStrategy::Regex,
            "fuzzy" => MatchStrategy::Fuzzy,
            "compound" => MatchStrategy::Compound,
            "custom" => MatchStrategy::Custom,
            _ => MatchStrategy::Contains,
        }
    }

    /// Higher wins when weights tie: exact > regex > contains > fuzzy, with
    /// compound and custom slotted below regex.
    fn specificity(&self) -> u8 {
        match self {
            MatchStrategy::Exact => 50,
            MatchStrategy::Regex => 40,
            MatchStrategy::Compound => 35,
            MatchStrategy::Custom => 35,
            MatchStrategy::Contains => 20,
            MatchStrategy::Fuzzy => 10,
        }
    }
}

/// Boolean combinators for compound patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    And,
    Or,
    Not,
}

/// The compiled matching rule behind a pattern.
#[derive(Debug, Clone)]
pub enum PatternRule {
    Exact(String),
    Contains(String),
    Regex(Regex),
    Fuzzy { pattern: String, threshold: f64 },
    Compound { op: CompoundOp, children: Vec<PatternRule> },
    Custom { name: String },
}

impl PatternRule {
    fn strategy(&self) -> MatchStrategy {
        match self {
            PatternRule::Exact(_) => MatchStrategy::Exact,
            PatternRule::Contains(_) => MatchStrategy::Contains,
            PatternRule::Regex(_) => MatchStrategy::Regex,
            PatternRule::Fuzzy { .. } => MatchStrategy::Fuzzy,
            PatternRule::Compound { .. } => MatchStrategy::Compound,
            PatternRule::Custom { .. } => MatchStrategy::Custom,
        }
    }
}

/// A registered trigger descriptor, associated with one event block.
#[derive(Debug, Clone)]
pub struct TriggerPattern {
    pub id: String,
    pub block_id: String,
    pub rule: PatternRule,
    pub case_sensitive: bool,
    pub weight: i32,
    pub enabled: bool,
}

/// Raw registration input, before regex compilation.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub id: String,
    pub block_id: String,
    pub strategy: MatchStrategy,
    pub pattern: String,
    pub case_sensitive: bool,
    pub weight: i32,
    pub enabled: bool,
}

/// The outcome of matching one stimulus against all registered patterns.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub matched: bool,
    /// Every matching pattern id, best-ranked first.
    pub matched_pattern_ids: Vec<String>,
    /// Confidence of the best match, 0..1.
    pub confidence: f64,
    /// Named regex capture groups from the best regex match.
    pub extracted_values: AHashMap<String, String>,
}

type CustomMatcher = Box<dyn Fn(&str, &AHashMap<String, Value>) -> bool + Send + Sync>;

/// Evaluates trigger patterns against incoming stimuli.
#[derive(Default)]
pub struct EventMatcher {
    patterns: Vec<TriggerPattern>,
    custom: AHashMap<String, CustomMatcher>,
}

impl EventMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pattern. A malformed regex yields a validation issue and
    /// the pattern is stored disabled so it never matches.
    pub fn add_pattern(&mut self, spec: PatternSpec) -> Option<ValidationIssue> {
        let (rule, issue) = match spec.strategy {
            MatchStrategy::Exact => (PatternRule::Exact(spec.pattern.clone()), None),
            MatchStrategy::Contains | MatchStrategy::Compound => {
                // Compound trees are registered via `add_compound`; a bare
                // compound spec degrades to its pattern text.
                (PatternRule::Contains(spec.pattern.clone()), None)
            }
            MatchStrategy::Fuzzy => (
                PatternRule::Fuzzy {
                    pattern: spec.pattern.clone(),
                    threshold: 0.75,
                },
                None,
            ),
            MatchStrategy::Custom => (
                PatternRule::Custom {
                    name: spec.pattern.clone(),
                },
                None,
            ),
            MatchStrategy::Regex => match RegexBuilder::new(&spec.pattern)
                .case_insensitive(!spec.case_sensitive)
                .build()
            {
                Ok(regex) => (PatternRule::Regex(regex), None),
                Err(e) => {
                    tracing::warn!(
                        pattern = %spec.pattern,
                        block_id = %spec.block_id,
                        "invalid regex pattern disabled: {e}"
                    );
                    (
                        PatternRule::Contains(spec.pattern.clone()),
                        Some(ValidationIssue {
                            category: IssueCategory::Logic,
                            severity: Severity::Error,
                            block_id: Some(spec.block_id.clone()),
                            message: format!("invalid regex pattern '{}': {}", spec.pattern, e),
                            auto_fixable: false,
                        }),
                    )
                }
            },
        };
        let enabled = spec.enabled && issue.is_none();
        self.patterns.push(TriggerPattern {
            id: spec.id,
            block_id: spec.block_id,
            rule,
            case_sensitive: spec.case_sensitive,
            weight: spec.weight,
            enabled,
        });
        issue
    }

    /// Registers a fully-built pattern (compound trees, custom rules).
    pub fn add_trigger(&mut self, pattern: TriggerPattern) {
        self.patterns.push(pattern);
    }

    /// Registers a named custom matcher. Matchers are pure functions over the
    /// message and a read-only view of the context variables.
    pub fn register_custom<F>(&mut self, name: &str, matcher: F)
    where
        F: Fn(&str, &AHashMap<String, Value>) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(name.to_string(), Box::new(matcher));
    }

    pub fn patterns(&self) -> &[TriggerPattern] {
        &self.patterns
    }

    /// Evaluates every enabled pattern against the stimulus text. Results are
    /// ranked by weight, then strategy specificity, then declaration order,
    /// so matching stays deterministic.
    pub fn find_match(
        &self,
        text: &str,
        variables: &AHashMap<String, Value>,
    ) -> MatchResult {
        let mut hits: Vec<(usize, &TriggerPattern, f64)> = Vec::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            if !pattern.enabled {
                continue;
            }
            if let Some(confidence) =
                self.eval_rule(&pattern.rule, text, pattern.case_sensitive, variables)
            {
                hits.push((index, pattern, confidence));
            }
        }
        let ranked: Vec<_> = hits
            .into_iter()
            .sorted_by_key(|(index, pattern, _)| {
                (
                    std::cmp::Reverse(pattern.weight),
                    std::cmp::Reverse(pattern.rule.strategy().specificity()),
                    *index,
                )
            })
            .collect();

        let Some((_, best, confidence)) = ranked.first().map(|(i, p, c)| (*i, *p, *c)) else {
            return MatchResult::default();
        };

        let mut extracted_values = AHashMap::new();
        if let PatternRule::Regex(regex) = &best.rule {
            if let Some(captures) = regex.captures(text) {
                for name in regex.capture_names().flatten() {
                    if let Some(capture) = captures.name(name) {
                        extracted_values.insert(name.to_string(), capture.as_str().to_string());
                    }
                }
            }
        }

        MatchResult {
            matched: true,
            matched_pattern_ids: ranked.iter().map(|(_, p, _)| p.id.clone()).collect(),
            confidence,
            extracted_values,
        }
    }

    /// The block id of the best-ranked matching pattern, if any.
    pub fn best_block(
        &self,
        text: &str,
        variables: &AHashMap<String, Value>,
    ) -> Option<(String, MatchResult)> {
        let result = self.find_match(text, variables);
        if !result.matched {
            return None;
        }
        let best_id = result.matched_pattern_ids.first()?;
        let block_id = self
            .patterns
            .iter()
            .find(|p| &p.id == best_id)
            .map(|p| p.block_id.clone())?;
        Some((block_id, result))
    }

    /// Short-circuiting boolean combination over child rule results.
    pub fn match_compound(
        &self,
        op: CompoundOp,
        children: &[PatternRule],
        text: &str,
        case_sensitive: bool,
        variables: &AHashMap<String, Value>,
    ) -> bool {
        match op {
            CompoundOp::And => children
                .iter()
                .all(|c| self.eval_rule(c, text, case_sensitive, variables).is_some()),
            CompoundOp::Or => children
                .iter()
                .any(|c| self.eval_rule(c, text, case_sensitive, variables).is_some()),
            CompoundOp::Not => !children
                .iter()
                .any(|c| self.eval_rule(c, text, case_sensitive, variables).is_some()),
        }
    }

    /// Returns the match confidence, or `None` when the rule does not match.
    fn eval_rule(
        &self,
        rule: &PatternRule,
        text: &str,
        case_sensitive: bool,
        variables: &AHashMap<String, Value>,
    ) -> Option<f64> {
        match rule {
            PatternRule::Exact(pattern) => {
                let matched = if case_sensitive {
                    text == pattern
                } else {
                    text.to_lowercase() == pattern.to_lowercase()
                };
                matched.then_some(1.0)
            }
            PatternRule::Contains(pattern) => {
                if pattern.is_empty() {
                    return None;
                }
                let matched = if case_sensitive {
                    text.contains(pattern.as_str())
                } else {
                    text.to_lowercase().contains(&pattern.to_lowercase())
                };
                matched.then_some(0.7)
            }
            PatternRule::Regex(regex) => regex.is_match(text).then_some(0.9),
            PatternRule::Fuzzy { pattern, threshold } => {
                let similarity = if case_sensitive {
                    similarity(text, pattern)
                } else {
                    similarity(&text.to_lowercase(), &pattern.to_lowercase())
                };
                (similarity >= *threshold).then_some(similarity)
            }
            PatternRule::Compound { op, children } => self
                .match_compound(*op, children, text, case_sensitive, variables)
                .then_some(0.8),
            PatternRule::Custom { name } => match self.custom.get(name) {
                Some(matcher) => matcher(text, variables).then_some(0.8),
                None => {
                    tracing::debug!(%name, "custom matcher not registered, skipping");
                    None
                }
            },
        }
    }
}

/// Normalized Levenshtein similarity in 0..1. Hand-rolled; nothing in the
/// dependency stack covers edit distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    1.0 - previous[b.len()] as f64 / max_len as f64
}
