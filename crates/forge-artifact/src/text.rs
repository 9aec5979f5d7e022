//! Lexical text heuristics
//!
//! Everything in the pipeline that "reads" prose goes through this module:
//! word sets for similarity search, sentence statistics for clarity, and
//! action-verb density for actionability. The scoring functions sit behind
//! [`TextScorer`] so a stronger analysis can replace [`HeuristicTextScorer`]
//! without changing any caller.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Debug;

/// Verbs that signal an actionable statement
pub const ACTION_VERBS: &[&str] = &[
    "add", "authenticate", "build", "cache", "check", "configure", "create", "define", "deliver",
    "deploy", "design", "develop", "document", "enable", "ensure", "establish", "expose", "fix",
    "generate", "handle", "implement", "install", "integrate", "load", "log", "measure", "migrate",
    "monitor", "optimize", "parse", "provide", "refactor", "remove", "report", "return", "review",
    "run", "set", "store", "support", "test", "update", "validate", "verify", "write",
];

/// Sentences longer than this count against clarity
pub const LONG_SENTENCE_WORDS: usize = 30;

/// Lowercase alphanumeric tokens, in order
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Lowercase word set
#[must_use]
pub fn word_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Words longer than three characters, deduplicated
#[must_use]
pub fn significant_words(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3)
        .collect()
}

/// Token-overlap ratio `|A ∩ B| / max(|A|, |B|)`
///
/// Always in `[0, 1]`; identical non-empty texts score exactly 1 and an
/// empty side scores 0.
#[must_use]
pub fn token_overlap(a: &str, b: &str) -> f64 {
    overlap_of_sets(&word_set(a), &word_set(b))
}

/// [`token_overlap`] over pre-computed word sets
#[must_use]
pub fn overlap_of_sets(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let denom = a.len().max(b.len());
    if denom == 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / denom as f64
}

/// Whether `word` (lowercase) is an action verb or a short inflection of one
#[must_use]
pub fn is_action_verb(word: &str) -> bool {
    ACTION_VERBS.iter().any(|verb| {
        word == *verb || (word.starts_with(verb) && word.len() - verb.len() <= 3 && word.len() > 3)
    })
}

/// Split text into sentence-like fragments
///
/// Lines are treated as boundaries so that bullet items count as sentences.
#[must_use]
pub fn sentences(text: &str) -> Vec<&str> {
    text.lines()
        .flat_map(|line| line.split(['.', '!', '?']))
        .map(str::trim)
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

/// Statistical profile of a block of prose
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextProfile {
    /// Total word count
    pub word_count: usize,
    /// Word count of each sentence
    pub sentence_lengths: Vec<usize>,
    /// Blank-line separated paragraphs
    pub paragraph_count: usize,
    /// Number of action-verb tokens
    pub action_verb_count: usize,
}

impl TextProfile {
    /// Profile `text`
    #[must_use]
    pub fn analyze(text: &str) -> Self {
        let words = tokenize(text);
        let sentence_lengths = sentences(text)
            .into_iter()
            .map(|s| tokenize(s).len())
            .filter(|n| *n > 0)
            .collect();
        let paragraph_count = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();
        let action_verb_count = words.iter().filter(|w| is_action_verb(w)).count();

        Self {
            word_count: words.len(),
            sentence_lengths,
            paragraph_count,
            action_verb_count,
        }
    }

    /// Mean words per sentence (0 when there are none)
    #[must_use]
    pub fn mean_sentence_length(&self) -> f64 {
        if self.sentence_lengths.is_empty() {
            return 0.0;
        }
        self.sentence_lengths.iter().sum::<usize>() as f64 / self.sentence_lengths.len() as f64
    }

    /// Fraction of sentences longer than [`LONG_SENTENCE_WORDS`]
    #[must_use]
    pub fn long_sentence_ratio(&self) -> f64 {
        if self.sentence_lengths.is_empty() {
            return 0.0;
        }
        let long = self
            .sentence_lengths
            .iter()
            .filter(|n| **n > LONG_SENTENCE_WORDS)
            .count();
        long as f64 / self.sentence_lengths.len() as f64
    }

    /// Action verbs per word
    #[must_use]
    pub fn action_verb_density(&self) -> f64 {
        if self.word_count == 0 {
            return 0.0;
        }
        self.action_verb_count as f64 / self.word_count as f64
    }

    /// Whether the text has more than one paragraph
    #[inline]
    #[must_use]
    pub fn has_paragraph_breaks(&self) -> bool {
        self.paragraph_count > 1
    }
}

/// Scoring strategy for prose quality
///
/// All scores are in `[0, 1]`.
pub trait TextScorer: Send + Sync + Debug {
    /// Readability from the sentence-length distribution
    fn clarity(&self, profile: &TextProfile) -> f64;

    /// Coverage from length and paragraph structure
    fn completeness(&self, profile: &TextProfile) -> f64;

    /// Density of action verbs
    fn actionability(&self, profile: &TextProfile) -> f64;
}

/// Default lexical scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTextScorer;

impl HeuristicTextScorer {
    /// Sentences in this word range read best
    pub const IDEAL_SENTENCE: (f64, f64) = (8.0, 20.0);
    /// Word count at which length stops adding completeness
    pub const FULL_LENGTH_WORDS: f64 = 60.0;
    /// Action-verb density that maps to full actionability
    pub const FULL_ACTION_DENSITY: f64 = 0.1;
}

impl TextScorer for HeuristicTextScorer {
    fn clarity(&self, profile: &TextProfile) -> f64 {
        if profile.sentence_lengths.is_empty() {
            return 0.0;
        }
        let (lo, hi) = Self::IDEAL_SENTENCE;
        let mean = profile.mean_sentence_length();
        let mean_score = if mean < lo {
            mean / lo
        } else if mean > hi {
            (1.0 - (mean - hi) / hi).max(0.0)
        } else {
            1.0
        };
        let score = 0.7 * mean_score + 0.3 * (1.0 - profile.long_sentence_ratio());
        score.clamp(0.0, 1.0)
    }

    fn completeness(&self, profile: &TextProfile) -> f64 {
        let length = (profile.word_count as f64 / Self::FULL_LENGTH_WORDS).min(1.0);
        let structure = if profile.has_paragraph_breaks() { 0.2 } else { 0.0 };
        (0.8 * length + structure).clamp(0.0, 1.0)
    }

    fn actionability(&self, profile: &TextProfile) -> f64 {
        (profile.action_verb_density() / Self::FULL_ACTION_DENSITY).clamp(0.0, 1.0)
    }
}
