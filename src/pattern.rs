//! Skip patterns.
//!
//! A [`SkipMatcher`] decides, per dataset path, whether the dataset is left
//! out of the stripped copy. Patterns are unanchored and case-sensitive: a
//! pattern matches if it is found anywhere in the path. All patterns are
//! compiled into one alternation so each path is scanned once.

use regex::Regex;

use crate::errors::StripError;

/// How raw pattern strings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    /// Regular expressions (`regex` crate syntax).
    #[default]
    Regex,
    /// Plain substrings; regex metacharacters have no meaning.
    Literal,
}

/// Compiled, non-empty set of skip patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    alternation: Regex,
}

impl PatternSet {
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Keep/skip decision for dataset paths.
#[derive(Debug, Clone)]
pub enum SkipMatcher {
    /// Every dataset is kept.
    MatchAll,
    /// Datasets whose path matches any pattern are skipped.
    MatchPattern(PatternSet),
}

impl SkipMatcher {
    /// Build a matcher from raw patterns.
    ///
    /// Entries are trimmed and empty entries dropped (an empty alternative
    /// would match every path). No remaining pattern yields [`SkipMatcher::MatchAll`].
    pub fn from_patterns<I, S>(patterns: I, syntax: PatternSyntax) -> Result<Self, StripError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Ok(SkipMatcher::MatchAll);
        }

        let mut branches = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            let branch = match syntax {
                PatternSyntax::Regex => {
                    // compile alone first so the error names the bad pattern
                    Regex::new(pattern).map_err(|source| StripError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })?;
                    pattern.clone()
                }
                PatternSyntax::Literal => regex::escape(pattern),
            };
            branches.push(format!("(?:{branch})"));
        }

        let alternation = Regex::new(&branches.join("|")).map_err(|e| {
            StripError::Configuration(format!("cannot combine skip patterns: {e}"))
        })?;
        Ok(SkipMatcher::MatchPattern(PatternSet {
            patterns,
            alternation,
        }))
    }

    /// Single pattern, treated as a one-element set.
    pub fn single(pattern: &str, syntax: PatternSyntax) -> Result<Self, StripError> {
        Self::from_patterns([pattern], syntax)
    }

    /// Comma-separated pattern list, as given on the command line.
    pub fn from_list(list: &str, syntax: PatternSyntax) -> Result<Self, StripError> {
        Self::from_patterns(list.split(','), syntax)
    }

    /// True if `path` matches at least one skip pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            SkipMatcher::MatchAll => false,
            SkipMatcher::MatchPattern(set) => set.alternation.is_match(path),
        }
    }

    pub fn keeps(&self, path: &str) -> bool {
        !self.matches(path)
    }

    /// Active patterns; empty for [`SkipMatcher::MatchAll`].
    pub fn patterns(&self) -> &[String] {
        match self {
            SkipMatcher::MatchAll => &[],
            SkipMatcher::MatchPattern(set) => set.patterns(),
        }
    }
}
