//! Engine-native label matchers

use regex::Regex;
use std::fmt;

use crate::error::{TsdbError, TsdbResult};
use crate::labels::Labels;

/// A predicate over one label of a series.
///
/// A label that is absent from a series is matched as the empty string.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Label value equals the given string
    Equal { name: String, value: String },
    /// Label value fully matches the regular expression
    Regex { name: String, regex: Regex },
    /// Negation of the inner matcher
    Not(Box<Matcher>),
}

impl Matcher {
    /// Create an equality matcher
    pub fn equal<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self::Equal {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a regex matcher. The pattern is anchored at both ends.
    pub fn regex<N: Into<String>>(name: N, pattern: &str) -> TsdbResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| TsdbError::invalid_matcher(e.to_string()))?;
        Ok(Self::Regex {
            name: name.into(),
            regex,
        })
    }

    /// Negate a matcher
    pub fn not(inner: Matcher) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Name of the label this matcher inspects
    pub fn name(&self) -> &str {
        match self {
            Matcher::Equal { name, .. } | Matcher::Regex { name, .. } => name,
            Matcher::Not(inner) => inner.name(),
        }
    }

    /// Check a single label value
    pub fn matches_value(&self, value: &str) -> bool {
        match self {
            Matcher::Equal { value: expected, .. } => value == expected,
            Matcher::Regex { regex, .. } => regex.is_match(value),
            Matcher::Not(inner) => !inner.matches_value(value),
        }
    }

    /// Check a series' label set
    pub fn matches(&self, labels: &Labels) -> bool {
        self.matches_value(labels.get(self.name()).unwrap_or(""))
    }
}

/// Check that every matcher accepts the label set
pub fn matches_all(matchers: &[Matcher], labels: &Labels) -> bool {
    matchers.iter().all(|m| m.matches(labels))
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Equal { name, value } => write!(f, "{}={:?}", name, value),
            Matcher::Regex { name, regex } => write!(f, "{}=~{:?}", name, regex.as_str()),
            Matcher::Not(inner) => write!(f, "!({})", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(&str, &str)]) -> Labels {
        Labels::from_pairs(pairs.iter().copied()).canonical()
    }

    #[test]
    fn test_equal_and_not_equal() {
        let api = series(&[("job", "api")]);
        let db = series(&[("job", "db")]);

        let eq = Matcher::equal("job", "api");
        assert!(eq.matches(&api));
        assert!(!eq.matches(&db));

        let neq = Matcher::not(Matcher::equal("job", "api"));
        assert!(!neq.matches(&api));
        assert!(neq.matches(&db));
    }

    #[test]
    fn test_missing_label_is_empty_string() {
        let no_job = series(&[("env", "prod")]);
        assert!(Matcher::equal("job", "").matches(&no_job));
        assert!(Matcher::not(Matcher::equal("job", "api")).matches(&no_job));
    }

    #[test]
    fn test_regex_is_anchored() {
        let m = Matcher::regex("job", "ap").unwrap();
        assert!(!m.matches(&series(&[("job", "api")])));

        let m = Matcher::regex("job", "ap.*|db").unwrap();
        assert!(m.matches(&series(&[("job", "api")])));
        assert!(m.matches(&series(&[("job", "db")])));
        assert!(!m.matches(&series(&[("job", "xdb")])));
    }

    #[test]
    fn test_bad_regex() {
        let err = Matcher::regex("job", "(unclosed").unwrap_err();
        assert!(matches!(err, TsdbError::InvalidMatcher(_)));
    }

    #[test]
    fn test_matches_all_is_conjunction() {
        let labels = series(&[("job", "api"), ("env", "prod")]);
        let both = vec![Matcher::equal("job", "api"), Matcher::equal("env", "prod")];
        assert!(matches_all(&both, &labels));

        let one_fails = vec![Matcher::equal("job", "api"), Matcher::equal("env", "dev")];
        assert!(!matches_all(&one_fails, &labels));

        assert!(matches_all(&[], &labels));
    }
}
