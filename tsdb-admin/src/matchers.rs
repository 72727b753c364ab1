//! Translation of wire matchers into engine matchers

use tsdb_core::{Matcher, TsdbError};

use crate::api::{MatcherSpec, MatcherType};
use crate::error::{AdminError, AdminResult};

/// Translate a single wire matcher
pub fn translate(spec: &MatcherSpec) -> AdminResult<Matcher> {
    let matcher = match spec.kind {
        MatcherType::Eq => Matcher::equal(&spec.name, &spec.value),
        MatcherType::Neq => Matcher::not(Matcher::equal(&spec.name, &spec.value)),
        MatcherType::Re => regex(spec)?,
        MatcherType::Nre => Matcher::not(regex(spec)?),
        MatcherType::Unknown => {
            return Err(AdminError::invalid_argument("unknown matcher type"));
        }
    };
    Ok(matcher)
}

/// Translate a list of wire matchers, keeping their order.
/// The result is interpreted conjunctively.
pub fn translate_all(specs: &[MatcherSpec]) -> AdminResult<Vec<Matcher>> {
    specs.iter().map(translate).collect()
}

fn regex(spec: &MatcherSpec) -> AdminResult<Matcher> {
    Matcher::regex(&spec.name, &spec.value).map_err(|e| {
        let detail = match e {
            TsdbError::InvalidMatcher(msg) => msg,
            other => other.to_string(),
        };
        AdminError::invalid_argument(format!("bad regexp matcher: {}", detail))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsdb_core::Labels;

    fn job(value: &str) -> Labels {
        Labels::from_pairs([("job", value)])
    }

    #[test]
    fn test_translate_each_kind() {
        let eq = translate(&MatcherSpec::new(MatcherType::Eq, "job", "api")).unwrap();
        assert!(eq.matches(&job("api")));

        let neq = translate(&MatcherSpec::new(MatcherType::Neq, "job", "api")).unwrap();
        assert!(!neq.matches(&job("api")));
        assert!(neq.matches(&job("db")));

        let re = translate(&MatcherSpec::new(MatcherType::Re, "job", "a.i")).unwrap();
        assert!(re.matches(&job("api")));

        let nre = translate(&MatcherSpec::new(MatcherType::Nre, "job", "a.i")).unwrap();
        assert!(!nre.matches(&job("api")));
        assert!(nre.matches(&job("db")));
    }

    #[test]
    fn test_bad_regex_is_invalid_argument() {
        for kind in [MatcherType::Re, MatcherType::Nre] {
            let err = translate(&MatcherSpec::new(kind, "job", "([")).unwrap_err();
            match err {
                AdminError::InvalidArgument(msg) => {
                    assert!(msg.starts_with("bad regexp matcher: regex parse error"), "{}", msg);
                    assert!(!msg.contains("invalid matcher"), "{}", msg);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_type_is_invalid_argument() {
        let err = translate(&MatcherSpec::new(MatcherType::Unknown, "job", "api")).unwrap_err();
        assert_eq!(err, AdminError::invalid_argument("unknown matcher type"));
    }

    #[test]
    fn test_translate_all_stops_at_first_error() {
        let specs = vec![
            MatcherSpec::new(MatcherType::Eq, "job", "api"),
            MatcherSpec::new(MatcherType::Unknown, "env", "prod"),
        ];
        assert!(translate_all(&specs).is_err());

        let specs = vec![
            MatcherSpec::new(MatcherType::Eq, "job", "api"),
            MatcherSpec::new(MatcherType::Neq, "env", "dev"),
        ];
        let matchers = translate_all(&specs).unwrap();
        assert_eq!(matchers.len(), 2);
        assert_eq!(matchers[1].name(), "env");
    }
}
