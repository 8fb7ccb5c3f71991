//! Path pattern parsing and segment matching.
//!
//! # Responsibilities
//! - Parse route patterns such as `/account/{accountId}` into segments
//! - Match request path segments against a pattern, capturing parameters
//! - Rank competing patterns by specificity
//!
//! # Design Decisions
//! - Literal matching is case-sensitive
//! - Literal segments are stored percent-decoded, like request segments
//! - A single trailing slash is ignored on both patterns and paths
//! - A parameter never matches an empty segment
//! - No regex, no wildcards: matching is a linear walk over segments

use std::cmp::Ordering;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::routing::RouteError;

/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Captures the request segment under the given name.
    Param(String),
}

impl Segment {
    /// Returns true for literal segments.
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// A parsed route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern. Parameters are written as `{name}` and must span a whole segment.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &'static str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let mut segments = Vec::new();
        for part in split_path(pattern) {
            if part.is_empty() {
                return Err(invalid("empty path segment"));
            }

            if let Some(inner) = part.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("unterminated parameter"))?;
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("parameter name must be non-empty"));
                }
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                if duplicate {
                    return Err(invalid("parameter name used twice"));
                }
                segments.push(Segment::Param(name.to_string()));
            } else if part.contains(['{', '}']) {
                return Err(invalid("parameter must span a whole segment"));
            } else {
                let literal = percent_decode_str(part)
                    .decode_utf8()
                    .map_err(|_| invalid("literal segment is not valid UTF-8 once decoded"))?;
                segments.push(Segment::Literal(literal.into_owned()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern's segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match already-decoded path segments, returning captured parameters on success.
    pub fn match_segments<S: AsRef<str>>(&self, path: &[S]) -> Option<Vec<(String, String)>> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, value) in self.segments.iter().zip(path) {
            let value = value.as_ref();
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if value.is_empty() => return None,
                Segment::Param(name) => params.push((name.clone(), value.to_string())),
            }
        }
        Some(params)
    }

    /// Two patterns collide when they differ only in parameter names.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Compare specificity position by position; a literal beats a parameter
    /// at the first position where the two patterns differ.
    pub fn specificity_cmp(&self, other: &PathPattern) -> Ordering {
        self.segments
            .iter()
            .map(Segment::is_literal)
            .cmp(other.segments.iter().map(Segment::is_literal))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a path into raw segments, ignoring the leading and a single trailing slash.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals_and_params() {
        let pattern = PathPattern::parse("/withdrawal/status/{withdrawalId}").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("withdrawal".into()),
                Segment::Literal("status".into()),
                Segment::Param("withdrawalId".into()),
            ]
        );
        assert_eq!(pattern.to_string(), "/withdrawal/status/{withdrawalId}");
    }

    #[test]
    fn test_literal_segments_are_decoded() {
        let pattern = PathPattern::parse("/files/a%20b").unwrap();
        assert_eq!(
            pattern.segments(),
            &[Segment::Literal("files".into()), Segment::Literal("a b".into())]
        );
        assert_eq!(pattern.to_string(), "/files/a%20b");
    }

    #[test]
    fn test_root_pattern_has_no_segments() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.segments().is_empty());
        assert_eq!(pattern.match_segments::<&str>(&[]), Some(vec![]));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["account", "/account/{}", "/account/{id", "/a/{id}/{id}", "/a/x{id}", "/a//b", "/a/%FF"] {
            assert!(
                matches!(PathPattern::parse(bad), Err(RouteError::InvalidPattern { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_match_captures_params() {
        let pattern = PathPattern::parse("/account/{accountId}").unwrap();
        let params = pattern.match_segments(&split_path("/account/42")).unwrap();
        assert_eq!(params, vec![("accountId".to_string(), "42".to_string())]);

        assert!(pattern.match_segments(&split_path("/account")).is_none());
        assert!(pattern.match_segments(&split_path("/accounts/42")).is_none());
        assert!(pattern.match_segments(&split_path("/account/42/extra")).is_none());
    }

    #[test]
    fn test_trailing_slash_ignored() {
        assert_eq!(split_path("/account/1/"), vec!["account", "1"]);
        assert_eq!(split_path("/"), Vec::<&str>::new());
    }

    #[test]
    fn test_param_rejects_empty_segment() {
        let pattern = PathPattern::parse("/a/{x}/b").unwrap();
        assert!(pattern.match_segments(&split_path("/a//b")).is_none());
    }

    #[test]
    fn test_same_shape_ignores_param_names() {
        let a = PathPattern::parse("/a/{x}").unwrap();
        let b = PathPattern::parse("/a/{y}/").unwrap();
        let c = PathPattern::parse("/a/b").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_specificity_prefers_earlier_literal() {
        let literal_first = PathPattern::parse("/a/b/{y}").unwrap();
        let param_first = PathPattern::parse("/a/{x}/c").unwrap();
        assert_eq!(literal_first.specificity_cmp(&param_first), Ordering::Greater);
        assert_eq!(param_first.specificity_cmp(&literal_first), Ordering::Less);
    }
}
