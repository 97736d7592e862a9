//! Route pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse `/`-separated patterns into literal and parameter segments
//! - Match a concrete path segment-by-segment, collecting bindings
//! - Order patterns by specificity (literal before parameter)
//!
//! # Design Decisions
//! - Segment counts must be equal; there are no wildcards
//! - A parameter never matches an empty segment
//! - Literal comparison is exact and case-sensitive
//! - Path segments are percent-decoded after splitting, so `%2F` stays
//!   inside one segment; a segment that does not decode to UTF-8 never matches

use std::cmp::Ordering;
use std::fmt;

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Marker that introduces a parameter segment.
pub const PARAM_MARKER: char = ':';

/// Error parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/': {0:?}")]
    NotAbsolute(String),

    #[error("parameter without a name in pattern {pattern:?} at segment {index}")]
    EmptyParam { pattern: String, index: usize },

    #[error("parameter `{name}` appears twice in pattern {pattern:?}")]
    DuplicateParam { pattern: String, name: String },
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern such as `/users/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        for (index, part) in split_segments(raw).enumerate() {
            match part.strip_prefix(PARAM_MARKER) {
                Some("") => {
                    return Err(PatternError::EmptyParam {
                        pattern: raw.to_string(),
                        index,
                    })
                }
                Some(name) => {
                    if segments.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
                        return Err(PatternError::DuplicateParam {
                            pattern: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if the pattern has no parameter segments.
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Match a concrete path, returning `(name, value)` bindings on success.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut bindings = Vec::new();
        let mut parts = split_segments(path);

        for segment in &self.segments {
            let part = percent_decode_str(parts.next()?).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => bindings.push((name.clone(), part.into_owned())),
            }
        }

        // Leftover segments mean the path is longer than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(bindings)
    }

    /// Compare specificity: at the first position where one pattern has a
    /// literal and the other a parameter, the literal is more specific.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match (a, b) {
                (Segment::Literal(_), Segment::Param(_)) => return Ordering::Greater,
                (Segment::Param(_), Segment::Literal(_)) => return Ordering::Less,
                _ => {}
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on `/`, dropping the single leading separator.
fn split_segments(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_segments() {
        let pattern = RoutePattern::parse("/users/:id/addresses").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("addresses".into()),
            ]
        );
        assert!(!pattern.is_static());
        assert!(RoutePattern::parse("/about").unwrap().is_static());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            RoutePattern::parse("users"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/users/:"),
            Err(PatternError::EmptyParam { index: 1, .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_literal_match() {
        let pattern = RoutePattern::parse("/about").unwrap();
        assert_eq!(pattern.matches("/about"), Some(vec![]));
        assert_eq!(pattern.matches("/About"), None);
        assert_eq!(pattern.matches("/about/"), None);
        assert_eq!(pattern.matches("/about/more"), None);
    }

    #[test]
    fn test_root_pattern() {
        let pattern = RoutePattern::parse("/").unwrap();
        assert_eq!(pattern.matches("/"), Some(vec![]));
        assert_eq!(pattern.matches("/x"), None);
    }

    #[test]
    fn test_param_bindings() {
        let pattern = RoutePattern::parse("/users/:user_id/addresses/:address_id").unwrap();
        assert_eq!(
            pattern.matches("/users/7/addresses/3"),
            Some(bindings(&[("user_id", "7"), ("address_id", "3")]))
        );
        assert_eq!(pattern.matches("/users/7/addresses"), None);
        assert_eq!(pattern.matches("/users/7/phones/3"), None);
    }

    #[test]
    fn test_param_rejects_empty_segment() {
        let pattern = RoutePattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.matches("/users/"), None);
        assert_eq!(pattern.matches("/users/42"), Some(bindings(&[("id", "42")])));
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let pattern = RoutePattern::parse("/users/:name").unwrap();
        assert_eq!(
            pattern.matches("/users/John%20Doe"),
            Some(bindings(&[("name", "John Doe")]))
        );
        // An encoded separator stays inside its segment.
        assert_eq!(pattern.matches("/users/a%2Fb"), Some(bindings(&[("name", "a/b")])));
        assert_eq!(pattern.matches("/users/%FF"), None);

        let literal = RoutePattern::parse("/café").unwrap();
        assert_eq!(literal.matches("/caf%C3%A9"), Some(vec![]));
        assert_eq!(literal.matches("/café"), Some(vec![]));
    }

    #[test]
    fn test_specificity() {
        let literal = RoutePattern::parse("/users/new").unwrap();
        let param = RoutePattern::parse("/users/:id").unwrap();
        let other_param = RoutePattern::parse("/users/:name").unwrap();
        assert_eq!(literal.specificity_cmp(&param), Ordering::Greater);
        assert_eq!(param.specificity_cmp(&literal), Ordering::Less);
        assert_eq!(param.specificity_cmp(&other_param), Ordering::Equal);

        let late_literal = RoutePattern::parse("/:section/edit").unwrap();
        let early_literal = RoutePattern::parse("/users/:action").unwrap();
        assert_eq!(early_literal.specificity_cmp(&late_literal), Ordering::Greater);
    }
}
