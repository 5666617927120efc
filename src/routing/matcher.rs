//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile `/v1/clubs/uuid/:club_uuid` style patterns
//! - Match a request path segment by segment
//! - Extract named parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A parameter matches exactly one non-empty segment
//! - A trailing slash is a segment of its own, so `/a/` never matches `/a/:x`
//! - Segments are percent-decoded before comparison; a segment that does not
//!   decode to UTF-8 fails the match

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::percent_decode_str;

/// Parameters extracted from a matched path, by name.
pub type PathParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Rejected route pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern {0:?} must start with '/'")]
    NotAbsolute(String),

    #[error("pattern {pattern:?} has an unnamed parameter")]
    UnnamedParam { pattern: String },

    #[error("pattern {pattern:?} declares parameter {name:?} twice")]
    DuplicateParam { pattern: String, name: String },
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        };

        let mut segments = Vec::new();
        for part in rest.split('/') {
            match part.strip_prefix(':') {
                Some("") => {
                    return Err(PatternError::UnnamedParam {
                        pattern: pattern.to_string(),
                    })
                }
                Some(name) => {
                    if segments.contains(&Segment::Param(name.to_string())) {
                        return Err(PatternError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning the extracted parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = PathParams::new();

        for segment in &self.segments {
            let part = decode_segment(parts.next()?)?;
            match segment {
                Segment::Literal(expected) => {
                    if part != expected.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.into_owned());
                }
            }
        }

        // Extra segments mean a longer path than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn decode_segment(raw: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(raw).decode_utf8().ok()
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_extraction() {
        let pattern = PathPattern::parse("/v1/clubs/uuid/:club_uuid").unwrap();
        let params = pattern.matches("/v1/clubs/uuid/abc-123").unwrap();
        assert_eq!(params["club_uuid"], "abc-123");
    }

    #[test]
    fn test_empty_segment_never_matches_param() {
        let pattern = PathPattern::parse("/v1/clubs/uuid/:club_uuid").unwrap();
        assert!(pattern.matches("/v1/clubs/uuid/").is_none());
        assert!(pattern.matches("/v1/clubs/uuid").is_none());
        assert!(pattern.matches("/v1/clubs/uuid/abc/extra").is_none());
    }

    #[test]
    fn test_multiple_params() {
        let pattern = PathPattern::parse("/v1/time-tables/years/:year/months/:month/days/:day").unwrap();
        let params = pattern.matches("/v1/time-tables/years/2020/months/3/days/14").unwrap();
        assert_eq!(params["year"], "2020");
        assert_eq!(params["month"], "3");
        assert_eq!(params["day"], "14");
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let pattern = PathPattern::parse("/v1/announcements/types/:type/query/:search_query").unwrap();
        let params = pattern
            .matches("/v1/announcements/types/club/query/%EA%B3%B5%EC%A7%80")
            .unwrap();
        assert_eq!(params["type"], "club");
        assert_eq!(params["search_query"], "공지");

        let params = pattern.matches("/v1/announcements/types/club/query/a%20b%2Fc").unwrap();
        assert_eq!(params["search_query"], "a b/c");
    }

    #[test]
    fn test_undecodable_segment_does_not_match() {
        let pattern = PathPattern::parse("/v1/clubs/uuid/:club_uuid").unwrap();
        assert!(pattern.matches("/v1/clubs/uuid/%FF%FE").is_none());
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let pattern = PathPattern::parse("/v1/clubs/count").unwrap();
        assert!(pattern.matches("/v1/clubs/count").is_some());
        assert!(pattern.matches("/v1/Clubs/count").is_none());
        assert!(pattern.matches("/v1/clubs/count/").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(PathPattern::parse("v1/clubs"), Err(PatternError::NotAbsolute(_))));
        assert!(matches!(PathPattern::parse("/v1/:"), Err(PatternError::UnnamedParam { .. })));
        assert!(matches!(
            PathPattern::parse("/v1/:id/x/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }
}
