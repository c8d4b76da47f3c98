//! Glob pattern normalization and matching against root-relative paths.
//!
//! Semantics:
//! - `*` matches a non-empty run of characters inside one segment
//! - `**` matches zero or more whole segments (`**/x` matches `x` and `a/x`)
//! - `?`, `[...]` and `{a,b}` behave as in `globset`

use crate::error::{Result, ScopeError};
use crate::types::RelPath;
use globset::{GlobBuilder, GlobMatcher};
use std::fmt;

/// Where a pattern without a `/` is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchoring {
    /// Matched against the full relative path; only `**/` lets it float.
    Root,
    /// A bare name is matched at any depth.
    Anywhere,
}

/// A compiled glob over relative paths.
#[derive(Clone)]
pub struct GlobPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobPattern").field(&self.raw).finish()
    }
}

impl GlobPattern {
    /// Compile a root-anchored pattern, as written in `include:`/`exclude:` filters.
    pub fn anchored(raw: &str) -> Result<Self> {
        Self::new(raw, Anchoring::Root)
    }

    /// Compile a pattern that matches bare names at any depth.
    pub fn anywhere(raw: &str) -> Result<Self> {
        Self::new(raw, Anchoring::Anywhere)
    }

    pub fn new(raw: &str, anchoring: Anchoring) -> Result<Self> {
        let normalized = normalize_glob_pattern(raw, anchoring);
        if normalized.is_empty() {
            return Err(ScopeError::Pattern {
                pattern: raw.to_string(),
                message: "empty pattern".to_string(),
            });
        }
        let matcher = build_matcher(&normalized).map_err(|message| ScopeError::Pattern {
            pattern: raw.to_string(),
            message,
        })?;
        Ok(Self {
            raw: raw.trim().to_string(),
            matcher,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern matches `path` itself. The root never matches.
    pub fn matches(&self, path: &RelPath) -> bool {
        !path.is_root() && self.matcher.is_match(path.as_str())
    }

    /// True if the pattern matches `path` or any directory above it.
    pub fn matches_or_contains(&self, path: &RelPath) -> bool {
        path.ancestors()
            .filter(|p| !p.is_empty())
            .any(|p| self.matcher.is_match(p))
    }
}

/// Normalize a glob pattern for matching against relative paths.
///
/// Rules:
/// - Leading `./` and `/`, and trailing `/`, are stripped
/// - With `Anchoring::Anywhere`, patterns without a separator get a `**/` prefix
/// - A lone `*` becomes `?*` so it cannot match the empty string
pub fn normalize_glob_pattern(raw: &str, anchoring: Anchoring) -> String {
    let mut pattern = raw.trim();
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    let pattern = pattern.trim_start_matches('/').trim_end_matches('/');

    let pattern = if anchoring == Anchoring::Anywhere
        && !pattern.is_empty()
        && !pattern.contains('/')
        && !pattern.starts_with("**")
    {
        format!("**/{}", pattern)
    } else {
        pattern.to_string()
    };

    require_non_empty_stars(&pattern)
}

fn require_non_empty_stars(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }

        if in_class {
            if c == ']' {
                in_class = false;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '[' => {
                out.push(c);
                in_class = true;
                // A leading negation and a leading `]` belong to the class body.
                if matches!(chars.get(i + 1), Some('!') | Some('^')) {
                    i += 1;
                    out.push(chars[i]);
                }
                if chars.get(i + 1) == Some(&']') {
                    i += 1;
                    out.push(']');
                }
            }
            '*' => {
                let doubled = (i > 0 && chars[i - 1] == '*') || chars.get(i + 1) == Some(&'*');
                if doubled {
                    out.push('*');
                } else {
                    out.push_str("?*");
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Build a case-sensitive matcher whose wildcards never cross `/`.
pub fn build_matcher(glob_pattern: &str) -> std::result::Result<GlobMatcher, String> {
    GlobBuilder::new(glob_pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| e.kind().to_string())
}

/// Match a raw root-anchored pattern against a relative path string.
pub fn matches(raw_pattern: &str, path: &str) -> Result<bool> {
    let pattern = GlobPattern::anchored(raw_pattern)?;
    let candidate = RelPath::parse(path).unwrap_or_default();
    Ok(pattern.matches(&candidate))
}
