//! Core types shared by the rule compiler, the engine and the walker

use crate::error::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

// ============================================================================
// Source root
// ============================================================================

/// The root of the tree, both as supplied and fully resolved.
///
/// Rules are evaluated against paths under `canonical`. `given` is kept so that
/// classification entries written against a non-canonical spelling of the
/// root still match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub canonical: PathBuf,
    pub given: PathBuf,
}

impl SourceRoot {
    /// Resolve and validate a root directory.
    pub fn resolve(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScopeError::RootNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(ScopeError::RootNotDirectory(path.to_path_buf()));
        }
        let canonical = path.canonicalize()?;
        let given = absolutize(path)?;
        Ok(Self { canonical, given })
    }

    /// Absolute path of `rel` under the canonical root.
    pub fn canonical_path(&self, rel: &RelPath) -> PathBuf {
        join_rel(&self.canonical, rel.as_str())
    }

    /// Absolute path of `rel` under the root as supplied.
    pub fn given_path(&self, rel: &RelPath) -> PathBuf {
        join_rel(&self.given, rel.as_str())
    }

    /// Relative path of an absolute path under either spelling of the root.
    pub fn relativize(&self, path: &Path) -> Option<RelPath> {
        path.strip_prefix(&self.canonical)
            .or_else(|_| path.strip_prefix(&self.given))
            .ok()
            .and_then(RelPath::from_path)
    }
}

pub(crate) fn join_rel(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |p, s| p.join(s))
}

/// Make a path absolute against the working directory and drop `.`/`..` lexically.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Direction of a path-list entry or glob filter, and the shape of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Include,
    Exclude,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Include => "include",
            Direction::Exclude => "exclude",
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(self, Direction::Include)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a candidate is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A normalized, slash-separated path relative to the source root.
///
/// Never contains `.` or `..` segments; the root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath {
    inner: String,
}

impl RelPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a slash-separated string.
    ///
    /// Empty and `.` segments are dropped and `..` pops the previous segment.
    /// Returns `None` when `..` would climb above the root.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(other),
            }
        }
        Some(Self {
            inner: segments.join("/"),
        })
    }

    /// Build from a relative filesystem path (e.g. the result of `strip_prefix`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut segments: Vec<String> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    segments.pop()?;
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(Self {
            inner: segments.join("/"),
        })
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Number of segments; this is a path-list rule's specificity.
    pub fn depth(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split('/').count()
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.inner.is_empty() {
            return None;
        }
        Some(match self.inner.rfind('/') {
            Some(idx) => &self.inner[idx + 1..],
            None => &self.inner,
        })
    }

    pub fn parent(&self) -> Option<RelPath> {
        if self.inner.is_empty() {
            return None;
        }
        Some(match self.inner.rfind('/') {
            Some(idx) => Self {
                inner: self.inner[..idx].to_string(),
            },
            None => Self::root(),
        })
    }

    pub fn join(&self, name: &str) -> RelPath {
        if self.inner.is_empty() {
            return Self {
                inner: name.to_string(),
            };
        }
        Self {
            inner: format!("{}/{}", self.inner, name),
        }
    }

    /// True if `ancestor` equals this path or is one of its ancestors, segment-wise.
    pub fn starts_with(&self, ancestor: &RelPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        match self.inner.strip_prefix(ancestor.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// This path followed by each of its ancestors, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        let inner = self.inner.as_str();
        let mut next = Some(inner);
        std::iter::from_fn(move || {
            let current = next?;
            next = if current.is_empty() {
                None
            } else {
                Some(current.rfind('/').map_or("", |idx| &current[..idx]))
            };
            Some(current)
        })
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.inner)
        }
    }
}

impl Serialize for RelPath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
