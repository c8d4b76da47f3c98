//! Rule set compilation
//!
//! Turns the raw include/exclude path lists, the ordered glob filters and the
//! TypeScript mode into immutable rule structures. Bad values here are fatal.

use crate::config::{IndexSettings, ENV_TYPESCRIPT};
use crate::error::{Result, ScopeError};
use crate::patterns::GlobPattern;
use crate::types::{Direction, RelPath};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

/// Built-in filters evaluated before any user filter.
pub const DEFAULT_FILTERS: &[(Direction, &str)] = &[
    (Direction::Exclude, "*.min.js"),
    (Direction::Exclude, "*-min.js"),
];

// ============================================================================
// Path lists
// ============================================================================

/// One entry of `LGTM_INDEX_INCLUDE` or `LGTM_INDEX_EXCLUDE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathListRule {
    pub direction: Direction,
    pub path: RelPath,
}

impl PathListRule {
    /// Depth of the rule's path; deeper rules win.
    pub fn specificity(&self) -> usize {
        self.path.depth()
    }

    /// True if the rule's path is `path` or one of its ancestors.
    pub fn covers(&self, path: &RelPath) -> bool {
        path.starts_with(&self.path)
    }
}

/// Compiled include and exclude path lists
#[derive(Debug, Clone, Default)]
pub struct PathLists {
    rules: Vec<PathListRule>,
    explicit_includes: bool,
}

impl PathLists {
    /// Parse both lists. Entries are relative to `root`; absolute entries must lie inside it.
    pub fn parse(include: &str, exclude: &str, root: &Path) -> Result<Self> {
        let mut rules = Vec::new();
        for path in parse_path_list(include, root)? {
            rules.push(PathListRule {
                direction: Direction::Include,
                path,
            });
        }
        let explicit_includes = !rules.is_empty();
        for path in parse_path_list(exclude, root)? {
            rules.push(PathListRule {
                direction: Direction::Exclude,
                path,
            });
        }
        Ok(Self {
            rules,
            explicit_includes,
        })
    }

    pub fn rules(&self) -> &[PathListRule] {
        &self.rules
    }

    /// True once any include entry was supplied; the default then narrows to "excluded".
    pub fn has_explicit_includes(&self) -> bool {
        self.explicit_includes
    }

    /// The most specific rule covering `path`. Equal depth resolves to exclude.
    pub fn resolve(&self, path: &RelPath) -> Option<&PathListRule> {
        let mut best: Option<&PathListRule> = None;
        for rule in self.rules.iter().filter(|r| r.covers(path)) {
            best = match best {
                None => Some(rule),
                Some(current) => {
                    let deeper = rule.specificity() > current.specificity();
                    let tie_to_exclude = rule.specificity() == current.specificity()
                        && rule.direction == Direction::Exclude;
                    if deeper || tie_to_exclude {
                        Some(rule)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    /// True if an include entry lies strictly below `dir`.
    pub fn has_include_below(&self, dir: &RelPath) -> bool {
        self.rules.iter().any(|r| {
            r.direction == Direction::Include
                && r.path.depth() > dir.depth()
                && r.path.starts_with(dir)
        })
    }
}

fn parse_path_list(raw: &str, root: &Path) -> Result<Vec<RelPath>> {
    let mut paths = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = if Path::new(line).is_absolute() {
            Path::new(line)
                .strip_prefix(root)
                .ok()
                .and_then(RelPath::from_path)
        } else {
            RelPath::parse(line)
        };
        match parsed {
            Some(path) => paths.push(path),
            None => return Err(ScopeError::PathOutsideRoot(line.to_string())),
        }
    }
    Ok(paths)
}

// ============================================================================
// Glob filters
// ============================================================================

/// Where a filter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum FilterOrigin {
    Builtin,
    User { line: usize },
}

/// One `(direction, glob)` pair
#[derive(Debug, Clone)]
pub struct FilterRule {
    pub direction: Direction,
    pub pattern: GlobPattern,
    pub origin: FilterOrigin,
}

/// Ordered glob filters; the last matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    rules: Vec<FilterRule>,
}

impl FilterList {
    /// Parse `include:<glob>` / `exclude:<glob>` lines, preserving order.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let directive_error = || ScopeError::FilterDirective {
                line: idx + 1,
                directive: trimmed.to_string(),
            };
            let (direction, glob) = trimmed.split_once(':').ok_or_else(directive_error)?;
            let direction = match direction.trim() {
                "include" => Direction::Include,
                "exclude" => Direction::Exclude,
                _ => return Err(directive_error()),
            };
            if glob.trim().is_empty() {
                return Err(directive_error());
            }
            rules.push(FilterRule {
                direction,
                pattern: GlobPattern::anchored(glob)?,
                origin: FilterOrigin::User { line: idx + 1 },
            });
        }
        Ok(Self { rules })
    }

    /// The built-in defaults.
    pub fn defaults() -> Self {
        let rules = DEFAULT_FILTERS
            .iter()
            .filter_map(|(direction, raw)| {
                GlobPattern::anywhere(raw).ok().map(|pattern| FilterRule {
                    direction: *direction,
                    pattern,
                    origin: FilterOrigin::Builtin,
                })
            })
            .collect();
        Self { rules }
    }

    /// Append `later`; its rules take precedence over ours.
    pub fn then(mut self, later: FilterList) -> Self {
        self.rules.extend(later.rules);
        self
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The last rule matching `path` or one of its ancestor directories.
    pub fn resolve(&self, path: &RelPath) -> Option<&FilterRule> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.matches_or_contains(path))
    }
}

// ============================================================================
// TypeScript mode
// ============================================================================

/// Whether TypeScript files are eligible at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeScriptMode {
    /// Setting absent: eligible
    #[default]
    Default,
    /// `basic`: eligible, including the variant extensions
    Basic,
    /// `none`: never eligible
    None,
}

impl TypeScriptMode {
    /// Parse the optional setting value. An unrecognized value is an error.
    pub fn from_setting(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(TypeScriptMode::Default),
            Some(v) => v.parse(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, TypeScriptMode::None)
    }
}

impl FromStr for TypeScriptMode {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(TypeScriptMode::Basic),
            "none" => Ok(TypeScriptMode::None),
            _ => Err(ScopeError::InvalidSetting {
                name: ENV_TYPESCRIPT,
                value: s.to_string(),
                expected: "'basic' or 'none'",
            }),
        }
    }
}

// ============================================================================
// Rule set
// ============================================================================

/// Everything compiled from the string settings, immutable for one run
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub path_lists: PathLists,
    pub filters: FilterList,
    pub typescript: TypeScriptMode,
}

impl RuleSet {
    /// Compile the settings against the (canonical) source root.
    pub fn compile(settings: &IndexSettings, root: &Path) -> Result<Self> {
        let typescript = TypeScriptMode::from_setting(settings.typescript.as_deref())?;
        let path_lists = PathLists::parse(
            settings.include.as_deref().unwrap_or(""),
            settings.exclude.as_deref().unwrap_or(""),
            root,
        )?;
        let user_filters = FilterList::parse(settings.filters.as_deref().unwrap_or(""))?;

        Ok(Self {
            path_lists,
            filters: FilterList::defaults().then(user_filters),
            typescript,
        })
    }
}
