//! Depth-first traversal of the source root
//!
//! Symlinks are followed. Every entry is identified by its canonical path,
//! which drives cycle detection and the root-relative path handed to the
//! visitor. Dead links, cycles, hidden entries and targets outside the root
//! are skipped and counted, never raised.

use crate::eligibility::LINT_CONFIG_NAMES;
use crate::error::Diagnostic;
use crate::types::{EntryKind, RelPath, SourceRoot};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One directory or file reached by the walk
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path as reached, possibly through symlinks
    pub path: PathBuf,
    /// Fully resolved path
    pub canonical: PathBuf,
    /// Canonical path relative to the canonical root
    pub rel: RelPath,
    pub kind: EntryKind,
    pub via_symlink: bool,
}

/// Receives the walk's entries and decides descent
pub trait WalkVisitor {
    /// Called for every directory, the root included. Return `false` to prune it.
    fn enter_dir(&mut self, entry: &WalkEntry) -> bool;

    fn visit_file(&mut self, entry: &WalkEntry);
}

/// Canonical identities of the directories entered so far
#[derive(Debug, Default)]
pub struct VisitedSet {
    dirs: HashSet<PathBuf>,
}

impl VisitedSet {
    pub fn contains(&self, canonical: &Path) -> bool {
        self.dirs.contains(canonical)
    }

    /// Returns `false` if the directory was already present.
    pub fn insert(&mut self, canonical: PathBuf) -> bool {
        self.dirs.insert(canonical)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// Counters for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub dirs_entered: usize,
    pub dirs_pruned: usize,
    pub files_seen: usize,
    pub dead_links: usize,
    pub cycles: usize,
    pub hidden_skipped: usize,
    pub outside_root: usize,
    pub errors: usize,
}

/// Result of a walk
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub stats: WalkStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks a source root, handing entries to a visitor
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: SourceRoot,
}

impl TreeWalker {
    pub fn new(root: SourceRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    pub fn walk<V: WalkVisitor>(&self, visitor: &mut V) -> WalkReport {
        let mut report = WalkReport::default();
        let mut visited = VisitedSet::default();

        let mut it = WalkDir::new(&self.root.canonical)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        loop {
            let entry = match it.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    self.record_error(err, &mut report);
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            let skip = |it: &mut walkdir::IntoIter| {
                if is_dir {
                    it.skip_current_dir();
                }
            };

            let canonical = match entry.path().canonicalize() {
                Ok(path) => path,
                Err(e) => {
                    if is_dead_link(entry.path()) {
                        debug!(path = %entry.path().display(), "Skipping dead link");
                        report.stats.dead_links += 1;
                    } else {
                        warn!(path = %entry.path().display(), error = %e, "Cannot resolve entry");
                        report.stats.errors += 1;
                        report.diagnostics.push(Diagnostic::new(
                            entry.path().display().to_string(),
                            format!("cannot resolve: {}", e),
                        ));
                    }
                    skip(&mut it);
                    continue;
                }
            };

            let rel = match canonical
                .strip_prefix(&self.root.canonical)
                .ok()
                .and_then(RelPath::from_path)
            {
                Some(rel) => rel,
                None => {
                    debug!(path = %entry.path().display(), target = %canonical.display(), "Skipping target outside root");
                    report.stats.outside_root += 1;
                    skip(&mut it);
                    continue;
                }
            };

            if is_dir && visited.contains(&canonical) {
                debug!(path = %entry.path().display(), "Skipping directory already visited");
                report.stats.cycles += 1;
                skip(&mut it);
                continue;
            }

            if entry.depth() > 0 && is_hidden(entry.path(), &canonical, is_dir) {
                report.stats.hidden_skipped += 1;
                skip(&mut it);
                continue;
            }

            let walk_entry = WalkEntry {
                path: entry.path().to_path_buf(),
                canonical,
                rel,
                kind: if is_dir { EntryKind::Dir } else { EntryKind::File },
                via_symlink: entry.path_is_symlink(),
            };

            if is_dir {
                if visitor.enter_dir(&walk_entry) {
                    visited.insert(walk_entry.canonical);
                    report.stats.dirs_entered += 1;
                } else {
                    report.stats.dirs_pruned += 1;
                    it.skip_current_dir();
                }
            } else {
                report.stats.files_seen += 1;
                visitor.visit_file(&walk_entry);
            }
        }

        debug!(
            dirs = report.stats.dirs_entered,
            files = report.stats.files_seen,
            visited = visited.len(),
            "Walk complete"
        );
        report
    }

    fn record_error(&self, err: walkdir::Error, report: &mut WalkReport) {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        if err.loop_ancestor().is_some() {
            debug!(path = %path, "Skipping symlink cycle");
            report.stats.cycles += 1;
            return;
        }
        if err.path().map_or(false, is_dead_link) {
            debug!(path = %path, "Skipping dead link");
            report.stats.dead_links += 1;
            return;
        }

        let message = match err.io_error() {
            Some(io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
                "permission denied".to_string()
            }
            _ => err.to_string(),
        };
        warn!(path = %path, error = %message, "Skipping unreadable entry");
        report.stats.errors += 1;
        report.diagnostics.push(Diagnostic::new(path, message));
    }
}

/// The shallowest component of `rel` the walk would skip as hidden.
pub fn hidden_component(root: &SourceRoot, rel: &RelPath, kind: EntryKind) -> Option<RelPath> {
    let depth = rel.depth();
    let mut prefix = RelPath::root();
    for (idx, segment) in rel.segments().enumerate() {
        prefix = prefix.join(segment);
        let is_dir = idx + 1 < depth || kind == EntryKind::Dir;
        let path = root.canonical_path(&prefix);
        if is_hidden(&path, &path, is_dir) {
            return Some(prefix);
        }
    }
    None
}

fn is_dead_link(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
        && !path.exists()
}

fn hidden_name(path: &Path) -> Option<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| n.starts_with('.'))
}

/// Hidden by name or attribute, either as reached or as resolved.
/// Allow-listed configuration files are never hidden.
fn is_hidden(path: &Path, canonical: &Path, is_dir: bool) -> bool {
    let allowed = |name: &str| !is_dir && LINT_CONFIG_NAMES.contains(&name);
    let named = [path, canonical]
        .iter()
        .filter_map(|p| hidden_name(p))
        .any(|name| !allowed(name));
    if named {
        return true;
    }
    let allow_listed = !is_dir
        && canonical
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| LINT_CONFIG_NAMES.contains(&n));
    !allow_listed && has_hidden_attribute(canonical)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    path.metadata()
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}
