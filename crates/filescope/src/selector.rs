//! Selection orchestrator
//!
//! Compiles the configuration once, then drives the walker with the
//! eligibility engine and gathers the selected files.

use crate::classification::ClassificationIndex;
use crate::config::SelectorConfig;
use crate::eligibility::{Decision, EligibilityEngine, Reason};
use crate::error::{Diagnostic, Result, ScopeError};
use crate::externs::collect_externs;
use crate::rules::RuleSet;
use crate::types::{absolutize, Direction, EntryKind, RelPath, SourceRoot};
use crate::walker::{hidden_component, TreeWalker, WalkEntry, WalkStats, WalkVisitor};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of one selection run
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Canonical source root
    pub root: PathBuf,
    /// Absolute paths to extract, sorted and unique
    pub files: Vec<PathBuf>,
    /// How many of `files` came from the externs directory
    pub externs: usize,
    pub stats: WalkStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// A compiled, reusable selection for one root
#[derive(Debug, Clone)]
pub struct Selector {
    root: SourceRoot,
    engine: EligibilityEngine,
    externs_dir: Option<PathBuf>,
    setup_diagnostics: Vec<Diagnostic>,
}

impl Selector {
    /// Validate the root and compile every rule. Configuration errors surface here.
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        let root = SourceRoot::resolve(&config.root)?;
        let rules = RuleSet::compile(&config.settings, &root.canonical)?;

        let (classification, setup_diagnostics) = match &config.settings.repository_folders_csv {
            Some(csv) => ClassificationIndex::load(csv, root.clone()),
            None => (ClassificationIndex::empty(root.clone()), Vec::new()),
        };

        info!(
            root = %root.canonical.display(),
            path_rules = rules.path_lists.rules().len(),
            filters = rules.filters.rules().len(),
            typescript = ?rules.typescript,
            classified = classification.len(),
            "Selector ready"
        );

        Ok(Self {
            root,
            engine: EligibilityEngine::new(rules, classification),
            externs_dir: config.externs_dir.clone(),
            setup_diagnostics,
        })
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    /// Walk the root and return every selected file.
    pub fn select(&self) -> Selection {
        let mut visitor = SelectingVisitor {
            engine: &self.engine,
            files: BTreeSet::new(),
        };
        let report = TreeWalker::new(self.root.clone()).walk(&mut visitor);
        let mut files = visitor.files;

        let mut diagnostics = self.setup_diagnostics.clone();
        diagnostics.extend(report.diagnostics);

        let mut externs = 0;
        if let Some(dir) = &self.externs_dir {
            let (extern_files, extern_diagnostics) = collect_externs(dir);
            diagnostics.extend(extern_diagnostics);
            for file in extern_files {
                if files.insert(file) {
                    externs += 1;
                }
            }
        }

        info!(
            files = files.len(),
            externs,
            dirs = report.stats.dirs_entered,
            pruned = report.stats.dirs_pruned,
            diagnostics = diagnostics.len(),
            "Selection complete"
        );

        Selection {
            root: self.root.canonical.clone(),
            files: files.into_iter().collect(),
            externs,
            stats: report.stats,
            diagnostics,
        }
    }

    /// Decision for one path without walking, agreeing with `select`.
    ///
    /// `path` may be absolute or relative to the root. An existing directory is
    /// judged as a directory, anything else as a file. Hidden components and
    /// pruned ancestors exclude the path just as they do during a walk.
    pub fn explain(&self, path: &Path) -> Result<Decision> {
        let rel = self.relativize(path)?;
        let kind = if self.root.canonical_path(&rel).is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        if let Some(entry) = hidden_component(&self.root, &rel, kind) {
            return Ok(Decision {
                verdict: Direction::Exclude,
                descend: false,
                reason: Reason::Hidden { entry },
            });
        }
        Ok(self.engine.decide_reachable(&rel, kind))
    }

    /// Root-relative form of `path`, resolving symlinks when it exists.
    pub fn relativize(&self, path: &Path) -> Result<RelPath> {
        let outside = || ScopeError::PathOutsideRoot(path.display().to_string());
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let rel = RelPath::from_path(path).ok_or_else(outside)?;
            self.root.canonical_path(&rel)
        };
        let resolved = match absolute.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => absolutize(&absolute)?,
        };
        self.root.relativize(&resolved).ok_or_else(outside)
    }
}

struct SelectingVisitor<'a> {
    engine: &'a EligibilityEngine,
    files: BTreeSet<PathBuf>,
}

impl WalkVisitor for SelectingVisitor<'_> {
    fn enter_dir(&mut self, entry: &WalkEntry) -> bool {
        let decision = self.engine.decide_dir(&entry.rel);
        if !decision.descend {
            debug!(path = %entry.rel, reason = ?decision.reason, "Pruned directory");
        }
        decision.descend
    }

    fn visit_file(&mut self, entry: &WalkEntry) {
        let decision = self.engine.decide_file(&entry.rel);
        if decision.is_included() {
            self.files.insert(entry.canonical.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        temp
    }

    #[test]
    fn test_root_errors() {
        let temp = tree(&["a.js"]);
        let missing = SelectorConfig::new(temp.path().join("nope"), IndexSettings::default());
        assert!(matches!(Selector::new(&missing), Err(ScopeError::RootNotFound(_))));

        let file = SelectorConfig::new(temp.path().join("a.js"), IndexSettings::default());
        assert!(matches!(Selector::new(&file), Err(ScopeError::RootNotDirectory(_))));
    }

    #[test]
    fn test_config_errors_abort_before_walking() {
        let temp = tree(&["a.js"]);
        let settings = IndexSettings {
            filters: Some("**/*.js".to_string()),
            ..Default::default()
        };
        let err = Selector::new(&SelectorConfig::new(temp.path(), settings)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_csv_is_a_diagnostic() {
        let temp = tree(&["a.js"]);
        let settings = IndexSettings {
            repository_folders_csv: Some(temp.path().join("missing.csv")),
            ..Default::default()
        };
        let selector = Selector::new(&SelectorConfig::new(temp.path(), settings)).unwrap();
        let selection = selector.select();
        assert_eq!(selection.files.len(), 1);
        assert_eq!(selection.diagnostics.len(), 1);
    }

    #[test]
    fn test_externs_are_added() {
        let temp = tree(&["src/a.js", "dist/tools/data/externs/es5.js", "dist/tools/data/externs/x.txt"]);
        let config = SelectorConfig::new(temp.path().join("src"), IndexSettings::default())
            .with_externs_dir(temp.path().join("dist/tools/data/externs"));
        let selection = Selector::new(&config).unwrap().select();
        assert_eq!(selection.files.len(), 2);
        assert_eq!(selection.externs, 1);
    }

    #[test]
    fn test_explain() {
        let temp = tree(&["a.js", "a.json", "node_modules/dep/index.js"]);
        let settings = IndexSettings {
            exclude: Some("node_modules".to_string()),
            ..Default::default()
        };
        let selector = Selector::new(&SelectorConfig::new(temp.path(), settings)).unwrap();

        let decision = selector.explain(Path::new("a.js")).unwrap();
        assert_eq!(decision.verdict, Direction::Include);
        assert_eq!(decision.reason, Reason::Default);

        let decision = selector.explain(&temp.path().join("node_modules")).unwrap();
        assert!(!decision.descend);

        let decision = selector.explain(Path::new("./not/there.js")).unwrap();
        assert_eq!(decision.verdict, Direction::Include);

        assert!(matches!(
            selector.explain(Path::new("../escape.js")),
            Err(ScopeError::PathOutsideRoot(_))
        ));
    }

    #[test]
    fn test_explain_agrees_with_select() {
        let temp = tree(&[
            "a.js",
            "tst.json",
            "node_modules/leftpad/tst.json",
            ".github/ci.js",
            ".eslintrc.json",
        ]);
        let settings = IndexSettings {
            filters: Some("exclude:**/node_modules\ninclude:**/*.json".to_string()),
            ..Default::default()
        };
        let selector = Selector::new(&SelectorConfig::new(temp.path(), settings)).unwrap();
        let selection = selector.select();

        for rel in [
            "a.js",
            "tst.json",
            "node_modules/leftpad/tst.json",
            ".github/ci.js",
            ".eslintrc.json",
        ] {
            let selected = selection.files.contains(&selector.root().canonical.join(rel));
            let decision = selector.explain(Path::new(rel)).unwrap();
            assert_eq!(decision.is_included(), selected, "{}", rel);
        }

        let nested = selector.explain(Path::new("node_modules/leftpad/tst.json")).unwrap();
        assert!(matches!(nested.reason, Reason::AncestorPruned { ref dir, .. } if dir.as_str() == "node_modules"));
        let hidden = selector.explain(Path::new(".github/ci.js")).unwrap();
        assert_eq!(
            hidden.reason,
            Reason::Hidden {
                entry: RelPath::parse(".github").unwrap()
            }
        );
    }
}
