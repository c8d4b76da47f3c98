//! The decision core
//!
//! A pure function of the compiled rules, the classification index and one
//! candidate path. Evaluation order:
//!
//! 1. A file whose type is switched off is excluded outright.
//! 2. Scope: the deepest covering path-list entry decides, and with no entry
//!    an include list narrows the default to "out". An `external` or
//!    `metadata` folder counts as an exclude entry at the folder's depth.
//!    Out is final.
//! 3. Inside scope, the last matching glob filter decides.
//! 4. Otherwise files fall back to their base type eligibility.
//!
//! Directories are pruned by a matching exclude filter or when out of scope,
//! unless an explicit include entry lies below them.

use crate::classification::{Classification, ClassificationIndex};
use crate::rules::{FilterOrigin, RuleSet, TypeScriptMode};
use crate::types::{Direction, EntryKind, RelPath};
use serde::Serialize;

/// File names recognized regardless of extension
pub const LINT_CONFIG_NAMES: &[&str] = &[
    ".eslintrc",
    ".eslintrc.json",
    ".eslintrc.yml",
    ".eslintrc.yaml",
    ".eslintrc.js",
    ".eslintrc.cjs",
];

const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "es6", "es"];
const HTML_EXTENSIONS: &[&str] = &["htm", "html", "xhtm", "xhtml", "vue"];
const YAML_EXTENSIONS: &[&str] = &["raml", "yaml", "yml"];
const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx"];
const TYPESCRIPT_VARIANT_EXTENSIONS: &[&str] = &["mts", "cts"];

/// Recognized file type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    JavaScript,
    Html,
    Yaml,
    TypeScript,
    PackageJson,
    LintConfig,
}

impl FileType {
    /// Detect the type of a file from its name. Case-sensitive.
    pub fn detect(file_name: &str, typescript: TypeScriptMode) -> Option<FileType> {
        if file_name == "package.json" {
            return Some(FileType::PackageJson);
        }
        if LINT_CONFIG_NAMES.contains(&file_name) {
            return Some(FileType::LintConfig);
        }
        let (_, ext) = file_name.rsplit_once('.')?;
        if JAVASCRIPT_EXTENSIONS.contains(&ext) {
            Some(FileType::JavaScript)
        } else if HTML_EXTENSIONS.contains(&ext) {
            Some(FileType::Html)
        } else if YAML_EXTENSIONS.contains(&ext) {
            Some(FileType::Yaml)
        } else if TYPESCRIPT_EXTENSIONS.contains(&ext)
            || (typescript == TypeScriptMode::Basic && TYPESCRIPT_VARIANT_EXTENSIONS.contains(&ext))
        {
            Some(FileType::TypeScript)
        } else {
            None
        }
    }

    /// True for every extension that belongs to TypeScript, whatever the mode.
    fn is_typescript_name(file_name: &str) -> bool {
        file_name.rsplit_once('.').map_or(false, |(_, ext)| {
            TYPESCRIPT_EXTENSIONS.contains(&ext) || TYPESCRIPT_VARIANT_EXTENSIONS.contains(&ext)
        })
    }
}

/// Why a verdict was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The file's language is switched off
    TypeDisabled,
    /// No filter applied and the file type is not recognized
    UnrecognizedType,
    /// The deepest path-list entry covering the path
    PathList { direction: Direction, rule: RelPath },
    /// An include list exists and no entry covers the path
    OutsideIncludes,
    /// A tagged folder at or above the path
    Classified {
        tag: Classification,
        folder: RelPath,
    },
    /// The last glob filter matching the path or an ancestor
    Filter {
        direction: Direction,
        pattern: String,
        origin: FilterOrigin,
    },
    /// No rule applies
    Default,
    /// Out of scope, but entered to reach an include entry below
    IncludeBelow,
    /// An enclosing directory is never entered
    AncestorPruned { dir: RelPath, reason: Box<Reason> },
    /// The path or an enclosing directory is hidden
    Hidden { entry: RelPath },
}

/// Verdict for one candidate path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub verdict: Direction,
    /// Directories only: whether traversal enters it
    pub descend: bool,
    pub reason: Reason,
}

impl Decision {
    fn file(verdict: Direction, reason: Reason) -> Self {
        Self {
            verdict,
            descend: false,
            reason,
        }
    }

    pub fn is_included(&self) -> bool {
        self.verdict.is_include()
    }
}

enum Scope {
    In(Reason),
    Out(Reason),
}

/// Combines the rule set and the classification index into verdicts
#[derive(Debug, Clone)]
pub struct EligibilityEngine {
    rules: RuleSet,
    classification: ClassificationIndex,
}

impl EligibilityEngine {
    pub fn new(rules: RuleSet, classification: ClassificationIndex) -> Self {
        Self {
            rules,
            classification,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classification(&self) -> &ClassificationIndex {
        &self.classification
    }

    pub fn decide(&self, path: &RelPath, kind: EntryKind) -> Decision {
        match kind {
            EntryKind::File => self.decide_file(path),
            EntryKind::Dir => self.decide_dir(path),
        }
    }

    /// Whether a file is selected.
    pub fn decide_file(&self, path: &RelPath) -> Decision {
        let name = path.file_name().unwrap_or("");
        let typescript = self.rules.typescript;

        if !typescript.is_enabled() && FileType::is_typescript_name(name) {
            return Decision::file(Direction::Exclude, Reason::TypeDisabled);
        }

        let scope_reason = match self.scope(path) {
            Scope::Out(reason) => return Decision::file(Direction::Exclude, reason),
            Scope::In(reason) => reason,
        };

        if let Some(filter) = self.rules.filters.resolve(path) {
            return Decision::file(
                filter.direction,
                Reason::Filter {
                    direction: filter.direction,
                    pattern: filter.pattern.as_str().to_string(),
                    origin: filter.origin,
                },
            );
        }

        match FileType::detect(name, typescript) {
            Some(_) => Decision::file(Direction::Include, scope_reason),
            None => Decision::file(Direction::Exclude, Reason::UnrecognizedType),
        }
    }

    /// Whether a directory is entered. The root is never matched by a filter.
    pub fn decide_dir(&self, path: &RelPath) -> Decision {
        if let Some(filter) = self.rules.filters.resolve(path) {
            if filter.direction == Direction::Exclude {
                return Decision {
                    verdict: Direction::Exclude,
                    descend: false,
                    reason: Reason::Filter {
                        direction: filter.direction,
                        pattern: filter.pattern.as_str().to_string(),
                        origin: filter.origin,
                    },
                };
            }
        }

        match self.scope(path) {
            Scope::In(reason) => Decision {
                verdict: Direction::Include,
                descend: true,
                reason,
            },
            Scope::Out(_) if self.rules.path_lists.has_include_below(path) => Decision {
                verdict: Direction::Exclude,
                descend: true,
                reason: Reason::IncludeBelow,
            },
            Scope::Out(reason) => Decision {
                verdict: Direction::Exclude,
                descend: false,
                reason,
            },
        }
    }

    /// Like `decide`, but also fails when a traversal would never reach the
    /// path because an enclosing directory, or the root, is pruned.
    pub fn decide_reachable(&self, path: &RelPath, kind: EntryKind) -> Decision {
        let mut enclosing: Vec<&str> = path.ancestors().skip(1).collect();
        enclosing.reverse();
        for dir in enclosing {
            let dir = RelPath::parse(dir).unwrap_or_default();
            let decision = self.decide_dir(&dir);
            if !decision.descend {
                return Decision::file(
                    Direction::Exclude,
                    Reason::AncestorPruned {
                        dir,
                        reason: Box::new(decision.reason),
                    },
                );
            }
        }
        self.decide(path, kind)
    }

    /// A tagged `external` or `metadata` folder acts as an exclude entry at
    /// its own depth: it loses only to a path-list entry at or below it.
    fn scope(&self, path: &RelPath) -> Scope {
        let path_lists = &self.rules.path_lists;
        let rule = path_lists.resolve(path);

        if let Some(hit) = self.classification.classify(path) {
            let outranked = rule.map_or(false, |r| r.path.depth() >= hit.folder.depth());
            if hit.tag.excludes_by_default() && !outranked {
                return Scope::Out(Reason::Classified {
                    tag: hit.tag.clone(),
                    folder: hit.folder,
                });
            }
        }

        if let Some(rule) = rule {
            let reason = Reason::PathList {
                direction: rule.direction,
                rule: rule.path.clone(),
            };
            return match rule.direction {
                Direction::Include => Scope::In(reason),
                Direction::Exclude => Scope::Out(reason),
            };
        }

        if path_lists.has_explicit_includes() {
            return Scope::Out(Reason::OutsideIncludes);
        }
        Scope::In(Reason::Default)
    }
}
