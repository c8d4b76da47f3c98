//! Repository folder classification
//!
//! Loads the externally produced `classification,path` table and answers
//! "which tag, if any, applies to this path or its closest tagged ancestor".
//! Rows that cannot be parsed or resolved are dropped with a diagnostic.

use crate::error::Diagnostic;
use crate::types::{absolutize, RelPath, SourceRoot};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Tag describing the provenance of a folder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    External,
    Metadata,
    ThirdParty,
    Generated,
    Library,
    Test,
    Documentation,
    Other(String),
}

impl Classification {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        match tag.to_ascii_lowercase().as_str() {
            "external" => Classification::External,
            "metadata" => Classification::Metadata,
            "thirdparty" => Classification::ThirdParty,
            "generated" => Classification::Generated,
            "library" => Classification::Library,
            "test" => Classification::Test,
            "documentation" => Classification::Documentation,
            _ => Classification::Other(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Classification::External => "external",
            Classification::Metadata => "metadata",
            Classification::ThirdParty => "thirdparty",
            Classification::Generated => "generated",
            Classification::Library => "library",
            Classification::Test => "test",
            Classification::Documentation => "documentation",
            Classification::Other(tag) => tag,
        }
    }

    /// Only `external` and `metadata` folders are left out unless explicitly included.
    pub fn excludes_by_default(&self) -> bool {
        matches!(self, Classification::External | Classification::Metadata)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One resolved row of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationEntry {
    pub tag: Classification,
    /// Absolute path as written (URI decoded, lexically normalized)
    pub written: PathBuf,
    /// Fully resolved path
    pub canonical: PathBuf,
}

impl ClassificationEntry {
    /// Resolve a raw path column. Bare paths and `file:` URIs are accepted.
    pub fn resolve(tag: Classification, raw_path: &str) -> Result<Self, String> {
        let raw_path = raw_path.trim();
        if raw_path.is_empty() {
            return Err("empty path".to_string());
        }
        let path = if raw_path.starts_with("file:") {
            let url = Url::parse(raw_path).map_err(|e| format!("invalid URI: {}", e))?;
            url.to_file_path()
                .map_err(|_| "URI does not name a local file".to_string())?
        } else {
            PathBuf::from(raw_path)
        };
        let written = absolutize(&path).map_err(|e| format!("cannot absolutize: {}", e))?;
        let canonical = written
            .canonicalize()
            .map_err(|e| format!("cannot resolve: {}", e))?;
        Ok(Self {
            tag,
            written,
            canonical,
        })
    }
}

/// The tagged ancestor found for a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAncestor<'a> {
    pub tag: &'a Classification,
    /// The tagged folder, relative to the source root
    pub folder: RelPath,
}

#[derive(Debug, Deserialize)]
struct FolderRecord {
    classification: String,
    path: String,
}

/// Classification lookups bound to one source root
#[derive(Debug, Clone)]
pub struct ClassificationIndex {
    root: SourceRoot,
    canonical: HashMap<PathBuf, Classification>,
    written: HashMap<PathBuf, Classification>,
}

impl ClassificationIndex {
    pub fn empty(root: SourceRoot) -> Self {
        Self {
            root,
            canonical: HashMap::new(),
            written: HashMap::new(),
        }
    }

    /// Load a CSV file. A missing or unreadable file yields an empty index.
    pub fn load(csv_path: &Path, root: SourceRoot) -> (Self, Vec<Diagnostic>) {
        match std::fs::File::open(csv_path) {
            Ok(file) => Self::from_reader(file, root),
            Err(e) => {
                warn!(path = %csv_path.display(), error = %e, "Cannot read repository folders table");
                let diag = Diagnostic::new(
                    csv_path.display().to_string(),
                    format!("cannot read classification table: {}", e),
                );
                (Self::empty(root), vec![diag])
            }
        }
    }

    /// Parse CSV rows with a `classification,path` header.
    pub fn from_reader<R: io::Read>(reader: R, root: SourceRoot) -> (Self, Vec<Diagnostic>) {
        let mut index = Self::empty(root);
        let mut diagnostics = Vec::new();

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let has_columns = rdr
            .headers()
            .map(|h| h.iter().any(|c| c == "classification") && h.iter().any(|c| c == "path"))
            .unwrap_or(false);
        if !has_columns {
            warn!("Repository folders table has no classification,path header");
            diagnostics.push(Diagnostic::new(
                "<header>",
                "expected a 'classification,path' header",
            ));
            return (index, diagnostics);
        }

        for result in rdr.deserialize::<FolderRecord>() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    warn!(line, error = %e, "Skipping malformed classification row");
                    diagnostics.push(Diagnostic::new(
                        format!("<line {}>", line),
                        format!("malformed row: {}", e),
                    ));
                    continue;
                }
            };

            let tag = Classification::parse(&record.classification);
            match ClassificationEntry::resolve(tag, &record.path) {
                Ok(entry) => index.insert(entry),
                Err(message) => {
                    warn!(path = %record.path, reason = %message, "Ignoring classification entry");
                    diagnostics.push(Diagnostic::new(record.path, message));
                }
            }
        }

        debug!(entries = index.len(), "Loaded classification index");
        (index, diagnostics)
    }

    /// Add an entry. The first entry for a path wins.
    pub fn insert(&mut self, entry: ClassificationEntry) {
        self.written
            .entry(entry.written)
            .or_insert_with(|| entry.tag.clone());
        self.canonical.entry(entry.canonical).or_insert(entry.tag);
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    /// Closest tagged folder at or above `path`, never looking above the root.
    pub fn classify(&self, path: &RelPath) -> Option<ClassifiedAncestor<'_>> {
        if self.canonical.is_empty() {
            return None;
        }
        for ancestor in path.ancestors() {
            let folder = RelPath::parse(ancestor).unwrap_or_default();
            let tag = self
                .canonical
                .get(&self.root.canonical_path(&folder))
                .or_else(|| self.written.get(&self.root.given_path(&folder)));
            if let Some(tag) = tag {
                return Some(ClassifiedAncestor { tag, folder });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SourceRoot) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("foo").join("bar")).unwrap();
        fs::create_dir_all(src.join("node_modules").join("leftpad")).unwrap();
        fs::create_dir_all(src.join(".git")).unwrap();
        let root = SourceRoot::resolve(&src).unwrap();
        (temp, root)
    }

    fn rel(s: &str) -> RelPath {
        RelPath::parse(s).unwrap()
    }

    #[test]
    fn test_tags() {
        assert_eq!(Classification::parse(" External "), Classification::External);
        assert_eq!(Classification::parse("thirdparty"), Classification::ThirdParty);
        assert_eq!(
            Classification::parse(" Vendored-Docs "),
            Classification::Other("Vendored-Docs".to_string())
        );
        assert!(Classification::External.excludes_by_default());
        assert!(Classification::Metadata.excludes_by_default());
        assert!(!Classification::ThirdParty.excludes_by_default());
        assert!(!Classification::Other("x".to_string()).excludes_by_default());
    }

    #[test]
    fn test_load_bare_paths_and_uris() {
        let (_temp, root) = setup();
        let bar_uri = Url::from_directory_path(root.canonical.join("foo").join("bar")).unwrap();
        let csv = format!(
            "classification,path\nthirdparty,{}\nexternal,{}\nmetadata,{}\n",
            root.canonical.join("node_modules").display(),
            bar_uri,
            root.canonical.join(".git").display(),
        );

        let (index, diagnostics) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(index.len(), 3);

        let hit = index.classify(&rel("foo/bar/tst.js")).unwrap();
        assert_eq!(hit.tag, &Classification::External);
        assert_eq!(hit.folder, rel("foo/bar"));
        assert_eq!(
            index.classify(&rel("node_modules/leftpad/index.js")).unwrap().tag,
            &Classification::ThirdParty
        );
        assert_eq!(index.classify(&rel(".git")).unwrap().tag, &Classification::Metadata);
        assert!(index.classify(&rel("foo/tst.js")).is_none());
        assert!(index.classify(&rel("tst.js")).is_none());
    }

    #[test]
    fn test_closest_ancestor_wins() {
        let (_temp, root) = setup();
        let csv = format!(
            "classification,path\nexternal,{}\ngenerated,{}\n",
            root.canonical.join("foo").display(),
            root.canonical.join("foo").join("bar").display(),
        );
        let (index, _) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert_eq!(
            index.classify(&rel("foo/bar/x.js")).unwrap().tag,
            &Classification::Generated
        );
        assert_eq!(index.classify(&rel("foo/x.js")).unwrap().tag, &Classification::External);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let (_temp, root) = setup();
        let csv = format!(
            "classification,path\nexternal,no-such-path\nexternal,\nexternal,file://remotehost/share\nmetadata,{}\n",
            root.canonical.join(".git").display(),
        );
        let (index, diagnostics) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert_eq!(index.len(), 1);
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].path, "no-such-path");
    }

    #[test]
    fn test_missing_header() {
        let (_temp, root) = setup();
        let csv = "tag,folder\nexternal,/tmp\n";
        let (index, diagnostics) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert!(index.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let (temp, root) = setup();
        let (index, diagnostics) =
            ClassificationIndex::load(&temp.path().join("repositoryFolders.csv"), root);
        assert!(index.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_lookup_never_climbs_above_root() {
        let (temp, root) = setup();
        let csv = format!("classification,path\nexternal,{}\n", temp.path().display());
        let (index, _) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert_eq!(index.len(), 1);
        assert!(index.classify(&rel("foo/bar/x.js")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_entries_through_symlinked_root() {
        // Table written against a symlinked spelling of the root still applies.
        let (temp, root) = setup();
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(&root.canonical, &alias).unwrap();

        let csv = format!("classification,path\nexternal,{}\n", alias.join("foo").display());
        let (index, diagnostics) = ClassificationIndex::from_reader(csv.as_bytes(), root);
        assert!(diagnostics.is_empty());
        assert_eq!(index.classify(&rel("foo/tst.js")).unwrap().tag, &Classification::External);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_spelling_matches_given_root() {
        let (temp, _) = setup();
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(temp.path().join("src"), &alias).unwrap();
        let root = SourceRoot::resolve(&alias).unwrap();
        assert_ne!(root.canonical, root.given);

        let entry = ClassificationEntry::resolve(
            Classification::Metadata,
            &alias.join(".git").display().to_string(),
        )
        .unwrap();
        assert_eq!(entry.written, alias.join(".git"));

        let mut index = ClassificationIndex::empty(root);
        index.insert(ClassificationEntry {
            // Canonical side deliberately unmatched: only the written form can hit.
            canonical: PathBuf::from("/nonexistent/.git"),
            ..entry
        });
        assert_eq!(index.classify(&rel(".git/config")).unwrap().tag, &Classification::Metadata);
    }
}
