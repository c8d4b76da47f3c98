//! Extern definition files shipped with the distribution
//!
//! Every `.js` file below the externs directory is selected, independent of
//! the rules applied to the source tree.

use crate::error::Diagnostic;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collect the extern files under `dir`, sorted. A missing directory yields nothing.
pub fn collect_externs(dir: &Path) -> (Vec<PathBuf>, Vec<Diagnostic>) {
    let mut files = Vec::new();
    let mut diagnostics = Vec::new();

    if !dir.is_dir() {
        debug!(path = %dir.display(), "No externs directory");
        return (files, diagnostics);
    }

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable extern entry");
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                diagnostics.push(Diagnostic::new(path, e.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("js") {
            continue;
        }
        match entry.path().canonicalize() {
            Ok(path) => files.push(path),
            Err(e) => diagnostics.push(Diagnostic::new(
                entry.path().display().to_string(),
                format!("cannot resolve: {}", e),
            )),
        }
    }

    debug!(count = files.len(), "Collected externs");
    (files, diagnostics)
}
