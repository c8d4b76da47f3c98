//! Filescope - Source File Selection
//!
//! Decides, for a source tree, exactly which files are handed to extraction.
//! The decision is a pure function of the tree, the configured rules and an
//! optional folder classification table.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ IndexSettings│────▶│   RuleSet    │──┐
//! └──────────────┘     └──────────────┘  │   ┌──────────────────┐
//! ┌──────────────┐     ┌──────────────┐  ├──▶│ EligibilityEngine│
//! │ folders CSV  │────▶│Classification│──┘   └────────┬─────────┘
//! └──────────────┘     └──────────────┘               │ verdicts
//!                      ┌──────────────┐      ┌────────▼─────────┐
//!                      │  TreeWalker  │◀────▶│     Selector     │──▶ files
//!                      └──────────────┘      └──────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Path list**: include/exclude root-relative paths; the deepest covering entry wins
//! - **Filter**: ordered `include:`/`exclude:` globs; the last match wins
//! - **Classification**: folder tags; `external` and `metadata` are out by default
//! - **Base eligibility**: recognized file types, gated by the TypeScript mode

pub mod classification;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod externs;
pub mod patterns;
pub mod rules;
pub mod selector;
pub mod types;
pub mod walker;

// Re-exports for convenience
pub use classification::{Classification, ClassificationEntry, ClassificationIndex};
pub use config::{IndexSettings, SelectorConfig};
pub use eligibility::{Decision, EligibilityEngine, FileType, Reason};
pub use error::{Diagnostic, Result, ScopeError};
pub use patterns::{Anchoring, GlobPattern};
pub use rules::{FilterList, FilterOrigin, FilterRule, PathListRule, PathLists, RuleSet, TypeScriptMode};
pub use selector::{Selection, Selector};
pub use types::{Direction, EntryKind, RelPath, SourceRoot};
pub use walker::{TreeWalker, VisitedSet, WalkEntry, WalkReport, WalkStats, WalkVisitor};
