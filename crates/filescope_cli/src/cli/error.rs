//! Helpful error types for CLI commands
//!
//! Every error includes what went wrong and, where one exists, a suggestion
//! for fixing the offending setting.

use filescope::config::{ENV_EXCLUDE, ENV_FILTERS, ENV_INCLUDE, ENV_SOURCE_ROOT};
use filescope::ScopeError;
use serde::Serialize;
use std::fmt;

/// An error with context and suggestions
#[derive(Debug, Serialize)]
pub struct HelpfulError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// No root on the command line and none in the environment
    pub fn missing_root() -> Self {
        Self::new("No source root given")
            .with_suggestion("TRY: Pass the root directory: filescope select <ROOT>")
            .with_suggestion(format!("TRY: Set {} to the root directory", ENV_SOURCE_ROOT))
    }

    /// Wrap a selection error, adding hints for configuration mistakes.
    pub fn from_scope(err: &ScopeError) -> Self {
        let base = Self::new(err.to_string());
        match err {
            ScopeError::FilterDirective { .. } => base
                .with_context(format!("While parsing {}", ENV_FILTERS))
                .with_suggestion("TRY: Write each filter as include:<glob> or exclude:<glob>"),
            ScopeError::Pattern { .. } => base
                .with_context(format!("While compiling {}", ENV_FILTERS))
                .with_suggestion("TRY: Check for unbalanced [ ] or { } in the glob"),
            ScopeError::InvalidSetting { .. } => base
                .with_suggestion("TRY: Leave the setting unset for the default behaviour"),
            ScopeError::PathOutsideRoot(_) => base
                .with_context(format!("While reading {} / {}", ENV_INCLUDE, ENV_EXCLUDE))
                .with_suggestion("TRY: Use paths relative to the source root"),
            ScopeError::RootNotFound(path) | ScopeError::RootNotDirectory(path) => base
                .with_suggestion(format!("TRY: Check the path exists: ls -la {}", path.display())),
            ScopeError::Io(_) | ScopeError::Config(_) => base,
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON document on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({ "error": helpful }),
        None => serde_json::json!({ "error": { "message": format!("{:#}", err) } }),
    };
    println!("{}", payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::from_scope(&ScopeError::FilterDirective {
            line: 2,
            directive: "keep:*.js".to_string(),
        });
        let display = err.to_string();
        assert!(display.contains("ERROR: Invalid filter on line 2"));
        assert!(display.contains("CONTEXT: While parsing LGTM_INDEX_FILTERS"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_missing_root() {
        let display = HelpfulError::missing_root().to_string();
        assert!(display.contains("LGTM_SRC"));
    }
}
