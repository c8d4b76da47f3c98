//! `filescope explain` - show why paths are selected or not

use crate::cli::error::HelpfulError;
use crate::cli::SettingsArgs;
use clap::Args;
use filescope::config::ENV_SOURCE_ROOT;
use filescope::{Decision, Reason, RelPath, Selector};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    /// Paths to explain, absolute or relative to the root
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Root of the source tree
    #[arg(long, env = ENV_SOURCE_ROOT)]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Explanation {
    path: RelPath,
    #[serde(flatten)]
    decision: Decision,
}

pub fn run(args: ExplainArgs) -> anyhow::Result<()> {
    let root = args.root.clone().ok_or_else(HelpfulError::missing_root)?;
    let config = args.settings.to_config(root)?;
    let selector = Selector::new(&config).map_err(|e| HelpfulError::from_scope(&e))?;

    let mut explanations = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let rel = selector
            .relativize(path)
            .map_err(|e| HelpfulError::from_scope(&e))?;
        let decision = selector.explain(path).map_err(|e| HelpfulError::from_scope(&e))?;
        explanations.push(Explanation { path: rel, decision });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&explanations)?);
    } else {
        for explanation in &explanations {
            println!("{}", format_explanation(explanation));
        }
    }
    Ok(())
}

fn format_explanation(explanation: &Explanation) -> String {
    let decision = &explanation.decision;
    let descend = if decision.descend { " (descend)" } else { "" };
    format!(
        "{}: {}{} - {}",
        explanation.path,
        decision.verdict,
        descend,
        describe(&decision.reason)
    )
}

fn describe(reason: &Reason) -> String {
    match reason {
        Reason::TypeDisabled => "language switched off".to_string(),
        Reason::UnrecognizedType => "file type not recognized".to_string(),
        Reason::PathList { direction, rule } => format!("{} path {}", direction, rule),
        Reason::OutsideIncludes => "not under any include path".to_string(),
        Reason::Classified { tag, folder } => format!("folder {} classified as {}", folder, tag),
        Reason::Filter {
            direction,
            pattern,
            origin,
        } => match origin {
            filescope::FilterOrigin::Builtin => format!("built-in filter {}:{}", direction, pattern),
            filescope::FilterOrigin::User { line } => {
                format!("filter {}:{} (line {})", direction, pattern, line)
            }
        },
        Reason::Default => "no rule applies".to_string(),
        Reason::IncludeBelow => "entered for an include path below".to_string(),
        Reason::AncestorPruned { dir, reason } => {
            format!("directory {} is not entered: {}", dir, describe(reason))
        }
        Reason::Hidden { entry } => format!("{} is hidden", entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filescope::{Direction, FilterOrigin};

    #[test]
    fn test_format_explanation() {
        let explanation = Explanation {
            path: RelPath::parse("lib/jquery.min.js").unwrap(),
            decision: Decision {
                verdict: Direction::Exclude,
                descend: false,
                reason: Reason::Filter {
                    direction: Direction::Exclude,
                    pattern: "*.min.js".to_string(),
                    origin: FilterOrigin::Builtin,
                },
            },
        };
        assert_eq!(
            format_explanation(&explanation),
            "lib/jquery.min.js: exclude - built-in filter exclude:*.min.js"
        );
    }

    #[test]
    fn test_format_pruned_ancestor() {
        let explanation = Explanation {
            path: RelPath::parse("node_modules/leftpad/tst.json").unwrap(),
            decision: Decision {
                verdict: Direction::Exclude,
                descend: false,
                reason: Reason::AncestorPruned {
                    dir: RelPath::parse("node_modules").unwrap(),
                    reason: Box::new(Reason::Filter {
                        direction: Direction::Exclude,
                        pattern: "**/node_modules".to_string(),
                        origin: FilterOrigin::User { line: 1 },
                    }),
                },
            },
        };
        assert_eq!(
            format_explanation(&explanation),
            "node_modules/leftpad/tst.json: exclude - directory node_modules is not entered: \
             filter exclude:**/node_modules (line 1)"
        );
    }
}
