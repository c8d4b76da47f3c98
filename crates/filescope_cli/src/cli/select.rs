//! `filescope select` - list the files to extract

use crate::cli::error::HelpfulError;
use crate::cli::SettingsArgs;
use clap::Args;
use filescope::config::ENV_SOURCE_ROOT;
use filescope::{Selection, Selector};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Root of the source tree
    #[arg(env = ENV_SOURCE_ROOT)]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SelectArgs) -> anyhow::Result<()> {
    let root = args.root.clone().ok_or_else(HelpfulError::missing_root)?;
    let config = args.settings.to_config(root)?;
    let selector = Selector::new(&config).map_err(|e| HelpfulError::from_scope(&e))?;
    let selection = selector.select();

    for diag in &selection.diagnostics {
        warn!(path = %diag.path, "{}", diag.message);
    }

    if args.json {
        output_json(&selection)
    } else {
        output_paths(&selection)
    }
}

fn output_json(selection: &Selection) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(selection)?;
    println!("{}", json);
    Ok(())
}

fn output_paths(selection: &Selection) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for file in &selection.files {
        writeln!(out, "{}", file.display())?;
    }
    out.flush()?;
    Ok(())
}
