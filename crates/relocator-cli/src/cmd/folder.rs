use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use relocator_core::{locate, types::StatusDir};
use std::path::Path;

#[derive(Subcommand)]
pub enum FolderSubcommand {
    /// List project folders in a status directory
    List {
        /// inactive, rfps, current or completed (or the directory name)
        dir: String,
    },
}

pub fn run(root: &Path, subcmd: FolderSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FolderSubcommand::List { dir } => list(root, &dir, json),
    }
}

fn list(root: &Path, dir: &str, json: bool) -> anyhow::Result<()> {
    let dir: StatusDir = dir.parse()?;
    let names = locate::list_projects_in(root, dir)
        .with_context(|| format!("failed to list {dir}"))?;

    if json {
        print_json(&serde_json::json!({
            "dir": dir,
            "folders": names,
        }))?;
        return Ok(());
    }

    if names.is_empty() {
        println!("No project folders in {dir}.");
        return Ok(());
    }
    for name in &names {
        println!("{name}");
    }
    Ok(())
}
