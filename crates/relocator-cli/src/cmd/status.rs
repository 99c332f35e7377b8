use crate::output::{emit, print_json, print_warnings};
use crate::prompt::StdinConfirm;
use anyhow::{bail, Context};
use clap::Subcommand;
use relocator_core::{
    config::Config,
    db::RelocatorDb,
    locate,
    relocate::{AutoConfirm, Confirm, Relocator},
    types::{ProjectNumber, Status, StatusDir},
    RelocateError,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum StatusSubcommand {
    /// Set a project's status, moving its folder if the status directory changes
    Set {
        number: String,
        /// draft, sent, awarded, active, on_hold, completed, lost or cancelled
        status: String,
        /// Don't ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(root: &Path, subcmd: StatusSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StatusSubcommand::Set {
            number,
            status,
            yes,
        } => {
            let number = ProjectNumber::parse(&number)?;
            let status: Status = status.parse()?;
            change(root, &number, status, yes, json)
        }
    }
}

pub fn archive(root: &Path, number: &str, yes: bool, json: bool) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    change(root, &number, Status::Completed, yes, json)
}

/// Move an RFP out of `01 RFPs`: `current` marks it active, `archive`
/// completed and `inactive` cancelled.
pub fn promote(
    root: &Path,
    number: &str,
    destination: &str,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    let status = match destination.to_lowercase().as_str() {
        "current" => Status::Active,
        "archive" | "completed" => Status::Completed,
        "inactive" => Status::Cancelled,
        other => bail!("unknown destination '{other}': expected current, archive or inactive"),
    };

    let location = locate::find_project_folder(root, &number)?;
    match location.location {
        Some(StatusDir::Rfps) => {}
        Some(dir) => bail!("project {number} is in {dir}, not {}", StatusDir::Rfps),
        None => bail!("project folder {number} not found"),
    }

    change(root, &number, status, yes, json)
}

fn change(
    root: &Path,
    number: &ProjectNumber,
    to: Status,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let db = RelocatorDb::open_root(root).context("failed to open database")?;

    let mut gate: Box<dyn Confirm> = if yes || !config.confirm_moves {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm)
    };

    let relocation = match Relocator::new(root, &config, &db).change_status(number, to, gate.as_mut())
    {
        Ok(r) => r,
        Err(RelocateError::UserCancelled) => {
            if json {
                print_json(&serde_json::json!({ "number": number, "cancelled": true }))?;
            } else {
                println!("Cancelled. {number} is unchanged.");
            }
            return Ok(());
        }
        Err(e @ RelocateError::PartialFailure { .. }) => {
            return Err(e).context("run 'relocator recover' to finish the status change");
        }
        Err(e) => return Err(e).with_context(|| format!("failed to set {number} to {to}")),
    };

    emit(json, &relocation, |r| {
        println!("{}", r.message());
        print_warnings(&r.warnings);
    })
}
