use crate::output::{emit, print_json, print_table};
use anyhow::Context;
use relocator_core::{
    db::RelocatorDb,
    reconcile::{self, FolderState, RepairAction},
    recovery::{self, RecoveryReport, Resolution},
};
use std::path::Path;

pub fn run(root: &Path, repair: bool, json: bool) -> anyhow::Result<()> {
    let db = RelocatorDb::open_root(root).context("failed to open database")?;

    if repair {
        let report = reconcile::repair(root, &db).context("repair failed")?;
        if json {
            return print_json(&report);
        }
        print_recovery(&report.recovery);
        if report.actions.is_empty() {
            println!("Nothing to repair.");
        }
        for action in &report.actions {
            match action {
                RepairAction::Moved { number, to, .. } => {
                    println!("moved    {number} -> {}", to.display())
                }
                RepairAction::Skipped { number, reason } => {
                    println!("skipped  {number}: {reason}")
                }
            }
        }
        return Ok(());
    }

    let report = reconcile::check(root, &db).context("reconcile failed")?;
    if json {
        return print_json(&report);
    }

    if report.is_clean() {
        println!("All {} projects are where their status says.", report.projects.len());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = report
        .problems()
        .map(|p| {
            let detail = match &p.state {
                FolderState::Misplaced {
                    expected, actual, ..
                } => format!("in {actual}, expected {expected}"),
                FolderState::Missing => "folder not found".to_string(),
                FolderState::Ambiguous { paths } => format!("{} folders", paths.len()),
                FolderState::Consistent { dir } => dir.to_string(),
            };
            vec![p.number.to_string(), p.status.to_string(), detail]
        })
        .collect();
    if !rows.is_empty() {
        print_table(&["NUMBER", "STATUS", "PROBLEM"], rows);
    }

    if !report.untracked.is_empty() {
        println!("\nUntracked folders (use 'relocator project adopt'):");
        for f in &report.untracked {
            println!("  {}/{}", f.dir, f.name);
        }
    }
    if !report.pending_intents.is_empty() {
        println!(
            "\n{} interrupted relocation(s); run 'relocator recover'.",
            report.pending_intents.len()
        );
    }
    println!("\nRun 'relocator reconcile --repair' to move misplaced folders.");
    Ok(())
}

pub fn recover(root: &Path, json: bool) -> anyhow::Result<()> {
    let db = RelocatorDb::open_root(root).context("failed to open database")?;
    let report = recovery::recover(&db).context("recovery failed")?;

    emit(json, &report, |r| {
        if r.resolutions.is_empty() {
            println!("No interrupted relocations.");
        } else {
            print_recovery(r);
        }
    })
}

fn print_recovery(report: &RecoveryReport) {
    for r in &report.resolutions {
        match r {
            Resolution::RolledForward { intent } => {
                println!("finished {}: now {}", intent.number, intent.to)
            }
            Resolution::RolledBack { intent } => {
                println!("discarded {}: folder never moved", intent.number)
            }
            Resolution::Unresolved { intent, reason } => {
                println!("unresolved {}: {reason}", intent.number)
            }
        }
    }
}
