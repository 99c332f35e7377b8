//! Comparing persisted status with folder location across all projects.
//!
//! Status always wins: a misplaced folder is moved to the directory its
//! status maps to, never the other way round.

use crate::db::ProjectStore;
use crate::error::{RelocateError, Result};
use crate::intent::Intent;
use crate::io;
use crate::locate::{self, FoundFolder};
use crate::paths;
use crate::project::Project;
use crate::recovery::{self, RecoveryReport};
use crate::types::{ProjectNumber, Status, StatusDir};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FolderState {
    Consistent {
        dir: StatusDir,
    },
    Misplaced {
        expected: StatusDir,
        actual: StatusDir,
        path: PathBuf,
    },
    Missing,
    Ambiguous {
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectCheck {
    pub number: ProjectNumber,
    pub status: Status,
    #[serde(flatten)]
    pub state: FolderState,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub projects: Vec<ProjectCheck>,
    /// Folders with a project number but no record.
    pub untracked: Vec<FoundFolder>,
    pub pending_intents: Vec<Intent>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty()
            && self.pending_intents.is_empty()
            && self
                .projects
                .iter()
                .all(|p| matches!(p.state, FolderState::Consistent { .. }))
    }

    pub fn problems(&self) -> impl Iterator<Item = &ProjectCheck> {
        self.projects
            .iter()
            .filter(|p| !matches!(p.state, FolderState::Consistent { .. }))
    }
}

/// Check every project record against the status tree.
pub fn check<S: ProjectStore>(root: &Path, store: &S) -> Result<ReconcileReport> {
    let mut by_number: BTreeMap<ProjectNumber, Vec<FoundFolder>> = BTreeMap::new();
    for found in locate::scan_tree(root) {
        by_number.entry(found.number.clone()).or_default().push(found);
    }

    let projects = store.list_projects()?;
    let tracked: HashSet<&ProjectNumber> = projects.iter().map(|p| &p.number).collect();

    let checks = projects
        .iter()
        .map(|p| ProjectCheck {
            number: p.number.clone(),
            status: p.status,
            state: folder_state(p, by_number.get(&p.number).map(Vec::as_slice)),
        })
        .collect();

    let untracked = by_number
        .into_iter()
        .filter(|(n, _)| !tracked.contains(n))
        .flat_map(|(_, folders)| folders)
        .collect();

    Ok(ReconcileReport {
        projects: checks,
        untracked,
        pending_intents: store.pending_intents()?,
    })
}

fn folder_state(project: &Project, found: Option<&[FoundFolder]>) -> FolderState {
    let expected = project.expected_dir();
    match found.unwrap_or_default() {
        [] => FolderState::Missing,
        [only] if only.dir == expected => FolderState::Consistent { dir: expected },
        [only] => FolderState::Misplaced {
            expected,
            actual: only.dir,
            path: only.path.clone(),
        },
        many => FolderState::Ambiguous {
            paths: many.iter().map(|f| f.path.clone()).collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RepairAction {
    Moved {
        number: ProjectNumber,
        from: PathBuf,
        to: PathBuf,
    },
    Skipped {
        number: ProjectNumber,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    pub recovery: RecoveryReport,
    pub actions: Vec<RepairAction>,
}

/// Recover pending intents, then move every misplaced folder to the
/// directory its status maps to.
///
/// Missing and ambiguous projects are left for a person to sort out.
pub fn repair<S: ProjectStore>(root: &Path, store: &S) -> Result<RepairReport> {
    let recovery = recovery::recover(store)?;
    let report = check(root, store)?;

    let mut actions = Vec::new();
    for p in report.problems() {
        let action = match &p.state {
            FolderState::Misplaced { expected, path, .. } => {
                match move_into(root, *expected, path) {
                    Ok(to) => {
                        sync_folder_name(store, &p.number, &to)?;
                        tracing::info!(number = %p.number, to = %to.display(), "moved misplaced folder");
                        RepairAction::Moved {
                            number: p.number.clone(),
                            from: path.clone(),
                            to,
                        }
                    }
                    Err(e) => RepairAction::Skipped {
                        number: p.number.clone(),
                        reason: e.to_string(),
                    },
                }
            }
            FolderState::Missing => RepairAction::Skipped {
                number: p.number.clone(),
                reason: "folder not found".to_string(),
            },
            FolderState::Ambiguous { paths } => RepairAction::Skipped {
                number: p.number.clone(),
                reason: format!("{} folders match", paths.len()),
            },
            FolderState::Consistent { .. } => continue,
        };
        actions.push(action);
    }

    Ok(RepairReport { recovery, actions })
}

fn move_into(root: &Path, dir: StatusDir, path: &Path) -> Result<PathBuf> {
    let dest_root = paths::status_dir(root, dir);
    if !dest_root.is_dir() {
        return Err(RelocateError::StatusDirMissing(dest_root));
    }
    let name = path
        .file_name()
        .ok_or_else(|| RelocateError::NotFound(path.display().to_string()))?;
    let to = dest_root.join(name);
    if to.exists() {
        return Err(RelocateError::Conflict {
            number: name.to_string_lossy().into_owned(),
            path: to,
        });
    }
    io::move_dir(path, &to)?;
    Ok(to)
}

fn sync_folder_name<S: ProjectStore>(store: &S, number: &ProjectNumber, to: &Path) -> Result<()> {
    let Some(mut project) = store.load_project(number)? else {
        return Ok(());
    };
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if project.folder != name {
        project.folder = name;
        store.save_project(&project)?;
    }
    Ok(())
}
