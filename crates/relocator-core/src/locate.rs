//! Finding project folders in the status tree.

use crate::error::{RelocateError, Result};
use crate::paths;
use crate::types::{ProjectNumber, StatusDir};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a project's folder currently is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderLocation {
    pub number: ProjectNumber,
    pub exists: bool,
    pub location: Option<StatusDir>,
    pub path: Option<PathBuf>,
}

impl FolderLocation {
    fn not_found(number: &ProjectNumber) -> Self {
        Self {
            number: number.clone(),
            exists: false,
            location: None,
            path: None,
        }
    }

    pub fn folder_name(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// A project folder found while scanning the status tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundFolder {
    pub number: ProjectNumber,
    pub dir: StatusDir,
    pub name: String,
    pub path: PathBuf,
}

/// Every directory in `dir` whose name starts with a project number.
fn scan_dir(root: &Path, dir: StatusDir) -> Result<Vec<FoundFolder>> {
    let search = paths::status_dir(root, dir);
    let mut found = Vec::new();
    for entry in std::fs::read_dir(&search)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(number) = ProjectNumber::from_folder_name(&name) {
            found.push(FoundFolder {
                number,
                dir,
                name,
                path: entry.path(),
            });
        }
    }
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

/// Scan all status directories. Missing or unreadable directories are skipped.
pub fn scan_tree(root: &Path) -> Vec<FoundFolder> {
    let mut all = Vec::new();
    for &dir in StatusDir::all() {
        if !paths::status_dir(root, dir).is_dir() {
            continue;
        }
        match scan_dir(root, dir) {
            Ok(found) => all.extend(found),
            Err(e) => tracing::warn!(dir = %dir, error = %e, "failed to read status directory"),
        }
    }
    all
}

/// Find the folder for `number` across all status directories.
///
/// More than one matching folder is an error: the project's location is
/// ambiguous until someone removes the duplicate.
pub fn find_project_folder(root: &Path, number: &ProjectNumber) -> Result<FolderLocation> {
    let matches: Vec<FoundFolder> = scan_tree(root)
        .into_iter()
        .filter(|f| &f.number == number)
        .collect();

    match matches.as_slice() {
        [] => Ok(FolderLocation::not_found(number)),
        [only] => Ok(FolderLocation {
            number: number.clone(),
            exists: true,
            location: Some(only.dir),
            path: Some(only.path.clone()),
        }),
        many => Err(RelocateError::Ambiguous {
            number: number.to_string(),
            paths: many.iter().map(|f| f.path.clone()).collect(),
        }),
    }
}

/// Project folder names under one status directory, sorted.
pub fn list_projects_in(root: &Path, dir: StatusDir) -> Result<Vec<String>> {
    let path = paths::status_dir(root, dir);
    if !path.is_dir() {
        return Err(RelocateError::StatusDirMissing(path));
    }
    Ok(scan_dir(root, dir)?.into_iter().map(|f| f.name).collect())
}
