use crate::config::Config;
use crate::db::ProjectStore;
use crate::error::{RelocateError, Result};
use crate::locate;
use crate::paths;
use crate::templates;
use crate::types::{ProjectNumber, Status, StatusDir};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// StatusChange
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: Status,
    pub entered: DateTime<Utc>,
    pub exited: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub number: ProjectNumber,
    /// Short name, the part of the folder name after the number.
    pub name: String,
    pub status: Status,
    /// Folder name under the status directory.
    pub folder: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
}

impl Project {
    pub fn new(number: ProjectNumber, name: impl Into<String>, status: Status) -> Self {
        let name = name.into();
        let folder = format!("{number} {name}");
        Self::with_folder(number, name, folder, status)
    }

    fn with_folder(number: ProjectNumber, name: String, folder: String, status: Status) -> Self {
        let now = Utc::now();
        Self {
            number,
            name,
            status,
            folder,
            created_at: now,
            updated_at: now,
            status_history: vec![StatusChange {
                status,
                entered: now,
                exited: None,
            }],
        }
    }

    /// Directory the folder must live under for the current status.
    pub fn expected_dir(&self) -> StatusDir {
        self.status.folder()
    }

    /// Record a new status. A no-op when the status is unchanged.
    pub fn set_status(&mut self, status: Status) {
        if status == self.status {
            return;
        }
        let now = Utc::now();
        if let Some(last) = self.status_history.last_mut() {
            last.exited = Some(now);
        }
        self.status = status;
        self.updated_at = now;
        self.status_history.push(StatusChange {
            status,
            entered: now,
            exited: None,
        });
    }

    // ---------------------------------------------------------------------------
    // Registry operations
    // ---------------------------------------------------------------------------

    /// Register a new project and create its folder under the status directory.
    ///
    /// The folder is copied from the configured project template when there
    /// is one, otherwise created empty.
    pub fn create<S: ProjectStore>(
        root: &Path,
        cfg: &Config,
        store: &S,
        number: ProjectNumber,
        name: &str,
        status: Status,
    ) -> Result<Self> {
        validate_name(name)?;
        if store.load_project(&number)?.is_some() {
            return Err(RelocateError::ProjectExists(number.to_string()));
        }
        let existing = locate::find_project_folder(root, &number)?;
        if let Some(path) = existing.path {
            return Err(RelocateError::Conflict {
                number: number.to_string(),
                path,
            });
        }

        let project = Self::new(number, name.trim(), status);
        let dir = paths::status_dir(root, project.expected_dir());
        if !dir.is_dir() {
            return Err(RelocateError::StatusDirMissing(dir));
        }
        let folder = dir.join(&project.folder);

        match &cfg.project_template {
            Some(template) => templates::instantiate(root, template, &folder, &project.number)?,
            None => std::fs::create_dir(&folder)?,
        }
        if let Err(e) = store.save_project(&project) {
            if let Err(rm) = std::fs::remove_dir_all(&folder) {
                tracing::warn!(folder = %folder.display(), error = %rm, "failed to remove folder of unsaved project");
            }
            return Err(e);
        }
        tracing::info!(number = %project.number, folder = %folder.display(), "created project");
        Ok(project)
    }

    /// Register a record for a folder that already exists in the status tree.
    ///
    /// Without an explicit status the project takes the default status of
    /// the directory its folder is in, so it starts out consistent.
    pub fn adopt<S: ProjectStore>(
        root: &Path,
        store: &S,
        number: ProjectNumber,
        status: Option<Status>,
    ) -> Result<Self> {
        if store.load_project(&number)?.is_some() {
            return Err(RelocateError::ProjectExists(number.to_string()));
        }
        let loc = locate::find_project_folder(root, &number)?;
        let (Some(dir), Some(path)) = (loc.location, loc.path) else {
            return Err(RelocateError::NotFound(number.to_string()));
        };
        let folder = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| number.to_string());
        let name = folder
            .strip_prefix(number.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();

        let project = Self::with_folder(
            number,
            name,
            folder,
            status.unwrap_or_else(|| dir.default_status()),
        );
        store.save_project(&project)?;
        tracing::info!(number = %project.number, dir = %dir, "adopted project folder");
        Ok(project)
    }

    pub fn load<S: ProjectStore>(store: &S, number: &ProjectNumber) -> Result<Self> {
        store
            .load_project(number)?
            .ok_or_else(|| RelocateError::ProjectNotFound(number.to_string()))
    }
}

/// A short name must be usable as part of a single path component.
pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.len() > 120
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\', ':'])
        || trimmed.chars().any(char::is_control)
    {
        return Err(RelocateError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
