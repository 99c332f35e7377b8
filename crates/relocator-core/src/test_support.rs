//! Fixtures shared by the unit tests.

use crate::db::{ProjectStore, RelocatorDb};
use crate::error::{RelocateError, Result};
use crate::intent::Intent;
use crate::paths;
use crate::project::Project;
use crate::types::{ProjectNumber, StatusDir};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A projects root with all four status directories.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for &d in StatusDir::all() {
            std::fs::create_dir_all(paths::status_dir(dir.path(), d)).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Open the database. redb allows one handle per file, so call once.
    pub fn db(&self) -> RelocatorDb {
        RelocatorDb::open(&paths::db_path(self.root())).unwrap()
    }

    pub fn folder(&self, dir: StatusDir, name: &str) -> PathBuf {
        let p = paths::project_folder(self.root(), dir, name);
        std::fs::create_dir_all(&p).unwrap();
        p
    }
}

/// Wraps a real store and fails chosen writes on demand.
pub struct FlakyStore {
    inner: RelocatorDb,
    fail_saves: Cell<bool>,
    fail_intents: Cell<bool>,
}

impl FlakyStore {
    pub fn new(inner: RelocatorDb) -> Self {
        Self {
            inner,
            fail_saves: Cell::new(false),
            fail_intents: Cell::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn fail_intents(&self, fail: bool) {
        self.fail_intents.set(fail);
    }
}

impl ProjectStore for FlakyStore {
    fn load_project(&self, number: &ProjectNumber) -> Result<Option<Project>> {
        self.inner.load_project(number)
    }

    fn save_project(&self, project: &Project) -> Result<()> {
        if self.fail_saves.get() {
            return Err(RelocateError::Db("injected save failure".to_string()));
        }
        self.inner.save_project(project)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.inner.list_projects()
    }

    fn record_intent(&self, intent: &Intent) -> Result<()> {
        if self.fail_intents.get() {
            return Err(RelocateError::Db("injected intent failure".to_string()));
        }
        self.inner.record_intent(intent)
    }

    fn clear_intent(&self, intent: &Intent) -> Result<()> {
        self.inner.clear_intent(intent)
    }

    fn pending_intents(&self) -> Result<Vec<Intent>> {
        self.inner.pending_intents()
    }
}
