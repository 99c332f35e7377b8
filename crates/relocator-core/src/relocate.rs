//! Status changes that move a project folder between status directories.
//!
//! A relocation runs in this order:
//!
//! 1. resolve the source folder and the destination path,
//! 2. ask the [`Confirm`] gate,
//! 3. record an [`Intent`],
//! 4. move the folder,
//! 5. persist the new status,
//! 6. clear the intent.
//!
//! If the process dies or the status write fails between 4 and 6, the intent
//! stays in the log and [`crate::recovery::recover`] can finish the job.

use crate::config::Config;
use crate::db::ProjectStore;
use crate::error::{RelocateError, Result};
use crate::intent::Intent;
use crate::io::{self, MoveMethod};
use crate::locate;
use crate::paths;
use crate::project::Project;
use crate::templates;
use crate::types::{ProjectNumber, Status, StatusDir};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Confirmation gate
// ---------------------------------------------------------------------------

/// A status change that requires moving a folder, shown to the user before
/// anything is touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChange {
    pub number: ProjectNumber,
    pub from: Status,
    pub to: Status,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Decides whether a pending folder move goes ahead.
pub trait Confirm {
    fn confirm(&mut self, change: &PendingChange) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&PendingChange) -> bool,
{
    fn confirm(&mut self, change: &PendingChange) -> bool {
        self(change)
    }
}

/// Accepts every change.
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _change: &PendingChange) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Relocation {
    pub number: ProjectNumber,
    pub from: Status,
    pub to: Status,
    /// False when the folder was already under the right directory.
    pub moved: bool,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Relocation {
    pub fn message(&self) -> String {
        if self.moved {
            format!(
                "Moved {} from {} to {}",
                self.number,
                parent_name(&self.old_path),
                parent_name(&self.new_path)
            )
        } else if self.from == self.to {
            format!("{} is already {}", self.number, self.to)
        } else {
            format!(
                "{} set to {} (folder already in {})",
                self.number,
                self.to,
                parent_name(&self.new_path)
            )
        }
    }
}

fn parent_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Relocator
// ---------------------------------------------------------------------------

pub struct Relocator<'a, S: ProjectStore> {
    root: &'a Path,
    config: &'a Config,
    store: &'a S,
}

impl<'a, S: ProjectStore> Relocator<'a, S> {
    pub fn new(root: &'a Path, config: &'a Config, store: &'a S) -> Self {
        Self {
            root,
            config,
            store,
        }
    }

    /// Change the status of `number` to `to`, moving its folder when the new
    /// status maps to a different directory.
    ///
    /// Returns `UserCancelled` when the gate declines; nothing has been
    /// changed in that case.
    pub fn change_status(
        &self,
        number: &ProjectNumber,
        to: Status,
        gate: &mut dyn Confirm,
    ) -> Result<Relocation> {
        let mut project = Project::load(self.store, number)?;
        if self
            .store
            .pending_intents()?
            .iter()
            .any(|i| &i.number == number)
        {
            return Err(RelocateError::PendingIntent(number.to_string()));
        }
        let loc = locate::find_project_folder(self.root, number)?;
        let (Some(current_dir), Some(source)) = (loc.location, loc.path.clone()) else {
            return Err(RelocateError::NotFound(number.to_string()));
        };
        let folder_name = loc.folder_name().unwrap_or_else(|| project.folder.clone());
        let from = project.status;
        let dest_dir = to.folder();

        if current_dir == dest_dir {
            if from != to || project.folder != folder_name {
                project.set_status(to);
                project.folder = folder_name;
                self.store.save_project(&project)?;
                tracing::info!(number = %number, from = %from, to = %to, "status changed without move");
            }
            return Ok(Relocation {
                number: number.clone(),
                from,
                to,
                moved: false,
                old_path: source.clone(),
                new_path: source,
                warnings: Vec::new(),
            });
        }

        let dest_root = paths::status_dir(self.root, dest_dir);
        if !dest_root.is_dir() {
            return Err(RelocateError::StatusDirMissing(dest_root));
        }
        let destination = dest_root.join(&folder_name);
        if destination.exists() {
            return Err(RelocateError::Conflict {
                number: number.to_string(),
                path: destination,
            });
        }

        let change = PendingChange {
            number: number.clone(),
            from,
            to,
            source: source.clone(),
            destination: destination.clone(),
        };
        if !gate.confirm(&change) {
            tracing::info!(number = %number, "status change cancelled");
            return Err(RelocateError::UserCancelled);
        }

        let intent = Intent::new(number.clone(), from, to, &source, &destination);
        self.store.record_intent(&intent)?;

        let method = match io::move_dir(&source, &destination) {
            Ok(m) => m,
            Err(e) => {
                if let Err(clear) = self.store.clear_intent(&intent) {
                    tracing::warn!(number = %number, error = %clear, "failed to clear intent after failed move");
                }
                return Err(e);
            }
        };

        project.set_status(to);
        project.folder = folder_name;
        if let Err(e) = self.store.save_project(&project) {
            tracing::error!(
                number = %number,
                old_path = %source.display(),
                new_path = %destination.display(),
                error = %e,
                "folder moved but status not recorded"
            );
            return Err(RelocateError::PartialFailure {
                number: number.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                old_path: source,
                new_path: destination,
                reason: e.to_string(),
            });
        }

        let mut warnings = Vec::new();
        if let MoveMethod::CopyLeftSource { error } = &method {
            warnings.push(format!(
                "copied to {} but could not remove {} ({error}); delete it by hand",
                destination.display(),
                source.display()
            ));
        }
        if let Err(e) = self.store.clear_intent(&intent) {
            tracing::warn!(number = %number, error = %e, "failed to clear completed intent");
            warnings.push(format!("stale intent left in log ({e}); run 'relocator recover'"));
        }

        if current_dir == StatusDir::Rfps && dest_dir == StatusDir::Current {
            warnings.extend(templates::copy_awarded(self.root, self.config, &destination));
        }

        tracing::info!(
            number = %number,
            from = %current_dir,
            to = %dest_dir,
            copied = !matches!(method, MoveMethod::Rename),
            "relocated project folder"
        );

        Ok(Relocation {
            number: number.clone(),
            from,
            to,
            moved: true,
            old_path: source,
            new_path: destination,
            warnings,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FlakyStore, TestTree};
    use std::cell::Cell;

    fn number(s: &str) -> ProjectNumber {
        ProjectNumber::parse(s).unwrap()
    }

    /// The `25-97199 Test Project` fixture, registered as Draft.
    fn draft_fixture(tree: &TestTree, store: &impl ProjectStore) -> PathBuf {
        let path = tree.folder(StatusDir::Rfps, "25-97199 Test Project");
        std::fs::write(path.join("25-97199-var.json"), b"{\"01 Project Name\": \"Test\"}")
            .unwrap();
        store
            .save_project(&Project::new(number("25-97199"), "Test Project", Status::Draft))
            .unwrap();
        path
    }

    #[test]
    fn draft_to_completed_moves_folder() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let old = draft_fixture(&tree, &db);

        let r = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap();

        assert!(r.moved);
        assert_eq!(
            r.new_path,
            tree.root().join("99 Completed/25-97199 Test Project")
        );
        assert!(!old.exists());
        let loc = locate::find_project_folder(tree.root(), &number("25-97199")).unwrap();
        assert_eq!(loc.location, Some(StatusDir::Completed));
        assert_eq!(
            Project::load(&db, &number("25-97199")).unwrap().status,
            Status::Completed
        );
        assert!(db.pending_intents().unwrap().is_empty());
    }

    #[test]
    fn round_trip_restores_original_path() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let original = draft_fixture(&tree, &db);
        let relocator = Relocator::new(tree.root(), &cfg, &db);
        let n = number("25-97199");

        relocator
            .change_status(&n, Status::Completed, &mut AutoConfirm)
            .unwrap();
        let back = relocator
            .change_status(&n, Status::Draft, &mut AutoConfirm)
            .unwrap();

        assert_eq!(back.new_path, original);
        assert_eq!(
            original.as_os_str().as_encoded_bytes(),
            tree.root()
                .join("01 RFPs/25-97199 Test Project")
                .as_os_str()
                .as_encoded_bytes()
        );
        assert_eq!(
            std::fs::read_to_string(original.join("25-97199-var.json")).unwrap(),
            "{\"01 Project Name\": \"Test\"}"
        );
        let p = Project::load(&db, &n).unwrap();
        assert_eq!(p.status, Status::Draft);
        assert_eq!(p.status_history.len(), 3);
    }

    #[test]
    fn duplicate_folder_at_destination_is_ambiguous() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let source = draft_fixture(&tree, &db);
        tree.folder(StatusDir::Completed, "25-97199 Test Project");

        let asked = Cell::new(false);
        let mut gate = |_: &PendingChange| {
            asked.set(true);
            true
        };
        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut gate)
            .unwrap_err();

        assert!(matches!(err, RelocateError::Ambiguous { .. }), "{err}");
        assert!(!asked.get());
        assert!(source.join("25-97199-var.json").exists());
        assert_eq!(
            Project::load(&db, &number("25-97199")).unwrap().status,
            Status::Draft
        );
        assert!(db.pending_intents().unwrap().is_empty());
    }

    #[test]
    fn occupied_destination_with_other_name_is_conflict() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let source = draft_fixture(&tree, &db);
        // Same folder name, but a plain file rather than a project folder.
        std::fs::write(tree.root().join("99 Completed/25-97199 Test Project"), b"").unwrap();

        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();

        assert!(matches!(err, RelocateError::Conflict { .. }), "{err}");
        assert!(source.is_dir());
        assert_eq!(
            Project::load(&db, &number("25-97199")).unwrap().status,
            Status::Draft
        );
    }

    #[test]
    fn cancel_makes_no_changes() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let source = draft_fixture(&tree, &db);

        let mut seen = None;
        let mut gate = |c: &PendingChange| {
            seen = Some(c.clone());
            false
        };
        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut gate)
            .unwrap_err();

        assert!(matches!(err, RelocateError::UserCancelled));
        let seen = seen.unwrap();
        assert_eq!(seen.from, Status::Draft);
        assert_eq!(seen.to, Status::Completed);
        assert_eq!(seen.source, source);
        assert_eq!(
            seen.destination,
            tree.root().join("99 Completed/25-97199 Test Project")
        );

        assert!(source.is_dir());
        assert!(!tree.root().join("99 Completed/25-97199 Test Project").exists());
        let p = Project::load(&db, &number("25-97199")).unwrap();
        assert_eq!(p.status, Status::Draft);
        assert_eq!(p.status_history.len(), 1);
        assert!(db.pending_intents().unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_not_found() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        db.save_project(&Project::new(number("25-97199"), "Test Project", Status::Draft))
            .unwrap();

        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();
        assert!(matches!(err, RelocateError::NotFound(_)));
        assert_eq!(
            Project::load(&db, &number("25-97199")).unwrap().status,
            Status::Draft
        );
    }

    #[test]
    fn unknown_project_is_not_found() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        tree.folder(StatusDir::Rfps, "25-97199 Test Project");

        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();
        assert!(matches!(err, RelocateError::ProjectNotFound(_)));
    }

    #[test]
    fn missing_destination_dir_fails() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let source = draft_fixture(&tree, &db);
        std::fs::remove_dir(tree.root().join("99 Completed")).unwrap();

        let err = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();
        assert!(matches!(err, RelocateError::StatusDirMissing(_)));
        assert!(source.is_dir());
    }

    #[test]
    fn same_directory_change_skips_gate_and_move() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        let source = draft_fixture(&tree, &db);

        let mut gate = |_: &PendingChange| -> bool { panic!("gate must not be asked") };
        let r = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Sent, &mut gate)
            .unwrap();

        assert!(!r.moved);
        assert_eq!(r.new_path, source);
        assert_eq!(
            Project::load(&db, &number("25-97199")).unwrap().status,
            Status::Sent
        );
    }

    #[test]
    fn status_write_failure_is_partial_failure_with_intent() {
        let tree = TestTree::new();
        let store = FlakyStore::new(tree.db());
        let cfg = Config::default();
        let source = draft_fixture(&tree, &store);
        store.fail_saves(true);

        let err = Relocator::new(tree.root(), &cfg, &store)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();

        match err {
            RelocateError::PartialFailure {
                old_path, new_path, ..
            } => {
                assert_eq!(old_path, source);
                assert_eq!(
                    new_path,
                    tree.root().join("99 Completed/25-97199 Test Project")
                );
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        assert!(!source.exists());
        assert_eq!(store.pending_intents().unwrap().len(), 1);
        assert_eq!(
            store.load_project(&number("25-97199")).unwrap().unwrap().status,
            Status::Draft
        );
    }

    #[test]
    fn intent_write_failure_leaves_folder_alone() {
        let tree = TestTree::new();
        let store = FlakyStore::new(tree.db());
        let cfg = Config::default();
        let source = draft_fixture(&tree, &store);
        store.fail_intents(true);

        let err = Relocator::new(tree.root(), &cfg, &store)
            .change_status(&number("25-97199"), Status::Completed, &mut AutoConfirm)
            .unwrap_err();

        assert!(matches!(err, RelocateError::Db(_)));
        assert!(source.is_dir());
    }

    #[test]
    fn rfp_to_current_copies_award_templates() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        draft_fixture(&tree, &db);
        let extras = tree.root().join("11 Current/00 Additional Folders");
        std::fs::create_dir_all(extras.join("03 Contract")).unwrap();
        std::fs::create_dir_all(extras.join("98 Outgoing")).unwrap();

        let r = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Awarded, &mut AutoConfirm)
            .unwrap();

        assert!(r.moved);
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
        assert!(r.new_path.join("03 Contract").is_dir());
        assert!(r.new_path.join("98 Outgoing").is_dir());
    }

    #[test]
    fn awarded_without_templates_still_succeeds() {
        let tree = TestTree::new();
        let db = tree.db();
        let cfg = Config::default();
        draft_fixture(&tree, &db);

        let r = Relocator::new(tree.root(), &cfg, &db)
            .change_status(&number("25-97199"), Status::Active, &mut AutoConfirm)
            .unwrap();
        assert!(r.moved);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.message().contains("11 Current"));
    }

    #[test]
    fn pending_intent_blocks_further_changes_until_recovered() {
        let tree = TestTree::new();
        let store = FlakyStore::new(tree.db());
        let cfg = Config::default();
        draft_fixture(&tree, &store);
        let relocator = Relocator::new(tree.root(), &cfg, &store);
        let n = number("25-97199");

        store.fail_saves(true);
        assert!(matches!(
            relocator.change_status(&n, Status::Active, &mut AutoConfirm),
            Err(RelocateError::PartialFailure { .. })
        ));
        store.fail_saves(false);

        let err = relocator
            .change_status(&n, Status::Awarded, &mut AutoConfirm)
            .unwrap_err();
        assert!(matches!(err, RelocateError::PendingIntent(_)), "{err}");
        assert_eq!(Project::load(&store, &n).unwrap().status, Status::Draft);

        crate::recovery::recover(&store).unwrap();
        assert_eq!(Project::load(&store, &n).unwrap().status, Status::Active);

        relocator
            .change_status(&n, Status::Awarded, &mut AutoConfirm)
            .unwrap();
        assert_eq!(Project::load(&store, &n).unwrap().status, Status::Awarded);
        assert!(store.pending_intents().unwrap().is_empty());
    }
}
