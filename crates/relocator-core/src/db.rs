//! Persistent storage for project records and relocation intents using redb.
//!
//! # Table design
//!
//! `PROJECTS` is keyed by the canonical project number (`YY-CCCNN`) and holds
//! a JSON-encoded `Project`.
//!
//! `INTENTS` uses a 24-byte composite key:
//! ```text
//! [ created_at_ms: u64 big-endian (8 bytes) | uuid: 16 bytes ]
//! ```
//! so a full scan returns pending intents oldest first.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{RelocateError, Result};
use crate::intent::Intent;
use crate::project::Project;
use crate::types::ProjectNumber;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
const INTENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("intents");

fn intent_key(ts: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = ts.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

fn db_err(e: impl std::fmt::Display) -> RelocateError {
    RelocateError::Db(e.to_string())
}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

/// Storage the relocation workflow depends on: project status records and
/// the intent log.
pub trait ProjectStore {
    fn load_project(&self, number: &ProjectNumber) -> Result<Option<Project>>;
    fn save_project(&self, project: &Project) -> Result<()>;
    /// All projects, ordered by number.
    fn list_projects(&self) -> Result<Vec<Project>>;

    fn record_intent(&self, intent: &Intent) -> Result<()>;
    fn clear_intent(&self, intent: &Intent) -> Result<()>;
    /// Intents not yet cleared, oldest first.
    fn pending_intents(&self) -> Result<Vec<Intent>>;
}

// ---------------------------------------------------------------------------
// RelocatorDb
// ---------------------------------------------------------------------------

pub struct RelocatorDb {
    db: Database,
}

impl RelocatorDb {
    /// Open or create the redb database at `path`.
    ///
    /// Creates both tables if they don't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(PROJECTS).map_err(db_err)?;
        wt.open_table(INTENTS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// Open the database of an initialized projects root.
    pub fn open_root(root: &Path) -> Result<Self> {
        let path = crate::paths::db_path(root);
        if !path.exists() {
            return Err(RelocateError::NotInitialized);
        }
        Self::open(&path)
    }
}

impl ProjectStore for RelocatorDb {
    fn load_project(&self, number: &ProjectNumber) -> Result<Option<Project>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(PROJECTS).map_err(db_err)?;
        let project = match table.get(number.as_str()).map_err(db_err)? {
            Some(v) => Some(serde_json::from_slice(v.value())?),
            None => None,
        };
        Ok(project)
    }

    fn save_project(&self, project: &Project) -> Result<()> {
        let value = serde_json::to_vec(project)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(PROJECTS).map_err(db_err)?;
            table
                .insert(project.number.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(PROJECTS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }

    fn record_intent(&self, intent: &Intent) -> Result<()> {
        let key = intent_key(intent.created_at, intent.id);
        let value = serde_json::to_vec(intent)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(INTENTS).map_err(db_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn clear_intent(&self, intent: &Intent) -> Result<()> {
        let key = intent_key(intent.created_at, intent.id);
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(INTENTS).map_err(db_err)?;
            table.remove(key.as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn pending_intents(&self) -> Result<Vec<Intent>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(INTENTS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
