//! Relocation intents.
//!
//! An `Intent` is written before a project folder is moved and removed once
//! the new status has been committed. An intent that survives a crash or a
//! failed status write marks a project whose folder and status may disagree.

use crate::types::{ProjectNumber, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: Uuid,
    pub number: ProjectNumber,
    pub from: Status,
    pub to: Status,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Intent {
    pub fn new(
        number: ProjectNumber,
        from: Status,
        to: Status,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            from,
            to,
            source: source.into(),
            destination: destination.into(),
            created_at: Utc::now(),
        }
    }

    /// Where the folder is now, judged from the filesystem alone.
    pub fn progress(&self) -> IntentProgress {
        match (self.source.exists(), self.destination.exists()) {
            (true, false) => IntentProgress::NotMoved,
            (false, true) => IntentProgress::Moved,
            (true, true) => IntentProgress::Both,
            (false, false) => IntentProgress::Vanished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentProgress {
    NotMoved,
    Moved,
    Both,
    Vanished,
}
