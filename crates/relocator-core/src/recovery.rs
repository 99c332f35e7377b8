//! Finishing or discarding relocations that were interrupted between the
//! folder move and the status commit.

use crate::db::ProjectStore;
use crate::error::Result;
use crate::intent::{Intent, IntentProgress};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// The folder had moved; the new status was committed.
    RolledForward { intent: Intent },
    /// The folder never moved; the intent was discarded.
    RolledBack { intent: Intent },
    /// The filesystem does not tell which way to go. The intent is kept.
    Unresolved { intent: Intent, reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryReport {
    pub resolutions: Vec<Resolution>,
}

impl RecoveryReport {
    pub fn unresolved(&self) -> usize {
        self.resolutions
            .iter()
            .filter(|r| matches!(r, Resolution::Unresolved { .. }))
            .count()
    }
}

/// Resolve every pending intent against the filesystem.
pub fn recover<S: ProjectStore>(store: &S) -> Result<RecoveryReport> {
    let mut report = RecoveryReport::default();
    for intent in store.pending_intents()? {
        let resolution = match intent.progress() {
            IntentProgress::Moved => {
                match store.load_project(&intent.number)? {
                    Some(project) if project.status != intent.from && project.status != intent.to => {
                        Resolution::Unresolved {
                            reason: format!(
                                "status is now {}, expected {} or {}",
                                project.status, intent.from, intent.to
                            ),
                            intent,
                        }
                    }
                    Some(mut project) => {
                        project.set_status(intent.to);
                        if let Some(name) = intent.destination.file_name() {
                            project.folder = name.to_string_lossy().into_owned();
                        }
                        store.save_project(&project)?;
                        store.clear_intent(&intent)?;
                        tracing::info!(number = %intent.number, to = %intent.to, "rolled relocation forward");
                        Resolution::RolledForward { intent }
                    }
                    None => Resolution::Unresolved {
                        reason: format!("project {} has no record", intent.number),
                        intent,
                    },
                }
            }
            IntentProgress::NotMoved => {
                store.clear_intent(&intent)?;
                tracing::info!(number = %intent.number, "discarded relocation that never moved");
                Resolution::RolledBack { intent }
            }
            IntentProgress::Both => Resolution::Unresolved {
                reason: format!(
                    "both {} and {} exist",
                    intent.source.display(),
                    intent.destination.display()
                ),
                intent,
            },
            IntentProgress::Vanished => Resolution::Unresolved {
                reason: format!(
                    "neither {} nor {} exists",
                    intent.source.display(),
                    intent.destination.display()
                ),
                intent,
            },
        };
        if let Resolution::Unresolved { intent, reason } = &resolution {
            tracing::warn!(number = %intent.number, reason = %reason, "relocation needs manual attention");
        }
        report.resolutions.push(resolution);
    }
    Ok(report)
}
