use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("not initialized: run 'relocator init'")]
    NotInitialized,

    #[error("invalid project number '{0}': expected YY-CCCNN")]
    InvalidNumber(String),

    #[error("unknown status: {0}")]
    InvalidStatus(String),

    #[error("unknown status directory: {0}")]
    InvalidStatusDir(String),

    #[error("invalid project name '{0}'")]
    InvalidName(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("project folder {0} not found")]
    NotFound(String),

    #[error("project {number} has more than one folder: {}", display_paths(.paths))]
    Ambiguous { number: String, paths: Vec<PathBuf> },

    #[error("destination folder already exists: {}", .path.display())]
    Conflict { number: String, path: PathBuf },

    #[error("status directory {} does not exist", .0.display())]
    StatusDirMissing(PathBuf),

    #[error(
        "moved {number} from {} to {} but failed to record status {to} (still {from}): {reason}",
        .old_path.display(),
        .new_path.display()
    )]
    PartialFailure {
        number: String,
        from: String,
        to: String,
        old_path: PathBuf,
        new_path: PathBuf,
        reason: String,
    },

    #[error("project {0} has an interrupted relocation: run 'relocator recover' first")]
    PendingIntent(String),

    #[error("status change cancelled")]
    UserCancelled,

    #[error("copy verification failed for {}: {reason}", .path.display())]
    CopyVerification { path: PathBuf, reason: String },

    #[error("database error: {0}")]
    Db(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, RelocateError>;
