use crate::types::StatusDir;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RELOCATOR_DIR: &str = ".relocator";
pub const CONFIG_FILE: &str = ".relocator/config.yaml";
pub const DB_FILE: &str = ".relocator/relocator.redb";

/// Prefix for staging directories used by cross-device moves.
pub const STAGING_PREFIX: &str = ".relocating-";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn relocator_dir(root: &Path) -> PathBuf {
    root.join(RELOCATOR_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}

pub fn status_dir(root: &Path, dir: StatusDir) -> PathBuf {
    root.join(dir.dir_name())
}

pub fn project_folder(root: &Path, dir: StatusDir, folder_name: &str) -> PathBuf {
    status_dir(root, dir).join(folder_name)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
