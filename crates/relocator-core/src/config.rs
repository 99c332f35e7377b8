use crate::error::{RelocateError, Result};
use crate::paths;
use crate::types::StatusDir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AwardedTemplates
// ---------------------------------------------------------------------------

/// Folders copied into a project when it moves from RFPs to Current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardedTemplates {
    /// Directory holding the template folders. Relative paths resolve
    /// against the projects root.
    #[serde(default = "default_awarded_source")]
    pub source: PathBuf,
    #[serde(default = "default_awarded_folders")]
    pub folders: Vec<String>,
}

fn default_awarded_source() -> PathBuf {
    PathBuf::from("11 Current/00 Additional Folders")
}

fn default_awarded_folders() -> Vec<String> {
    [
        "03 Contract",
        "04 Deliverables",
        "05 Submittals",
        "11 SubContractors",
        "98 Outgoing",
        "99 Temp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AwardedTemplates {
    fn default() -> Self {
        Self {
            source: default_awarded_source(),
            folders: default_awarded_folders(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectTemplate
// ---------------------------------------------------------------------------

/// Folder copied when a new project is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub path: PathBuf,
    /// Text in file names replaced by the project number after copying.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "yy-cccnn".to_string()
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_template: Option<ProjectTemplate>,
    #[serde(default)]
    pub awarded_templates: AwardedTemplates,
    /// Ask before moving a folder. `--yes` overrides per invocation.
    #[serde(default = "default_confirm")]
    pub confirm_moves: bool,
}

fn default_version() -> u32 {
    1
}

fn default_confirm() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_template: None,
            awarded_templates: AwardedTemplates::default(),
            confirm_moves: default_confirm(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RelocateError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Resolve a configured path against the projects root.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        let expanded = paths::expand_home(path);
        if expanded.is_absolute() {
            expanded
        } else {
            root.join(expanded)
        }
    }

    pub fn awarded_source(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.awarded_templates.source)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !root.is_dir() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("projects root {} does not exist", root.display()),
            });
            return warnings;
        }

        for &dir in StatusDir::all() {
            let p = paths::status_dir(root, dir);
            if !p.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("status directory '{dir}' is missing"),
                });
            }
        }

        let source = self.awarded_source(root);
        if !source.is_dir() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "awarded template folder {} not found; templates will not be copied",
                    source.display()
                ),
            });
        }

        if let Some(template) = &self.project_template {
            let p = Self::resolve(root, &template.path);
            if !p.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("project template {} not found", p.display()),
                });
            }
            if template.placeholder.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "project template placeholder is empty".to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
