//! Template folders: the new-project skeleton and the folders added when a
//! project is awarded.

use crate::config::{Config, ProjectTemplate};
use crate::error::Result;
use crate::io;
use crate::types::ProjectNumber;
use regex::RegexBuilder;
use std::path::Path;

/// Copy the configured awarded-project folders into `project_path`.
///
/// Never fails: anything that could not be copied comes back as a warning.
/// Folders already present in the project are left alone.
pub fn copy_awarded(root: &Path, cfg: &Config, project_path: &Path) -> Vec<String> {
    let source = cfg.awarded_source(root);
    if !source.is_dir() {
        return vec![format!(
            "awarded project template folder {} not found",
            source.display()
        )];
    }

    let mut warnings = Vec::new();
    for folder in &cfg.awarded_templates.folders {
        let src = source.join(folder);
        let dst = project_path.join(folder);
        if !src.is_dir() || dst.exists() {
            continue;
        }
        if let Err(e) = io::copy_dir_recursive(&src, &dst) {
            tracing::warn!(folder = %folder, error = %e, "failed to copy template folder");
            warnings.push(format!("failed to copy template folder {folder}: {e}"));
        }
    }
    warnings
}

/// Copy the project template to `dest` and rename every entry whose name
/// contains the placeholder so it carries the project number instead.
pub fn instantiate(
    root: &Path,
    template: &ProjectTemplate,
    dest: &Path,
    number: &ProjectNumber,
) -> Result<()> {
    let src = Config::resolve(root, &template.path);
    if !src.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("project template {} not found", src.display()),
        )
        .into());
    }
    if dest.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        )
        .into());
    }
    io::copy_dir_recursive(&src, dest)?;
    if !template.placeholder.trim().is_empty() {
        rename_placeholders(dest, &template.placeholder, number.as_str())?;
    }
    Ok(())
}

/// Rename files and directories below `dir` whose names contain `pattern`
/// (case-insensitive), deepest entries first.
pub fn rename_placeholders(dir: &Path, pattern: &str, replacement: &str) -> Result<()> {
    let re = RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    for entry in entries {
        let is_dir = entry.file_type()?.is_dir();
        let mut path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if re.is_match(&name) {
            let renamed = dir.join(re.replace_all(&name, regex::NoExpand(replacement)).as_ref());
            std::fs::rename(&path, &renamed)?;
            path = renamed;
        }
        if is_dir {
            rename_placeholders(&path, pattern, replacement)?;
        }
    }
    Ok(())
}
