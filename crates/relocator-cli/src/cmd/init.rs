use crate::output::print_json;
use anyhow::Context;
use relocator_core::{config::Config, db::RelocatorDb, io, paths, types::StatusDir};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut created = Vec::new();
    let mut existing = Vec::new();

    if !json {
        println!("Initializing relocator in: {}", root.display());
    }

    // 1. Status directories
    for &dir in StatusDir::all() {
        let p = paths::status_dir(root, dir);
        if p.is_dir() {
            existing.push(dir.dir_name().to_string());
        } else {
            io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
            created.push(dir.dir_name().to_string());
        }
    }

    // 2. config.yaml
    let config_yaml = serde_yaml::to_string(&Config::default())?;
    if io::write_if_missing(&paths::config_path(root), config_yaml.as_bytes())
        .context("failed to write config.yaml")?
    {
        created.push(paths::CONFIG_FILE.to_string());
    } else {
        existing.push(paths::CONFIG_FILE.to_string());
    }

    // 3. Database
    let db_path = paths::db_path(root);
    if db_path.exists() {
        existing.push(paths::DB_FILE.to_string());
    } else {
        RelocatorDb::open(&db_path).context("failed to create database")?;
        created.push(paths::DB_FILE.to_string());
    }

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "created": created,
            "existing": existing,
        }))?;
    } else {
        for c in &created {
            println!("  created: {c}");
        }
        for e in &existing {
            println!("  exists:  {e}");
        }
        println!("\nNext: relocator project create <YY-CCCNN> --name \"...\"");
    }
    Ok(())
}
