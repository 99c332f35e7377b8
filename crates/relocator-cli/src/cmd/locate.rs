use crate::output::emit;
use relocator_core::{locate, types::ProjectNumber};
use std::path::Path;

pub fn run(root: &Path, number: &str, json: bool) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    let location = locate::find_project_folder(root, &number)?;

    emit(json, &location, |loc| match (loc.location, &loc.path) {
        (Some(dir), Some(path)) => {
            println!("{number}: {dir}");
            println!("  {}", path.display());
        }
        _ => println!("{number}: not found"),
    })
}
