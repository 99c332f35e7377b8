use crate::output::{emit, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use relocator_core::{
    config::Config,
    db::{ProjectStore, RelocatorDb},
    locate,
    project::Project,
    types::{ProjectNumber, Status},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Register a new project and create its folder
    Create {
        /// Project number, YY-CCCNN
        number: String,
        /// Short name used in the folder name
        #[arg(long)]
        name: String,
        /// Initial status
        #[arg(long, default_value = "draft")]
        status: String,
    },
    /// List all projects
    List,
    /// Show a project's record and folder location
    Show { number: String },
    /// Register an existing folder that has no record
    Adopt {
        number: String,
        /// Status to record (default: follows the folder's directory)
        #[arg(long)]
        status: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Create {
            number,
            name,
            status,
        } => create(root, &number, &name, &status, json),
        ProjectSubcommand::List => list(root, json),
        ProjectSubcommand::Show { number } => show(root, &number, json),
        ProjectSubcommand::Adopt { number, status } => adopt(root, &number, status, json),
    }
}

fn create(root: &Path, number: &str, name: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    let status: Status = status.parse()?;
    let config = Config::load(root).context("failed to load config")?;
    let db = RelocatorDb::open_root(root).context("failed to open database")?;

    let project = Project::create(root, &config, &db, number.clone(), name, status)
        .with_context(|| format!("failed to create project '{number}'"))?;

    emit(json, &project, |p| {
        println!(
            "Created project: {} in {}/{}",
            p.number,
            p.expected_dir(),
            p.folder
        )
    })
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let db = RelocatorDb::open_root(root).context("failed to open database")?;
    let projects = db.list_projects().context("failed to list projects")?;

    if json {
        print_json(&projects)?;
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                p.number.to_string(),
                p.status.to_string(),
                p.expected_dir().to_string(),
                p.name.clone(),
            ]
        })
        .collect();
    print_table(&["NUMBER", "STATUS", "DIRECTORY", "NAME"], rows);
    Ok(())
}

fn show(root: &Path, number: &str, json: bool) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    let db = RelocatorDb::open_root(root).context("failed to open database")?;
    let project =
        Project::load(&db, &number).with_context(|| format!("project '{number}' not found"))?;
    let location = locate::find_project_folder(root, &number)?;

    if json {
        print_json(&serde_json::json!({
            "project": project,
            "location": location,
        }))?;
        return Ok(());
    }

    let n = &project.number;
    println!("Project: {} ({})", n, project.name);
    println!(
        "Number:  year {:02}, country +{}, sequence {:02}",
        n.year(),
        n.country(),
        n.seq()
    );
    println!("Status:  {}", project.status);
    println!("Folder:  {}/{}", project.expected_dir(), project.folder);
    match (location.location, &location.path) {
        (Some(dir), Some(_)) if dir == project.expected_dir() => println!("On disk: {dir} (ok)"),
        (Some(dir), Some(path)) => println!(
            "On disk: {} (expected {}; run 'relocator reconcile')",
            path.display(),
            project.expected_dir()
        ),
        _ => println!("On disk: not found"),
    }
    println!("Created: {}", project.created_at.format("%Y-%m-%d %H:%M"));

    println!("\nHistory:");
    for h in &project.status_history {
        println!("  {:<10} {}", h.status, h.entered.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

fn adopt(root: &Path, number: &str, status: Option<String>, json: bool) -> anyhow::Result<()> {
    let number = ProjectNumber::parse(number)?;
    let status = status.map(|s| s.parse::<Status>()).transpose()?;
    let db = RelocatorDb::open_root(root).context("failed to open database")?;

    let project = Project::adopt(root, &db, number.clone(), status)
        .with_context(|| format!("failed to adopt '{number}'"))?;

    if json {
        print_json(&project)?;
    } else {
        println!(
            "Adopted project: {} ({}) in {}",
            project.number, project.status, project.folder
        );
        let location = locate::find_project_folder(root, &project.number)?;
        if location.location != Some(project.expected_dir()) {
            println!(
                "Folder is not in {}; run 'relocator reconcile --repair' to move it.",
                project.expected_dir()
            );
        }
    }
    Ok(())
}
