use crate::output::print_json;
use anyhow::{bail, Context};
use clap::Subcommand;
use relocator_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Check the configuration against the projects root
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                print_json(&config)?;
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(())
        }
        ConfigSubcommand::Validate => {
            let warnings = config.validate(root);
            let errors = warnings
                .iter()
                .filter(|w| w.level == WarnLevel::Error)
                .count();

            if json {
                print_json(&warnings)?;
            } else if warnings.is_empty() {
                println!("Config OK.");
            } else {
                for w in &warnings {
                    let label = match w.level {
                        WarnLevel::Error => "error",
                        WarnLevel::Warning => "warning",
                    };
                    println!("{label}: {}", w.message);
                }
            }

            if errors > 0 {
                bail!("config has {errors} error(s)");
            }
            Ok(())
        }
    }
}
