// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Maintenance commands for a resource database root.
// Run with: cargo run -p aster-tool -- <command>

use anyhow::{bail, Context, Result};
use aster_agents::ResourceRegistry;
use aster_core::{
    gpu::HeadlessGpuContext,
    resource::{Resource, ResourceId, ResourceState},
    DatabaseError, ResourceConfig, ResourceDatabase,
};
use aster_io::FolderResourceDatabase;
use aster_lanes::LoaderFactory;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Instant};

#[derive(Parser, Debug)]
#[command(name = "aster", about = "Resource database maintenance", version)]
struct Cli {
    /// RON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database root. Overrides the root of `--config`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report consistency issues without changing anything
    Validate,
    /// Repair what validation reports
    Mend,
    /// List every registered resource
    List,
    /// Load resources against a headless device and report their states
    Load {
        /// Resource ids, relative to the root.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

fn resolve_config(cli: &Cli) -> Result<ResourceConfig> {
    let mut config = match &cli.config {
        Some(path) => ResourceConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => ResourceConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn open_database(config: &Arc<ResourceConfig>) -> FolderResourceDatabase {
    let loaders = Arc::new(LoaderFactory::new(config.clone()));
    FolderResourceDatabase::open(config, loaders)
}

/// Opens without the repair pass `open` runs, so nothing is written.
fn inspect_database(config: &Arc<ResourceConfig>) -> FolderResourceDatabase {
    let loaders = Arc::new(LoaderFactory::new(config.clone()));
    FolderResourceDatabase::inspect(config, loaders)
}

fn validate(config: &Arc<ResourceConfig>) -> Result<()> {
    let database = inspect_database(config);
    let errors = database.validate();
    println!("{}: {} resources, {errors}", config.root.display(), database.len());
    if !errors.is_success() {
        bail!("database '{}' is inconsistent", database.name());
    }
    Ok(())
}

fn mend(config: &Arc<ResourceConfig>) -> Result<()> {
    let database = inspect_database(config);
    let errors = database.validate();
    if errors.is_success() {
        println!("Nothing to repair");
        return Ok(());
    }
    let report = database.mend(errors);
    println!("Repaired {errors}: {} files written", report.written);
    if report.remaining != DatabaseError::SUCCESS {
        bail!("left unrepaired: {}", report.remaining);
    }
    Ok(())
}

fn list(config: &Arc<ResourceConfig>) -> Result<()> {
    let database = open_database(config);
    for id in database.ids() {
        let metadata = database.find(&id)?;
        println!(
            "{:<10} {:<18} {id}",
            metadata.resource_type.name(),
            format!("{:?}", metadata.format)
        );
    }
    Ok(())
}

fn load(config: Arc<ResourceConfig>, ids: &[String]) -> Result<()> {
    let registry = ResourceRegistry::open(config, Arc::new(HeadlessGpuContext::new()))?;
    let start = Instant::now();
    let handles: Vec<_> = ids
        .iter()
        .map(|id| registry.load::<dyn Resource>(ResourceId::new(id.as_str())))
        .collect();
    registry.wait_idle();

    let mut failed = 0;
    for handle in &handles {
        let state = handle.get_state();
        if state != ResourceState::Loaded {
            failed += 1;
        }
        println!("{state:?}\t{}", handle.id());
    }
    let stats = registry.stats();
    println!(
        "{} loaded, {} errored in {:.2}s",
        stats.loaded,
        stats.errored,
        start.elapsed().as_secs_f64()
    );
    if failed > 0 {
        bail!("{failed} of {} requested resources did not load", handles.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = Arc::new(resolve_config(&cli)?);

    match &cli.command {
        Command::Validate => validate(&config),
        Command::Mend => mend(&config),
        Command::List => list(&config),
        Command::Load { ids } => load(config.clone(), ids),
        Command::Config => {
            print!("{}", config.to_ron_string()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn root_overrides_config_file() {
        let cli = Cli::parse_from(["aster", "--root", "content", "list"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.root, PathBuf::from("content"));
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn validate_is_read_only_and_mend_repairs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tex")).unwrap();
        std::fs::write(dir.path().join("tex/a.png"), b"png").unwrap();
        let config = Arc::new(ResourceConfig::with_root(dir.path()));

        assert!(validate(&config).is_err());
        assert!(!dir.path().join(aster_io::DATABASE_FILE_NAME).exists());
        assert!(!dir.path().join("tex/a.png.meta").exists());

        mend(&config).unwrap();
        assert!(dir.path().join(aster_io::DATABASE_FILE_NAME).is_file());
        assert!(dir.path().join("tex/a.png.meta").is_file());
        validate(&config).unwrap();
    }
}
