//! CLI command implementations.

use anyhow::{Context, Result};
use bb2gl_migrate::{
    ConsoleProgressReporter, ImportBundle, MigrationConfig, MigrationProgress, Migrator,
};
use std::path::Path;

/// Load and validate the configuration file.
fn load_config(path: &Path) -> Result<MigrationConfig> {
    MigrationConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Run a full migration.
pub fn migrate(config_path: &Path, show_progress: bool) -> Result<()> {
    let config = load_config(config_path)?;

    tracing::info!(
        project = %config.project_path,
        input = %config.input_path.display(),
        "Starting migration"
    );

    let mut migrator = Migrator::from_config(&config).context("failed to prepare migration")?;

    let reporter = show_progress.then(ConsoleProgressReporter::new);
    if let Some(reporter) = &reporter {
        migrator = migrator.with_progress(MigrationProgress::with_callback(reporter.callback()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let outcome = runtime.block_on(migrator.migrate());

    match outcome {
        Ok(report) => {
            if let Some(reporter) = &reporter {
                reporter.finish("done");
            }
            report.print_summary();
            Ok(())
        }
        Err(e) => {
            if let Some(reporter) = &reporter {
                reporter.abandon();
            }
            Err(e).context("migration aborted")
        }
    }
}

/// Validate configuration and export, printing what a run would migrate.
pub fn check(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let bundle = ImportBundle::load(&config.input_path)
        .with_context(|| format!("invalid export {}", config.input_path.display()))?;

    println!("{}", summarize(&config, &bundle));
    Ok(())
}

fn summarize(config: &MigrationConfig, bundle: &ImportBundle) -> String {
    let users: Vec<&str> = config
        .credentials
        .iter()
        .map(|c| c.username.as_str())
        .collect();

    format!(
        "Target:      {} ({})\n\
         Identities:  {}\n\
         Milestones:  {}\n\
         Components:  {}\n\
         Issues:      {}\n\
         Comments:    {}",
        config.project_path,
        config.api_url,
        users.join(", "),
        bundle.milestones.len(),
        bundle.components.len(),
        bundle.issues.len(),
        bundle.comments.len(),
    )
}
