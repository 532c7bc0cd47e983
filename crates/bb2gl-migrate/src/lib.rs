//! # bb2gl Migration
//!
//! This crate migrates the issue tracker of a Bitbucket repository into a
//! GitLab project, starting from Bitbucket's JSON issue export.
//!
//! ## Features
//!
//! - **Milestones**: created on GitLab unless one with the same title exists
//! - **Labels**: one per component, one per priority (`P0`..`P4`) and `on hold`
//! - **Issues**: created in id order with their comments as notes, closed
//!   when resolved or on hold
//! - **Attribution**: every write goes through the GitLab token mapped to the
//!   Bitbucket user who authored it
//!
//! ## Example
//!
//! ```rust,ignore
//! use bb2gl_migrate::{MigrationConfig, Migrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MigrationConfig::load("bb2gl.toml")?;
//!     let migrator = Migrator::from_config(&config)?;
//!     let report = migrator.migrate().await?;
//!
//!     report.print_summary();
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod credentials;
pub mod error;
pub mod gitlab;
pub mod index;
pub mod mapping;
pub mod migrate;
pub mod progress;
pub mod settings;
pub mod types;

// Re-export main types
pub use bundle::ImportBundle;
pub use credentials::CredentialTable;
pub use error::{MigrationError, Result};
pub use gitlab::{GitLabApi, GitLabClient};
pub use mapping::{Priority, TranslatedIssue};
pub use migrate::Migrator;
pub use progress::{ConsoleProgressReporter, MigrationPhase, MigrationProgress, ProgressCallback};
pub use settings::MigrationConfig;
pub use types::MigrationReport;

/// Version of the migration tools.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
