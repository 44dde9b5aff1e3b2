//! wlsc migrates Whisker Language Script stories to WLS 2.0 and validates
//! story documents
//!
//! The crate has two halves:
//!
//! - [`Migrator`] rewrites 1.x story source: it inserts or rewrites the
//!   `@version` directive, renames variables that collide with 2.0 reserved
//!   words and flags constructs that need a human to look at them.
//! - [`StoryValidator`] runs a fixed set of [`Validator`]s over a [`Story`]
//!   and collects [`Issue`]s, many of which carry an idempotent [`Fix`].
//!
//! The `wls-migrate` and `wls-lint` binaries are thin wrappers around
//! [`migrate_tool::run`] and [`linter::lint`].
#[macro_use]
mod macros;

mod config;
pub use config::CliConfig;
pub use config::Config;
pub use config::ConfigFile;
pub use config::LintProfile;
pub use config::MigrateOptions;

pub mod issue;
pub use issue::{Category, Fix, FixAction, FixOutcome, Issue, Severity};

pub mod reserved;

pub mod scanner;

pub mod migration;
pub use migration::{format_report, MigrationResult, Migrator};

pub mod story;
pub use story::Story;

pub mod twee;

pub mod validators;
pub use validators::{StoryValidator, ValidationResult, Validator};

pub mod report;
pub use report::{ReportFormat, Reporter};

pub mod utils;

pub mod linter;

pub mod migrate_tool;
