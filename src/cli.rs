//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::pgdump::AUTO_TARGETS;

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "src-rs",
    about   = "Repository metadata and database snapshot helpers for Sourcegraph",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the configuration file.
    ///
    /// Defaults to `<config dir>/src-rs/config.toml`.  The file is optional;
    /// `SRC_ENDPOINT` and `SRC_ACCESS_TOKEN` override whatever it contains.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug logging to stderr.  `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Manage repositories.
    #[command(subcommand)]
    Repos(ReposCommand),

    /// Manage instance snapshots.
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
}

#[derive(clap::Subcommand, Debug)]
pub enum ReposCommand {
    /// Add a key-value pair to a repository.
    #[command(after_help = "\
Examples:

  Add a key-value pair to a repository:

        $ src-rs repos add-kvp --repo=repoID --key=mykey --value=myvalue

  Omitting --value will create a tag (a key with a null value).")]
    AddKvp(AddKvpArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum SnapshotCommand {
    /// Generate commands to export database dumps.
    ///
    /// The commands are printed, never run.  They are intended as a reference
    /// and may need adjusting for your deployment.
    #[command(after_help = "\
TARGETS FILES
  Predefined targets are available based on default configurations
  ('local', 'docker', 'k8s').  Custom targets can be provided in YAML
  format with '--targets=targets.yaml', e.g.

    primary:
      target: ...   # e.g. in docker, the name of the database container
      dbname: ...   # name of database
      username: ... # username for database access
      password: ... # only include password if it is non-sensitive
    codeintel:
      # same as above
    codeinsights:
      # same as above")]
    Databases(DatabasesArgs),
}

/// Arguments of `repos add-kvp`.
///
/// `key` and `value` are `Option` so that "not passed" is distinguishable
/// from "passed as an empty string".
#[derive(Args, Debug, Clone, Default)]
pub struct AddKvpArgs {
    /// The ID of the repo to add the key-value pair to (required).
    #[arg(long)]
    pub repo: Option<String>,

    /// The name of the key to add (required).
    #[arg(long)]
    pub key: Option<String>,

    /// The value associated with the key.  Defaults to null.
    #[arg(long)]
    pub value: Option<String>,

    #[command(flatten)]
    pub api: ApiFlags,
}

/// Arguments of `snapshot databases`.
#[derive(Args, Debug, Clone)]
pub struct DatabasesArgs {
    /// How the commands reach the databases: `pg_dump` (default), `docker`
    /// or `kubectl`.
    pub builder: Option<String>,

    /// Predefined targets ('local', 'docker' or 'k8s'), or a custom targets
    /// YAML file.  `auto` picks the preset matching the builder.
    #[arg(long, default_value = AUTO_TARGETS)]
    pub targets: String,
}

/// Flags shared by every command that talks to the API.
#[derive(Args, Debug, Clone, Default)]
pub struct ApiFlags {
    /// Print the curl command for the request instead of sending it.
    #[arg(long)]
    pub get_curl: bool,

    /// Log the request and response bodies to stderr.
    #[arg(long)]
    pub dump_requests: bool,

    /// Ask the server to trace the request and log the trace URL.
    #[arg(long)]
    pub trace: bool,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure_skip_verify: bool,
}
