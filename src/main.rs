//! `src-rs` — repository metadata and database snapshot helpers.
//!
//! # Usage
//!
//! ```text
//! src-rs repos add-kvp --repo=<id> --key=<key> [--value=<value>]
//! src-rs snapshot databases [pg_dump|docker|kubectl] [--targets=<auto|local|docker|k8s|file.yaml>]
//! ```
//!
//! # Module layout
//!
//! | Module                          | Responsibility                           |
//! |---------------------------------|------------------------------------------|
//! | [`cli`]                         | Argument types parsed by clap            |
//! | [`config`]                      | API endpoint/token config (TOML + env)   |
//! | [`api`]                         | GraphQL client and transport             |
//! | [`pgdump`]                      | Targets, presets, dump command templates |
//! | [`error`]                       | Typed errors                             |
//! | [`ui`]                          | Status lines, command blocks, spinner    |
//! | [`commands::repos_add_kvp`]     | `repos add-kvp` subcommand               |
//! | [`commands::snapshot_databases`]| `snapshot databases` subcommand          |

mod api;
mod cli;
mod commands;
mod config;
mod error;
mod pgdump;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, ReposCommand, SnapshotCommand, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        // ── src-rs repos add-kvp ──────────────────────────────────────────────
        Subcommand::Repos(ReposCommand::AddKvp(args)) => {
            commands::repos_add_kvp::run(&cli, args)?;
        },

        // ── src-rs snapshot databases ─────────────────────────────────────────
        Subcommand::Snapshot(SnapshotCommand::Databases(args)) => {
            commands::snapshot_databases::run(args)?;
        },
    }

    Ok(())
}

/// Log to stderr at `warn`, or this crate at `debug` with `--verbose`.
/// `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default = if verbose { "warn,src_rs=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
