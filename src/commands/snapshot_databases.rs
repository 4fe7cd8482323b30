//! `src-rs snapshot databases` — print the commands that dump each database.
//!
//! Nothing is executed.  The handler resolves the template and targets,
//! renders one `pg_dump` command per database, makes sure the snapshot
//! directory exists, and prints the commands for the operator to run.
//!
//! | Builder            | Default targets | Wrapper                         |
//! |--------------------|-----------------|---------------------------------|
//! | `pg_dump` / (none) | `local`         | `--host=<target>`               |
//! | `docker`           | `docker`        | `docker exec -it <target> sh`   |
//! | `kubectl`          | `k8s`           | `kubectl exec -it <target> bash`|

use std::{io::Write, path::Path};

use anyhow::Result;
use tracing::warn;

use crate::{
    cli::DatabasesArgs,
    pgdump::{DumpCommand, SNAPSHOT_DIR, Template, build_commands, select_targets},
    ui,
};

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn run(args: &DatabasesArgs) -> Result<()> {
    plan(args, Path::new(SNAPSHOT_DIR), &mut std::io::stdout().lock())?;
    Ok(())
}

/// Resolve, render and print the dump commands, writing dumps into `out_dir`.
///
/// An unknown builder fails before any file is touched.  The targets source
/// is announced before it is loaded, so a bad targets file still names
/// itself ahead of the error.  Failing to create
/// `out_dir` is reported but does not stop the commands from being printed.
pub fn plan(args: &DatabasesArgs, out_dir: &Path, w: &mut impl Write) -> Result<Vec<DumpCommand>> {
    let template = Template::from_style(args.builder.as_deref().unwrap_or_default())?;

    let source = select_targets(&args.targets, template);
    ui::info(w, &format!("Using {source}"))?;
    let targets = source.load()?;

    let commands = build_commands(out_dir, template, &targets);

    if let Err(e) = std::fs::create_dir_all(out_dir) {
        warn!(dir = %out_dir.display(), error = %e, "failed to create snapshot directory");
        ui::warning(
            w,
            &format!("Could not create output directory {}: {e}", out_dir.display()),
        )?;
    }

    ui::success_block(
        w,
        "Run these commands to generate the required database dumps:",
        commands.iter().map(ToString::to_string),
    )?;
    ui::suggestion(
        w,
        "Note that you may need to do some additional setup, such as authentication, beforehand.",
    )?;

    Ok(commands)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn args(builder: &str, targets: &str) -> DatabasesArgs {
        DatabasesArgs {
            builder: Some(builder.into()),
            targets: targets.into(),
        }
    }

    #[test]
    fn docker_auto_uses_docker_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        let cmds = plan(&args("docker", "auto"), dir.path(), &mut out).unwrap();

        assert!(cmds[0].command.starts_with("docker exec -it pgsql sh -c '"));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Using predefined targets for docker environments"));
    }

    #[test]
    fn creates_nested_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("a").join("snapshot");

        plan(&args("", "auto"), &out_dir, &mut Vec::new()).unwrap();

        assert!(out_dir.is_dir());
    }

    #[test]
    fn prints_three_commands_and_note() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        plan(&args("kubectl", "auto"), dir.path(), &mut out).unwrap();

        let out = console::strip_ansi_codes(&String::from_utf8(out).unwrap()).into_owned();
        assert_eq!(out.matches("kubectl exec -it statefulset/").count(), 3);
        assert!(out.contains("additional setup"));
    }

    #[test]
    fn unknown_builder_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("never");
        let mut out = Vec::new();

        let err = plan(&args("frobnicate", "/tmp/no-such-targets-abc123.yaml"), &out_dir, &mut out).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnknownTemplate(s)) if s == "frobnicate"
        ));
        assert!(!out_dir.exists());
        assert!(out.is_empty());
    }

    #[test]
    fn bad_targets_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("never");

        let mut out = Vec::new();

        let err = plan(&args("docker", "/tmp/no-such-targets-abc123.yaml"), &out_dir, &mut out).unwrap_err();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::TargetsFile { .. })));
        assert!(!out_dir.exists());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(
            r#"Using targets defined in targets file "/tmp/no-such-targets-abc123.yaml""#
        ));
        assert!(!out.contains("Run these commands"));
    }

    #[test]
    fn directory_failure_is_reported_but_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let mut out = Vec::new();

        let cmds = plan(&args("pg_dump", "auto"), &blocker.join("sub"), &mut out).unwrap();

        assert_eq!(cmds.len(), 3);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Could not create output directory"));
    }
}
