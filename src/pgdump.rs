//! `pg_dump` command construction for database snapshots.
//!
//! Like the rest of the command builders in this crate, nothing here executes
//! anything.  Every function is pure apart from [`TargetsSource::load`],
//! which may read a targets file from disk.
//!
//! # Pipeline
//!
//! 1. [`Template::from_style`] turns the builder style token into a template.
//! 2. [`select_targets`] picks where the [`Targets`] for this invocation come
//!    from, either a built-in preset or a user-supplied YAML file, and
//!    [`TargetsSource::load`] reads them.
//! 3. [`build_commands`] renders one [`DumpCommand`] per database, in the
//!    fixed order primary, codeintel, codeinsights.
//!
//! # Targets file format
//!
//! ```yaml
//! primary:
//!   target: pgsql       # container, statefulset, or host; empty for local
//!   dbname: sg
//!   username: sg
//!   password: sg        # only include non-sensitive passwords
//! codeintel:
//!   # same as above
//! codeinsights:
//!   # same as above
//! ```

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, FileError};

/// Directory the generated commands write their dumps into.
pub const SNAPSHOT_DIR: &str = "src-snapshot";

/// Selector value that derives the preset from the template.
pub const AUTO_TARGETS: &str = "auto";

// ─── Targets ──────────────────────────────────────────────────────────────────

/// Connection parameters for one database deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    /// Where the database lives: a docker container name, a kubernetes
    /// resource such as `statefulset/pgsql`, or a host.  Empty means the
    /// local default.
    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub dbname: String,

    #[serde(default)]
    pub username: String,

    /// Only include passwords that are not sensitive.
    #[serde(default)]
    pub password: String,
}

/// The three databases of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Targets {
    #[serde(default)]
    pub primary: Target,

    #[serde(default)]
    pub codeintel: Target,

    #[serde(default)]
    pub codeinsights: Target,
}

impl Targets {
    /// Targets paired with the file name their dump is written to, in
    /// output order.
    pub fn outputs(&self) -> [(&'static str, &Target); 3] {
        [
            ("primary.sql", &self.primary),
            ("codeintel.sql", &self.codeintel),
            ("codeinsights.sql", &self.codeinsights),
        ]
    }
}

fn target(target: &str, dbname: &str, username: &str, password: &str) -> Target {
    Target {
        target: target.into(),
        dbname: dbname.into(),
        username: username.into(),
        password: password.into(),
    }
}

/// Built-in targets for the default deployment configurations.
///
/// The credentials are the documented defaults of each deployment method.
pub fn preset(name: &str) -> Option<Targets> {
    let targets = match name {
        "local" => Targets {
            primary: target("", "sg", "sg", "sg"),
            codeintel: target("", "sg", "sg", "sg"),
            codeinsights: target("", "postgres", "postgres", "password"),
        },
        // deploy-sourcegraph-managed
        "docker" => Targets {
            primary: target("pgsql", "sg", "sg", "sg"),
            codeintel: target("codeintel-db", "sg", "sg", "sg"),
            codeinsights: target("codeinsights-db", "postgres", "postgres", "password"),
        },
        // deploy-sourcegraph-helm
        "k8s" => Targets {
            primary: target("statefulset/pgsql", "sg", "sg", "sg"),
            codeintel: target("statefulset/codeintel-db", "sg", "sg", "sg"),
            codeinsights: target("statefulset/codeinsights-db", "postgres", "postgres", "password"),
        },
        _ => return None,
    };
    Some(targets)
}

// ─── Templates ────────────────────────────────────────────────────────────────

/// How the generated command reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Run `pg_dump` directly, optionally against a remote host.
    PgDump,
    /// Run `pg_dump` inside a docker container.
    Docker,
    /// Run `pg_dump` inside a kubernetes pod.
    Kubectl,
}

impl Template {
    /// Parse the builder style given on the command line.  An empty style
    /// selects [`Template::PgDump`].
    pub fn from_style(style: &str) -> Result<Self, Error> {
        match style {
            "" | "pg_dump" => Ok(Self::PgDump),
            "docker" => Ok(Self::Docker),
            "kubectl" => Ok(Self::Kubectl),
            other => Err(Error::UnknownTemplate(other.to_string())),
        }
    }

    /// Preset used when targets are `auto`.
    pub const fn default_preset(self) -> &'static str {
        match self {
            Self::PgDump => "local",
            Self::Docker => "docker",
            Self::Kubectl => "k8s",
        }
    }

    /// Render the command that dumps `t` to stdout.
    pub fn render(self, t: &Target) -> String {
        let dump = pg_dump(t);
        if t.target.is_empty() {
            return dump;
        }
        match self {
            Self::PgDump => format!("{dump} --host={}", t.target),
            Self::Docker => format!("docker exec -it {} sh -c '{dump}'", t.target),
            Self::Kubectl => format!("kubectl exec -it {} -- bash -c '{dump}'", t.target),
        }
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_style(s)
    }
}

/// The bare `pg_dump` invocation for `t`.
///
/// `PGPASSWORD` is only set when a password is configured so that `pg_dump`
/// falls back to `.pgpass` or a prompt otherwise.
pub fn pg_dump(t: &Target) -> String {
    let cmd = format!(
        "pg_dump --no-owner --format=p --no-acl --clean --if-exists --username={} {}",
        t.username, t.dbname
    );
    if t.password.is_empty() {
        cmd
    } else {
        format!("PGPASSWORD={} {cmd}", t.password)
    }
}

// ─── Resolution ───────────────────────────────────────────────────────────────

/// Where the active [`Targets`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetsSource {
    Preset(String),
    File(PathBuf),
}

impl fmt::Display for TargetsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset(name) => write!(f, "predefined targets for {name} environments"),
            Self::File(path) => write!(f, "targets defined in targets file {:?}", path.display().to_string()),
        }
    }
}

/// Decide where the targets for this invocation come from, without reading
/// anything.
///
/// `auto` picks the template's default preset.  Any other known preset name
/// is used as-is; everything else is treated as the path to a targets file.
pub fn select_targets(selector: &str, template: Template) -> TargetsSource {
    let key = if selector == AUTO_TARGETS {
        template.default_preset()
    } else {
        selector
    };

    if preset(key).is_some() {
        TargetsSource::Preset(key.to_string())
    } else {
        TargetsSource::File(PathBuf::from(key))
    }
}

impl TargetsSource {
    /// Materialise the targets, reading the file for [`TargetsSource::File`].
    pub fn load(&self) -> Result<Targets, Error> {
        match self {
            Self::Preset(name) => {
                debug!(preset = %name, "using predefined targets");
                preset(name).ok_or_else(|| Error::UnknownPreset(name.clone()))
            },
            Self::File(path) => {
                debug!(path = %path.display(), "loading targets file");
                load_targets_file(path).map_err(|source| Error::TargetsFile {
                    path: path.clone(),
                    source,
                })
            },
        }
    }
}

/// [`select_targets`] followed by [`TargetsSource::load`].
#[cfg(test)]
pub fn resolve_targets(selector: &str, template: Template) -> Result<(TargetsSource, Targets), Error> {
    let source = select_targets(selector, template);
    let targets = source.load()?;
    Ok((source, targets))
}

/// Read a targets YAML file.
pub fn load_targets_file(path: &Path) -> Result<Targets, FileError> {
    let f = File::open(path)?;
    Ok(serde_yaml::from_reader(f)?)
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// One rendered dump command and the file its output is redirected into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpCommand {
    pub command: String,
    pub output: PathBuf,
}

impl fmt::Display for DumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.command, self.output.display())
    }
}

/// Render one command per database in `targets`, writing into `out_dir`.
pub fn build_commands(out_dir: &Path, template: Template, targets: &Targets) -> Vec<DumpCommand> {
    targets
        .outputs()
        .into_iter()
        .map(|(file, t)| DumpCommand {
            command: template.render(t),
            output: out_dir.join(file),
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn k8s() -> Targets {
        preset("k8s").unwrap()
    }

    // ── Template::from_style ──────────────────────────────────────────────────

    #[test]
    fn empty_style_is_pg_dump() {
        assert_eq!(Template::from_style("").unwrap(), Template::PgDump);
        assert_eq!(Template::from_style("pg_dump").unwrap(), Template::PgDump);
    }

    #[test]
    fn unknown_style_errors() {
        let err = Template::from_style("frobnicate").unwrap_err();
        assert!(matches!(err, Error::UnknownTemplate(ref s) if s == "frobnicate"));
    }

    #[test]
    fn style_is_case_sensitive() {
        assert!("Docker".parse::<Template>().is_err());
        assert_eq!("docker".parse::<Template>().unwrap(), Template::Docker);
    }

    // ── pg_dump ───────────────────────────────────────────────────────────────

    #[test]
    fn pg_dump_omits_pgpassword_without_password() {
        let cmd = pg_dump(&target("", "sg", "sg", ""));
        assert!(!cmd.contains("PGPASSWORD"));
        assert!(cmd.starts_with("pg_dump "));
    }

    #[test]
    fn pg_dump_embeds_connection_parameters() {
        let cmd = pg_dump(&target("", "db1", "alice", "hunter2"));
        assert!(cmd.starts_with("PGPASSWORD=hunter2 "));
        assert!(cmd.contains("--username=alice"));
        assert!(cmd.ends_with(" db1"));
    }

    // ── Template::render ──────────────────────────────────────────────────────

    #[test]
    fn kubectl_renders_exec_wrapper() {
        insta::assert_snapshot!(
            Template::Kubectl.render(&k8s().primary),
            @"kubectl exec -it statefulset/pgsql -- bash -c 'PGPASSWORD=sg pg_dump --no-owner --format=p --no-acl --clean --if-exists --username=sg sg'"
        );
    }

    #[test]
    fn docker_renders_exec_wrapper() {
        let t = preset("docker").unwrap();
        insta::assert_snapshot!(
            Template::Docker.render(&t.codeinsights),
            @"docker exec -it codeinsights-db sh -c 'PGPASSWORD=password pg_dump --no-owner --format=p --no-acl --clean --if-exists --username=postgres postgres'"
        );
    }

    #[test]
    fn pg_dump_adds_host_for_named_target() {
        let cmd = Template::PgDump.render(&target("db.internal", "sg", "sg", "sg"));
        assert!(cmd.ends_with(" sg --host=db.internal"));
    }

    #[test]
    fn empty_target_renders_bare_command_for_every_template() {
        let t = preset("local").unwrap().primary;
        let bare = pg_dump(&t);
        for template in [Template::PgDump, Template::Docker, Template::Kubectl] {
            assert_eq!(template.render(&t), bare);
        }
    }

    // ── resolve_targets ───────────────────────────────────────────────────────

    #[test]
    fn auto_follows_template() {
        let cases = [
            (Template::PgDump, "local"),
            (Template::Docker, "docker"),
            (Template::Kubectl, "k8s"),
        ];
        for (template, expected) in cases {
            let (source, targets) = resolve_targets(AUTO_TARGETS, template).unwrap();
            assert_eq!(source, TargetsSource::Preset(expected.into()));
            assert_eq!(targets, preset(expected).unwrap());
        }
    }

    #[test]
    fn explicit_preset_overrides_template_default() {
        let (source, targets) = resolve_targets("k8s", Template::Docker).unwrap();
        assert_eq!(source, TargetsSource::Preset("k8s".into()));
        assert_eq!(targets.primary.target, "statefulset/pgsql");
    }

    #[test]
    fn unknown_selector_loads_yaml_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
primary:
  target: my-pg
  dbname: main
  username: admin
  password: ""
codeintel:
  target: my-ci
  dbname: ci
  username: admin
codeinsights:
  dbname: insights
  username: admin
"#
        )
        .unwrap();

        let selector = f.path().to_str().unwrap();
        let (source, targets) = resolve_targets(selector, Template::Docker).unwrap();
        assert_eq!(source, TargetsSource::File(f.path().to_path_buf()));
        assert_eq!(targets.primary, target("my-pg", "main", "admin", ""));
        assert_eq!(targets.codeintel.target, "my-ci");
        assert!(targets.codeinsights.target.is_empty());
    }

    #[test]
    fn loading_an_unknown_preset_errors() {
        let err = TargetsSource::Preset("staging".into()).load().unwrap_err();
        assert!(matches!(err, Error::UnknownPreset(ref s) if s == "staging"));
    }

    #[test]
    fn selecting_a_file_reads_nothing() {
        let source = select_targets("/tmp/no-such-targets-abc123.yaml", Template::Kubectl);
        assert_eq!(
            source,
            TargetsSource::File(PathBuf::from("/tmp/no-such-targets-abc123.yaml"))
        );
        assert_eq!(
            source.to_string(),
            r#"targets defined in targets file "/tmp/no-such-targets-abc123.yaml""#
        );
    }

    #[test]
    fn missing_targets_file_is_wrapped_with_path() {
        let err = resolve_targets("/tmp/no-such-targets-abc123.yaml", Template::PgDump).unwrap_err();
        match err {
            Error::TargetsFile { path, source } => {
                assert_eq!(path, PathBuf::from("/tmp/no-such-targets-abc123.yaml"));
                assert!(matches!(source, FileError::Io(_)));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_targets_file_is_a_yaml_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "primary: [not, a, target").unwrap();

        let err = resolve_targets(f.path().to_str().unwrap(), Template::PgDump).unwrap_err();
        assert!(matches!(
            err,
            Error::TargetsFile {
                source: FileError::Yaml(_),
                ..
            }
        ));
    }

    // ── build_commands ────────────────────────────────────────────────────────

    #[test]
    fn commands_follow_fixed_order() {
        let cmds = build_commands(Path::new("out"), Template::Kubectl, &k8s());
        let outputs: Vec<_> = cmds.iter().map(|c| c.output.clone()).collect();
        assert_eq!(outputs, vec![
            PathBuf::from("out/primary.sql"),
            PathBuf::from("out/codeintel.sql"),
            PathBuf::from("out/codeinsights.sql"),
        ]);
        assert!(cmds[1].command.contains("statefulset/codeintel-db"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = build_commands(Path::new(SNAPSHOT_DIR), Template::Docker, &preset("docker").unwrap());
        let b = build_commands(Path::new(SNAPSHOT_DIR), Template::Docker, &preset("docker").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn dump_command_display_redirects_into_output() {
        let cmds = build_commands(Path::new(SNAPSHOT_DIR), Template::PgDump, &preset("local").unwrap());
        insta::assert_snapshot!(
            cmds[2].to_string(),
            @"PGPASSWORD=password pg_dump --no-owner --format=p --no-acl --clean --if-exists --username=postgres postgres > src-snapshot/codeinsights.sql"
        );
    }
}
