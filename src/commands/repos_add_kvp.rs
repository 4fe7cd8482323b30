//! `src-rs repos add-kvp` — attach a key-value pair (or a tag) to a repo.
//!
//! Omitting `--value` creates a tag: the key is stored with a `null` value.
//! Passing `--value=` stores an empty string instead.  The two are kept
//! apart all the way into the request variables.

use std::io::Write;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use crate::{
    api::{Client, Outcome, Request, Transport},
    cli::{AddKvpArgs, Cli},
    config,
    error::Error,
    ui,
};

const QUERY: &str = "mutation addKVP(
  $repo: ID!,
  $key: String!,
  $value: String,
) {
  addRepoKeyValuePair(
    repo: $repo,
    key: $key,
    value: $value,
  ) {
    alwaysNil
  }
}";

/// A validated key-value pair ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub repo_id: String,
    pub key: String,
    /// `None` stores a tag (null value).
    pub value: Option<String>,
}

impl TryFrom<&AddKvpArgs> for KeyValuePair {
    type Error = Error;

    fn try_from(args: &AddKvpArgs) -> Result<Self, Self::Error> {
        let repo_id = match args.repo.as_deref() {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => return Err(Error::Validation { flag: "repo" }),
        };
        let key = args.key.clone().ok_or(Error::Validation { flag: "key" })?;
        Ok(Self {
            repo_id,
            key,
            value: args.value.clone(),
        })
    }
}

impl KeyValuePair {
    pub fn request(&self) -> Request {
        Request {
            name: "AddKVP",
            query: QUERY,
            variables: json!({
                "repo": self.repo_id,
                "key": self.key,
                "value": self.value,
            }),
        }
    }

    /// Line printed once the pair has been created.
    pub fn confirmation(&self) -> String {
        let value = self.value.as_deref().unwrap_or("<nil>");
        format!("Key-value pair '{}:{value}' created.", self.key)
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Validate the flags, then send the mutation once.
///
/// Validation runs before the config is loaded or a client is built, so a
/// missing flag never costs a network round-trip.
pub fn run(cli: &Cli, args: &AddKvpArgs) -> Result<()> {
    let kvp = KeyValuePair::try_from(args)?;
    let config = config::load(cli.config.as_deref())?;
    debug!(endpoint = %config.endpoint, repo = %kvp.repo_id, "adding key-value pair");

    let client = Client::new(config, args.api.clone())?;
    execute(&client, &kvp, &mut std::io::stdout().lock())
}

/// Send the mutation through `client` and print the result to `w`.
pub fn execute<T: Transport>(client: &Client<T>, kvp: &KeyValuePair, w: &mut impl Write) -> Result<()> {
    let flags = client.flags();
    let spinner = (!flags.get_curl && !flags.dump_requests).then(|| ui::spinner("Adding key-value pair"));

    let outcome = client.execute::<serde_json::Value>(&kvp.request());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match outcome? {
        Outcome::Curl(curl) => writeln!(w, "{curl}")?,
        Outcome::Data { data, trace } => {
            debug!(response = ?data, "key-value pair added");
            if let Some(trace) = trace {
                ui::info(w, &format!("Trace: {trace}"))?;
            }
            writeln!(w, "{}", kvp.confirmation())?;
        },
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
