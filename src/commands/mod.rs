//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File                    | Invocation                  | Description                       |
//! |-------------------------|-----------------------------|-----------------------------------|
//! | `repos_add_kvp.rs`      | `src-rs repos add-kvp`      | Add a key-value pair to a repo    |
//! | `snapshot_databases.rs` | `src-rs snapshot databases` | Print database dump commands      |

pub mod repos_add_kvp;
pub mod snapshot_databases;
