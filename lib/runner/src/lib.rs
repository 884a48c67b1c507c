//! # Ekara Runner
//!
//! The Playbook Runner (C8) and Inventory Builder (C9): spawns the
//! external Ansible tooling, streams its output, and collects `TASK [...]`
//! events for the progress notifier (§4.6, §4.7). Grounded on the
//! concurrency shape of the source `ansible.go` (one task draining stdout,
//! one draining stderr, a select loop over both plus process exit) using
//! this workspace's usual async idiom: `tokio::process` with bounded
//! `mpsc` line channels instead of raw goroutine-style pipes, and a
//! `CancellationToken` in place of a context cancellation channel.

mod error;
mod inventory;
mod notifier;
mod playbook;

pub use error::RunnerError;
pub use inventory::{Inventory, InventorySpec, build_inventory};
pub use notifier::{NoopNotifier, Notifier};
pub use playbook::{PlayOutcome, PlaybookSpec, play};
