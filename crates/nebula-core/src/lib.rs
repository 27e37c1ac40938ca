//! Replication engine between `nebula-api` and the `nebula-sync` binary.
//!
//! - **[`Synchronizer`]** — owns the primary and replica
//!   [`SessionClient`](nebula_api::SessionClient)s and runs one replication
//!   pass per [`run()`](Synchronizer::run), full or selective depending on
//!   the [`SyncPlan`]. Replica failures are collected, not short-circuited.
//!
//! - **[`filter`]** — include/exclude of dotted key paths over a
//!   configuration document.
//!
//! - **[`RetryPolicy`]** — fixed-delay bounded retry around a single
//!   appliance operation.
//!
//! - **[`SyncCallback`]** — run-completion hook. [`SyncState`] keeps the
//!   bounded outcome history behind the health endpoint and
//!   [`WebhookNotifier`] forwards outcomes over HTTP.

pub mod callback;
pub mod error;
pub mod filter;
pub mod plan;
pub mod retry;
pub mod state;
pub mod sync;
pub mod webhook;

// ── Primary re-exports ──────────────────────────────────────────────
pub use callback::SyncCallback;
pub use error::{ReplicaFailure, SyncError};
pub use filter::{FilterError, FilterMode, FilterSpec};
pub use plan::{Category, CategorySetting, GravitySettings, SyncMode, SyncPlan};
pub use retry::{Retryable, RetryBudget, RetryPolicy};
pub use state::{Outcome, SyncState};
pub use sync::Synchronizer;
pub use webhook::{WebhookError, WebhookNotifier, WebhookRequest, WebhookSettings};
