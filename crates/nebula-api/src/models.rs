// Wire models for the Pi-hole v6 API
//
// Request and response bodies for /api/auth, /api/teleporter and /api/config.
// The configuration document itself is left untyped: the sync layer treats
// it as a generic tree and never assumes a schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Hierarchical configuration document (`/api/config` payload).
///
/// Values are `serde_json::Value`, a recursive tagged tree of
/// null / bool / number / string / array / object.
pub type ConfigDocument = Map<String, Value>;

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub session: AuthSession,
}

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
pub(crate) struct AuthSession {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub totp: bool,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub csrf: Option<String>,
    #[serde(default)]
    pub validity: i64,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Teleporter ───────────────────────────────────────────────────────

/// Gravity database tables to restore from a teleporter bundle.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GravitySelector {
    pub group: bool,
    pub adlist: bool,
    pub adlist_by_group: bool,
    pub domainlist: bool,
    pub domainlist_by_group: bool,
    pub client: bool,
    pub client_by_group: bool,
}

impl GravitySelector {
    pub fn all() -> Self {
        Self {
            group: true,
            adlist: true,
            adlist_by_group: true,
            domainlist: true,
            domainlist_by_group: true,
            client: true,
            client_by_group: true,
        }
    }

    pub fn any(&self) -> bool {
        self.group
            || self.adlist
            || self.adlist_by_group
            || self.domainlist
            || self.domainlist_by_group
            || self.client
            || self.client_by_group
    }
}

/// The `import` field of a teleporter upload: which parts of the bundle
/// the receiving appliance should apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSelector {
    pub config: bool,
    pub dhcp_leases: bool,
    pub gravity: GravitySelector,
}

impl ImportSelector {
    /// Selector that restores everything in the bundle.
    pub fn all() -> Self {
        Self {
            config: true,
            dhcp_leases: true,
            gravity: GravitySelector::all(),
        }
    }

    /// Returns `true` if at least one flag is set.
    pub fn any(&self) -> bool {
        self.config || self.dhcp_leases || self.gravity.any()
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigResponse {
    pub config: ConfigDocument,
}

#[derive(Debug, Serialize)]
pub(crate) struct PatchConfigRequest<'a> {
    pub config: &'a ConfigDocument,
}
