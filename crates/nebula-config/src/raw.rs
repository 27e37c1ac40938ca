// Raw configuration layers as figment extracts them.
//
// Environment variables are flat (`SYNC_CONFIG_DNS_INCLUDE`). They are
// mapped onto the nested layout used by TOML files
// (`[sync_config.dns] include = ...`) before extraction, so both sources
// land in the same structs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Value shapes ────────────────────────────────────────────────────

/// A list given either as one comma-separated string (environment) or as
/// a TOML array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum ListValue {
    Joined(String),
    Items(Vec<String>),
}

impl ListValue {
    /// Trimmed, non-blank entries.
    pub(crate) fn items(&self) -> Vec<String> {
        match self {
            Self::Joined(value) => split_list(value),
            Self::Items(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Webhook headers: `key:value,key:value` or a TOML table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum HeaderValue {
    Joined(String),
    Table(BTreeMap<String, String>),
}

// ── Layers ──────────────────────────────────────────────────────────

#[derive(Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawSettings {
    pub primary: Option<String>,
    pub primary_file: Option<PathBuf>,
    pub replicas: Option<ListValue>,
    pub replicas_file: Option<PathBuf>,
    pub full_sync: bool,
    pub run_gravity: bool,
    pub cron: Option<String>,
    pub sync_config: BTreeMap<String, RawCategory>,
    pub sync_gravity: RawGravity,
    pub client: RawClient,
    pub webhook: RawWebhooks,
    pub api: RawApi,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            primary: None,
            primary_file: None,
            replicas: None,
            replicas_file: None,
            full_sync: true,
            run_gravity: false,
            cron: None,
            sync_config: BTreeMap::new(),
            sync_gravity: RawGravity::default(),
            client: RawClient::default(),
            webhook: RawWebhooks::default(),
            api: RawApi::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawCategory {
    pub enabled: bool,
    pub include: Option<ListValue>,
    pub exclude: Option<ListValue>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawGravity {
    pub dhcp_leases: bool,
    pub group: bool,
    pub ad_list: bool,
    pub ad_list_by_group: bool,
    pub domain_list: bool,
    pub domain_list_by_group: bool,
    pub client: bool,
    pub client_by_group: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawClient {
    pub skip_tls_verification: bool,
    pub retry_delay_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for RawClient {
    fn default() -> Self {
        Self {
            skip_tls_verification: false,
            retry_delay_seconds: 1,
            timeout_seconds: 20,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawWebhooks {
    pub success: RawWebhook,
    pub failure: RawWebhook,
    pub skip_tls_verification: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawWebhook {
    pub url: Option<String>,
    pub method: Option<String>,
    pub body: Option<String>,
    pub headers: Option<HeaderValue>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawApi {
    pub enabled: bool,
    pub port: u16,
}

impl Default for RawApi {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

// ── Environment mapping ─────────────────────────────────────────────

const TOP_LEVEL: &[&str] = &[
    "primary",
    "primary_file",
    "replicas",
    "replicas_file",
    "full_sync",
    "run_gravity",
    "cron",
];

/// Map a flat environment variable name onto its dotted figment key.
/// Variables that are not ours map to `None` and are ignored.
pub(crate) fn env_key(name: &str) -> Option<String> {
    let name = name.to_ascii_lowercase();

    if TOP_LEVEL.contains(&name.as_str()) {
        return Some(name);
    }

    if let Some(rest) = name.strip_prefix("sync_config_") {
        return Some(match rest.rsplit_once('_') {
            Some((category, field @ ("include" | "exclude"))) => {
                format!("sync_config.{category}.{field}")
            }
            _ => format!("sync_config.{rest}.enabled"),
        });
    }

    if let Some(rest) = name.strip_prefix("sync_gravity_") {
        return Some(format!("sync_gravity.{rest}"));
    }

    if name == "webhook_client_skip_tls_verification" {
        return Some("webhook.skip_tls_verification".into());
    }

    if let Some(rest) = name.strip_prefix("webhook_sync_") {
        return match rest.split_once('_') {
            Some((kind @ ("success" | "failure"), field)) => {
                Some(format!("webhook.{kind}.{field}"))
            }
            _ => None,
        };
    }

    ["client", "api"].into_iter().find_map(|section| {
        name.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(|field| format!("{section}.{field}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_top_level_names() {
        assert_eq!(env_key("PRIMARY").as_deref(), Some("primary"));
        assert_eq!(env_key("REPLICAS_FILE").as_deref(), Some("replicas_file"));
        assert_eq!(env_key("CRON").as_deref(), Some("cron"));
    }

    #[test]
    fn maps_category_names() {
        assert_eq!(env_key("SYNC_CONFIG_DNS").as_deref(), Some("sync_config.dns.enabled"));
        assert_eq!(
            env_key("SYNC_CONFIG_DHCP_INCLUDE").as_deref(),
            Some("sync_config.dhcp.include")
        );
        assert_eq!(
            env_key("SYNC_CONFIG_RESOLVER_EXCLUDE").as_deref(),
            Some("sync_config.resolver.exclude")
        );
    }

    #[test]
    fn maps_nested_sections() {
        assert_eq!(
            env_key("SYNC_GRAVITY_AD_LIST_BY_GROUP").as_deref(),
            Some("sync_gravity.ad_list_by_group")
        );
        assert_eq!(
            env_key("CLIENT_RETRY_DELAY_SECONDS").as_deref(),
            Some("client.retry_delay_seconds")
        );
        assert_eq!(
            env_key("WEBHOOK_SYNC_FAILURE_HEADERS").as_deref(),
            Some("webhook.failure.headers")
        );
        assert_eq!(
            env_key("WEBHOOK_CLIENT_SKIP_TLS_VERIFICATION").as_deref(),
            Some("webhook.skip_tls_verification")
        );
        assert_eq!(env_key("API_PORT").as_deref(), Some("api.port"));
    }

    #[test]
    fn ignores_foreign_names() {
        assert_eq!(env_key("PATH"), None);
        assert_eq!(env_key("HOME"), None);
        assert_eq!(env_key("WEBHOOK_SYNC_OTHER_URL"), None);
        assert_eq!(env_key("APIKEY"), None);
    }

    #[test]
    fn list_values_are_trimmed() {
        let joined = ListValue::Joined(" a.b , c,, ".into());
        assert_eq!(joined.items(), vec!["a.b", "c"]);

        let items = ListValue::Items(vec!["x".into(), " ".into()]);
        assert_eq!(items.items(), vec!["x"]);
    }
}
