//! Configuration for nebula-sync.
//!
//! Settings are layered, later layers winning: built-in defaults, an
//! optional TOML file, then the process environment. The merged layers are
//! validated into [`Settings`]: parsed appliances, the
//! [`SyncPlan`](nebula_core::SyncPlan), the cron schedule, and
//! client/webhook/API tuning. Nothing downstream sees unvalidated input.

mod raw;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cron::Schedule;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use reqwest::Method;
use thiserror::Error;
use url::Url;

use nebula_api::{Appliance, GravitySelector, TlsMode, TransportConfig};
use nebula_core::{
    Category, CategorySetting, GravitySettings, RetryPolicy, SyncPlan, WebhookRequest,
    WebhookSettings,
};

use crate::raw::{HeaderValue, RawSettings, RawWebhook, env_key, split_list};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {field}")]
    Missing { field: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl ToString) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.to_string(),
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub primary: Appliance,
    pub replicas: Vec<Appliance>,
    pub plan: SyncPlan,
    /// Recurring schedule. `None` runs once and exits.
    pub schedule: Option<Schedule>,
    pub client: ClientSettings,
    pub webhook: WebhookSettings,
    pub api: ApiSettings,
}

/// HTTP tuning shared by every appliance client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub skip_tls_verification: bool,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            skip_tls_verification: false,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(20),
        }
    }
}

impl ClientSettings {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from_skip_verification(self.skip_tls_verification),
            timeout: self.timeout,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay)
    }
}

/// Health endpoint server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Build the layered figment. An explicitly given file must exist.
pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(RawSettings::default()));

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    Ok(figment.merge(Env::raw().filter_map(|key| env_key(key.as_str()).map(Into::into))))
}

/// Load and validate settings from file + environment.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    Settings::from_figment(&figment(path)?)
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let raw: RawSettings = figment.extract()?;
        Self::resolve(raw)
    }

    fn resolve(raw: RawSettings) -> Result<Self, ConfigError> {
        let primary = resolve_primary(&raw)?;
        let replicas = resolve_replicas(&raw)?;
        let plan = resolve_plan(&raw)?;

        let schedule = raw
            .cron
            .as_deref()
            .filter(|expr| !expr.trim().is_empty())
            .map(parse_schedule)
            .transpose()?;

        if raw.client.timeout_seconds == 0 {
            return Err(invalid("CLIENT_TIMEOUT_SECONDS", "must be greater than zero"));
        }
        let client = ClientSettings {
            skip_tls_verification: raw.client.skip_tls_verification,
            retry_delay: Duration::from_secs(raw.client.retry_delay_seconds),
            timeout: Duration::from_secs(raw.client.timeout_seconds),
        };

        let webhook = WebhookSettings {
            success: resolve_webhook("WEBHOOK_SYNC_SUCCESS", raw.webhook.success)?,
            failure: resolve_webhook("WEBHOOK_SYNC_FAILURE", raw.webhook.failure)?,
            skip_tls_verification: raw.webhook.skip_tls_verification,
        };

        let api = ApiSettings {
            enabled: raw.api.enabled,
            port: raw.api.port,
        };

        Ok(Self {
            primary,
            replicas,
            plan,
            schedule,
            client,
            webhook,
            api,
        })
    }
}

// ── Appliances ──────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn non_blank_path(path: Option<&PathBuf>) -> Option<&Path> {
    path.map(PathBuf::as_path)
        .filter(|path| !path.as_os_str().is_empty())
}

fn read_trimmed(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|contents| contents.trim().to_owned())
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_appliance(field: &str, value: &str) -> Result<Appliance, ConfigError> {
    Appliance::from_str(value.trim()).map_err(|e| invalid(field, e))
}

/// `PRIMARY_FILE` wins over `PRIMARY`.
fn resolve_primary(raw: &RawSettings) -> Result<Appliance, ConfigError> {
    if let Some(path) = non_blank_path(raw.primary_file.as_ref()) {
        return parse_appliance("PRIMARY_FILE", &read_trimmed(path)?);
    }
    let value = non_blank(raw.primary.as_deref()).ok_or_else(|| ConfigError::Missing {
        field: "PRIMARY/PRIMARY_FILE".into(),
    })?;
    parse_appliance("PRIMARY", value)
}

/// `REPLICAS_FILE` wins over `REPLICAS`. At least one replica is required.
fn resolve_replicas(raw: &RawSettings) -> Result<Vec<Appliance>, ConfigError> {
    let (field, entries) = match non_blank_path(raw.replicas_file.as_ref()) {
        Some(path) => ("REPLICAS_FILE", split_list(&read_trimmed(path)?)),
        None => (
            "REPLICAS",
            raw.replicas
                .as_ref()
                .map(raw::ListValue::items)
                .unwrap_or_default(),
        ),
    };

    if entries.is_empty() {
        return Err(ConfigError::Missing {
            field: "REPLICAS/REPLICAS_FILE".into(),
        });
    }

    entries
        .iter()
        .map(|entry| parse_appliance(field, entry))
        .collect()
}

// ── Plan ────────────────────────────────────────────────────────────

fn resolve_plan(raw: &RawSettings) -> Result<SyncPlan, ConfigError> {
    let mut plan = if raw.full_sync {
        SyncPlan::full()
    } else {
        SyncPlan::selective()
    };

    for (name, setting) in &raw.sync_config {
        let field = format!("SYNC_CONFIG_{}", name.to_ascii_uppercase());
        let category =
            Category::from_str(name).map_err(|_| invalid(&field, "unknown configuration category"))?;
        let setting = CategorySetting::new(
            setting.enabled,
            setting.include.as_ref().map(raw::ListValue::items),
            setting.exclude.as_ref().map(raw::ListValue::items),
        )
        .map_err(|e| invalid(&field, e))?;
        plan = plan.with_category(category, setting);
    }

    let gravity = &raw.sync_gravity;
    Ok(plan
        .with_run_gravity(raw.run_gravity)
        .with_gravity(GravitySettings {
            dhcp_leases: gravity.dhcp_leases,
            tables: GravitySelector {
                group: gravity.group,
                adlist: gravity.ad_list,
                adlist_by_group: gravity.ad_list_by_group,
                domainlist: gravity.domain_list,
                domainlist_by_group: gravity.domain_list_by_group,
                client: gravity.client,
                client_by_group: gravity.client_by_group,
            },
        }))
}

/// Parse a 5-field (minute precision) or 6-field (second precision) cron
/// expression.
///
/// 5-field expressions use standard cron day-of-week numbering (0 or 7 is
/// Sunday) and are rewritten for the `cron` crate, which counts 1 as
/// Sunday. 6-field expressions are passed through in the crate's syntax.
fn parse_schedule(expr: &str) -> Result<Schedule, ConfigError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let normalized = match fields.as_slice() {
        [minute, hour, day, month, weekday] => {
            format!("0 {minute} {hour} {day} {month} {}", day_of_week_field(weekday))
        }
        [_, _, _, _, _, _] => fields.join(" "),
        _ => {
            return Err(invalid(
                "CRON",
                format!("expected 5 or 6 fields, got {}", fields.len()),
            ));
        }
    };
    Schedule::from_str(&normalized).map_err(|e| invalid("CRON", e))
}

fn day_of_week_field(field: &str) -> String {
    field
        .split(',')
        .map(day_of_week_part)
        .collect::<Vec<_>>()
        .join(",")
}

/// Expand one numeric list element (`n`, `a-b`, `a-b/s`, `a/s`) into
/// explicit days. Names, `*` and anything unparseable pass through.
fn day_of_week_part(part: &str) -> String {
    let (base, step) = match part.split_once('/') {
        Some((base, step)) => match step.parse::<usize>() {
            Ok(step) if step > 0 => (base, Some(step)),
            _ => return part.to_owned(),
        },
        None => (part, None),
    };

    let bounds = match (base.split_once('-'), step) {
        (Some((start, end)), _) => start.parse::<u8>().ok().zip(end.parse::<u8>().ok()),
        (None, Some(_)) => base.parse::<u8>().ok().map(|start| (start, 6)),
        (None, None) => base.parse::<u8>().ok().map(|day| (day, day)),
    };

    match bounds {
        Some((start, end)) if start <= end && end <= 7 => (start..=end)
            .step_by(step.unwrap_or(1))
            .map(|day| day % 7 + 1)
            .collect::<BTreeSet<_>>()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        _ => part.to_owned(),
    }
}

// ── Webhooks ────────────────────────────────────────────────────────

fn resolve_webhook(prefix: &str, raw: RawWebhook) -> Result<WebhookRequest, ConfigError> {
    let url = non_blank(raw.url.as_deref())
        .map(|url| Url::parse(url).map_err(|e| invalid(format!("{prefix}_URL"), e)))
        .transpose()?;

    let method = match non_blank(raw.method.as_deref()) {
        Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|e| invalid(format!("{prefix}_METHOD"), e))?,
        None => Method::POST,
    };

    let headers = match raw.headers {
        None => Vec::new(),
        Some(HeaderValue::Table(table)) => table.into_iter().collect(),
        Some(HeaderValue::Joined(value)) => parse_headers(&format!("{prefix}_HEADERS"), &value)?,
    };

    Ok(WebhookRequest {
        url,
        method,
        body: raw.body.unwrap_or_default(),
        headers,
    })
}

/// `key:value,key:value`. Only the first `:` separates, so values may
/// contain colons.
fn parse_headers(field: &str, value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|pair| match pair.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_owned(), value.trim().to_owned()))
            }
            _ => Err(invalid(field, format!("expected 'key:value', got '{pair}'"))),
        })
        .collect()
}
