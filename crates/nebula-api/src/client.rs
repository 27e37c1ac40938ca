// Pi-hole session client
//
// Wraps `reqwest::Client` with URL construction, session bookkeeping and
// status handling. Endpoint groups (auth, teleporter, config) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::appliance::Appliance;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Product identity sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("nebula-sync/", env!("CARGO_PKG_VERSION"));

/// Header carrying the session id on authenticated requests.
pub(crate) const SID_HEADER: &str = "sid";

/// Session state handed out by `/api/auth`. Never persisted.
#[derive(Debug, Clone, Default)]
pub(crate) struct Session {
    pub sid: Option<String>,
    pub csrf: Option<String>,
    pub validity: i64,
    pub valid: bool,
}

/// Client for one appliance.
///
/// Starts unauthenticated; [`authenticate`](Self::authenticate) opens a
/// session and [`delete_session`](Self::delete_session) closes it. Every
/// other operation fails with [`Error::NoSession`] before touching the
/// network when no valid session is held.
#[derive(Debug)]
pub struct SessionClient {
    http: reqwest::Client,
    appliance: Appliance,
    session: RwLock<Session>,
}

impl SessionClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(appliance: Appliance, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, appliance))
    }

    /// Create a client with a pre-built `reqwest::Client`, e.g. one shared
    /// between all appliances of a run.
    pub fn with_client(http: reqwest::Client, appliance: Appliance) -> Self {
        Self {
            http,
            appliance,
            session: RwLock::new(Session::default()),
        }
    }

    pub fn appliance(&self) -> &Appliance {
        &self.appliance
    }

    /// The appliance base address, used as identity in logs and errors.
    pub fn target(&self) -> String {
        self.appliance.to_string()
    }

    /// Whether a valid session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.read_session().valid
    }

    /// CSRF token issued alongside the current session, if any.
    pub fn csrf_token(&self) -> Option<String> {
        self.read_session().csrf
    }

    /// Seconds the current session stays valid, as reported at login.
    pub fn session_validity(&self) -> Option<i64> {
        let session = self.read_session();
        session.valid.then_some(session.validity)
    }

    // ── Session bookkeeping ──────────────────────────────────────────

    pub(crate) fn read_session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store_session(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    pub(crate) fn clear_session(&self) {
        trace!(appliance = %self.appliance, "clearing session");
        self.store_session(Session::default());
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{endpoint}`, tolerating a trailing slash on the base.
    pub fn api_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.appliance.url().as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{endpoint}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request carrying the product identity.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    /// Start a request that requires a valid session, attaching the sid.
    pub(crate) fn authed_request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<(RequestBuilder, Url), Error> {
        let session = self.read_session();
        if !session.valid {
            return Err(Error::NoSession {
                target: self.target(),
            });
        }

        let url = self.api_url(endpoint)?;
        let mut builder = self.request(method, url.clone());
        if let Some(sid) = session.sid.as_deref() {
            builder = builder.header(SID_HEADER, sid);
        }
        Ok((builder, url))
    }

    /// Send a request and require a 2xx status.
    pub(crate) async fn send(&self, builder: RequestBuilder, url: &Url) -> Result<Response, Error> {
        debug!(appliance = %self.appliance, "{url}");

        let resp = builder.send().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(resp)
    }

    /// Decode a JSON body, keeping the raw text for diagnosis on failure.
    pub(crate) async fn read_json<T: DeserializeOwned>(
        &self,
        resp: Response,
        url: &Url,
    ) -> Result<T, Error> {
        let body = resp.text().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                url: url.to_string(),
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
