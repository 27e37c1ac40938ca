// ── Webhook notifier ──
//
// Forwards run outcomes to user-configured HTTP endpoints. Delivery
// failures are logged and dropped; they never reach the synchronizer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use nebula_api::{TlsMode, TransportConfig, USER_AGENT};

use crate::callback::SyncCallback;
use crate::error::SyncError;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// One configured webhook call. Without a URL the webhook is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub url: Option<Url>,
    pub method: Method,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Default for WebhookRequest {
    fn default() -> Self {
        Self {
            url: None,
            method: Method::POST,
            body: String::new(),
            headers: Vec::new(),
        }
    }
}

/// Success and failure webhooks plus client tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookSettings {
    pub success: WebhookRequest,
    pub failure: WebhookRequest,
    pub skip_tls_verification: bool,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("send webhook request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(u16),

    #[error("create webhook request: {0}")]
    Client(#[from] nebula_api::Error),
}

/// [`SyncCallback`] that calls the success or failure webhook.
#[derive(Debug)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    success: WebhookRequest,
    failure: WebhookRequest,
}

impl WebhookNotifier {
    pub fn new(settings: WebhookSettings) -> Result<Self, WebhookError> {
        let transport = TransportConfig {
            tls: TlsMode::from_skip_verification(settings.skip_tls_verification),
            timeout: WEBHOOK_TIMEOUT,
        };
        Ok(Self::with_client(transport.build_client()?, settings))
    }

    pub fn with_client(http: reqwest::Client, settings: WebhookSettings) -> Self {
        Self {
            http,
            success: settings.success,
            failure: settings.failure,
        }
    }

    async fn invoke(&self, request: &WebhookRequest) -> Result<(), WebhookError> {
        let Some(url) = request.url.clone() else {
            return Ok(());
        };

        debug!(
            url = %url,
            method = %request.method,
            body = %request.body,
            headers = ?request.headers,
            "invoking webhook"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(WebhookError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl SyncCallback for WebhookNotifier {
    async fn on_success(&self) {
        if let Err(e) = self.invoke(&self.success).await {
            warn!(error = %e, "webhook trigger failed");
        }
    }

    async fn on_failure(&self, _error: &SyncError) {
        if let Err(e) = self.invoke(&self.failure).await {
            warn!(error = %e, "webhook trigger failed");
        }
    }
}
