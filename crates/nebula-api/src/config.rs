// Live configuration and actions
//
// `GET /api/config` returns the whole configuration tree, `PATCH /api/config`
// merges a partial tree per top-level category, and `POST /api/action/gravity`
// kicks off a gravity rebuild.

use reqwest::Method;
use tracing::debug;

use crate::client::SessionClient;
use crate::error::Error;
use crate::models::{ConfigDocument, ConfigResponse, PatchConfigRequest};

impl SessionClient {
    /// Fetch the full configuration document.
    pub async fn read_config(&self) -> Result<ConfigDocument, Error> {
        let (builder, url) = self.authed_request(Method::GET, "config")?;
        let resp = self.send(builder, &url).await?;
        let config: ConfigResponse = self.read_json(resp, &url).await?;

        debug!(appliance = %self.appliance(), categories = config.config.len(), "read config");
        Ok(config.config)
    }

    /// Merge `partial` into the live configuration.
    ///
    /// `partial` is keyed by category (`dns`, `dhcp`, ...); the appliance
    /// replaces the given keys and leaves everything else untouched.
    pub async fn patch_config(&self, partial: &ConfigDocument) -> Result<(), Error> {
        debug!(
            appliance = %self.appliance(),
            categories = ?partial.keys().collect::<Vec<_>>(),
            "patching config"
        );

        let (builder, url) = self.authed_request(Method::PATCH, "config")?;
        self.send(builder.json(&PatchConfigRequest { config: partial }), &url)
            .await?;
        Ok(())
    }

    /// Start a gravity rebuild.
    ///
    /// Returns once the appliance accepted the request; the rebuild itself
    /// keeps running on the appliance.
    pub async fn trigger_rebuild(&self) -> Result<(), Error> {
        debug!(appliance = %self.appliance(), "triggering gravity rebuild");

        let (builder, url) = self.authed_request(Method::POST, "action/gravity")?;
        self.send(builder, &url).await?;
        Ok(())
    }
}
