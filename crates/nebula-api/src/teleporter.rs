// Teleporter bundle transfer
//
// `GET /api/teleporter` exports the full configuration as an opaque archive;
// `POST /api/teleporter` uploads one as multipart form data, optionally with
// an `import` selector restricting what the receiver applies.

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::client::SessionClient;
use crate::error::Error;
use crate::models::ImportSelector;

/// File name the bundle is uploaded under.
const BUNDLE_FILE_NAME: &str = "config.zip";

impl SessionClient {
    /// Download the full configuration bundle.
    pub async fn export_bundle(&self) -> Result<Bytes, Error> {
        let (builder, url) = self.authed_request(Method::GET, "teleporter")?;
        let resp = self.send(builder, &url).await?;

        let bundle = resp.bytes().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        debug!(appliance = %self.appliance(), bytes = bundle.len(), "exported bundle");
        Ok(bundle)
    }

    /// Upload a bundle, applying only the parts named by `selector`.
    ///
    /// Without a selector the appliance applies its own defaults.
    pub async fn import_bundle(
        &self,
        bundle: &Bytes,
        selector: Option<&ImportSelector>,
    ) -> Result<(), Error> {
        debug!(appliance = %self.appliance(), ?selector, "importing bundle");

        let (builder, url) = self.authed_request(Method::POST, "teleporter")?;

        let file = Part::bytes(bundle.to_vec())
            .file_name(BUNDLE_FILE_NAME)
            .mime_str("application/zip")
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;
        let mut form = Form::new().part("file", file);

        if let Some(selector) = selector {
            let import = serde_json::to_string(selector).map_err(|e| Error::Deserialization {
                url: url.to_string(),
                message: format!("failed to encode import selector: {e}"),
                body: String::new(),
            })?;
            form = form.text("import", import);
        }

        self.send(builder.multipart(form), &url).await?;
        Ok(())
    }
}
