// Session authentication
//
// `POST /api/auth` exchanges the appliance password for a session id;
// `DELETE /api/auth` invalidates it. The sid is sent as a header on all
// subsequent requests.

use reqwest::Method;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::client::{SID_HEADER, Session, SessionClient};
use crate::error::Error;
use crate::models::{AuthRequest, AuthResponse};

impl SessionClient {
    /// Authenticate with the appliance password.
    ///
    /// The session is stored only if the appliance reports it valid. On any
    /// failure the client is left unauthenticated.
    pub async fn authenticate(&self) -> Result<(), Error> {
        debug!(appliance = %self.appliance(), "authenticating");
        self.clear_session();

        let url = self.api_url("auth")?;
        let body = AuthRequest {
            password: self.appliance().password().expose_secret(),
        };

        let resp = self
            .send(self.request(Method::POST, url.clone()).json(&body), &url)
            .await?;
        let auth: AuthResponse = self.read_json(resp, &url).await?;

        if !auth.session.valid {
            return Err(Error::Authentication {
                url: url.to_string(),
                message: auth
                    .session
                    .message
                    .unwrap_or_else(|| "session reported invalid".into()),
            });
        }

        self.store_session(Session {
            sid: auth.session.sid,
            csrf: auth.session.csrf,
            validity: auth.session.validity,
            valid: true,
        });

        debug!(appliance = %self.appliance(), validity = auth.session.validity, "authenticated");
        Ok(())
    }

    /// End the current session.
    ///
    /// A client that never obtained a session id succeeds without sending
    /// anything, so teardown can run unconditionally.
    pub async fn delete_session(&self) -> Result<(), Error> {
        let session = self.read_session();
        let Some(sid) = session.sid.filter(|sid| !sid.is_empty()) else {
            debug!(appliance = %self.appliance(), "no session to delete");
            self.clear_session();
            return Ok(());
        };

        debug!(appliance = %self.appliance(), "deleting session");

        let url = self.api_url("auth")?;
        let builder = self
            .request(Method::DELETE, url.clone())
            .header(SID_HEADER, sid);
        self.send(builder, &url).await?;

        self.clear_session();
        Ok(())
    }
}
