// Gateway authentication
//
// Cookie-based session login/logout. The login endpoint sets a session
// cookie in the client's jar; later requests carry it automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::gateway::client::GatewayClient;

impl GatewayClient {
    /// Authenticate with the controller using username/password.
    ///
    /// The login endpoint differs by family:
    /// - UniFi OS: `POST /api/auth/login`
    /// - Standalone: `POST /api/login`
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.root_url(self.family().login_path())?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "remember": true,
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("login failed (HTTP {status}): {body}");
            // Standalone controllers reject bad credentials with 400
            // `api.err.Invalid`; anything outside 400/401/403 is the
            // controller or a proxy failing, not the credentials.
            return Err(match status.as_u16() {
                400 | 401 => Error::Authentication { message },
                403 => Error::PermissionDenied { message },
                code => Error::Api {
                    message,
                    status: Some(code),
                },
            });
        }

        // UniFi OS rejects proxied POSTs without the CSRF token issued here.
        if let Some(token) = resp
            .headers()
            .get("X-CSRF-Token")
            .or_else(|| resp.headers().get("x-csrf-token"))
            .and_then(|v| v.to_str().ok())
        {
            self.set_csrf_token(token.to_owned());
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.root_url(self.family().logout_path())?;
        debug!("logging out at {}", url);

        let _resp = self.http().post(url).send().await?;

        debug!("logout complete");
        Ok(())
    }
}
