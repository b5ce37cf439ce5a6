// Gateway API HTTP client
//
// Wraps `reqwest::Client` with UniFi-specific URL construction, envelope
// unwrapping, and family-aware path prefixing. Endpoint calls live in
// sibling modules as inherent methods so this file stays focused on
// transport mechanics.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::ApiFamily;
use crate::error::Error;
use crate::gateway::models::{LegacyResponse, V2Response};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// UniFi OS wraps some errors as `{"error":{"code":N,"message":"..."}}` with HTTP 200.
#[derive(serde::Deserialize)]
struct UnifiOsError {
    error: Option<UnifiOsErrorInner>,
}

#[derive(serde::Deserialize)]
struct UnifiOsErrorInner {
    code: u16,
    message: Option<String>,
}

/// Raw HTTP client for a UniFi gateway controller.
///
/// Handles the `{ data: [], meta: { rc, msg } }` envelope, the bare v2
/// payloads, site-scoped URL construction, and family-aware path
/// prefixing. Methods return decoded payloads; callers never see the
/// envelope.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
    family: ApiFamily,
    /// CSRF token for UniFi OS. Required on POST requests through the
    /// `/proxy/network/` path. Captured at login and rotated via
    /// `X-Updated-CSRF-Token`.
    csrf_token: RwLock<Option<String>>,
}

impl GatewayClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `https://192.168.1.1` or
    /// `https://controller:8443`.
    pub fn new(
        base_url: Url,
        site: String,
        family: ApiFamily,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, site, family))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        site: String,
        family: ApiFamily,
    ) -> Self {
        Self {
            http,
            base_url,
            site,
            family,
            csrf_token: RwLock::new(None),
        }
    }

    /// The current site identifier.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API family this client speaks.
    pub fn family(&self) -> ApiFamily {
        self.family
    }

    // ── CSRF token management ─────────────────────────────────────────

    pub(crate) fn set_csrf_token(&self, token: String) {
        debug!("storing CSRF token");
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn update_csrf_from_response(&self, headers: &reqwest::header::HeaderMap) {
        let new_token = headers
            .get("X-Updated-CSRF-Token")
            .or_else(|| headers.get("x-csrf-token"))
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if let Some(token) = new_token {
            trace!("CSRF token rotated");
            *self
                .csrf_token
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(token);
        }
    }

    fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self
            .csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(token) => builder.header("X-CSRF-Token", token),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn prefixed(&self, rest: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let prefix = self.family.network_prefix().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{prefix}{rest}"))?)
    }

    /// Build a root-relative URL without the network prefix (login/logout).
    pub(crate) fn root_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Build a site-scoped URL: `{base}{prefix}/api/s/{site}/{path}`
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        self.prefixed(&format!("/api/s/{}/{path}", self.site))
    }

    /// Build a v2 site-scoped URL: `{base}{prefix}/v2/api/site/{site}/{path}`
    pub(crate) fn v2_site_url(&self, path: &str) -> Result<Url, Error> {
        self.prefixed(&format!("/v2/api/site/{}/{path}", self.site))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the legacy envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        self.parse_envelope(resp).await
    }

    /// Send a POST request with JSON body and unwrap the legacy envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<T>, Error> {
        debug!("POST {}", url);
        let builder = self.apply_csrf(self.http.post(url).json(body));
        let resp = builder.send().await?;
        self.parse_envelope(resp).await
    }

    /// Send a GET request to a v2 endpoint (no `meta` envelope).
    pub(crate) async fn get_v2<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let body = self.read_body(resp).await?;
        let parsed: V2Response<T> = decode(&body)?;
        Ok(parsed.into_items())
    }

    /// Check the status line, then return the body text.
    ///
    /// Also recognises the UniFi OS `{"error": {...}}` shape that arrives
    /// with HTTP 200.
    async fn read_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        self.update_csrf_from_response(resp.headers());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::PermissionDenied {
                message: preview(&body).to_owned(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: preview(&body).to_owned(),
                status: Some(status.as_u16()),
            });
        }

        let body = resp.text().await?;

        if let Ok(wrapper) = serde_json::from_str::<UnifiOsError>(&body) {
            if let Some(err) = wrapper.error {
                let msg = err.message.unwrap_or_default();
                return Err(match err.code {
                    401 => Error::Authentication { message: msg },
                    403 => Error::PermissionDenied { message: msg },
                    code => Error::Api {
                        message: format!("UniFi OS error {code}: {msg}"),
                        status: Some(code),
                    },
                });
            }
        }

        Ok(body)
    }

    /// Parse the `{ meta, data }` envelope, returning `data` on success
    /// or an `Error::Api` if `meta.rc != "ok"`.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Vec<T>, Error> {
        let body = self.read_body(resp).await?;
        let envelope: LegacyResponse<T> = decode(&body)?;

        match envelope.meta.rc.as_str() {
            "ok" => Ok(envelope.data),
            _ => Err(Error::Api {
                message: envelope
                    .meta
                    .msg
                    .unwrap_or_else(|| format!("rc={}", envelope.meta.rc)),
                status: None,
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
