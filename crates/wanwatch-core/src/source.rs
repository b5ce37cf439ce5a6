// ── WAN data sources ──
//
// `WanSource` is the seam between the poll pipeline and the network.
// `GatewaySource` is the production implementation over `GatewayClient`:
// it logs in lazily, re-authenticates once when a session expires, and
// logs out on close. Tests plug in scripted sources instead.

use std::future::Future;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wanwatch_api::transport::{TlsMode, TransportConfig};
use wanwatch_api::{ApiFamily, GatewayClient};

use crate::config::{AuthCredentials, ControllerProfile, TlsVerification};
use crate::error::CoreError;
use crate::model::SpeedTestOutcome;

/// Read access to one controller's raw WAN payloads.
///
/// Each fetch is independent so a poll cycle can run them concurrently.
/// Implementations must not cache: every call reflects the controller now.
pub trait WanSource: Send + Sync + 'static {
    fn api_family(&self) -> ApiFamily;

    fn fetch_wan_list(&self) -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;

    fn fetch_routing_info(&self) -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;

    fn fetch_network_config(&self)
    -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;

    /// Trigger a controller-side speed test where the family allows it.
    fn start_speed_test(&self) -> impl Future<Output = Result<SpeedTestOutcome, CoreError>> + Send;

    /// Release any session held with the controller.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

// ── GatewaySource ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    WanList,
    Routing,
    NetworkConfig,
    SpeedTest,
}

#[derive(Debug, Default)]
struct Session {
    authenticated: bool,
    /// Bumped on every successful login so concurrent callers that saw
    /// the same expired session trigger only one re-login.
    generation: u64,
}

/// `WanSource` backed by a live controller session.
pub struct GatewaySource {
    client: GatewayClient,
    credentials: AuthCredentials,
    session: Mutex<Session>,
}

impl GatewaySource {
    /// Build a source for a profile. No network I/O happens until the
    /// first fetch.
    pub fn new(profile: &ControllerProfile) -> Result<Self, CoreError> {
        let transport = TransportConfig::new(tls_to_transport(&profile.tls), profile.timeout);
        let client = GatewayClient::new(
            profile.url.clone(),
            profile.site.clone(),
            profile.family,
            &transport,
        )?;
        Ok(Self::with_client(client, profile.auth.clone()))
    }

    /// Wrap a pre-built client.
    pub fn with_client(client: GatewayClient, credentials: AuthCredentials) -> Self {
        Self {
            client,
            credentials,
            session: Mutex::new(Session::default()),
        }
    }

    /// Log in if no session exists yet; returns the session generation.
    async fn ensure_session(&self) -> Result<u64, CoreError> {
        let mut session = self.session.lock().await;
        if !session.authenticated {
            self.login(&mut *session).await?;
        }
        Ok(session.generation)
    }

    /// Log in again unless another caller already did since `seen`.
    async fn renew_session(&self, seen: u64) -> Result<(), CoreError> {
        let mut session = self.session.lock().await;
        if session.generation == seen {
            info!("controller session expired, logging in again");
            session.authenticated = false;
            self.login(&mut *session).await?;
        }
        Ok(())
    }

    async fn login(&self, session: &mut Session) -> Result<(), CoreError> {
        self.client
            .login(&self.credentials.username, &self.credentials.password)
            .await?;
        session.authenticated = true;
        session.generation += 1;
        debug!(generation = session.generation, "controller session established");
        Ok(())
    }

    async fn request(&self, endpoint: Endpoint) -> Result<Vec<Value>, wanwatch_api::Error> {
        match endpoint {
            Endpoint::WanList => self.client.list_wan_records().await,
            Endpoint::Routing => self.client.list_routes().await,
            Endpoint::NetworkConfig => self.client.list_network_config().await,
            Endpoint::SpeedTest => self.client.start_speed_test().await.map(|()| Vec::new()),
        }
    }

    /// Run one call with lazy login and a single re-login on expiry.
    async fn call(&self, endpoint: Endpoint) -> Result<Vec<Value>, CoreError> {
        let generation = self.ensure_session().await?;
        match self.request(endpoint).await {
            Err(e) if e.is_auth_expired() => {
                debug!(?endpoint, "request rejected as unauthenticated");
                self.renew_session(generation).await?;
                Ok(self.request(endpoint).await?)
            }
            other => Ok(other?),
        }
    }
}

impl WanSource for GatewaySource {
    fn api_family(&self) -> ApiFamily {
        self.client.family()
    }

    async fn fetch_wan_list(&self) -> Result<Vec<Value>, CoreError> {
        self.call(Endpoint::WanList).await
    }

    async fn fetch_routing_info(&self) -> Result<Vec<Value>, CoreError> {
        self.call(Endpoint::Routing).await
    }

    async fn fetch_network_config(&self) -> Result<Vec<Value>, CoreError> {
        self.call(Endpoint::NetworkConfig).await
    }

    async fn start_speed_test(&self) -> Result<SpeedTestOutcome, CoreError> {
        if !self.client.family().supports_speed_test_trigger() {
            return Ok(SpeedTestOutcome::Unsupported);
        }
        self.call(Endpoint::SpeedTest).await?;
        info!("speed test accepted by controller");
        Ok(SpeedTestOutcome::Accepted)
    }

    async fn close(&self) {
        let mut session = self.session.lock().await;
        if !session.authenticated {
            return;
        }
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed");
        }
        session.authenticated = false;
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
