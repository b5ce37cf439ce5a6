#![allow(dead_code, clippy::unwrap_used)]
// Scripted `WanSource` for pipeline and scheduler tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;

use wanwatch_core::{
    ApiFamily, AuthCredentials, ControllerProfile, CoreError, ErrorKind, PollPolicy, ProfileId,
    SpeedTestOutcome, SpeedTestSchedule, TlsVerification, WanSource,
};

#[derive(Default)]
struct Script {
    wan_failures: VecDeque<ErrorKind>,
    routing_fails: bool,
    config_fails: bool,
}

struct Inner {
    family: ApiFamily,
    wans: Vec<Value>,
    routes: Vec<Value>,
    config: Vec<Value>,
    delay: Duration,
    script: Mutex<Script>,
    wan_calls: AtomicUsize,
    speed_tests: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeSource {
    inner: Arc<Inner>,
}

impl FakeSource {
    pub fn new(family: ApiFamily, wans: Vec<Value>) -> Self {
        Self::build(family, wans, Vec::new(), Vec::new(), Duration::ZERO)
    }

    pub fn build(
        family: ApiFamily,
        wans: Vec<Value>,
        routes: Vec<Value>,
        config: Vec<Value>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                family,
                wans,
                routes,
                config,
                delay,
                script: Mutex::new(Script::default()),
                wan_calls: AtomicUsize::new(0),
                speed_tests: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
            }),
        }
    }

    /// Queue failures for the next WAN-list fetches.
    pub fn fail_wan_list(&self, kinds: &[ErrorKind]) {
        self.inner
            .script
            .lock()
            .unwrap()
            .wan_failures
            .extend(kinds.iter().copied());
    }

    pub fn fail_routing(&self) {
        self.inner.script.lock().unwrap().routing_fails = true;
    }

    pub fn fail_config(&self) {
        self.inner.script.lock().unwrap().config_fails = true;
    }

    pub fn wan_calls(&self) -> usize {
        self.inner.wan_calls.load(Ordering::SeqCst)
    }

    pub fn speed_tests(&self) -> usize {
        self.inner.speed_tests.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

fn error_of(kind: ErrorKind) -> CoreError {
    match kind {
        ErrorKind::Auth => CoreError::AuthenticationFailed {
            message: "bad credentials".into(),
        },
        ErrorKind::Transport => CoreError::ConnectionFailed {
            url: "https://gw.test".into(),
            reason: "connection refused".into(),
        },
        ErrorKind::Decode => CoreError::Decode {
            message: "expected array".into(),
        },
        ErrorKind::Other => CoreError::Internal("scripted".into()),
    }
}

impl WanSource for FakeSource {
    fn api_family(&self) -> ApiFamily {
        self.inner.family
    }

    async fn fetch_wan_list(&self) -> Result<Vec<Value>, CoreError> {
        self.inner.wan_calls.fetch_add(1, Ordering::SeqCst);
        if !self.inner.delay.is_zero() {
            tokio::time::sleep(self.inner.delay).await;
        }
        let failure = self.inner.script.lock().unwrap().wan_failures.pop_front();
        match failure {
            Some(kind) => Err(error_of(kind)),
            None => Ok(self.inner.wans.clone()),
        }
    }

    async fn fetch_routing_info(&self) -> Result<Vec<Value>, CoreError> {
        if self.inner.script.lock().unwrap().routing_fails {
            return Err(error_of(ErrorKind::Transport));
        }
        Ok(self.inner.routes.clone())
    }

    async fn fetch_network_config(&self) -> Result<Vec<Value>, CoreError> {
        if self.inner.script.lock().unwrap().config_fails {
            return Err(error_of(ErrorKind::Decode));
        }
        Ok(self.inner.config.clone())
    }

    async fn start_speed_test(&self) -> Result<SpeedTestOutcome, CoreError> {
        if !self.inner.family.supports_speed_test_trigger() {
            return Ok(SpeedTestOutcome::Unsupported);
        }
        self.inner.speed_tests.fetch_add(1, Ordering::SeqCst);
        Ok(SpeedTestOutcome::Accepted)
    }

    async fn close(&self) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Payload builders ────────────────────────────────────────────────

/// Two UniFi OS speed-test records: `eth9/WAN` untested, `eth10/WAN2` tested.
pub fn udm_pair() -> Vec<Value> {
    vec![
        json!({ "interface_name": "eth9", "wan_networkgroup": "WAN" }),
        json!({
            "interface_name": "eth10", "wan_networkgroup": "WAN2",
            "download_mbps": 310.2, "upload_mbps": 35.8, "latency_ms": 11,
            "time": 1_700_000_000
        }),
    ]
}

pub fn udm_default_route(intf: &str) -> Vec<Value> {
    vec![json!({ "pfx": "0.0.0.0/0", "nh": [{ "intf": intf, "t": "S>*" }] })]
}

pub fn profile(id: &str, family: ApiFamily) -> ControllerProfile {
    ControllerProfile {
        id: ProfileId::from(id),
        url: Url::parse("https://gw.test").unwrap(),
        auth: AuthCredentials {
            username: "admin".into(),
            password: "secret".to_string().into(),
        },
        family,
        site: "default".into(),
        tls: TlsVerification::DangerAcceptInvalid,
        timeout: Duration::from_secs(10),
        poll: PollPolicy::default(),
        speed_test: SpeedTestSchedule::disabled(),
    }
}
