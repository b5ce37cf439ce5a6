// WAN telemetry endpoints
//
// The WAN list, routing table and network configuration come from
// different endpoints per API family. Payloads are returned as raw JSON
// values; interpretation belongs to the normalizer.

use serde_json::{Value, json};
use tracing::debug;

use crate::auth::ApiFamily;
use crate::error::Error;
use crate::gateway::client::GatewayClient;

impl GatewayClient {
    /// Fetch the raw WAN records.
    ///
    /// - UniFi OS: `GET /proxy/network/v2/api/site/{site}/speedtest`, one
    ///   record per speed-test result
    /// - Standalone: `GET /api/s/{site}/stat/device`, gateway records
    ///   carrying `wan1..wanN` blocks
    pub async fn list_wan_records(&self) -> Result<Vec<Value>, Error> {
        let records: Vec<Value> = match self.family() {
            ApiFamily::Udm => {
                let url = self.v2_site_url("speedtest")?;
                self.get_v2(url).await?
            }
            ApiFamily::Legacy => {
                let url = self.site_url("stat/device")?;
                self.get(url).await?
            }
        };
        debug!(count = records.len(), family = %self.family(), "fetched WAN records");
        Ok(records)
    }

    /// Fetch the routing table.
    ///
    /// `GET /api/s/{site}/stat/routing`
    pub async fn list_routes(&self) -> Result<Vec<Value>, Error> {
        let url = self.site_url("stat/routing")?;
        self.get(url).await
    }

    /// Fetch the network configuration entries.
    ///
    /// `GET /api/s/{site}/rest/networkconf`
    pub async fn list_network_config(&self) -> Result<Vec<Value>, Error> {
        let url = self.site_url("rest/networkconf")?;
        self.get(url).await
    }

    /// Ask the gateway to run a speed test.
    ///
    /// `POST /api/s/{site}/cmd/devmgr` with `{"cmd": "speedtest"}`. UniFi OS
    /// consoles schedule their own tests and reject the command, so the call
    /// fails fast with `UnsupportedOperation` there.
    pub async fn start_speed_test(&self) -> Result<(), Error> {
        if !self.family().supports_speed_test_trigger() {
            return Err(Error::UnsupportedOperation(
                "speed-test trigger is not available on UniFi OS",
            ));
        }
        let url = self.site_url("cmd/devmgr")?;
        debug!("starting speed test");
        let _: Vec<Value> = self.post(url, &json!({ "cmd": "speedtest" })).await?;
        Ok(())
    }
}
