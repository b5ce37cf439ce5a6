use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProfileId;
use crate::model::resolution::ResolutionResult;
use crate::model::wan::WanInterface;

/// Everything one successful poll cycle produced for a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub profile_id: ProfileId,
    /// Ordered by `wan_number`; exactly the resolved primary has `is_primary`.
    pub interfaces: Vec<WanInterface>,
    pub resolution: ResolutionResult,
    pub total_wan_interfaces: usize,
    pub polled_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot, marking the primary on the owned copies.
    pub fn new(
        profile_id: ProfileId,
        mut interfaces: Vec<WanInterface>,
        resolution: ResolutionResult,
    ) -> Self {
        interfaces.sort_by_key(|wan| wan.wan_number);
        for wan in &mut interfaces {
            wan.is_primary = resolution.primary_key.as_deref() == Some(wan.key.as_str());
        }
        Self {
            profile_id,
            total_wan_interfaces: interfaces.len(),
            interfaces,
            resolution,
            polled_at: Utc::now(),
        }
    }

    /// The primary interface, if one was resolved.
    pub fn primary(&self) -> Option<&WanInterface> {
        self.interfaces.iter().find(|wan| wan.is_primary)
    }
}
