// ── Domain model ──
//
// Canonical types produced by one poll cycle. Field names are the same
// for both controller families; the normalizer owns the mapping.

pub mod resolution;
pub mod signals;
pub mod snapshot;
pub mod wan;

pub use resolution::{ResolutionMethod, ResolutionResult};
pub use signals::{NetworkConfigSnapshot, RoutingSnapshot};
pub use snapshot::Snapshot;
pub use wan::{SpeedTest, SpeedTestOutcome, WanInterface};
