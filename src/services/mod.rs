//! Service layer.
//!
//! Domain logic kept apart from the CLI: services report through return
//! values and event channels, never by printing.

pub mod batch;
pub mod carbon;
pub mod feeds;
pub mod harvest;

pub use batch::{BatchResult, BatchService};
pub use feeds::{default_feeds, FeedClient, FeedError};
pub use harvest::{HarvestError, HarvestEvent, HarvestService, ScanReport, ScanRequest};
