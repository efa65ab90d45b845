//! Notification types shared between the registry, the delivery engine and
//! the wire protocol.

use serde_derive::{Deserialize, Serialize};

/// A notification owed to an agent for one channel. Held by the Delivery
/// Engine's `pending` map, keyed by channel identifier; never persisted in
/// registry snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingDelivery {
    pub uaid: String,
    #[serde(rename = "channelID")]
    pub channel_id: String,
    pub version: u64,
}

impl PendingDelivery {
    pub fn new(uaid: impl Into<String>, channel_id: impl Into<String>, version: u64) -> Self {
        Self {
            uaid: uaid.into(),
            channel_id: channel_id.into(),
            version,
        }
    }
}
