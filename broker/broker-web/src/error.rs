//! Every handler in this crate returns [`broker_common::errors::BrokerError`]
//! directly; its `ResponseError` impl already renders the JSON error body
//! this workspace's lineage expects. Nothing to add here.
pub use broker_common::errors::{BrokerError as ApiError, Result};
