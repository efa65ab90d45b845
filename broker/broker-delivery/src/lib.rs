//! The Delivery Engine (§4.5), the Wake-up Driver (§4.6) and the Reaper
//! (§4.7): the three background workers that keep pending deliveries
//! moving without blocking a session handler or HTTP request.
#[macro_use]
extern crate slog_scope;

mod engine;
mod reaper;
mod wakeup;

pub use engine::{spawn_delivery_engine, DeliveryHandle};
pub use reaper::spawn_reaper;
pub use wakeup::send_wakeup;
