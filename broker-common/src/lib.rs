#[macro_use]
extern crate slog;
#[macro_use]
extern crate slog_scope;

pub mod endpoint;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod notification;
pub mod test_support;
pub mod util;
