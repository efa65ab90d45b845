//! The per-connection session protocol state machine (spec.md §4.2):
//! `New -> Greeted -> Closed`. `NewSession` lives in the `New` state,
//! waiting for a `hello`; `GreetedSession` is the post-hello state where
//! register/unregister/ack are processed.
#[macro_use]
extern crate slog_scope;

mod identified;
mod unidentified;

pub use identified::{on_server_notif, GreetedSession, NotifAction};
pub use unidentified::NewSession;
