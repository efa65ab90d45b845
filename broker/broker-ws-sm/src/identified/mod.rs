use std::sync::Arc;

use broker_protocol::{ClientMessage, ServerMessage};
use broker_settings::AppState;

mod on_client_msg;
mod on_server_notif;

pub use on_server_notif::{on_server_notif, NotifAction};

/// A session that has completed `hello` and is attached to an agent. Only
/// here may register/unregister/ack be processed (spec.md §4.2).
pub struct GreetedSession {
    pub uaid: String,
    app_state: Arc<AppState>,
}

/// The outcome of processing one inbound message in the `Greeted` state:
/// an optional reply to write back, and whether this message (having
/// succeeded) should trigger a registry snapshot (spec.md §4.2: "Every
/// successful inbound hello/register/unregister triggers a registry
/// snapshot. `ack` does not.").
pub struct ClientMsgOutcome {
    pub reply: Option<ServerMessage>,
    pub should_snapshot: bool,
}

impl GreetedSession {
    pub(crate) fn new(uaid: String, app_state: Arc<AppState>) -> Self {
        Self { uaid, app_state }
    }

    /// Dispatch one inbound message. Touches the agent's last-contact
    /// timestamp regardless of message type (used by the Reaper).
    pub fn on_client_msg(&self, msg: ClientMessage, now: u64) -> ClientMsgOutcome {
        self.app_state
            .registry
            .write()
            .expect("registry lock poisoned")
            .touch_last_contact(&self.uaid, now);

        match msg {
            ClientMessage::Hello { .. } => ClientMsgOutcome {
                reply: None,
                should_snapshot: false,
            },
            ClientMessage::Register { channel_id } => on_client_msg::register(self, channel_id),
            ClientMessage::Unregister { channel_id } => {
                on_client_msg::unregister(self, channel_id)
            }
            ClientMessage::Ack { updates } => on_client_msg::ack(self, updates),
        }
    }

    /// Detach this session from its agent on disconnect. The agent itself
    /// is retained (spec.md §4.2: "session is detached ... agent is not
    /// deleted").
    pub fn detach(&self) {
        self.app_state
            .registry
            .write()
            .expect("registry lock poisoned")
            .detach_session(&self.uaid);
    }

    pub(crate) fn app_state(&self) -> &Arc<AppState> {
        &self.app_state
    }

    /// Snapshot and persist the registry. Callers trigger this after
    /// hello/successful register/unregister (spec.md §4.2).
    pub fn snapshot_and_persist(&self) {
        self.app_state.snapshot_and_persist();
    }
}
