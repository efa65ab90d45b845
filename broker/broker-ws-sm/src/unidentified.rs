use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use broker_protocol::{ServerMessage, ServerNotification, WakeupHostPort};
use broker_settings::AppState;

use crate::identified::GreetedSession;

/// A session waiting for (or yet to process) a `hello` message. Any other
/// message type received in this state is ignored and logged by the
/// transport loop before it ever reaches this type (spec.md §4.2).
pub struct NewSession {
    app_state: Arc<AppState>,
}

impl NewSession {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self { app_state }
    }

    /// Process a `hello` (spec.md §4.2):
    ///
    /// 1. No `uaid` -> mint a fresh one.
    /// 2. `uaid` + `channelIDs` where any listed channel isn't owned by that
    ///    agent -> reset (drop the old agent + its channels), mint a fresh
    ///    `uaid`.
    /// 3. Attach this session, apply the wake-up rendezvous if given,
    ///    transition to `Greeted`.
    pub fn on_hello(
        self,
        uaid: Option<String>,
        channel_ids: Option<Vec<String>>,
        wakeup_hostport: Option<WakeupHostPort>,
        sender: UnboundedSender<ServerNotification>,
        now: u64,
    ) -> (GreetedSession, ServerMessage) {
        let registry = &self.app_state.registry;

        let resolved_uaid = match uaid {
            None => fresh_uaid(),
            Some(uaid) => {
                let stale = channel_ids.is_some_and(|wanted| {
                    let reg = registry.read().expect("registry lock poisoned");
                    let Some(agent) = reg.get_agent(&uaid) else {
                        return !wanted.is_empty();
                    };
                    wanted.iter().any(|c| !agent.channels.contains(c))
                });
                if stale {
                    debug!("hello: resetting stale agent {}", uaid);
                    registry.write().expect("registry lock poisoned").reset_agent(&uaid);
                    fresh_uaid()
                } else {
                    uaid
                }
            }
        };

        {
            let mut reg = registry.write().expect("registry lock poisoned");
            reg.attach_session(&resolved_uaid, sender, now);
            reg.touch_last_contact(&resolved_uaid, now);
            if let Some(wakeup) = wakeup_hostport {
                reg.set_wakeup(&resolved_uaid, wakeup);
            }
        }

        let reply = ServerMessage::Hello {
            uaid: resolved_uaid.clone(),
            status: 200,
        };
        (GreetedSession::new(resolved_uaid, self.app_state), reply)
    }
}

fn fresh_uaid() -> String {
    Uuid::new_v4().as_simple().to_string()
}

#[cfg(test)]
mod tests {
    use broker_settings::AppState;

    use super::*;

    fn session() -> NewSession {
        NewSession::new(Arc::new(AppState::default()))
    }

    #[tokio::test]
    async fn hello_with_no_uaid_mints_a_fresh_one() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let (greeted, reply) = session().on_hello(None, None, None, tx, 0);
        match reply {
            ServerMessage::Hello { status, uaid } => {
                assert_eq!(status, 200);
                assert_eq!(uaid, greeted.uaid);
                assert_eq!(uaid.len(), 32);
            }
            _ => panic!("expected hello reply"),
        }
    }

    #[tokio::test]
    async fn hello_reusing_known_uaid_and_channels_keeps_it() {
        let app_state = Arc::new(AppState::default());
        {
            let mut reg = app_state.registry.write().unwrap();
            reg.ensure_agent("known", 0);
            reg.register_channel("known", "c1").unwrap();
        }
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let (greeted, reply) = NewSession::new(app_state).on_hello(
            Some("known".to_owned()),
            Some(vec!["c1".to_owned()]),
            None,
            tx,
            0,
        );
        assert_eq!(greeted.uaid, "known");
        match reply {
            ServerMessage::Hello { uaid, .. } => assert_eq!(uaid, "known"),
            _ => panic!("expected hello reply"),
        }
    }

    #[tokio::test]
    async fn hello_with_unknown_channel_resets_and_mints_new_uaid() {
        let app_state = Arc::new(AppState::default());
        {
            let mut reg = app_state.registry.write().unwrap();
            reg.ensure_agent("known", 0);
            reg.register_channel("known", "c1").unwrap();
        }
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let (greeted, _reply) = NewSession::new(app_state.clone()).on_hello(
            Some("known".to_owned()),
            Some(vec!["c1".to_owned(), "c2".to_owned()]),
            None,
            tx,
            0,
        );
        assert_ne!(greeted.uaid, "known");
        assert!(app_state.registry.read().unwrap().get_agent("known").is_none());
    }
}
