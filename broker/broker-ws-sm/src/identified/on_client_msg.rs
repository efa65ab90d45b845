//! Processing for `register`, `unregister` and `ack` messages received
//! from an agent in the `Greeted` state (spec.md §4.2).
use broker_common::endpoint::make_endpoint;
use broker_protocol::{ClientAck, ServerMessage};
use broker_registry::RegistryError;

use super::{ClientMsgOutcome, GreetedSession};

/// `register`: conflict if the channel exists and is owned by a different
/// agent (409, empty endpoint); otherwise 200 with a fresh push endpoint.
/// Missing `channelID` is ignored with a log, per spec.md §4.2.
pub(super) fn register(session: &GreetedSession, channel_id: Option<String>) -> ClientMsgOutcome {
    let Some(channel_id) = channel_id else {
        debug!("register: missing channelID, ignoring");
        return ClientMsgOutcome {
            reply: None,
            should_snapshot: false,
        };
    };

    let app_state = session.app_state();
    let result = app_state
        .registry
        .write()
        .expect("registry lock poisoned")
        .register_channel(&session.uaid, &channel_id);

    match result {
        Ok(()) => {
            let push_endpoint =
                make_endpoint(&app_state.base_url(), &app_state.settings.notify_prefix, &channel_id)
                    .unwrap_or_default();
            ClientMsgOutcome {
                reply: Some(ServerMessage::Register {
                    channel_id,
                    status: 200,
                    push_endpoint,
                }),
                should_snapshot: true,
            }
        }
        Err(RegistryError::Conflict(_)) => ClientMsgOutcome {
            reply: Some(ServerMessage::Register {
                channel_id,
                status: 409,
                push_endpoint: String::new(),
            }),
            should_snapshot: false,
        },
        Err(RegistryError::UnknownAgent(_)) => {
            // Can't happen via the transport loop (the agent was ensured
            // when it greeted); treat defensively as a conflict-free no-op.
            ClientMsgOutcome {
                reply: Some(ServerMessage::Register {
                    channel_id,
                    status: 409,
                    push_endpoint: String::new(),
                }),
                should_snapshot: false,
            }
        }
    }
}

/// `unregister`: always replies 200, whether or not the channel existed
/// (idempotent, spec.md §4.2). Also tells the Delivery Engine to drop any
/// pending entry for this channel (spec.md §3 invariant 4).
pub(super) fn unregister(session: &GreetedSession, channel_id: Option<String>) -> ClientMsgOutcome {
    let Some(channel_id) = channel_id else {
        debug!("unregister: missing channelID, ignoring");
        return ClientMsgOutcome {
            reply: None,
            should_snapshot: false,
        };
    };

    let app_state = session.app_state();
    app_state
        .registry
        .write()
        .expect("registry lock poisoned")
        .unregister_channel(&session.uaid, &channel_id);
    app_state.delivery.forget(&channel_id);

    ClientMsgOutcome {
        reply: Some(ServerMessage::Unregister {
            channel_id,
            status: 200,
        }),
        should_snapshot: true,
    }
}

/// `ack`: forward each update to the Delivery Engine. No reply, no
/// snapshot (spec.md §4.2/§4.5).
pub(super) fn ack(session: &GreetedSession, updates: Vec<ClientAck>) -> ClientMsgOutcome {
    let delivery = &session.app_state().delivery;
    for update in updates {
        delivery.ack(update.channel_id, update.version);
    }
    ClientMsgOutcome {
        reply: None,
        should_snapshot: false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use broker_settings::AppState;

    use super::*;

    fn greeted(uaid: &str) -> GreetedSession {
        let app_state = Arc::new(AppState::default());
        app_state
            .registry
            .write()
            .unwrap()
            .ensure_agent(uaid, 0);
        GreetedSession::new(uaid.to_owned(), app_state)
    }

    #[tokio::test]
    async fn register_succeeds_with_endpoint() {
        let session = greeted("u1");
        let outcome = register(&session, Some("c1".to_owned()));
        assert!(outcome.should_snapshot);
        match outcome.reply.unwrap() {
            ServerMessage::Register {
                status,
                push_endpoint,
                ..
            } => {
                assert_eq!(status, 200);
                assert!(push_endpoint.contains("c1"));
            }
            _ => panic!("expected register reply"),
        }
    }

    #[tokio::test]
    async fn register_conflict_by_other_agent_returns_409() {
        let session = greeted("u1");
        register(&session, Some("c1".to_owned()));

        let other_app_state = session.app_state().clone();
        other_app_state.registry.write().unwrap().ensure_agent("u2", 0);
        let other_session = GreetedSession::new("u2".to_owned(), other_app_state);

        let outcome = register(&other_session, Some("c1".to_owned()));
        assert!(!outcome.should_snapshot);
        match outcome.reply.unwrap() {
            ServerMessage::Register {
                status,
                push_endpoint,
                ..
            } => {
                assert_eq!(status, 409);
                assert!(push_endpoint.is_empty());
            }
            _ => panic!("expected register reply"),
        }
    }

    #[tokio::test]
    async fn unregister_is_always_200() {
        let session = greeted("u1");
        let outcome = unregister(&session, Some("never-registered".to_owned()));
        match outcome.reply.unwrap() {
            ServerMessage::Unregister { status, .. } => assert_eq!(status, 200),
            _ => panic!("expected unregister reply"),
        }
    }

    #[tokio::test]
    async fn missing_channel_id_on_register_is_ignored() {
        let session = greeted("u1");
        let outcome = register(&session, None);
        assert!(outcome.reply.is_none());
        assert!(!outcome.should_snapshot);
    }
}
