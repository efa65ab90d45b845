//! Turning a `ServerNotification` (from the Delivery Engine or the
//! Reaper) into either a message to write to the agent or a close.
use broker_protocol::{NotificationUpdate, ServerMessage, ServerNotification};

/// What the transport loop should do with a `ServerNotification` it read
/// off the per-agent channel.
pub enum NotifAction {
    /// Write this message to the agent's socket.
    Send(ServerMessage),
    /// Close the connection (the Reaper decided this agent is stale).
    Close,
}

/// Map one `ServerNotification` to the action the transport loop takes.
/// `updates` carries exactly one entry per message (spec.md §4.2).
pub fn on_server_notif(notif: ServerNotification) -> NotifAction {
    match notif {
        ServerNotification::Notification(pending) => NotifAction::Send(ServerMessage::Notification {
            updates: vec![NotificationUpdate::from(pending)],
        }),
        ServerNotification::Disconnect => NotifAction::Close,
    }
}

#[cfg(test)]
mod tests {
    use broker_common::notification::PendingDelivery;

    use super::*;

    #[test]
    fn notification_carries_exactly_one_update() {
        let action = on_server_notif(ServerNotification::Notification(PendingDelivery::new(
            "u1", "c1", 3,
        )));
        match action {
            NotifAction::Send(ServerMessage::Notification { updates }) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].version, 3);
            }
            _ => panic!("expected a send action"),
        }
    }

    #[test]
    fn disconnect_maps_to_close() {
        assert!(matches!(
            on_server_notif(ServerNotification::Disconnect),
            NotifAction::Close
        ));
    }
}
