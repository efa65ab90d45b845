use crate::protocol::MessageType;

pub const DUMMY_UAID: &str = "deadbeef00000000decafbad00000000";
pub const DUMMY_CHID: &str = "c1";

/// A minimal "hello" message, used by an unregistered agent with no
/// existing channel subscriptions.
pub fn hello_json() -> String {
    format!(r#"{{"messageType": "{}"}}"#, MessageType::Hello.as_ref())
}

/// A "hello" message re-presenting a previously issued uaid.
pub fn hello_again_json(uaid: &str) -> String {
    format!(
        r#"{{"messageType": "{}", "uaid": "{}"}}"#,
        MessageType::Hello.as_ref(),
        uaid
    )
}

pub fn register_json(channel_id: &str) -> String {
    format!(
        r#"{{"messageType": "{}", "channelID": "{}"}}"#,
        MessageType::Register.as_ref(),
        channel_id
    )
}

pub fn ack_json(channel_id: &str, version: u64) -> String {
    format!(
        r#"{{"messageType": "{}", "updates": [{{"channelID": "{}", "version": {}}}]}}"#,
        MessageType::Ack.as_ref(),
        channel_id,
        version
    )
}
