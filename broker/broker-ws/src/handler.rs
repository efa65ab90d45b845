use std::sync::Arc;

use actix_ws::{CloseReason, Message};
use futures_util::StreamExt;

use broker_common::util::sec_since_epoch;
use broker_protocol::{ClientMessage, ServerNotification};
use broker_settings::AppState;
use broker_ws_sm::{on_server_notif, NewSession, NotifAction};

use crate::error::{WSError, REAP_CLOSE_CODE};
use crate::session::{Session, SessionImpl};

type MessageStreamResult = Result<Message, actix_ws::ProtocolError>;

/// Spawns the per-connection task bridging an agent's raw WebSocket to the
/// session protocol state machine (spec.md §4.2).
pub fn spawn_session(
    session: actix_ws::Session,
    msg_stream: actix_ws::MessageStream,
    app_state: Arc<AppState>,
) {
    actix_rt::spawn(async move {
        let mut session = SessionImpl::new(session);
        let close_reason = run_session(app_state, &mut session, msg_stream)
            .await
            .unwrap_or_else(|e| {
                trace!("spawn_session: error: {}", e);
                Some(CloseReason {
                    code: e.close_code(),
                    description: Some(e.to_string()),
                })
            });
        trace!("spawn_session: close_reason: {:#?}", close_reason);
        let _ = session.close(close_reason).await;
    });
}

pub(crate) async fn run_session(
    app_state: Arc<AppState>,
    session: &mut impl Session,
    mut msg_stream: impl futures_util::Stream<Item = MessageStreamResult> + Unpin,
) -> Result<Option<CloseReason>, WSError> {
    let Some(hello) = wait_for_hello(&mut msg_stream).await? else {
        return Ok(None);
    };

    let (tx, mut notif_rx) = tokio::sync::mpsc::unbounded_channel::<ServerNotification>();
    let (uaid, channel_ids, wakeup_hostport) = hello;
    let (greeted, reply) = NewSession::new(app_state).on_hello(
        uaid,
        channel_ids,
        wakeup_hostport,
        tx,
        sec_since_epoch(),
    );
    session.text(reply).await?;
    greeted.snapshot_and_persist();

    let close_reason = loop {
        tokio::select! {
            maybe_result = msg_stream.next() => {
                let Some(result) = maybe_result else {
                    trace!("run_session: msg_stream EOF");
                    break None;
                };
                let msg = result?;
                let client_msg = match msg {
                    Message::Text(ref bytestring) => {
                        match serde_json::from_str::<ClientMessage>(bytestring) {
                            Ok(m) => m,
                            Err(e) => {
                                debug!("run_session: ignoring malformed client message: {}", e);
                                continue;
                            }
                        }
                    }
                    Message::Nop | Message::Binary(_) | Message::Continuation(_) => continue,
                    Message::Close(reason) => break reason,
                    Message::Ping(bytes) => {
                        session.pong(&bytes).await?;
                        continue;
                    }
                    Message::Pong(_) => continue,
                };

                let outcome = greeted.on_client_msg(client_msg, sec_since_epoch());
                if let Some(reply) = outcome.reply {
                    session.text(reply).await?;
                }
                if outcome.should_snapshot {
                    greeted.snapshot_and_persist();
                }
            }

            maybe_notif = notif_rx.recv() => {
                let Some(notif) = maybe_notif else {
                    trace!("run_session: notif channel closed");
                    break None;
                };
                match on_server_notif(notif) {
                    NotifAction::Send(smsg) => session.text(smsg).await?,
                    NotifAction::Close => {
                        break Some(CloseReason {
                            code: actix_ws::CloseCode::Other(REAP_CLOSE_CODE),
                            description: Some("reconnect via wake-up".to_owned()),
                        });
                    }
                }
            }
        }
    };

    greeted.detach();
    Ok(close_reason)
}

type HelloFields = (
    Option<String>,
    Option<Vec<String>>,
    Option<broker_protocol::WakeupHostPort>,
);

/// Waits for a `hello` message (spec.md §4.2). Any other message type, or
/// any message this agent can't be bothered to send well-formed, is logged
/// and ignored rather than treated as an error. Returns `None` if the
/// stream ends before a `hello` ever arrives.
async fn wait_for_hello(
    msg_stream: &mut (impl futures_util::Stream<Item = MessageStreamResult> + Unpin),
) -> Result<Option<HelloFields>, WSError> {
    loop {
        let Some(result) = msg_stream.next().await else {
            return Ok(None);
        };
        let msg = result?;
        match msg {
            Message::Text(ref bytestring) => {
                match serde_json::from_str::<ClientMessage>(bytestring) {
                    Ok(ClientMessage::Hello {
                        uaid,
                        channel_ids,
                        wakeup_hostport,
                    }) => return Ok(Some((uaid, channel_ids, wakeup_hostport))),
                    Ok(_) => {
                        debug!("wait_for_hello: ignoring non-hello message before hello");
                        continue;
                    }
                    Err(e) => {
                        debug!("wait_for_hello: ignoring malformed message: {}", e);
                        continue;
                    }
                }
            }
            Message::Close(_) => return Ok(None),
            _ => continue,
        }
    }
}
