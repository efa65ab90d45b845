use std::sync::Arc;

use broker_protocol::ServerMessage;
use broker_settings::AppState;

use crate::{handler::run_session, session::MockSession};

#[ctor::ctor]
fn init_test_logging() {
    broker_common::logging::init_logging(true).ok();
}

#[actix_web::test]
async fn hello_then_close() {
    let app_state = Arc::new(AppState::default());
    let mut session = MockSession::new();
    session
        .expect_text()
        .times(1)
        .withf(|msg| matches!(msg, ServerMessage::Hello { .. }))
        .return_once(|_| Ok(()));

    let s = futures::stream::iter(vec![
        Ok(actix_ws::Message::Text(
            broker_protocol::test_support::hello_json().into(),
        )),
        Ok(actix_ws::Message::Close(None)),
    ]);
    let close_reason = run_session(app_state, &mut session, s)
        .await
        .expect("session should not error");
    assert!(close_reason.is_none());
}

#[actix_web::test]
async fn malformed_message_before_hello_is_ignored() {
    let app_state = Arc::new(AppState::default());
    let mut session = MockSession::new();
    session
        .expect_text()
        .times(1)
        .withf(|msg| matches!(msg, ServerMessage::Hello { .. }))
        .return_once(|_| Ok(()));

    let s = futures::stream::iter(vec![
        Ok(actix_ws::Message::Text("not json".into())),
        Ok(actix_ws::Message::Text(
            broker_protocol::test_support::hello_json().into(),
        )),
        Ok(actix_ws::Message::Close(None)),
    ]);
    run_session(app_state, &mut session, s)
        .await
        .expect("session should not error");
}

#[actix_web::test]
async fn stream_closing_before_hello_ends_the_session_quietly() {
    let app_state = Arc::new(AppState::default());
    let mut session = MockSession::new();
    session.expect_text().never();

    let s = futures::stream::iter(Vec::<Result<actix_ws::Message, actix_ws::ProtocolError>>::new());
    let close_reason = run_session(app_state, &mut session, s)
        .await
        .expect("session should not error");
    assert!(close_reason.is_none());
}

#[actix_web::test]
async fn ping_gets_a_pong() {
    let app_state = Arc::new(AppState::default());
    let mut session = MockSession::new();
    session
        .expect_text()
        .times(1)
        .withf(|msg| matches!(msg, ServerMessage::Hello { .. }))
        .return_once(|_| Ok(()));
    session.expect_pong().times(1).return_once(|_| Ok(()));

    let s = futures::stream::iter(vec![
        Ok(actix_ws::Message::Text(
            broker_protocol::test_support::hello_json().into(),
        )),
        Ok(actix_ws::Message::Ping("ping".into())),
        Ok(actix_ws::Message::Close(None)),
    ]);
    run_session(app_state, &mut session, s)
        .await
        .expect("session should not error");
}
