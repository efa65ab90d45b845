use async_trait::async_trait;
use mockall::automock;

use broker_protocol::ServerMessage;

use crate::error::WSError;

/// Trait wrapping [`actix_ws::Session`] so it can be replaced by a mock in
/// tests that exercise the transport loop without a real socket.
#[async_trait]
#[automock]
pub trait Session {
    /// See [`actix_ws::Session::text`]
    async fn text(&mut self, msg: ServerMessage) -> Result<(), WSError>;

    /// See [`actix_ws::Session::pong`]
    async fn pong(&mut self, msg: &[u8]) -> Result<(), WSError>;

    /// See [`actix_ws::Session::close`]
    async fn close(mut self, reason: Option<actix_ws::CloseReason>) -> Result<(), WSError>;
}

/// Implements [`Session`] over a real [`actix_ws::Session`].
#[derive(Clone)]
pub struct SessionImpl {
    inner: actix_ws::Session,
}

impl SessionImpl {
    pub fn new(inner: actix_ws::Session) -> Self {
        SessionImpl { inner }
    }
}

#[async_trait]
impl Session for SessionImpl {
    async fn text(&mut self, msg: ServerMessage) -> Result<(), WSError> {
        let json = msg.to_json().expect("ServerMessage always serializes");
        Ok(self.inner.text(json).await?)
    }

    async fn pong(&mut self, msg: &[u8]) -> Result<(), WSError> {
        Ok(self.inner.pong(msg).await?)
    }

    async fn close(mut self, reason: Option<actix_ws::CloseReason>) -> Result<(), WSError> {
        Ok(self.inner.close(reason).await?)
    }
}
