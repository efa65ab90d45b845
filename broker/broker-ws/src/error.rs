/// Transport-level errors for the agent WebSocket handler. Protocol
/// violations from the agent (malformed JSON, missing fields) are never
/// represented here — spec.md §7 requires those be logged and ignored,
/// not surfaced as a closing error. This type covers only faults that
/// genuinely end the connection.
#[derive(thiserror::Error, Debug)]
pub enum WSError {
    #[error("WebSocket protocol error: {0}")]
    Protocol(#[from] actix_ws::ProtocolError),

    #[error("WebSocket session unexpectedly closed: {0}")]
    SessionClosed(#[from] actix_ws::Closed),

    #[error("Unsupported WebSocket message: {0}")]
    UnsupportedMessage(String),
}

impl WSError {
    pub fn close_code(&self) -> actix_ws::CloseCode {
        match self {
            WSError::UnsupportedMessage(_) => actix_ws::CloseCode::Unsupported,
            _ => actix_ws::CloseCode::Error,
        }
    }
}

/// Close code the server sends to signal "reconnect via wake-up expected"
/// (spec.md §6). `actix_ws::CloseCode` has no named variant for it, so
/// it's carried as the raw reserved-range code.
pub const REAP_CLOSE_CODE: u16 = 4774;
