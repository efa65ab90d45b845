//! Shared error type for the broker.

use std::error::Error;
use std::fmt::{self, Display};
use std::num;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use backtrace::Backtrace;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, BrokerError>;

/// The broker's error type: a cause plus a captured backtrace, matching the
/// split used throughout the rest of this workspace's ancestry.
#[derive(Debug)]
pub struct BrokerError {
    pub kind: BrokerErrorKind,
    pub backtrace: Backtrace,
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}\nBacktrace: \n{:?}", self.kind, self.backtrace)?;

        let mut error: &dyn Error = &self.kind;
        while let Some(source) = error.source() {
            write!(f, "\n\nCaused by: {}", source)?;
            error = source;
        }

        Ok(())
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

// Forward From impls to BrokerError from BrokerErrorKind. Because From is
// reflexive, this impl also takes care of From<BrokerErrorKind>.
impl<T> From<T> for BrokerError
where
    BrokerErrorKind: From<T>,
{
    fn from(item: T) -> Self {
        BrokerError {
            kind: BrokerErrorKind::from(item),
            backtrace: Backtrace::new(),
        }
    }
}

impl From<&str> for BrokerError {
    fn from(message: &str) -> Self {
        BrokerErrorKind::General(message.to_owned()).into()
    }
}

impl Serialize for BrokerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let status = self.kind.status();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("code", &status.as_u16())?;
        map.serialize_entry("error", &status.canonical_reason())?;
        map.serialize_entry("message", &self.kind.to_string())?;
        map.end()
    }
}

#[derive(Debug, ThisError)]
pub enum BrokerErrorKind {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    MetricError(#[from] cadence::MetricError),

    #[error(transparent)]
    UuidError(#[from] uuid::Error),

    #[error(transparent)]
    ParseIntError(#[from] num::ParseIntError),

    #[error(transparent)]
    ParseError(#[from] url::ParseError),

    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("channel id contains a path separator: {0}")]
    InvalidChannelId(String),

    #[error("channel already registered: {0}")]
    ChannelConflict(String),

    #[error("invalid state transition, from: {0}, to: {1}")]
    InvalidStateTransition(String, String),

    #[error("invalid client message: {0}")]
    InvalidClientMessage(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unable to send to agent")]
    SendError,

    #[error("General Error: {0}")]
    General(String),
}

impl BrokerErrorKind {
    /// Get the associated HTTP status code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownAgent(_) | Self::UnknownChannel(_) | Self::UnknownGroup(_) => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidChannelId(_)
            | Self::InvalidClientMessage(_)
            | Self::BadRequest(_)
            | Self::ParseIntError(_)
            | Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::ChannelConflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::MetricError(_) => "metric_error",
            Self::UuidError(_) => "uuid_error",
            Self::ParseIntError(_) => "parse_int_error",
            Self::ParseError(_) => "parse_url_error",
            Self::ConfigError(_) => "config_error",
            Self::UnknownAgent(_) => "unknown_agent",
            Self::UnknownChannel(_) => "unknown_channel",
            Self::UnknownGroup(_) => "unknown_group",
            Self::InvalidChannelId(_) => "invalid_channel_id",
            Self::ChannelConflict(_) => "channel_conflict",
            Self::InvalidStateTransition(_, _) => "invalid_state_transition",
            Self::InvalidClientMessage(_) => "invalid_client_message",
            Self::BadRequest(_) => "bad_request",
            Self::SendError => "send_error",
            Self::General(_) => "general_error",
        }
    }
}

impl ResponseError for BrokerError {
    fn status_code(&self) -> StatusCode {
        self.kind.status()
    }

    fn error_response(&self) -> HttpResponse {
        trace!("Returning error: {}", self.kind.metric_label());
        HttpResponse::build(self.status_code()).json(self)
    }
}
