#[macro_use]
extern crate slog_scope;

use actix_web::{web, Error, HttpRequest, HttpResponse};

use broker_settings::AppState;

mod error;
mod handler;
mod session;
#[cfg(test)]
mod test;

pub use error::{WSError, REAP_CLOSE_CODE};

/// Upgrades an inbound HTTP request to a WebSocket and hands it off to the
/// per-connection session loop (spec.md §4.2).
pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    debug!("🔌 Got connection");
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;
    handler::spawn_session(session, msg_stream, app_state.into_inner());
    Ok(response)
}
