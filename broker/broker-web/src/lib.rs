//! Wires the agent-facing WebSocket endpoint, the app-server notify and
//! group admin endpoints (§4.3, §4.4), the read-only admin view (§4.8),
//! and the Dockerflow health routes into one actix-web app.
#[macro_use]
extern crate slog_scope;

pub mod dockerflow;
pub mod error;
pub mod routes;
#[cfg(test)]
mod test;

use actix_web::web;

use broker_settings::Settings;

/// Builds the full app, including the standard error-to-JSON response
/// wrapping. `$config` is produced by [`config`] for a concrete
/// [`Settings`] value.
#[macro_export]
macro_rules! build_app {
    ($app_state: expr, $config: expr) => {
        actix_web::App::new()
            .app_data(actix_web::web::Data::new($app_state.clone()))
            .configure($config)
    };
}

/// The app's route table. Notify and group admin paths are derived from
/// `settings` at configure time since their prefixes are configuration,
/// not compile-time constants.
pub fn config(settings: Settings) -> impl Fn(&mut web::ServiceConfig) + Clone + 'static {
    move |cfg: &mut web::ServiceConfig| {
        // `{id:.*}` rather than `{id}`: a bare single-segment capture would
        // make actix 404 an id containing a literal `/` before the handler
        // ever sees it, instead of letting `notify_route`'s own
        // `id.contains('/')` check report the spec's 400.
        let notify_path = format!(
            "{}/{{id:.*}}",
            settings.notify_prefix.trim_end_matches('/')
        );
        let group_path = format!(
            "{}/{{action}}/{{group_id}}",
            settings.group_prefix.trim_end_matches('/')
        );
        cfg.route("/", web::get().to(broker_ws::ws_handler))
            .service(web::resource(notify_path).to(routes::notify_route))
            .service(web::resource(group_path).to(routes::group_route))
            .route("/admin", web::get().to(routes::admin_route))
            .configure(dockerflow::service);
    }
}
