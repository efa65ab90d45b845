//! Health and Dockerflow routes, carried as ambient ops infrastructure
//! regardless of spec.md's feature scope.
use actix_web::web::{Data, Json};
use actix_web::{web, HttpResponse};
use serde_json::json;

use broker_settings::AppState;

/// Handle the `/__heartbeat__` route.
pub async fn heartbeat_route(state: Data<AppState>) -> Json<serde_json::Value> {
    let reg = state.registry.read().expect("registry lock poisoned");
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "agents": reg.agents().count(),
    }))
}

/// Handle the `/status` route.
pub async fn status_route() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handle the `/__lbheartbeat__` route. Used by the load balancer; just
/// confirms the process is alive.
pub async fn lb_heartbeat_route() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Handle the `/__version__` route.
pub async fn version_route() -> Json<serde_json::Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

pub fn service(cfg: &mut web::ServiceConfig) {
    cfg.route("/__heartbeat__", web::get().to(heartbeat_route))
        .route("/__lbheartbeat__", web::get().to(lb_heartbeat_route))
        .route("/__version__", web::get().to(version_route))
        .route("/status", web::get().to(status_route));
}
