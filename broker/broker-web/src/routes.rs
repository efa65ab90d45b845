//! The app-server facing HTTP surface: Notify Intake (§4.3), Group Admin
//! (§4.4), and the read-only Admin View (§4.8).
use actix_web::{http::Method, web, HttpRequest, HttpResponse};
use serde_derive::Serialize;

use broker_common::endpoint::{make_endpoint, parse_channel_from_endpoint};
use broker_common::errors::{BrokerErrorKind, Result};
use broker_common::notification::PendingDelivery;
use broker_settings::AppState;

/// `PUT <notify-prefix><id>` where `id` names a channel or a group.
/// Increments every target channel's version by one and enqueues a
/// `PendingDelivery` for each (spec.md §4.3).
pub async fn notify_route(
    req: HttpRequest,
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.method() != Method::PUT {
        return Err(BrokerErrorKind::BadRequest(format!(
            "expected a write method, got {}",
            req.method()
        ))
        .into());
    }
    let id = id.into_inner();
    if id.contains('/') {
        return Err(BrokerErrorKind::InvalidChannelId(id).into());
    }

    let channel_ids = {
        let reg = state.registry.read().expect("registry lock poisoned");
        if reg.has_group(&id) {
            reg.group_members(&id).to_vec()
        } else if reg.get_channel(&id).is_some() {
            vec![id.clone()]
        } else {
            return Err(BrokerErrorKind::UnknownChannel(id).into());
        }
    };

    {
        let mut reg = state.registry.write().expect("registry lock poisoned");
        for channel_id in &channel_ids {
            if let Some((uaid, version)) = reg.bump_channel_version(channel_id) {
                state
                    .delivery
                    .new_pending(PendingDelivery::new(uaid, channel_id.clone(), version));
            }
        }
    }
    state.snapshot_and_persist();

    Ok(HttpResponse::Ok().body("OK"))
}

/// `POST <group-prefix>/<add|remove>/<groupID>`, body is a push endpoint
/// URL previously returned by `register` (spec.md §4.4).
pub async fn group_route(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.method() != Method::POST {
        return Err(BrokerErrorKind::BadRequest(format!(
            "expected POST, got {}",
            req.method()
        ))
        .into());
    }
    let (action, group_id) = path.into_inner();
    let endpoint = std::str::from_utf8(&body)
        .map_err(|_| BrokerErrorKind::BadRequest("push endpoint body must be utf-8".to_owned()))?
        .trim();
    let channel_id = parse_channel_from_endpoint(endpoint, &state.settings.notify_prefix)
        .map_err(|e| BrokerErrorKind::BadRequest(e.to_string()))?;

    {
        let reg = state.registry.read().expect("registry lock poisoned");
        if reg.get_channel(&channel_id).is_none() {
            return Err(BrokerErrorKind::BadRequest(format!(
                "unknown channel: {channel_id}"
            ))
            .into());
        }
    }

    match action.as_str() {
        "add" => state
            .registry
            .write()
            .expect("registry lock poisoned")
            .group_add(&group_id, &channel_id),
        "remove" => state
            .registry
            .write()
            .expect("registry lock poisoned")
            .group_remove(&group_id, &channel_id),
        other => {
            return Err(BrokerErrorKind::BadRequest(format!("unknown group action: {other}")).into())
        }
    }
    state.snapshot_and_persist();

    let group_endpoint = make_endpoint(&state.base_url(), &state.settings.notify_prefix, &group_id)?;
    Ok(HttpResponse::Ok().body(group_endpoint))
}

#[derive(Serialize)]
struct AdminAgent {
    uaid: String,
    connected: bool,
    channels: Vec<String>,
}

#[derive(Serialize)]
struct AdminView {
    agents: Vec<AdminAgent>,
    /// Total entries resident in the registry (agents + channels +
    /// groups), standing in for the spec's "total resident memory": an
    /// actual RSS figure isn't meaningfully scoped to the registry.
    resident_entries: usize,
}

/// Read-only listing of every agent with its connection state and owned
/// channels, plus a resident-entry count (spec.md §4.8). No mutation.
pub async fn admin_route(state: web::Data<AppState>) -> HttpResponse {
    let reg = state.registry.read().expect("registry lock poisoned");
    let agents: Vec<AdminAgent> = reg
        .agents()
        .map(|agent| AdminAgent {
            uaid: agent.uaid.clone(),
            connected: agent.connected(),
            channels: agent.channels.iter().cloned().collect(),
        })
        .collect();
    let resident_entries = agents.len() + reg.channel_count() + reg.group_count();

    HttpResponse::Ok().json(AdminView {
        agents,
        resident_entries,
    })
}
