use actix_web::{
    test::{call_service, init_service, TestRequest},
    App,
};

use broker_common::endpoint::make_endpoint;
use broker_settings::AppState;

use crate::config;

#[ctor::ctor]
fn init_test_logging() {
    broker_common::logging::init_logging(true).ok();
}

fn seeded_app_state() -> AppState {
    let app_state = AppState::default();
    {
        let mut reg = app_state.registry.write().unwrap();
        reg.ensure_agent("u1", 0);
        reg.register_channel("u1", "c1").unwrap();
    }
    app_state
}

#[actix_web::test]
async fn notify_route_bumps_version_and_replies_ok() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state.clone()))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::put().uri("/notify/c1").to_request();
    let resp = call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        app_state
            .registry
            .read()
            .unwrap()
            .get_channel("c1")
            .unwrap()
            .version,
        1
    );
}

#[actix_web::test]
async fn notify_route_unknown_id_is_not_found() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::put().uri("/notify/nope").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn notify_route_rejects_path_separator_in_id() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::put().uri("/notify/a%2Fb").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn notify_route_rejects_literal_path_separator_in_id() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state))
            .configure(config(settings)),
    )
    .await;

    // Without a tail capture in the route pattern this wouldn't even reach
    // `notify_route` — actix would 404 it as an unmatched path.
    let req = TestRequest::put().uri("/notify/a/b").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn group_add_then_notify_fans_out_to_member_channel() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let channel_endpoint = make_endpoint(&app_state.base_url(), &settings.notify_prefix, "c1").unwrap();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state.clone()))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::post()
        .uri("/groups/add/g1")
        .set_payload(channel_endpoint)
        .to_request();
    let resp = call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = TestRequest::put().uri("/notify/g1").to_request();
    let resp = call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        app_state
            .registry
            .read()
            .unwrap()
            .get_channel("c1")
            .unwrap()
            .version,
        1
    );
}

#[actix_web::test]
async fn admin_route_lists_seeded_agent() {
    let app_state = seeded_app_state();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::get().uri("/admin").to_request();
    let resp = call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["agents"][0]["uaid"], "u1");
    assert_eq!(body["agents"][0]["connected"], false);
}

#[actix_web::test]
async fn heartbeat_route_reports_ok() {
    let app_state = AppState::default();
    let settings = app_state.settings.clone();
    let app = init_service(
        App::new()
            .app_data(actix_web::web::Data::new(app_state))
            .configure(config(settings)),
    )
    .await;

    let req = TestRequest::get().uri("/__heartbeat__").to_request();
    let resp = call_service(&app, req).await;
    assert!(resp.status().is_success());
}
