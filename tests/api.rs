use actix_web::{test, web, App};
use mentat::app::AppState;
use mentat::config::Config;
use mentat::handlers::{configure_routes, static_handler};
use mentat::lifecycle::LifecycleTimings;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    Config {
        timings: LifecycleTimings {
            build_tick: Duration::from_millis(10),
            deploy_steps: [Duration::from_millis(5); 4],
        },
        preferences_path: dir.path().join("prefs.json"),
        ..Config::default()
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(configure_routes)
                .default_service(web::to(static_handler)),
        )
        .await
    };
}

macro_rules! get {
    ($app:expr, $uri:expr) => {{
        let body: Value = test::call_and_read_body_json(&$app, test::TestRequest::get().uri($uri).to_request()).await;
        body
    }};
}

macro_rules! post {
    ($app:expr, $uri:expr, $body:expr) => {{
        let body: Value =
            test::call_and_read_body_json(&$app, test::TestRequest::post().uri($uri).set_json($body).to_request())
                .await;
        body
    }};
}

#[actix_rt::test]
async fn tree_endpoint_filters_and_supports_legacy_mode() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    let body = get!(app, "/api/tree?q=build");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["tree"], json!({ "system": { "type": "folder", "children": {
        "logs": { "type": "folder", "files": ["build.log"] }
    } } }));

    let legacy = get!(app, "/api/tree?q=build&legacy=true");
    assert!(legacy["tree"]["projects"].is_object());
}

#[actix_rt::test]
async fn explorer_toggle_select_and_context() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    let toggled = post!(app, "/api/explorer/toggle", json!({ "name": "documents" }));
    assert_eq!(toggled["expanded"], json!(true));

    let selected = post!(app, "/api/explorer/select", json!({ "path": "system/logs", "isFolder": true }));
    assert_eq!(selected["currentDir"], json!("/system/logs"));

    let context = post!(app, "/api/explorer/context", json!({ "path": "documents/report.md" }));
    assert_eq!(context["contextFiles"], json!(["documents/report.md"]));

    let explorer = get!(app, "/api/explorer");
    assert_eq!(explorer["selectedPath"], json!("system/logs"));
    let rows = explorer["rows"].as_array().unwrap();
    assert!(rows.iter().any(|r| r["path"] == json!("documents/report.md")));
    assert!(rows.iter().any(|r| r["name"] == json!("system") && r["isCurrent"] == json!(true)));
}

#[actix_rt::test]
async fn build_then_deploy_through_the_api() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    let started = post!(app, "/api/projects/space-shooter/build", json!({}));
    assert_eq!(started["session"]["state"], json!("building"));
    assert_eq!(started["session"]["isBuilding"], json!(true));

    let rejected = post!(app, "/api/projects/space-shooter/deploy", json!({}));
    assert_eq!(rejected["success"], json!(false));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let session = get!(app, "/api/session");
    assert_eq!(session["session"]["state"], json!("built"));
    assert_eq!(session["session"]["buildLogs"].as_array().unwrap().len(), 9);

    post!(app, "/api/projects/space-shooter/deploy", json!({}));
    tokio::time::sleep(Duration::from_millis(200)).await;
    let session = get!(app, "/api/session");
    assert_eq!(session["session"]["state"], json!("deployed"));
    let last = session["session"]["buildLogs"].as_array().unwrap().last().cloned().unwrap();
    assert!(last.as_str().unwrap().ends_with("is now running."));

    let toasts = get!(app, "/api/notifications");
    let levels: Vec<&str> = toasts["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["level"].as_str())
        .collect();
    assert_eq!(levels, vec!["warning", "success", "success"]);
}

#[actix_rt::test]
async fn share_writes_the_clipboard_and_unknown_ids_are_404() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    post!(app, "/api/projects/task-api/share", json!({}));
    let clip = get!(app, "/api/clipboard");
    assert_eq!(clip["text"], json!("https://mentat.app/share/task-api"));

    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/projects/nope/build").to_request()).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn terminal_and_preferences() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    let out = post!(app, "/api/terminal", json!({ "input": "build" }));
    assert_eq!(out["output"], json!(mentat::terminal::NO_PROJECT));

    let prefs = post!(app, "/api/preferences", json!({ "key": "theme", "value": "light" }));
    assert_eq!(prefs["preferences"]["theme"], json!("light"));
    let bad = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/preferences")
            .set_json(json!({ "key": "theme", "value": "neon" }))
            .to_request(),
    )
    .await;
    assert_eq!(bad.status(), 400);
    assert!(dir.path().join("prefs.json").exists());
}

#[actix_rt::test]
async fn serves_the_embedded_page() {
    let dir = TempDir::new().unwrap();
    let state = web::Data::new(AppState::new(&test_config(&dir)));
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(resp.status().is_success());
    let missing = test::call_service(&app, test::TestRequest::get().uri("/nope.txt").to_request()).await;
    assert_eq!(missing.status(), 404);
}
