use crate::app::AppState;
use crate::file_tree::{filter_tree, filter_tree_legacy};
use crate::models::{ContextRequest, PreferenceRequest, SelectRequest, TerminalRequest, ToggleRequest, TreeQuery};
use crate::preferences::validate_preference;
use crate::terminal::TerminalContext;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::{debug, info, warn};
use rust_embed::RustEmbed;
use serde_json::json;
use std::time::Instant;

#[derive(RustEmbed)]
#[folder = "public/"]
struct Asset;

fn lock_failed(what: &str, e: impl std::fmt::Display) -> HttpResponse {
    warn!("{} lock failed: {}", what, e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": format!("{} lock failed", what) }))
}

fn unknown_project(id: &str) -> HttpResponse {
    warn!("Request for unknown project '{}'", id);
    HttpResponse::NotFound().json(json!({ "success": false, "error": format!("Unknown project: {}", id) }))
}

#[get("/api/connect")]
pub async fn connect() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": "Connection successful" }))
}

#[get("/api/tree")]
pub async fn get_tree(state: web::Data<AppState>, query: web::Query<TreeQuery>) -> HttpResponse {
    let q = query.q.as_deref().unwrap_or("");
    let start_time = Instant::now();
    let tree = if query.legacy {
        filter_tree_legacy(&state.tree, q)
    } else {
        filter_tree(&state.tree, q)
    };
    debug!("Filtered tree for '{}' in {:.2?}", q, start_time.elapsed());
    HttpResponse::Ok().json(json!({ "success": true, "query": q, "tree": tree }))
}

#[get("/api/explorer")]
pub async fn get_explorer(state: web::Data<AppState>, query: web::Query<TreeQuery>) -> HttpResponse {
    let explorer = match state.explorer.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Explorer", e),
    };
    let tree = filter_tree(&state.tree, query.q.as_deref().unwrap_or(""));
    let current_dir = state.workspace.current_dir();
    let rows = explorer.render_rows(&tree, &current_dir);
    HttpResponse::Ok().json(json!({
        "success": true,
        "currentDir": current_dir,
        "selectedPath": explorer.selected_path(),
        "contextFiles": state.workspace.context_files(),
        "rows": rows,
    }))
}

#[post("/api/explorer/toggle")]
pub async fn toggle_folder(state: web::Data<AppState>, req: web::Json<ToggleRequest>) -> HttpResponse {
    let mut explorer = match state.explorer.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Explorer", e),
    };
    explorer.toggle_folder(&req.name);
    HttpResponse::Ok().json(json!({ "success": true, "expanded": explorer.is_expanded(&req.name) }))
}

#[post("/api/explorer/select")]
pub async fn select_item(state: web::Data<AppState>, req: web::Json<SelectRequest>) -> HttpResponse {
    let mut explorer = match state.explorer.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Explorer", e),
    };
    explorer.select_item(&req.path, req.is_folder, &state.workspace);
    HttpResponse::Ok().json(json!({
        "success": true,
        "selectedPath": explorer.selected_path(),
        "currentDir": state.workspace.current_dir(),
    }))
}

#[post("/api/explorer/context")]
pub async fn add_to_context(state: web::Data<AppState>, req: web::Json<ContextRequest>) -> HttpResponse {
    let explorer = match state.explorer.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Explorer", e),
    };
    explorer.add_to_context(&req.path, &state.workspace);
    HttpResponse::Ok().json(json!({ "success": true, "contextFiles": state.workspace.context_files() }))
}

#[get("/api/projects")]
pub async fn list_projects(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "projects": state.projects }))
}

#[get("/api/session")]
pub async fn get_session(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "session": state.session.snapshot() }))
}

#[post("/api/projects/{id}/{action}")]
pub async fn project_action(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HttpResponse {
    let (id, action) = path.into_inner();
    let Some(project) = state.project(&id) else {
        return unknown_project(&id);
    };
    info!("Project action '{}' on '{}'", action, id);
    let session = &state.session;
    let result = match action.as_str() {
        "select" => session.select_project(project).map_err(|e| e.to_string()),
        "build" => session.start_build(project).map_err(|e| e.to_string()),
        "deploy" => session.deploy_project(project).map_err(|e| e.to_string()),
        "share" => session.share_project(project).map(|_| ()),
        "configure" => {
            session.configure_project(project);
            Ok(())
        }
        _ => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": format!("Unknown action: {}", action) }));
        }
    };
    match result {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "session": session.snapshot() })),
        Err(e) => HttpResponse::Ok().json(json!({ "success": false, "error": e, "session": session.snapshot() })),
    }
}

#[post("/api/build/stop")]
pub async fn stop_build(state: web::Data<AppState>) -> HttpResponse {
    state.session.stop_build();
    HttpResponse::Ok().json(json!({ "success": true, "session": state.session.snapshot() }))
}

#[get("/api/notifications")]
pub async fn drain_notifications(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "notifications": state.notifications.drain() }))
}

#[get("/api/clipboard")]
pub async fn get_clipboard(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "text": state.clipboard.contents() }))
}

#[get("/api/monitor")]
pub async fn get_monitor(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "monitor": state.monitor.snapshot() }))
}

#[get("/api/terminal")]
pub async fn get_terminal(state: web::Data<AppState>) -> HttpResponse {
    let terminal = match state.terminal.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Terminal", e),
    };
    HttpResponse::Ok().json(json!({ "success": true, "history": terminal.history() }))
}

#[post("/api/terminal")]
pub async fn run_terminal(state: web::Data<AppState>, req: web::Json<TerminalRequest>) -> HttpResponse {
    let mut terminal = match state.terminal.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Terminal", e),
    };
    let ctx = TerminalContext {
        session: &state.session,
        projects: &state.projects,
        tree: &state.tree,
        workspace: &state.workspace,
    };
    let output = terminal.execute(&req.input, &ctx);
    HttpResponse::Ok().json(json!({ "success": true, "output": output, "history": terminal.history() }))
}

#[get("/api/preferences")]
pub async fn get_preferences(state: web::Data<AppState>) -> HttpResponse {
    let prefs = match state.preferences.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Preferences", e),
    };
    HttpResponse::Ok().json(json!({ "success": true, "preferences": prefs.all() }))
}

#[post("/api/preferences")]
pub async fn set_preference(state: web::Data<AppState>, req: web::Json<PreferenceRequest>) -> HttpResponse {
    if let Err(e) = validate_preference(&req.key, &req.value) {
        return HttpResponse::BadRequest().json(json!({ "success": false, "error": e }));
    }
    let mut prefs = match state.preferences.lock() {
        Ok(guard) => guard,
        Err(e) => return lock_failed("Preferences", e),
    };
    match prefs.set(&req.key, &req.value) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "preferences": prefs.all() })),
        Err(e) => {
            warn!("Failed to save preference '{}': {}", req.key, e);
            HttpResponse::InternalServerError().json(json!({ "success": false, "error": e }))
        }
    }
}

pub async fn static_handler(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };
    debug!("Serving static asset: {}", path);

    match Asset::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(content.data.into_owned())
        }
        None => HttpResponse::NotFound().body("404 Not Found"),
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(connect)
        .service(get_tree)
        .service(get_explorer)
        .service(toggle_folder)
        .service(select_item)
        .service(add_to_context)
        .service(list_projects)
        .service(get_session)
        .service(project_action)
        .service(stop_build)
        .service(drain_notifications)
        .service(get_clipboard)
        .service(get_monitor)
        .service(get_terminal)
        .service(run_terminal)
        .service(get_preferences)
        .service(set_preference);
}
