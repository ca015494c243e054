use crate::config::ViewConfig;
use crate::db;
use crate::ipc::error::{err, ok, respond, HandlerErr};
use crate::ipc::helpers::{get_object, get_required_str};
use crate::ipc::types::{AppState, Request, Screens};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(&req.params, "path") {
        Ok(p) => PathBuf::from(p),
        Err(e) => return e.response(&req.id),
    };

    let conn = match db::open_db(&path) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    // Stored settings win over the process defaults, but must not block opening.
    match ViewConfig::load(&conn, &ViewConfig::from_env()) {
        Ok(cfg) => state.config = cfg,
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable workspace config"),
    }

    tracing::info!(path = %path.display(), "workspace selected");
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    // Screens mounted before now were reading from the in-memory backing.
    state.screens = Screens::default();
    ok(
        &req.id,
        json!({ "workspacePath": path.to_string_lossy(), "config": state.config }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "config": state.config }))
}

fn config_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let patch = get_object(&req.params, "patch")?;
    let next = state
        .config
        .apply_patch(patch)
        .map_err(HandlerErr::bad_params)?;
    if let Some(conn) = state.db.as_ref() {
        next.save(conn)
            .map_err(|e| HandlerErr::new("db_write_failed", e.to_string()))?;
    }
    if next.items_per_page != state.config.items_per_page {
        state.screens.set_items_per_page(next.items_per_page);
    }
    state.config = next;
    tracing::info!(config = ?state.config, "config updated");
    Ok(json!({ "config": state.config }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(respond(&req.id, config_update(state, req))),
        _ => None,
    }
}
