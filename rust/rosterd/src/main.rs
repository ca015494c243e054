mod config;
mod db;
mod entities;
mod export;
mod ipc;
mod logging;
mod optimistic;
mod record;
mod repo;
mod seed;
mod summary;
mod view;

use std::io::{self, BufRead, Write};

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("{e:#}");
    }

    let mut state = ipc::AppState::new(config::ViewConfig::from_env());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        items_per_page = state.config.items_per_page,
        "rosterd started"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let method = req.method.clone();
        let resp = ipc::handle_request(&mut state, req);
        tracing::trace!(%method, ok = resp.get("ok").and_then(|v| v.as_bool()), "handled");
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
}
