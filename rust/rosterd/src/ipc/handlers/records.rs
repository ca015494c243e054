//! `<kind>.*` methods shared by every management screen.

use crate::config::ViewConfig;
use crate::db;
use crate::entities::{BudgetCategory, CheckRecord, School, StaffMember, Student, Teacher};
use crate::export;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_bool, get_object, get_required_id, get_required_str, scalar_to_string};
use crate::ipc::types::{AppState, Request, Screen, Screens};
use crate::optimistic::{commit, Mutation};
use crate::record::{merge_patch, record_from_params, Entity, RecordId};
use crate::repo::{MemoryRepository, Repository, SqliteRepository};
use crate::seed;
use crate::summary::Summary;
use crate::view::{SortState, TableView};
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

struct Ctx<'a, E: Entity> {
    db: Option<&'a Connection>,
    config: &'a ViewConfig,
    screen: &'a mut Screen<E>,
    seed: fn() -> Vec<E>,
}

impl<E: Entity> Ctx<'_, E> {
    fn view(&self) -> Result<&TableView<E>, HandlerErr> {
        self.screen.view.as_ref().ok_or_else(not_open::<E>)
    }

    fn view_mut(&mut self) -> Result<&mut TableView<E>, HandlerErr> {
        self.screen.view.as_mut().ok_or_else(not_open::<E>)
    }
}

fn not_open<E: Entity>() -> HandlerErr {
    HandlerErr::new("not_open", format!("{} screen is not open", E::KIND))
}

fn not_found<E: Entity>(id: &RecordId) -> HandlerErr {
    HandlerErr::new("not_found", format!("{} record {} not found", E::KIND, id))
        .with_details(json!({ "id": id }))
}

fn page_json<E: Entity>(view: &TableView<E>) -> serde_json::Value {
    let mut out = view.page_view().to_json();
    out["filter"] = json!(view.filter());
    out["sort"] = json!(view.sort());
    out["form"] = view.mode().to_json();
    out
}

fn seeded_key<E: Entity>() -> String {
    format!("seeded.{}", E::KIND)
}

/// Inserts the demo rows into an empty workspace store in one transaction,
/// marking the kind as seeded before commit.
fn seed_workspace<E: Entity>(conn: &Connection, rows: Vec<E>) -> Result<Vec<E>, HandlerErr> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_write_failed", e.to_string()))?;
    let mut repo = SqliteRepository::<E>::new(conn);
    for r in &rows {
        repo.create(r)?;
    }
    db::settings_set_json(conn, &seeded_key::<E>(), &json!(true))
        .map_err(|e| HandlerErr::new("db_write_failed", e.to_string()))?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_write_failed", e.to_string()))?;
    tracing::info!(kind = E::KIND, records = rows.len(), "seeded demo records");
    Ok(repo.list()?)
}

fn open_workspace<E: Entity>(cx: &Ctx<'_, E>, conn: &Connection, force_seed: bool) -> Result<Vec<E>, HandlerErr> {
    let key = seeded_key::<E>();
    let already = db::settings_get_json(conn, &key)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?
        .is_some();
    let existing = SqliteRepository::<E>::new(conn).list()?;
    if !existing.is_empty() {
        if !already {
            // Rows written by the user count as a seeded store.
            db::settings_set_json(conn, &key, &json!(true))
                .map_err(|e| HandlerErr::new("db_write_failed", e.to_string()))?;
        }
        return Ok(existing);
    }
    if force_seed || (cx.config.seed_demo_data && !already) {
        return seed_workspace(conn, (cx.seed)());
    }
    Ok(existing)
}

fn open_memory<E: Entity>(cx: &mut Ctx<'_, E>, force_seed: bool) -> Result<Vec<E>, HandlerErr> {
    let existing = cx.screen.memory.list()?;
    if !existing.is_empty() {
        cx.screen.seeded = true;
        return Ok(existing);
    }
    if force_seed || (cx.config.seed_demo_data && !cx.screen.seeded) {
        let mut fresh = MemoryRepository::new();
        for r in (cx.seed)() {
            fresh.create(&r)?;
        }
        cx.screen.memory = fresh;
        cx.screen.seeded = true;
        tracing::info!(kind = E::KIND, "seeded demo records");
        return Ok(cx.screen.memory.list()?);
    }
    Ok(existing)
}

fn handle_open<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let force_seed = get_bool(params, "seed").unwrap_or(false);
    let records = match cx.db {
        Some(conn) => open_workspace(cx, conn, force_seed)?,
        None => open_memory(cx, force_seed)?,
    };

    tracing::info!(kind = E::KIND, records = records.len(), "screen opened");
    let view = TableView::new(records, cx.config.items_per_page);
    let out = page_json(&view);
    cx.screen.view = Some(view);
    Ok(out)
}

fn handle_close<E: Entity>(cx: &mut Ctx<'_, E>) -> Result<serde_json::Value, HandlerErr> {
    let was_open = cx.screen.view.take().is_some();
    Ok(json!({ "closed": was_open }))
}

enum SortChange {
    Keep,
    Clear,
    Set(SortState),
}

fn handle_query<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    // Validate everything before touching the view so a bad request changes nothing.
    let search = match params.get("search") {
        None => None,
        Some(v) => Some(
            v.as_str()
                .ok_or_else(|| HandlerErr::bad_params("search must be a string"))?
                .to_string(),
        ),
    };

    let mut filters: Vec<(String, String)> = Vec::new();
    if let Some(v) = params.get("filters") {
        let obj = v
            .as_object()
            .ok_or_else(|| HandlerErr::bad_params("filters must be an object"))?;
        for (field, value) in obj {
            if !E::SCHEMA.is_filterable(field) {
                return Err(HandlerErr::bad_params(format!("{} is not filterable", field))
                    .with_details(json!({ "filterable": E::SCHEMA.filterable })));
            }
            let value = scalar_to_string(value)
                .ok_or_else(|| HandlerErr::bad_params(format!("filters.{} must be a scalar", field)))?;
            filters.push((field.clone(), value));
        }
    }

    let sort = match params.get("sort") {
        None => SortChange::Keep,
        Some(v) if v.is_null() => SortChange::Clear,
        Some(v) => {
            let s: SortState = serde_json::from_value(v.clone())
                .map_err(|e| HandlerErr::bad_params(format!("invalid sort: {}", e)))?;
            if !E::SCHEMA.is_sortable(&s.key) {
                return Err(HandlerErr::bad_params(format!("{} is not sortable", s.key))
                    .with_details(json!({ "sortable": E::SCHEMA.sortable })));
            }
            SortChange::Set(s)
        }
    };

    let page = match params.get("page") {
        None => None,
        Some(v) => Some(
            v.as_u64()
                .ok_or_else(|| HandlerErr::bad_params("page must be a positive integer"))?,
        ),
    };

    let view = cx.view_mut()?;
    if let Some(s) = search {
        view.set_search(&s);
    }
    for (field, value) in filters {
        view.set_filter(&field, &value);
    }
    match sort {
        SortChange::Keep => {}
        SortChange::Clear => view.set_sort(None),
        SortChange::Set(s) => view.set_sort(Some(s)),
    }
    if let Some(p) = page {
        view.go_to_page(usize::try_from(p).unwrap_or(usize::MAX));
    }
    Ok(page_json(view))
}

fn handle_page<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let to = params
        .get("to")
        .ok_or_else(|| HandlerErr::bad_params("missing to"))?
        .clone();
    let view = cx.view_mut()?;
    match (&to, to.as_str()) {
        (_, Some("next")) => view.next_page(),
        (_, Some("prev")) => view.prev_page(),
        (_, Some("first")) => view.go_to_page(1),
        (_, Some("last")) => view.last_page(),
        (serde_json::Value::Number(n), _) => {
            let n = n
                .as_u64()
                .ok_or_else(|| HandlerErr::bad_params("to must be a positive integer"))?;
            view.go_to_page(usize::try_from(n).unwrap_or(usize::MAX));
        }
        _ => {
            return Err(HandlerErr::bad_params(
                "to must be a page number or next/prev/first/last",
            ))
        }
    }
    Ok(page_json(view))
}

fn handle_get<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_id(params)?;
    let view = cx.view()?;
    let record = view.get(&id).ok_or_else(|| not_found::<E>(&id))?;
    Ok(json!({ "record": record }))
}

fn handle_form_show<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mode = get_required_str(params, "mode")?;
    let view = cx.view_mut()?;
    match mode.as_str() {
        "create" => view.show_create(),
        "edit" => {
            let id = get_required_id(params)?;
            if !view.show_edit(&id) {
                return Err(not_found::<E>(&id));
            }
        }
        other => return Err(HandlerErr::bad_params(format!("unknown form mode: {}", other))),
    }
    let record = match view.mode() {
        crate::view::ViewMode::Edit(id) => view.get(id).cloned(),
        _ => None,
    };
    Ok(json!({ "form": view.mode().to_json(), "record": record }))
}

fn handle_form_hide<E: Entity>(cx: &mut Ctx<'_, E>) -> Result<serde_json::Value, HandlerErr> {
    let view = cx.view_mut()?;
    view.hide_form();
    Ok(json!({ "form": view.mode().to_json() }))
}

fn check_unique<E: Entity>(cx: &Ctx<'_, E>, candidate: &E, except: Option<&RecordId>) -> Result<(), HandlerErr> {
    if !cx.config.enforce_unique_groups {
        return Ok(());
    }
    let view = cx.view()?;
    match view.conflicting_group(candidate, except) {
        Some(fields) => Err(HandlerErr::new(
            "conflict",
            format!("another {} record already uses this {}", E::KIND, fields.join("/")),
        )
        .with_details(json!({ "fields": fields }))),
        None => Ok(()),
    }
}

/// Tentative local apply, then persist through the active repository.
fn persist<E: Entity>(cx: &mut Ctx<'_, E>, mutation: Mutation<E>) -> Result<E, HandlerErr> {
    let Screen { view, memory, .. } = &mut *cx.screen;
    let view = view.as_mut().ok_or_else(not_open::<E>)?;
    let record = match cx.db {
        Some(conn) => commit(view, &mut SqliteRepository::new(conn), mutation)?,
        None => commit(view, memory, mutation)?,
    };
    Ok(record)
}

fn mutation_result<E: Entity>(cx: &Ctx<'_, E>, record: &E) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "record": record, "page": page_json(cx.view()?) }))
}

fn handle_create<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fields = get_object(params, "record")?;
    let record: E = record_from_params(fields)
        .map_err(|e| HandlerErr::bad_params(format!("invalid record: {}", e)))?;
    check_unique(cx, &record, None)?;

    let created = persist(cx, Mutation::Create(record))?;
    cx.view_mut()?.hide_form();
    tracing::info!(kind = E::KIND, id = %created.id(), "record created");
    mutation_result(cx, &created)
}

fn handle_update<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_id(params)?;
    let patch = get_object(params, "patch")?;
    let existing = cx.view()?.get(&id).ok_or_else(|| not_found::<E>(&id))?;
    let merged = merge_patch(existing, patch)
        .map_err(|e| HandlerErr::bad_params(format!("invalid patch: {}", e)))?;
    check_unique(cx, &merged, Some(&id))?;

    let updated = persist(cx, Mutation::Update { id, record: merged })?;
    cx.view_mut()?.hide_form();
    tracing::info!(kind = E::KIND, id = %updated.id(), "record updated");
    mutation_result(cx, &updated)
}

fn handle_delete<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_id(params)?;
    if cx.view()?.get(&id).is_none() {
        return Err(not_found::<E>(&id));
    }
    if !get_bool(params, "confirm").unwrap_or(false) {
        return Err(HandlerErr::new(
            "confirmation_required",
            format!("deleting {} record {} needs confirm: true", E::KIND, id),
        )
        .with_details(json!({ "id": id })));
    }

    let removed = persist(cx, Mutation::Delete { id })?;
    tracing::info!(kind = E::KIND, id = %removed.id(), "record deleted");
    mutation_result(cx, &removed)
}

fn handle_toggle_status<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_id(params)?;
    let toggled = persist(cx, Mutation::ToggleStatus { id })?;
    tracing::info!(kind = E::KIND, id = %toggled.id(), "status toggled");
    mutation_result(cx, &toggled)
}

fn handle_export<E: Entity>(cx: &mut Ctx<'_, E>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out_path = get_required_str(params, "outPath")?;
    let view = cx.view()?;
    let rows = view.visible();
    let rows_exported = export::write_csv(&rows, &PathBuf::from(&out_path)).map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
    })?;
    tracing::info!(kind = E::KIND, rows = rows_exported, path = %out_path, "exported csv");
    Ok(json!({ "rowsExported": rows_exported, "path": out_path }))
}

fn handle_summary<E: Summary>(cx: &mut Ctx<'_, E>) -> Result<serde_json::Value, HandlerErr> {
    let view = cx.view()?;
    Ok(E::summarize(&view.visible()))
}

fn dispatch<E: Summary>(
    state: &mut AppState,
    req: &Request,
    op: &str,
    pick: fn(&mut Screens) -> &mut Screen<E>,
    seed: fn() -> Vec<E>,
) -> Option<serde_json::Value> {
    let AppState {
        db,
        config,
        screens,
        ..
    } = state;
    let mut cx = Ctx {
        db: db.as_ref(),
        config,
        screen: pick(screens),
        seed,
    };
    let p = &req.params;
    let res = match op {
        "open" => handle_open(&mut cx, p),
        "close" => handle_close(&mut cx),
        "query" => handle_query(&mut cx, p),
        "page" => handle_page(&mut cx, p),
        "get" => handle_get(&mut cx, p),
        "form.show" => handle_form_show(&mut cx, p),
        "form.hide" => handle_form_hide(&mut cx),
        "create" => handle_create(&mut cx, p),
        "update" => handle_update(&mut cx, p),
        "delete" => handle_delete(&mut cx, p),
        "toggleStatus" => handle_toggle_status(&mut cx, p),
        "export" => handle_export(&mut cx, p),
        "summary" => handle_summary(&mut cx),
        _ => return None,
    };
    if let Err(e) = &res {
        tracing::debug!(method = %req.method, code = e.code, message = %e.message, "request failed");
    }
    Some(respond(&req.id, res))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (kind, op) = req.method.split_once('.')?;
    match kind {
        Student::KIND => dispatch(state, req, op, |s| &mut s.students, seed::students),
        Teacher::KIND => dispatch(state, req, op, |s| &mut s.teachers, seed::teachers),
        School::KIND => dispatch(state, req, op, |s| &mut s.schools, seed::schools),
        StaffMember::KIND => dispatch(state, req, op, |s| &mut s.staff, seed::staff),
        CheckRecord::KIND => dispatch(state, req, op, |s| &mut s.checks, seed::checks),
        BudgetCategory::KIND => dispatch(state, req, op, |s| &mut s.budgets, seed::budgets),
        _ => None,
    }
}
