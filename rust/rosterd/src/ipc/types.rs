use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::ViewConfig;
use crate::entities::{BudgetCategory, CheckRecord, School, StaffMember, Student, Teacher};
use crate::record::Entity;
use crate::repo::MemoryRepository;
use crate::view::TableView;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A mounted (or not yet mounted) management screen.
pub struct Screen<E: Entity> {
    pub view: Option<TableView<E>>,
    /// Backing data when no workspace is selected.
    pub memory: MemoryRepository<E>,
    pub seeded: bool,
}

impl<E: Entity> Default for Screen<E> {
    fn default() -> Self {
        Screen {
            view: None,
            memory: MemoryRepository::new(),
            seeded: false,
        }
    }
}

#[derive(Default)]
pub struct Screens {
    pub students: Screen<Student>,
    pub teachers: Screen<Teacher>,
    pub schools: Screen<School>,
    pub staff: Screen<StaffMember>,
    pub checks: Screen<CheckRecord>,
    pub budgets: Screen<BudgetCategory>,
}

impl Screens {
    /// Applies a page size change to every mounted screen.
    pub fn set_items_per_page(&mut self, n: usize) {
        fn apply<E: Entity>(s: &mut Screen<E>, n: usize) {
            if let Some(v) = s.view.as_mut() {
                v.set_items_per_page(n);
            }
        }
        apply(&mut self.students, n);
        apply(&mut self.teachers, n);
        apply(&mut self.schools, n);
        apply(&mut self.staff, n);
        apply(&mut self.checks, n);
        apply(&mut self.budgets, n);
    }
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: ViewConfig,
    pub screens: Screens,
}

impl AppState {
    pub fn new(config: ViewConfig) -> AppState {
        AppState {
            workspace: None,
            db: None,
            config,
            screens: Screens::default(),
        }
    }
}
