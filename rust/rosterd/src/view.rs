use crate::record::{ActivityStatus, Entity, FieldValue, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical filter value meaning "no constraint".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub categorical: BTreeMap<String, String>,
}

impl FilterState {
    pub fn is_unconstrained(value: &str) -> bool {
        let t = value.trim();
        t.is_empty() || t.eq_ignore_ascii_case(ALL)
    }

    /// Active categorical constraints only.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categorical
            .iter()
            .filter(|(_, v)| !Self::is_unconstrained(v))
            .map(|(k, v)| (k.as_str(), v.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub current_page: usize,
    pub items_per_page: usize,
}

impl PageState {
    pub fn new(items_per_page: usize) -> PageState {
        PageState {
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }
}

/// Which of list / create form / edit form the screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Create,
    Edit(RecordId),
}

impl ViewMode {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ViewMode::List => serde_json::json!({ "mode": "list" }),
            ViewMode::Create => serde_json::json!({ "mode": "create" }),
            ViewMode::Edit(id) => serde_json::json!({ "mode": "edit", "id": id }),
        }
    }
}

pub fn matches_search<E: Entity>(record: &E, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    E::SCHEMA.searchable.iter().any(|f| match record.field(f) {
        FieldValue::Text(s) => s.to_lowercase().contains(&needle),
        FieldValue::Number(n) => crate::record::render_number(n).contains(&needle),
        FieldValue::Missing => false,
    })
}

pub fn matches_filters<E: Entity>(record: &E, filter: &FilterState) -> bool {
    if !matches_search(record, &filter.search_term) {
        return false;
    }
    filter
        .active()
        .all(|(field, want)| record.field(field).render().as_deref() == Some(want))
}

/// Ordered subsequence of `records` passing every active predicate.
pub fn filter_records<'a, E: Entity>(records: &'a [E], filter: &FilterState) -> Vec<&'a E> {
    records
        .iter()
        .filter(|r| matches_filters(*r, filter))
        .collect()
}

/// Stable single-key sort; equal keys keep filter order in both directions.
pub fn sort_records<E: Entity>(rows: &mut [&E], sort: Option<&SortState>) {
    let Some(sort) = sort else {
        return;
    };
    rows.sort_by(|a, b| {
        let ord = a.field(&sort.key).compare(&b.field(&sort.key));
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

pub fn total_pages(filtered_count: usize, items_per_page: usize) -> usize {
    let per = items_per_page.max(1);
    filtered_count.div_ceil(per).max(1)
}

pub fn page_slice<'s, T>(rows: &'s [T], page: &PageState) -> &'s [T] {
    let per = page.items_per_page.max(1);
    let start = page.current_page.saturating_sub(1).saturating_mul(per);
    if start >= rows.len() {
        return &[];
    }
    let end = (start + per).min(rows.len());
    &rows[start..end]
}

#[derive(Debug)]
pub struct PageView<'a, E> {
    pub rows: Vec<&'a E>,
    pub current_page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub items_per_page: usize,
}

impl<E: Serialize> PageView<'_, E> {
    pub fn can_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "rows": self.rows,
            "currentPage": self.current_page,
            "totalPages": self.total_pages,
            "filteredCount": self.filtered_count,
            "totalCount": self.total_count,
            "itemsPerPage": self.items_per_page,
            "canPrev": self.can_prev(),
            "canNext": self.can_next(),
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum DeleteOutcome<E> {
    Deleted { record: E, index: usize },
    Cancelled,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Toggled(ActivityStatus),
    NotFound,
    NoStatusField,
}

/// One management screen: the record store plus its transient view state.
#[derive(Debug, Clone)]
pub struct TableView<E: Entity> {
    pub(crate) records: Vec<E>,
    filter: FilterState,
    sort: Option<SortState>,
    page: PageState,
    mode: ViewMode,
}

impl<E: Entity> TableView<E> {
    pub fn new(records: Vec<E>, items_per_page: usize) -> TableView<E> {
        TableView {
            records,
            filter: FilterState::default(),
            sort: None,
            page: PageState::new(items_per_page),
            mode: ViewMode::List,
        }
    }

    #[cfg(test)]
    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    #[cfg(test)]
    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn set_search(&mut self, term: &str) {
        if self.filter.search_term != term {
            self.filter.search_term = term.to_string();
            self.page.current_page = 1;
        }
    }

    pub fn set_filter(&mut self, field: &str, value: &str) {
        let prev = self.filter.categorical.get(field).map(|s| s.as_str());
        let unchanged = match prev {
            Some(p) => p == value,
            None => FilterState::is_unconstrained(value),
        };
        if unchanged {
            return;
        }
        if FilterState::is_unconstrained(value) {
            self.filter.categorical.remove(field);
        } else {
            self.filter
                .categorical
                .insert(field.to_string(), value.to_string());
        }
        self.page.current_page = 1;
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort = sort;
    }

    pub fn set_items_per_page(&mut self, n: usize) {
        self.page = PageState::new(n);
    }

    /// Filtered and sorted records; the input to both paging and export.
    pub fn visible(&self) -> Vec<&E> {
        let mut rows = filter_records(&self.records, &self.filter);
        sort_records(&mut rows, self.sort.as_ref());
        rows
    }

    pub fn total_pages(&self) -> usize {
        total_pages(
            filter_records(&self.records, &self.filter).len(),
            self.page.items_per_page,
        )
    }

    pub fn page_view(&self) -> PageView<'_, E> {
        let rows = self.visible();
        let total = total_pages(rows.len(), self.page.items_per_page);
        let page = PageState {
            current_page: self.page.current_page.clamp(1, total),
            items_per_page: self.page.items_per_page,
        };
        PageView {
            rows: page_slice(&rows, &page).to_vec(),
            current_page: page.current_page,
            total_pages: total,
            filtered_count: rows.len(),
            total_count: self.records.len(),
            items_per_page: page.items_per_page,
        }
    }

    pub fn go_to_page(&mut self, n: usize) {
        self.page.current_page = n.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.page.current_page.saturating_sub(1));
    }

    pub fn last_page(&mut self) {
        self.page.current_page = self.total_pages();
    }

    pub(crate) fn clamp_page(&mut self) {
        let n = self.page.current_page;
        self.go_to_page(n);
    }

    pub fn get(&self, id: &RecordId) -> Option<&E> {
        self.records.iter().find(|r| r.id().matches(id))
    }

    pub(crate) fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id().matches(id))
    }

    pub fn next_id(&self) -> RecordId {
        E::SCHEMA
            .id_strategy
            .next_id(self.records.iter().map(|r| r.id()))
    }

    /// Appends `record` under a fresh id and returns that id.
    pub fn create(&mut self, mut record: E) -> RecordId {
        let id = self.next_id();
        record.set_id(id.clone());
        self.records.push(record);
        id
    }

    /// Replaces the matching record in place; returns the previous value.
    pub fn update(&mut self, id: &RecordId, mut record: E) -> Option<E> {
        let idx = self.position(id)?;
        record.set_id(self.records[idx].id().clone());
        Some(std::mem::replace(&mut self.records[idx], record))
    }

    /// Removes the matching record if `confirm` approves it.
    pub fn delete<F>(&mut self, id: &RecordId, confirm: F) -> DeleteOutcome<E>
    where
        F: FnOnce(&E) -> bool,
    {
        let Some(idx) = self.position(id) else {
            return DeleteOutcome::NotFound;
        };
        if !confirm(&self.records[idx]) {
            return DeleteOutcome::Cancelled;
        }
        let record = self.records.remove(idx);
        self.clamp_page();
        DeleteOutcome::Deleted { record, index: idx }
    }

    pub fn toggle_status(&mut self, id: &RecordId) -> ToggleOutcome {
        let Some(idx) = self.position(id) else {
            return ToggleOutcome::NotFound;
        };
        match self.records[idx].status_mut() {
            Some(status) => {
                *status = status.toggled();
                ToggleOutcome::Toggled(*status)
            }
            None => ToggleOutcome::NoStatusField,
        }
    }

    /// First unique field group that `candidate` would share with another record.
    /// Groups with an empty or missing member are not checked.
    pub fn conflicting_group(&self, candidate: &E, except: Option<&RecordId>) -> Option<&'static [&'static str]> {
        E::SCHEMA.unique_groups.iter().copied().find(|group| {
            let key: Option<Vec<String>> = group
                .iter()
                .map(|f| candidate.field(f).render().filter(|s| !s.trim().is_empty()))
                .collect();
            let Some(key) = key else {
                return false;
            };
            self.records.iter().any(|r| {
                if except.map(|e| r.id().matches(e)).unwrap_or(false) {
                    return false;
                }
                group
                    .iter()
                    .zip(key.iter())
                    .all(|(f, want)| r.field(f).render().as_deref() == Some(want.as_str()))
            })
        })
    }

    pub fn show_create(&mut self) {
        self.mode = ViewMode::Create;
    }

    /// Returns false when the record does not exist; the mode is left unchanged.
    pub fn show_edit(&mut self, id: &RecordId) -> bool {
        match self.get(id) {
            Some(r) => {
                self.mode = ViewMode::Edit(r.id().clone());
                true
            }
            None => false,
        }
    }

    pub fn hide_form(&mut self) {
        self.mode = ViewMode::List;
    }
}
