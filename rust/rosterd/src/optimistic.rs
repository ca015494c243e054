//! Tentative local mutations that are confirmed or rolled back once the
//! repository has answered.

use crate::record::{Entity, RecordId};
use crate::repo::{RepoError, Repository};
use crate::view::{DeleteOutcome, TableView, ToggleOutcome};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum Mutation<E> {
    Create(E),
    Update { id: RecordId, record: E },
    /// Only built once the user has confirmed the delete.
    Delete { id: RecordId },
    ToggleStatus { id: RecordId },
}

impl<E> Mutation<E> {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
            Mutation::ToggleStatus { .. } => "toggleStatus",
        }
    }
}

#[derive(Debug)]
enum Undo<E> {
    Remove(RecordId),
    Restore(E),
    Reinsert { index: usize, record: E },
}

/// Undo information for one tentatively applied mutation.
#[derive(Debug)]
#[must_use = "a ticket must be confirmed or rolled back"]
pub struct Ticket<E> {
    undo: Undo<E>,
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("record has no status to toggle")]
    NoStatusField,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CommitError {
    pub fn code(&self) -> &'static str {
        match self {
            CommitError::NotFound(_) => "not_found",
            CommitError::NoStatusField => "bad_params",
            CommitError::Repo(e) => e.code(),
        }
    }
}

impl<E: Entity> TableView<E> {
    /// Applies `mutation` locally. Returns the affected record as it now stands
    /// (or as it was, for a delete) and the ticket needed to undo it.
    pub fn apply_tentative(&mut self, mutation: Mutation<E>) -> Result<(E, Ticket<E>), CommitError> {
        match mutation {
            Mutation::Create(record) => {
                let id = self.create(record);
                let created = self.get(&id).cloned().ok_or(CommitError::NotFound(id.clone()))?;
                Ok((created, Ticket { undo: Undo::Remove(id) }))
            }
            Mutation::Update { id, record } => {
                let old = self
                    .update(&id, record)
                    .ok_or_else(|| CommitError::NotFound(id.clone()))?;
                let now = self.get(&id).cloned().ok_or(CommitError::NotFound(id))?;
                Ok((now, Ticket { undo: Undo::Restore(old) }))
            }
            Mutation::Delete { id } => match self.delete(&id, |_| true) {
                DeleteOutcome::Deleted { record, index } => Ok((
                    record.clone(),
                    Ticket {
                        undo: Undo::Reinsert { index, record },
                    },
                )),
                DeleteOutcome::Cancelled | DeleteOutcome::NotFound => Err(CommitError::NotFound(id)),
            },
            Mutation::ToggleStatus { id } => {
                let before = self
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| CommitError::NotFound(id.clone()))?;
                match self.toggle_status(&id) {
                    ToggleOutcome::Toggled(_) => {
                        let now = self.get(&id).cloned().ok_or(CommitError::NotFound(id))?;
                        Ok((now, Ticket { undo: Undo::Restore(before) }))
                    }
                    ToggleOutcome::NotFound => Err(CommitError::NotFound(id)),
                    ToggleOutcome::NoStatusField => Err(CommitError::NoStatusField),
                }
            }
        }
    }

    /// The mutation stands; its undo information is discarded.
    pub fn confirm(&mut self, _ticket: Ticket<E>) {}

    /// Puts the store back the way it was before the ticket's mutation.
    pub fn rollback(&mut self, ticket: Ticket<E>) {
        match ticket.undo {
            Undo::Remove(id) => {
                if let Some(idx) = self.position(&id) {
                    self.records.remove(idx);
                }
            }
            Undo::Restore(record) => {
                if let Some(idx) = self.position(record.id()) {
                    self.records[idx] = record;
                }
            }
            Undo::Reinsert { index, record } => {
                let at = index.min(self.records.len());
                self.records.insert(at, record);
            }
        }
        self.clamp_page();
    }
}

/// Applies `mutation` to the view, persists it, and rolls the view back if
/// the repository refuses it.
pub fn commit<E, R>(view: &mut TableView<E>, repo: &mut R, mutation: Mutation<E>) -> Result<E, CommitError>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    let op = mutation.name();
    let is_create = matches!(mutation, Mutation::Create(_));
    let is_delete = matches!(mutation, Mutation::Delete { .. });
    let (record, ticket) = view.apply_tentative(mutation)?;
    let persisted = if is_create {
        repo.create(&record)
    } else if is_delete {
        repo.delete(record.id())
    } else {
        repo.update(&record)
    };
    match persisted {
        Ok(()) => {
            view.confirm(ticket);
            tracing::debug!(kind = E::KIND, op, id = %record.id(), "mutation committed");
            Ok(record)
        }
        Err(e) => {
            view.rollback(ticket);
            tracing::warn!(kind = E::KIND, op, id = %record.id(), error = %e, "mutation rolled back");
            Err(CommitError::Repo(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::School;
    use crate::record::ActivityStatus;
    use crate::repo::MemoryRepository;
    use crate::seed;

    /// Accepts nothing.
    struct Offline;

    impl Repository<School> for Offline {
        fn list(&self) -> Result<Vec<School>, RepoError> {
            Ok(Vec::new())
        }
        fn create(&mut self, record: &School) -> Result<(), RepoError> {
            Err(RepoError::Duplicate {
                kind: "schools",
                id: record.id.to_string(),
            })
        }
        fn update(&mut self, record: &School) -> Result<(), RepoError> {
            Err(RepoError::NotFound {
                kind: "schools",
                id: record.id.to_string(),
            })
        }
        fn delete(&mut self, id: &RecordId) -> Result<(), RepoError> {
            Err(RepoError::NotFound {
                kind: "schools",
                id: id.to_string(),
            })
        }
    }

    fn new_school() -> School {
        School {
            id: RecordId::Num(0),
            name: "Riverside School".into(),
            code: "RIV-04".into(),
            email: "office@riverside.edu".into(),
            address: String::new(),
            status: ActivityStatus::Active,
        }
    }

    #[test]
    fn successful_commits_reach_both_sides() {
        let mut view = TableView::new(seed::schools(), 5);
        let mut repo = MemoryRepository::with_rows(seed::schools());

        let created = commit(&mut view, &mut repo, Mutation::Create(new_school())).expect("create");
        assert_eq!(created.id, RecordId::Num(4));

        commit(&mut view, &mut repo, Mutation::ToggleStatus { id: RecordId::Num(4) }).expect("toggle");
        commit(&mut view, &mut repo, Mutation::Delete { id: RecordId::Num(1) }).expect("delete");

        let stored = repo.list().expect("list");
        assert_eq!(stored, view.records().to_vec());
        assert_eq!(stored.last().map(|s| s.status), Some(ActivityStatus::Inactive));
    }

    #[test]
    fn failed_commits_roll_back() {
        let original = seed::schools();
        let mut view = TableView::new(original.clone(), 5);

        assert!(commit(&mut view, &mut Offline, Mutation::Create(new_school())).is_err());
        assert_eq!(view.records(), &original[..]);

        let mut renamed = original[0].clone();
        renamed.name = "Renamed".into();
        let err = commit(
            &mut view,
            &mut Offline,
            Mutation::Update {
                id: RecordId::Num(1),
                record: renamed,
            },
        )
        .expect_err("update refused");
        assert_eq!(err.code(), "not_found");
        assert_eq!(view.records(), &original[..]);

        assert!(commit(&mut view, &mut Offline, Mutation::Delete { id: RecordId::Num(2) }).is_err());
        assert_eq!(view.records(), &original[..]);

        assert!(commit(&mut view, &mut Offline, Mutation::ToggleStatus { id: RecordId::Num(3) }).is_err());
        assert_eq!(view.records(), &original[..]);
    }

    #[test]
    fn missing_ids_never_reach_the_repository() {
        let mut view = TableView::new(seed::schools(), 5);
        let err = commit(&mut view, &mut Offline, Mutation::Delete { id: RecordId::Num(99) })
            .expect_err("missing");
        assert!(matches!(err, CommitError::NotFound(_)));
    }
}
