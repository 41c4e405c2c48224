use crate::category::CategoryFilter;
use crate::error::StoreError;
use crate::task::{Task, TaskId};

/// An order-preserving, filtered snapshot of the store, as shown to the user.
///
/// Positions are zero-based indices into this view, not into the store.
#[derive(Debug, Clone)]
pub struct View<'a> {
    filter: CategoryFilter,
    tasks: Vec<&'a Task>,
}

impl<'a> View<'a> {
    pub(crate) fn new(filter: CategoryFilter, all: &'a [Task]) -> Self {
        let tasks = all
            .iter()
            .filter(|task| filter.matches(task.category))
            .collect();
        Self { filter, tasks }
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&'a Task> {
        self.tasks.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.tasks.iter().copied()
    }

    pub fn id_at(&self, position: usize) -> Result<TaskId, StoreError> {
        self.get(position)
            .map(|task| task.id)
            .ok_or(StoreError::OutOfRange {
                position,
                visible: self.len(),
            })
    }
}
