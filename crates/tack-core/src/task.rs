use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;

/// Handle for a task within one running session. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(skip, default = "TaskId::generate")]
    pub id: TaskId,

    pub text: String,

    #[serde(default)]
    pub category: Category,

    #[serde(default)]
    pub completed: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Task {
    pub fn new(text: String, category: Category) -> Self {
        Self {
            id: TaskId::generate(),
            text,
            category,
            completed: false,
            extra: BTreeMap::new(),
        }
    }

    /// Compares everything that gets persisted, ignoring the session handle.
    pub fn same_content(&self, other: &Task) -> bool {
        self.text == other.text
            && self.category == other.category
            && self.completed == other.completed
            && self.extra == other.extra
    }
}
