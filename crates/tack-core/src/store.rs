use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::category::{Category, CategoryFilter};
use crate::error::StoreError;
use crate::task::{Task, TaskId};
use crate::view::View;

/// The in-memory task list and the file it is snapshotted to.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    #[tracing::instrument(skip(path))]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let tasks = load_tasks(path)?;
        info!(file = %path.display(), count = tasks.len(), "opened task store");
        Ok(Self {
            path: path.to_path_buf(),
            tasks,
        })
    }

    /// A store that starts from `tasks` without touching the disk.
    pub fn with_tasks(path: &Path, tasks: Vec<Task>) -> Self {
        Self {
            path: path.to_path_buf(),
            tasks,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    #[tracing::instrument(skip(self))]
    pub fn save(&self) -> Result<(), StoreError> {
        save_tasks(&self.path, &self.tasks)
    }

    #[tracing::instrument(skip(self, text), fields(category = %category))]
    pub fn add(&mut self, text: &str, category: Category) -> Result<TaskId, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        let task = Task::new(text.to_string(), category);
        let id = task.id;
        self.tasks.push(task);
        debug!(%id, count = self.tasks.len(), "task added");
        Ok(id)
    }

    /// Flips completion and returns the new state.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        task.completed = !task.completed;
        debug!(completed = task.completed, "task toggled");
        Ok(task.completed)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let idx = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        let removed = self.tasks.remove(idx);
        debug!(count = self.tasks.len(), "task deleted");
        Ok(removed)
    }

    pub fn filter(&self, filter: CategoryFilter) -> View<'_> {
        View::new(filter, &self.tasks)
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_complete_at(
        &mut self,
        filter: CategoryFilter,
        position: usize,
    ) -> Result<bool, StoreError> {
        let id = self.filter(filter).id_at(position)?;
        self.toggle_complete(id)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_at(&mut self, filter: CategoryFilter, position: usize) -> Result<Task, StoreError> {
        let id = self.filter(filter).id_at(position)?;
        self.delete(id)
    }
}

/// Reads the task file. A missing file is an empty list.
#[tracing::instrument(skip(path))]
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, StoreError> {
    debug!(file = %path.display(), "loading tasks");
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(file = %path.display(), "no task file yet");
            return Ok(Vec::new());
        }
        Err(err) => return Err(StoreError::io(path, err)),
    };

    let parse_error = |task: Option<usize>, source: serde_json::Error| StoreError::Parse {
        path: path.to_path_buf(),
        task,
        source,
    };
    let records: Vec<serde_json::Value> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| parse_error(None, source))?;
    let tasks = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            serde_json::from_value::<Task>(record).map_err(|source| parse_error(Some(idx), source))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

/// Replaces the task file with `tasks`, atomically.
#[tracing::instrument(skip(path, tasks))]
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    debug!(file = %path.display(), count = tasks.len(), "saving tasks atomically");

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir).map_err(|err| StoreError::io(dir, err))?;

    let mut writer = BufWriter::new(temp);
    serde_json::to_writer_pretty(&mut writer, tasks)
        .map_err(|err| StoreError::io(path, err.into()))?;
    writer
        .write_all(b"\n")
        .map_err(|err| StoreError::io(path, err))?;
    let temp = writer
        .into_inner()
        .map_err(|err| StoreError::io(path, err.into_error()))?;

    // NamedTempFile is created 0600; keep whatever mode the replaced file had.
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|err| StoreError::io(path, err))?;
    }

    temp.persist(path)
        .map_err(|err| StoreError::io(path, err.error))?;

    Ok(())
}
