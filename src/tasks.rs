//! Ordered task collection and its filtered/sorted view.

use crate::models::{Filter, SortOrder, Task, TaskId};
use serde::{Deserialize, Serialize};

/// Owns the tasks in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Appends a new pending task. Returns `None` if `text` is blank after trimming.
    pub fn add(&mut self, text: &str) -> Option<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let task = Task::new(text);
        let id = task.id;
        self.tasks.push(task);
        Some(id)
    }

    /// Flips completion and returns the new value, or `None` for an unknown id.
    pub fn toggle(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    /// Removes a task, returning it if it existed.
    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Read-only projection of the tasks.
    ///
    /// Filtering keeps relative order. Priority sorting is stable, so tasks
    /// of equal priority stay in their filtered order.
    pub fn view(&self, filter: Filter, sort: SortOrder) -> Vec<&Task> {
        let mut view: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| filter.admits(t.completed))
            .collect();

        if sort == SortOrder::Priority {
            view.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight()));
        }

        view
    }
}
