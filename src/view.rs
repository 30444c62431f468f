//! Read-side helpers over a task snapshot: filter, search and progress counters.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Which tasks to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl Filter {
    pub fn accepts(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Incomplete => !task.completed,
        }
    }
}

/// Tasks per filter bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub all: usize,
    pub completed: usize,
    pub incomplete: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            all: tasks.len(),
            completed,
            incomplete: tasks.len() - completed,
        }
    }

    /// Percentage of completed tasks, rounded to the nearest integer.
    pub fn completion_rate(&self) -> u8 {
        if self.all == 0 {
            return 0;
        }
        ((self.completed as f64 / self.all as f64) * 100.0).round() as u8
    }
}

/// Apply `filter`, then a case-insensitive title search. Order is preserved.
///
/// Any non-empty `search` is matched as typed, whitespace included.
pub fn filter_tasks(tasks: &[Task], filter: Filter, search: Option<&str>) -> Vec<Task> {
    let needle = search.filter(|s| !s.is_empty()).map(str::to_lowercase);

    tasks
        .iter()
        .filter(|t| filter.accepts(t))
        .filter(|t| match &needle {
            Some(needle) => t.title.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .cloned()
        .collect()
}
