use crate::error::{CardError, StoreError};
use crate::store::{read_json, write_json};
use crate::task::Task;
use std::path::Path;

/// Tasks loaded from disk and the one currently shown.
#[derive(Debug, Default)]
pub struct TaskBoard {
    pub tasks: Vec<Task>,
    pub selected_task: usize,
}

impl TaskBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            selected_task: 0,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(read_json(path)?))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, &self.tasks)
    }

    pub fn selected(&self) -> Result<&Task, CardError> {
        self.tasks
            .get(self.selected_task)
            .ok_or(CardError::MissingTask)
    }

    pub fn move_selection(&mut self, direction: isize) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected_task = (self.selected_task as isize + direction)
            .clamp(0, self.tasks.len() as isize - 1) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;
    use tempfile::TempDir;

    fn board() -> TaskBoard {
        TaskBoard::new(vec![
            Task::new(1, TaskState::Pending, "one", "cat-1"),
            Task::new(2, TaskState::Done, "two", "cat-2"),
        ])
    }

    #[test]
    fn selection_is_clamped() {
        let mut board = board();
        board.move_selection(-1);
        assert_eq!(board.selected().unwrap().task_id, 1);
        board.move_selection(5);
        assert_eq!(board.selected().unwrap().task_id, 2);
    }

    #[test]
    fn empty_board_has_no_task_to_show() {
        let mut board = TaskBoard::default();
        board.move_selection(1);
        assert_eq!(board.selected(), Err(CardError::MissingTask));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        board().save_to_file(&path).unwrap();

        let loaded = TaskBoard::load_from_file(&path).unwrap();
        assert_eq!(loaded.tasks, board().tasks);
        assert_eq!(loaded.selected_task, 0);
    }
}
