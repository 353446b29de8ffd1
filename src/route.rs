use crate::task::TaskId;

/// Request to show another screen, handed to whatever owns routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub path: String,
}

impl NavigationIntent {
    pub fn task_detail(task_id: TaskId) -> Self {
        Self {
            path: task_path(task_id),
        }
    }
}

pub fn task_path(task_id: TaskId) -> String {
    format!("/tasks/{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_path_interpolates_id() {
        assert_eq!(task_path(42), "/tasks/42");
        assert_eq!(NavigationIntent::task_detail(7).path, "/tasks/7");
    }
}
