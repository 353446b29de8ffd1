use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = u64;

/// Opaque category reference, only meaningful to a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskData {
    pub description: String,
    pub category: CategoryId,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: TaskId,
    pub state: StateCode,
    pub data: TaskData,
}

/// The `state` value exactly as stored. Anything that is not a known
/// ordinal still loads, and renders with [`TaskState::UNKNOWN_LABEL`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum StateCode {
    Ordinal(i64),
    Other(serde_json::Value),
}

impl StateCode {
    pub fn state(&self) -> Option<TaskState> {
        match self {
            Self::Ordinal(ordinal) => TaskState::from_ordinal(*ordinal),
            Self::Other(_) => None,
        }
    }
}

impl From<TaskState> for StateCode {
    fn from(state: TaskState) -> Self {
        Self::Ordinal(state.ordinal())
    }
}

impl Task {
    pub fn new(
        task_id: TaskId,
        state: TaskState,
        description: impl Into<String>,
        category: impl Into<CategoryId>,
    ) -> Self {
        Self {
            task_id,
            state: state.into(),
            data: TaskData {
                description: description.into(),
                category: category.into(),
            },
        }
    }

    pub fn state_label(&self) -> &'static str {
        TaskState::label_for(&self.state)
    }
}

/// Lifecycle states a task can occupy, keyed by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    InProgress,
    Done,
}

impl TaskState {
    pub const ALL: [TaskState; 3] = [TaskState::Pending, TaskState::InProgress, TaskState::Done];

    /// Shown for ordinals outside the enumeration.
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Pending),
            1 => Some(Self::InProgress),
            2 => Some(Self::Done),
            _ => None,
        }
    }

    pub const fn ordinal(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn label_for(code: &StateCode) -> &'static str {
        code.state().map_or(Self::UNKNOWN_LABEL, Self::label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(0), "Pending")]
    #[case(json!(1), "In Progress")]
    #[case(json!(2), "Done")]
    #[case(json!(3), "Unknown")]
    #[case(json!(-1), "Unknown")]
    #[case(json!(u64::MAX), "Unknown")]
    #[case(json!(1.5), "Unknown")]
    #[case(json!("Done"), "Unknown")]
    #[case(json!(null), "Unknown")]
    fn label_for_stored_state(#[case] raw: serde_json::Value, #[case] expected: &str) {
        let code: StateCode = serde_json::from_value(raw).unwrap();
        assert_eq!(TaskState::label_for(&code), expected);
    }

    #[test]
    fn every_state_round_trips_through_its_ordinal() {
        for state in TaskState::ALL {
            assert_eq!(TaskState::from_ordinal(state.ordinal()), Some(state));
            assert_eq!(TaskState::label_for(&state.into()), state.label());
        }
    }

    #[test]
    fn task_deserializes_from_camel_case_json() {
        let json = r#"{"taskId":42,"state":0,"data":{"description":"Write spec","category":"cat-7"}}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task, Task::new(42, TaskState::Pending, "Write spec", "cat-7"));
        assert_eq!(task.state_label(), "Pending");
    }

    #[test]
    fn odd_states_do_not_reject_the_task_list() {
        let json = r#"[
            {"taskId":1,"state":-1,"data":{"description":"x","category":"c"}},
            {"taskId":2,"state":"archived","data":{"description":"y","category":"c"}},
            {"taskId":3,"state":2,"data":{"description":"z","category":"c"}}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        let labels: Vec<_> = tasks.iter().map(Task::state_label).collect();
        assert_eq!(labels, ["Unknown", "Unknown", "Done"]);
    }

    #[test]
    fn stored_state_is_written_back_unchanged() {
        let code = StateCode::Other(json!("archived"));
        assert_eq!(serde_json::to_value(&code).unwrap(), json!("archived"));
        assert_eq!(serde_json::to_value(StateCode::Ordinal(-1)).unwrap(), json!(-1));
    }
}
