use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

/// Id of the permanent default project. It always exists and is never
/// deleted; orphaned tasks are reassigned to it.
pub const INBOX_PROJECT_ID: &str = "inbox";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Today,
    Upcoming,
    Project,
    Label,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

/// Recurrence rule attached to a task. Only `frequency` and `interval`
/// drive the expansion when the task is completed; the end conditions and
/// the weekly/monthly/yearly refinement fields are carried through
/// serialization untouched and are not interpreted anywhere yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Recurrence {
    pub frequency: Option<Frequency>,
    pub interval: u32,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[serde(default)]
    pub day_of_month: Option<u8>,
    #[serde(default)]
    pub month_of_year: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    /// Display string. The store accepts empty titles; rejecting them is
    /// the caller's job.
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// 1..=4, 4 = highest.
    #[serde(default = "default_priority")]
    pub priority: u8,
    pub project_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub created_at: Timestamp,
    /// Manual position within the project, assigned by reorder. Absent
    /// until the task has been reordered at least once.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub recurring: Option<Recurrence>,
    /// Parent task for the subtask relation. Preserved across mutations;
    /// no derived view consumes it.
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Input for creating a task: every task field except the store-assigned
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: u8,
    pub project_id: String,
    pub label_ids: Vec<String>,
    pub order: Option<i64>,
    pub recurring: Option<Recurrence>,
    pub parent_id: Option<String>,
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            completed: false,
            due_date: None,
            priority: default_priority(),
            project_id: INBOX_PROJECT_ID.to_string(),
            label_ids: Vec::new(),
            order: None,
            recurring: None,
            parent_id: None,
        }
    }
}

/// Partial task update. `None` leaves the field untouched; for nullable
/// fields the inner option distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<u8>,
    pub project_id: Option<String>,
    pub label_ids: Option<Vec<String>>,
    pub order: Option<Option<i64>>,
    pub recurring: Option<Option<Recurrence>>,
    pub parent_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// The persisted portion of the store. The detail-pane task selection is
/// deliberately not part of this: it is transient presentation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersistedState {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub labels: Vec<Label>,
    #[serde(default)]
    pub selected_project_id: Option<String>,
    #[serde(default)]
    pub selected_label_id: Option<String>,
    #[serde(default)]
    pub view: ViewMode,
}

impl PersistedState {
    /// First-run state: built-in projects and labels, inbox selected.
    pub fn initial(now: Timestamp) -> Self {
        Self {
            tasks: Vec::new(),
            projects: default_projects(now),
            labels: default_labels(),
            selected_project_id: Some(INBOX_PROJECT_ID.to_string()),
            selected_label_id: None,
            view: ViewMode::Today,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateFile {
    pub schema_version: u32,
    pub state: PersistedState,
}

pub fn default_projects(now: Timestamp) -> Vec<Project> {
    vec![
        Project {
            id: INBOX_PROJECT_ID.to_string(),
            name: "Inbox".to_string(),
            color: "#0077ED".to_string(),
            created_at: now,
        },
        Project {
            id: "personal".to_string(),
            name: "Personal".to_string(),
            color: "#FF9500".to_string(),
            created_at: now,
        },
        Project {
            id: "work".to_string(),
            name: "Work".to_string(),
            color: "#FF2D55".to_string(),
            created_at: now,
        },
    ]
}

pub fn default_labels() -> Vec<Label> {
    vec![
        Label {
            id: "important".to_string(),
            name: "Important".to_string(),
            color: "#FF3B30".to_string(),
        },
        Label {
            id: "urgent".to_string(),
            name: "Urgent".to_string(),
            color: "#FF9500".to_string(),
        },
        Label {
            id: "later".to_string(),
            name: "Later".to_string(),
            color: "#5856D6".to_string(),
        },
    ]
}

fn default_priority() -> u8 {
    1
}
