use std::sync::{Arc, Mutex};

use crate::models::{
    Label, LabelPatch, PersistedState, Project, ProjectPatch, StateFile, Task, TaskPatch,
    ViewMode, INBOX_PROJECT_ID,
};

const SCHEMA_VERSION: u32 = 1;

/// In-memory tables plus navigation state. Every mutation takes the lock
/// exactly once, so a delete cascade is never observable half-applied.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

#[derive(Debug)]
struct AppData {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    labels: Vec<Label>,
    selected_project_id: Option<String>,
    selected_label_id: Option<String>,
    selected_task: Option<Task>,
    view: ViewMode,
}

impl AppState {
    pub fn new(state: PersistedState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                tasks: state.tasks,
                projects: state.projects,
                labels: state.labels,
                selected_project_id: state.selected_project_id,
                selected_label_id: state.selected_label_id,
                selected_task: None,
                view: state.view,
            })),
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        let guard = self.inner.lock().expect("state poisoned");
        PersistedState {
            tasks: guard.tasks.clone(),
            projects: guard.projects.clone(),
            labels: guard.labels.clone(),
            selected_project_id: guard.selected_project_id.clone(),
            selected_label_id: guard.selected_label_id.clone(),
            view: guard.view,
        }
    }

    pub fn state_file(&self) -> StateFile {
        StateFile {
            schema_version: SCHEMA_VERSION,
            state: self.snapshot(),
        }
    }

    /// Replaces every persisted table and selection. The transient task
    /// selection is cleared: it may point at a row that no longer exists.
    pub fn replace(&self, state: PersistedState) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks = state.tasks;
        guard.projects = state.projects;
        guard.labels = state.labels;
        guard.selected_project_id = state.selected_project_id;
        guard.selected_label_id = state.selected_label_id;
        guard.view = state.view;
        guard.selected_task = None;
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.projects.clone()
    }

    pub fn labels(&self) -> Vec<Label> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.labels.clone()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.iter().find(|t| t.id == task_id).cloned()
    }

    pub fn project(&self, project_id: &str) -> Option<Project> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.projects.iter().find(|p| p.id == project_id).cloned()
    }

    pub fn label(&self, label_id: &str) -> Option<Label> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.labels.iter().find(|l| l.id == label_id).cloned()
    }

    pub fn add_task(&self, task: Task) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.push(task);
    }

    pub fn patch_task(&self, task_id: &str, patch: &TaskPatch) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let task = match guard.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => task,
            None => return false,
        };
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(project_id) = &patch.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(label_ids) = &patch.label_ids {
            task.label_ids = label_ids.clone();
        }
        if let Some(order) = patch.order {
            task.order = order;
        }
        if let Some(recurring) = &patch.recurring {
            task.recurring = recurring.clone();
        }
        if let Some(parent_id) = &patch.parent_id {
            task.parent_id = parent_id.clone();
        }
        true
    }

    pub fn remove_task(&self, task_id: &str) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.retain(|task| task.id != task_id);
    }

    /// Flips the completion flag. Returns false if the id is unknown.
    pub fn toggle_completed(&self, task_id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        match guard.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.completed = !task.completed;
                true
            }
            None => false,
        }
    }

    /// Marks a task completed and appends its next occurrence under a
    /// single lock acquisition, so no reader sees one without the other.
    pub fn complete_with_successor(&self, task_id: &str, successor: Task) {
        let mut guard = self.inner.lock().expect("state poisoned");
        if let Some(task) = guard.tasks.iter_mut().find(|t| t.id == task_id) {
            task.completed = true;
        }
        guard.tasks.push(successor);
    }

    pub fn set_task_priority(&self, task_id: &str, priority: u8) {
        let mut guard = self.inner.lock().expect("state poisoned");
        if let Some(task) = guard.tasks.iter_mut().find(|t| t.id == task_id) {
            task.priority = priority;
        }
    }

    /// Writes manual positions onto the named tasks. Ids not present in
    /// the table are skipped.
    pub fn assign_orders(&self, assignments: &[(String, i64)]) {
        let mut guard = self.inner.lock().expect("state poisoned");
        for (task_id, position) in assignments {
            if let Some(task) = guard.tasks.iter_mut().find(|t| &t.id == task_id) {
                task.order = Some(*position);
            }
        }
    }

    pub fn add_project(&self, project: Project) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.projects.push(project);
    }

    pub fn patch_project(&self, project_id: &str, patch: &ProjectPatch) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let project = match guard.projects.iter_mut().find(|p| p.id == project_id) {
            Some(project) => project,
            None => return false,
        };
        if let Some(name) = &patch.name {
            project.name = name.clone();
        }
        if let Some(color) = &patch.color {
            project.color = color.clone();
        }
        true
    }

    /// Removes a project and reassigns its tasks to the inbox. Deleting
    /// the inbox itself is a silent no-op, reported as `false`. If the
    /// deleted project was the current selection, the selection falls
    /// back to the inbox.
    pub fn remove_project(&self, project_id: &str) -> bool {
        if project_id == INBOX_PROJECT_ID {
            return false;
        }
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.projects.retain(|project| project.id != project_id);
        for task in guard.tasks.iter_mut() {
            if task.project_id == project_id {
                task.project_id = INBOX_PROJECT_ID.to_string();
            }
        }
        if guard.selected_project_id.as_deref() == Some(project_id) {
            guard.selected_project_id = Some(INBOX_PROJECT_ID.to_string());
        }
        true
    }

    pub fn add_label(&self, label: Label) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.labels.push(label);
    }

    pub fn patch_label(&self, label_id: &str, patch: &LabelPatch) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let label = match guard.labels.iter_mut().find(|l| l.id == label_id) {
            Some(label) => label,
            None => return false,
        };
        if let Some(name) = &patch.name {
            label.name = name.clone();
        }
        if let Some(color) = &patch.color {
            label.color = color.clone();
        }
        true
    }

    /// Removes a label and strips it from every task. If it was the
    /// active label filter, the selection clears.
    pub fn remove_label(&self, label_id: &str) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.labels.retain(|label| label.id != label_id);
        for task in guard.tasks.iter_mut() {
            task.label_ids.retain(|id| id != label_id);
        }
        if guard.selected_label_id.as_deref() == Some(label_id) {
            guard.selected_label_id = None;
        }
    }

    pub fn view(&self) -> ViewMode {
        let guard = self.inner.lock().expect("state poisoned");
        guard.view
    }

    pub fn set_view(&self, view: ViewMode) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.view = view;
    }

    pub fn selected_project_id(&self) -> Option<String> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.selected_project_id.clone()
    }

    /// Selecting a project switches the view to the project mode;
    /// clearing the selection falls back to the today view.
    pub fn set_selected_project(&self, project_id: Option<String>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.view = if project_id.is_some() {
            ViewMode::Project
        } else {
            ViewMode::Today
        };
        guard.selected_project_id = project_id;
    }

    pub fn selected_label_id(&self) -> Option<String> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.selected_label_id.clone()
    }

    /// Selecting a label switches the view to the label mode; clearing
    /// the selection falls back to the today view.
    pub fn set_selected_label(&self, label_id: Option<String>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.view = if label_id.is_some() {
            ViewMode::Label
        } else {
            ViewMode::Today
        };
        guard.selected_label_id = label_id;
    }

    pub fn selected_task(&self) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.selected_task.clone()
    }

    pub fn set_selected_task(&self, task: Option<Task>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.selected_task = task;
    }
}
