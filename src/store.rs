use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    Label, LabelPatch, NewTask, PersistedState, Project, ProjectPatch, Task, TaskPatch, ViewMode,
};
use crate::recur::next_due_date;
use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::views;

#[derive(Debug, serde::Serialize)]
pub struct BackupEntry {
    pub name: String,
    pub modified_at: i64,
}

/// The task store: tables, commands, and derived views behind one handle.
///
/// Commands mutate the in-memory tables and then write the whole snapshot
/// through to disk; queries read the current tables and compute a view
/// from scratch. The presentation layer constructs one of these and calls
/// into it from its event handlers.
pub struct TaskStore {
    state: AppState,
    storage: Storage,
}

impl TaskStore {
    /// Opens the store over `data_dir`. A missing snapshot (first run)
    /// and an unreadable one both fall back to the built-in defaults;
    /// the latter is logged.
    pub fn open(data_dir: PathBuf) -> Result<Self, StorageError> {
        let storage = Storage::new(data_dir);
        storage.ensure_dirs()?;
        let state = match storage.load_state() {
            Ok(file) => file.state,
            Err(StorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                PersistedState::initial(Utc::now().timestamp())
            }
            Err(err) => {
                log::warn!("unreadable state document, starting from defaults: {err}");
                PersistedState::initial(Utc::now().timestamp())
            }
        };
        Ok(Self {
            state: AppState::new(state),
            storage,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    // Write-through, best effort: a failed write is logged, never
    // retried, and the in-memory mutation stands.
    fn persist(&self) {
        if let Err(err) = self.storage.save_state(&self.state.state_file(), false) {
            log::warn!("persist failed: {err}");
        }
    }

    // ---- task commands ----

    pub fn add_task(&self, input: NewTask) -> Task {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            completed: input.completed,
            due_date: input.due_date,
            priority: input.priority,
            project_id: input.project_id,
            label_ids: input.label_ids,
            created_at: Utc::now().timestamp(),
            order: input.order,
            recurring: input.recurring,
            parent_id: input.parent_id,
        };
        self.state.add_task(task.clone());
        self.persist();
        task
    }

    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) {
        self.state.patch_task(task_id, patch);
        self.persist();
    }

    pub fn delete_task(&self, task_id: &str) {
        self.state.remove_task(task_id);
        self.persist();
    }

    /// Completing an open recurring task with a due date spawns its next
    /// occurrence and leaves exactly one open copy; everything else is a
    /// plain completion flip. Unknown ids do nothing.
    pub fn toggle_task_completion(&self, task_id: &str) {
        let task = match self.state.task(task_id) {
            Some(task) => task,
            None => return,
        };

        if let (Some(rule), false) = (&task.recurring, task.completed) {
            if let Some(due) = task.due_date {
                if let Some(next_due) = next_due_date(due, rule) {
                    let successor = build_next_occurrence(&task, next_due);
                    self.state.complete_with_successor(task_id, successor);
                    self.persist();
                    return;
                }
            }
        }

        self.state.toggle_completed(task_id);
        self.persist();
    }

    pub fn set_task_priority(&self, task_id: &str, priority: u8) {
        self.state.set_task_priority(task_id, priority);
        self.persist();
    }

    /// Moves the task at `from` to `to` within the project's open-task
    /// sequence (priority descending, then newest first) and records the
    /// resulting 0-based positions in each task's `order` field. The
    /// positions are write-only: no view consults them (see DESIGN.md).
    pub fn reorder_tasks(&self, project_id: &str, from: usize, to: usize) {
        if from == to {
            return;
        }
        let mut window = views::reorder_window(&self.state.tasks(), project_id);
        if from >= window.len() || to >= window.len() {
            return;
        }
        let moved = window.remove(from);
        window.insert(to, moved);
        let assignments: Vec<(String, i64)> = window
            .iter()
            .enumerate()
            .map(|(position, task)| (task.id.clone(), position as i64))
            .collect();
        self.state.assign_orders(&assignments);
        self.persist();
    }

    // ---- project commands ----

    pub fn add_project(&self, name: &str, color: &str) -> Project {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.to_string(),
            created_at: Utc::now().timestamp(),
        };
        self.state.add_project(project.clone());
        self.persist();
        project
    }

    /// Renaming/recoloring is allowed for any project, the inbox
    /// included; only its identity is immutable.
    pub fn update_project(&self, project_id: &str, patch: &ProjectPatch) {
        self.state.patch_project(project_id, patch);
        self.persist();
    }

    pub fn delete_project(&self, project_id: &str) {
        if self.state.remove_project(project_id) {
            self.persist();
        }
    }

    // ---- label commands ----

    pub fn add_label(&self, name: &str, color: &str) -> Label {
        let label = Label {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.to_string(),
        };
        self.state.add_label(label.clone());
        self.persist();
        label
    }

    pub fn update_label(&self, label_id: &str, patch: &LabelPatch) {
        self.state.patch_label(label_id, patch);
        self.persist();
    }

    pub fn delete_label(&self, label_id: &str) {
        self.state.remove_label(label_id);
        self.persist();
    }

    // ---- navigation commands ----

    pub fn set_view(&self, view: ViewMode) {
        self.state.set_view(view);
        self.persist();
    }

    pub fn set_selected_project(&self, project_id: Option<String>) {
        self.state.set_selected_project(project_id);
        self.persist();
    }

    pub fn set_selected_label(&self, label_id: Option<String>) {
        self.state.set_selected_label(label_id);
        self.persist();
    }

    /// The detail-pane selection is transient: it is never written to
    /// the snapshot, so there is nothing to persist here.
    pub fn set_selected_task(&self, task: Option<Task>) {
        self.state.set_selected_task(task);
    }

    // ---- queries ----

    pub fn today_tasks(&self, today: NaiveDate) -> Vec<Task> {
        views::today_tasks(&self.state.tasks(), today)
    }

    pub fn upcoming_tasks(&self, today: NaiveDate) -> Vec<Task> {
        views::upcoming_tasks(&self.state.tasks(), today)
    }

    pub fn project_tasks(&self, project_id: &str) -> Vec<Task> {
        views::project_tasks(&self.state.tasks(), project_id)
    }

    pub fn label_tasks(&self, label_id: &str) -> Vec<Task> {
        views::label_tasks(&self.state.tasks(), label_id)
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        views::all_tasks(&self.state.tasks())
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.projects()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.state.labels()
    }

    // ---- backups & export ----

    pub fn create_backup(&self) -> Result<(), StorageError> {
        self.storage.ensure_dirs()?;
        self.storage.save_state(&self.state.state_file(), true)
    }

    pub fn list_backups(&self) -> Result<Vec<BackupEntry>, StorageError> {
        let list = match self.storage.list_backups() {
            Ok(list) => list,
            Err(StorageError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => {
                self.storage.ensure_dirs()?;
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        Ok(list
            .into_iter()
            .map(|(name, modified_at)| BackupEntry { name, modified_at })
            .collect())
    }

    pub fn restore_backup(&self, filename: &str) -> Result<(), StorageError> {
        let data = self.storage.restore_backup(filename)?;
        self.state.replace(data.state);
        Ok(())
    }

    /// Replaces the tables from a snapshot document outside the data
    /// directory (e.g. a file the user picked).
    pub fn import_snapshot(&self, path: &Path) -> Result<(), StorageError> {
        let data = self.storage.restore_from_path(path)?;
        self.state.replace(data.state);
        Ok(())
    }

    pub fn export_json(&self) -> Result<PathBuf, StorageError> {
        let path = export_default_path(self.storage.root(), "json");
        let json = serde_json::to_vec_pretty(&self.state.state_file())?;
        write_atomic_bytes(&path, &json)?;
        Ok(path)
    }

    pub fn export_csv(&self) -> Result<PathBuf, StorageError> {
        let path = export_default_path(self.storage.root(), "csv");
        let tasks = self.state.tasks();

        let mut out = String::new();
        out.push_str("id,title,project_id,due_date,priority,completed,labels,description\n");
        for task in tasks {
            let labels = task.label_ids.join(";");
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let description = task.description.unwrap_or_default().replace("\r\n", "\n");

            out.push_str(&csv_escape(&task.id));
            out.push(',');
            out.push_str(&csv_escape(&task.title));
            out.push(',');
            out.push_str(&csv_escape(&task.project_id));
            out.push(',');
            out.push_str(&due);
            out.push(',');
            out.push_str(&task.priority.to_string());
            out.push(',');
            out.push_str(if task.completed { "true" } else { "false" });
            out.push(',');
            out.push_str(&csv_escape(&labels));
            out.push(',');
            out.push_str(&csv_escape(&description));
            out.push('\n');
        }

        write_atomic_bytes(&path, out.as_bytes())?;
        Ok(path)
    }
}

fn build_next_occurrence(completed: &Task, next_due: NaiveDate) -> Task {
    let mut next = completed.clone();
    next.id = Uuid::new_v4().to_string();
    next.completed = false;
    next.created_at = Utc::now().timestamp();
    next.due_date = Some(next_due);
    // A manual position belongs to the row it was assigned to, not to
    // future occurrences.
    next.order = None;
    next
}

fn export_default_path(root: &Path, ext: &str) -> PathBuf {
    let exports_dir = root.join("exports");
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    exports_dir.join(format!("daylist-{stamp}.{ext}"))
}

fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = path.with_extension("tmp");
    fs::create_dir_all(
        path.parent()
            .ok_or_else(|| StorageError::Io(std::io::Error::other("invalid export path")))?,
    )?;
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)?;
    Ok(())
}

fn csv_escape(value: &str) -> String {
    // Minimal CSV escaping: wrap in quotes and double any existing quotes.
    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
