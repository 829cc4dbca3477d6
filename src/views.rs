use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::Task;

/// Open tasks due exactly on `today`, highest priority first.
pub fn today_tasks(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| !task.completed && task.due_date == Some(today))
        .cloned()
        .collect();
    out.sort_by(|a, b| b.priority.cmp(&a.priority));
    out
}

/// Open tasks due strictly after `today`, earliest due date first. Ties
/// keep their table order (stable sort).
pub fn upcoming_tasks(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| {
            !task.completed && task.due_date.map_or(false, |due| due > today)
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    out
}

/// Every task of one project, any completion state, in canonical order.
pub fn project_tasks(tasks: &[Task], project_id: &str) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| task.project_id == project_id)
        .cloned()
        .collect();
    out.sort_by(canonical_order);
    out
}

/// Every task carrying one label, any completion state, in canonical order.
pub fn label_tasks(tasks: &[Task], label_id: &str) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| task.label_ids.iter().any(|id| id == label_id))
        .cloned()
        .collect();
    out.sort_by(canonical_order);
    out
}

/// Every task in the store, in canonical order.
pub fn all_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.to_vec();
    out.sort_by(canonical_order);
    out
}

/// Canonical ordering used by the project/label/all views: completed
/// tasks last, then priority descending, then newest first. Manual
/// `order` values are not consulted here; the reorder command writes
/// them, but no view reads them (see DESIGN.md).
fn canonical_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// The sequence the reorder command measures its indices against: the
/// open tasks of one project in the canonical order minus the completion
/// key (priority descending, then newest first).
pub fn reorder_window(tasks: &[Task], project_id: &str) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|task| task.project_id == project_id && !task.completed)
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::INBOX_PROJECT_ID;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task(id: &str, priority: u8, created_at: i64) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task-{id}"),
            description: None,
            completed: false,
            due_date: None,
            priority,
            project_id: INBOX_PROJECT_ID.to_string(),
            label_ids: Vec::new(),
            created_at,
            order: None,
            recurring: None,
            parent_id: None,
        }
    }

    #[test]
    fn today_matches_calendar_day_and_sorts_by_priority() {
        let today = date(2025, 6, 10);
        let mut a = make_task("a", 4, 1);
        a.due_date = Some(today);
        let mut b = make_task("b", 2, 2);
        b.due_date = Some(today);
        let mut done = make_task("done", 4, 3);
        done.due_date = Some(today);
        done.completed = true;
        let mut tomorrow = make_task("tomorrow", 4, 4);
        tomorrow.due_date = Some(date(2025, 6, 11));
        let undated = make_task("undated", 4, 5);

        let out = today_tasks(&[b, done, tomorrow, undated, a], today);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn upcoming_is_strictly_after_today_sorted_by_due_date() {
        let today = date(2025, 6, 10);
        let mut soon = make_task("soon", 1, 1);
        soon.due_date = Some(date(2025, 6, 12));
        let mut later = make_task("later", 4, 2);
        later.due_date = Some(date(2025, 7, 1));
        let mut due_today = make_task("today", 4, 3);
        due_today.due_date = Some(today);
        let mut overdue = make_task("overdue", 4, 4);
        overdue.due_date = Some(date(2025, 6, 1));

        let out = upcoming_tasks(&[later, due_today, overdue, soon], today);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "later"]);
    }

    #[test]
    fn upcoming_keeps_table_order_for_equal_due_dates() {
        let today = date(2025, 6, 10);
        let due = date(2025, 6, 15);
        let mut first = make_task("first", 1, 1);
        first.due_date = Some(due);
        let mut second = make_task("second", 4, 2);
        second.due_date = Some(due);

        let out = upcoming_tasks(&[first, second], today);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn canonical_order_puts_completed_last_then_priority_then_newest() {
        let mut done_urgent = make_task("done_urgent", 4, 9);
        done_urgent.completed = true;
        let open_low_old = make_task("open_low_old", 1, 1);
        let open_low_new = make_task("open_low_new", 1, 5);
        let open_high = make_task("open_high", 3, 2);

        let out = all_tasks(&[done_urgent, open_low_old, open_low_new, open_high]);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["open_high", "open_low_new", "open_low_old", "done_urgent"]
        );
    }

    #[test]
    fn project_and_label_views_filter_by_membership() {
        let mut inbox = make_task("inbox", 1, 1);
        inbox.label_ids = vec!["urgent".to_string()];
        let mut other = make_task("other", 1, 2);
        other.project_id = "work".to_string();
        other.label_ids = vec!["urgent".to_string(), "later".to_string()];

        let tasks = vec![inbox, other];
        let ids: Vec<String> = project_tasks(&tasks, "work")
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(ids, vec!["other".to_string()]);

        let urgent: Vec<String> = label_tasks(&tasks, "urgent")
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(urgent, vec!["other".to_string(), "inbox".to_string()]);

        assert!(label_tasks(&tasks, "missing").is_empty());
    }

    #[test]
    fn reorder_window_skips_completed_and_ignores_manual_order() {
        let mut done = make_task("done", 4, 9);
        done.completed = true;
        let mut moved = make_task("moved", 1, 1);
        // A previously assigned manual position must not affect the window.
        moved.order = Some(0);
        let high = make_task("high", 4, 2);

        let out = reorder_window(&[done, moved, high], INBOX_PROJECT_ID);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "moved"]);
    }
}
