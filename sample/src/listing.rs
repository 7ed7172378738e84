//! Text rendering of projects and their tasks.

use ticktick_core::{ChecklistItemStatus, Project, Task, TaskStatus};

fn checkbox(done: bool) -> &'static str {
    if done {
        "☑"
    } else {
        "☐"
    }
}

/// Projects in display order. Projects without a sort order come first.
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by_key(|p| p.sort_order);
}

pub fn project_header(project: &Project) -> String {
    format!("Tasks of project {} (#{})", project.name, project.id)
}

/// One line per task, each followed by its checklist items, ordered by
/// status then sort order.
pub fn task_lines(tasks: &[Task]) -> Vec<String> {
    let mut tasks: Vec<&Task> = tasks.iter().collect();
    tasks.sort_by_key(|t| (t.status, t.sort_order));

    let mut lines = Vec::new();
    for task in tasks {
        lines.push(format!(
            "\t{} Task: {} {:?} (#{})",
            checkbox(task.status == TaskStatus::Completed),
            task.title,
            task.priority,
            task.id
        ));
        let Some(items) = &task.items else {
            continue;
        };
        let mut items: Vec<_> = items.iter().collect();
        items.sort_by_key(|i| (i.status, i.sort_order));
        for item in items {
            lines.push(format!(
                "\t\t{} {} (#{})",
                checkbox(item.status == ChecklistItemStatus::Completed),
                item.title,
                item.id
            ));
        }
    }
    lines
}
