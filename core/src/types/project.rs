use serde::{Deserialize, Serialize};

use super::Task;

/// How a project is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    List,
    Kanban,
    Timeline,
}

/// The user's permission on a shared project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Comment,
}

/// Whether a project holds tasks or notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectKind {
    Task,
    Note,
}

/// A task list as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(rename = "closed", default)]
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
}

/// A kanban column of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// A project together with its undone tasks and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    pub project: Project,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// Request payload for `POST /open/v1/project`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreationRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
}

impl ProjectCreationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Request payload for `POST /open/v1/project/{projectId}`.
///
/// `sort_order` defaults to `Some(0)`, as the service does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_sort_order", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
}

fn default_sort_order() -> Option<i64> {
    Some(0)
}

impl Default for ProjectUpdateRequest {
    fn default() -> Self {
        Self {
            name: None,
            color: None,
            sort_order: default_sort_order(),
            view_mode: None,
            kind: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_closed_flag_uses_closed_key() {
        let project: Project =
            serde_json::from_str(r#"{"id":"p","name":"n","closed":true}"#).unwrap();
        assert!(project.is_closed);
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["closed"], true);
        assert!(json.get("isClosed").is_none());
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(serde_json::to_value(ViewMode::Kanban).unwrap(), "kanban");
        assert_eq!(serde_json::to_value(Permission::Comment).unwrap(), "comment");
        assert_eq!(serde_json::to_value(ProjectKind::Note).unwrap(), "NOTE");
    }

    #[test]
    fn unknown_view_mode_is_a_decode_error() {
        let result: Result<Project, _> =
            serde_json::from_str(r#"{"id":"p","name":"n","closed":false,"viewMode":"grid"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_request_defaults_sort_order_to_zero() {
        let input = ProjectUpdateRequest {
            name: Some("project name2".to_string()),
            ..ProjectUpdateRequest::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"name": "project name2", "sortOrder": 0}));
    }

    #[test]
    fn project_data_defaults_missing_lists() {
        let data: ProjectData =
            serde_json::from_str(r#"{"project":{"id":"p","name":"n","closed":false}}"#).unwrap();
        assert!(data.tasks.is_empty());
        assert!(data.columns.is_empty());
    }
}
