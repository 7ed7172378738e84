//! In-memory emulation of the TickTick open API and token endpoint.
//!
//! DTOs are defined here independently from `ticktick-core`; integration
//! tests catch schema drift between the two crates. The update-task quirks
//! of the real service are reproduced: an unknown `projectId` yields a 500,
//! a known but different one yields a 200 with an empty body.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Project id used for tasks created without one.
pub const INBOX_ID: &str = "inbox1";

/// Authorization code the token endpoint rejects with `invalid_grant`.
pub const EXPIRED_CODE: &str = "expired";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub status: u8,
    pub is_all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub time_zone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub is_all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<String>,
    pub content: String,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistItem>>,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub start_date: String,
    pub status: u8,
    pub time_zone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectData {
    pub project: Project,
    pub tasks: Vec<Task>,
    pub columns: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub color: Option<String>,
    pub sort_order: Option<i64>,
    pub view_mode: Option<String>,
    pub kind: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub name: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i64>,
    pub view_mode: Option<String>,
    pub kind: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditItem {
    pub title: Option<String>,
    pub status: Option<u8>,
    pub is_all_day: Option<bool>,
    pub sort_order: Option<i64>,
    pub time_zone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub project_id: Option<String>,
    pub content: Option<String>,
    pub desc: Option<String>,
    pub is_all_day: Option<bool>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub time_zone: Option<String>,
    pub priority: Option<u8>,
    pub sort_order: Option<i64>,
    pub items: Option<Vec<EditItem>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub id: String,
    pub project_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub desc: Option<String>,
    pub is_all_day: Option<bool>,
    pub due_date: Option<String>,
    pub priority: Option<u8>,
    pub sort_order: Option<i64>,
}

#[derive(Default)]
pub struct Store {
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl Store {
    fn project_exists(&self, id: &str) -> bool {
        id == INBOX_ID || self.projects.iter().any(|p| p.id == id)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Server-assigned ids look like Mongo object ids: 24 hex characters.
fn object_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/open/v1/project", get(list_projects).post(create_project))
        .route(
            "/open/v1/project/{project_id}",
            get(get_project).post(update_project).delete(delete_project),
        )
        .route("/open/v1/project/{project_id}/data", get(get_project_data))
        .route(
            "/open/v1/project/{project_id}/task/{task_id}",
            get(get_task).delete(delete_task),
        )
        .route(
            "/open/v1/project/{project_id}/task/{task_id}/complete",
            post(complete_task),
        )
        .route("/open/v1/task", post(create_task))
        .route("/open/v1/task/{task_id}", post(update_task))
        .route("/oauth/token", post(issue_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- projects ---

async fn list_projects(State(db): State<Db>) -> Json<Vec<Project>> {
    let store = db.read().await;
    Json(store.projects.clone())
}

async fn create_project(State(db): State<Db>, Json(input): Json<CreateProject>) -> Json<Project> {
    let project = Project {
        id: object_id(),
        name: input.name,
        color: input.color,
        sort_order: input.sort_order,
        closed: false,
        view_mode: input.view_mode.or_else(|| Some("list".to_string())),
        kind: input.kind.or_else(|| Some("TASK".to_string())),
    };
    debug!(id = %project.id, "project created");
    db.write().await.projects.push(project.clone());
    Json(project)
}

async fn get_project(
    State(db): State<Db>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, StatusCode> {
    let store = db.read().await;
    store
        .projects
        .iter()
        .find(|p| p.id == project_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_project(
    State(db): State<Db>,
    Path(project_id): Path<String>,
    Json(input): Json<UpdateProject>,
) -> Result<Json<Project>, StatusCode> {
    let mut store = db.write().await;
    let project = store
        .projects
        .iter_mut()
        .find(|p| p.id == project_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        project.name = name;
    }
    if input.color.is_some() {
        project.color = input.color;
    }
    if input.sort_order.is_some() {
        project.sort_order = input.sort_order;
    }
    if input.view_mode.is_some() {
        project.view_mode = input.view_mode;
    }
    if input.kind.is_some() {
        project.kind = input.kind;
    }
    Ok(Json(project.clone()))
}

async fn delete_project(State(db): State<Db>, Path(project_id): Path<String>) -> StatusCode {
    let mut store = db.write().await;
    let before = store.projects.len();
    store.projects.retain(|p| p.id != project_id);
    if store.projects.len() == before {
        return StatusCode::NOT_FOUND;
    }
    store.tasks.retain(|t| t.project_id != project_id);
    StatusCode::OK
}

async fn get_project_data(
    State(db): State<Db>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectData>, StatusCode> {
    let store = db.read().await;
    let project = store
        .projects
        .iter()
        .find(|p| p.id == project_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;
    let tasks = store
        .tasks
        .iter()
        .filter(|t| t.project_id == project_id && t.status == 0)
        .cloned()
        .collect();
    Ok(Json(ProjectData {
        project,
        tasks,
        columns: Vec::new(),
    }))
}

// --- tasks ---

async fn get_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<Task>, StatusCode> {
    let store = db.read().await;
    store
        .tasks
        .iter()
        .find(|t| t.id == task_id && t.project_id == project_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<Json<Task>, StatusCode> {
    let mut store = db.write().await;
    let project_id = input.project_id.unwrap_or_else(|| INBOX_ID.to_string());
    if !store.project_exists(&project_id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let time_zone = input.time_zone.unwrap_or_else(|| "UTC".to_string());
    let items = input.items.map(|items| {
        items
            .into_iter()
            .map(|item| ChecklistItem {
                id: object_id(),
                title: item.title.unwrap_or_default(),
                status: item.status.unwrap_or(0),
                is_all_day: item.is_all_day.unwrap_or(false),
                sort_order: item.sort_order,
                time_zone: item.time_zone.unwrap_or_else(|| time_zone.clone()),
            })
            .collect()
    });
    let task = Task {
        id: object_id(),
        project_id,
        title: input.title,
        is_all_day: input.is_all_day.unwrap_or(false),
        completed_time: None,
        content: input.content.unwrap_or_default(),
        desc: input.desc.unwrap_or_default(),
        due_date: input.due_date,
        items,
        priority: input.priority.unwrap_or(0),
        sort_order: input.sort_order,
        start_date: input.start_date.unwrap_or_default(),
        status: 0,
        time_zone,
    };
    debug!(id = %task.id, project = %task.project_id, "task created");
    store.tasks.push(task.clone());
    Ok(Json(task))
}

async fn update_task(
    State(db): State<Db>,
    Path(task_id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> Result<(StatusCode, String), StatusCode> {
    let mut store = db.write().await;
    if !store.project_exists(&input.project_id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let task = store
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id && t.id == input.id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if task.project_id != input.project_id {
        // The service cannot move tasks: it acknowledges and does nothing.
        return Ok((StatusCode::OK, String::new()));
    }
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(content) = input.content {
        task.content = content;
    }
    if let Some(desc) = input.desc {
        task.desc = desc;
    }
    if let Some(is_all_day) = input.is_all_day {
        task.is_all_day = is_all_day;
    }
    if input.due_date.is_some() {
        task.due_date = input.due_date;
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    if input.sort_order.is_some() {
        task.sort_order = input.sort_order;
    }
    let body = serde_json::to_string(&*task).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::OK, body))
}

async fn complete_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> StatusCode {
    let mut store = db.write().await;
    match store
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id && t.project_id == project_id)
    {
        Some(task) => {
            task.status = 2;
            task.completed_time = Some("2019-11-13T03:00:00+0000".to_string());
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> StatusCode {
    let mut store = db.write().await;
    let before = store.tasks.len();
    store
        .tasks
        .retain(|t| !(t.id == task_id && t.project_id == project_id));
    if store.tasks.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

// --- oauth ---

async fn issue_token(
    Form(params): Form<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

    if param("grant_type") != "authorization_code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "unsupported_grant_type"})),
        );
    }
    if param("client_id").is_empty() || param("client_secret").is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid_client"})),
        );
    }
    let code = param("code");
    if code.is_empty() || code == EXPIRED_CODE {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "authorization code is invalid or expired",
            })),
        );
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": format!("token-{code}"),
            "token_type": "bearer",
            "expires_in": 15551999,
            "scope": param("scope"),
        })),
    )
}
