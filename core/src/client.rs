//! Stateless HTTP request builder and response parser for the open API.
//!
//! # Design
//! `TickTickClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. [`TickTickService`](crate::TickTickService) glues the two
//! together over a transport.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, CONTENT_TYPE};
use crate::types::{
    Project, ProjectCreationRequest, ProjectData, ProjectUpdateRequest, Task, TaskCreationRequest,
    TaskUpdateRequest,
};

/// Public API host.
pub const DEFAULT_API_URL: &str = "https://api.ticktick.com";

/// Synchronous, stateless client for the open API.
#[derive(Debug, Clone)]
pub struct TickTickClient {
    base_url: String,
}

impl Default for TickTickClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl TickTickClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn build_get_task(&self, project_id: &str, task_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/open/v1/project/{project_id}/task/{task_id}"))
    }

    pub fn build_create_task(&self, input: &TaskCreationRequest) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/open/v1/task", input)
    }

    /// Fails with `TaskIdMismatch` if `task_id` differs from `input.id`.
    pub fn build_update_task(
        &self,
        task_id: &str,
        input: &TaskUpdateRequest,
    ) -> Result<HttpRequest, ApiError> {
        if task_id != input.id {
            return Err(ApiError::TaskIdMismatch {
                path_id: task_id.to_string(),
                body_id: input.id.clone(),
            });
        }
        self.json_request(HttpMethod::Post, &format!("/open/v1/task/{task_id}"), input)
    }

    pub fn build_complete_task(&self, project_id: &str, task_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("/open/v1/project/{project_id}/task/{task_id}/complete"),
        )
    }

    pub fn build_delete_task(&self, project_id: &str, task_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/open/v1/project/{project_id}/task/{task_id}"))
    }

    pub fn parse_get_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        decode(response)
    }

    pub fn parse_create_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        decode(response)
    }

    /// The service answers 200 with an empty body when the request's
    /// `projectId` is not the task's project; that is reported as an error.
    pub fn parse_update_task(
        &self,
        input: &TaskUpdateRequest,
        response: HttpResponse,
    ) -> Result<Task, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Err(ApiError::Http {
                status: response.status,
                body: format!("task not updated (invalid project id? {})", input.project_id),
            });
        }
        from_body(&response.body)
    }

    pub fn parse_complete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn build_get_projects(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/open/v1/project")
    }

    pub fn build_get_project(&self, project_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/open/v1/project/{project_id}"))
    }

    pub fn build_get_project_data(&self, project_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/open/v1/project/{project_id}/data"))
    }

    pub fn build_create_project(
        &self,
        input: &ProjectCreationRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/open/v1/project", input)
    }

    pub fn build_update_project(
        &self,
        project_id: &str,
        input: &ProjectUpdateRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("/open/v1/project/{project_id}"), input)
    }

    pub fn build_delete_project(&self, project_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/open/v1/project/{project_id}"))
    }

    pub fn parse_get_projects(&self, response: HttpResponse) -> Result<Vec<Project>, ApiError> {
        decode(response)
    }

    pub fn parse_get_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    pub fn parse_get_project_data(&self, response: HttpResponse) -> Result<ProjectData, ApiError> {
        decode(response)
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    pub fn parse_update_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    pub fn parse_delete_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body: Some(body),
        })
    }
}

/// Any 2xx is a success; everything else becomes `ApiError::Http`.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    debug!(status = response.status, "request rejected");
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    from_body(&response.body)
}

fn from_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
