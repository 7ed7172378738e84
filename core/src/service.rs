//! Typed facade over `TickTickClient` and a `Transport`.
//!
//! Each method is one build → execute → parse round-trip. No retries, no
//! caching: every call either returns a fresh value or an error.

use crate::client::TickTickClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{
    Project, ProjectCreationRequest, ProjectData, ProjectUpdateRequest, Task, TaskCreationRequest,
    TaskUpdateRequest,
};

#[derive(Debug, Clone)]
pub struct TickTickService<T> {
    client: TickTickClient,
    transport: T,
}

impl<T: Transport> TickTickService<T> {
    pub fn new(client: TickTickClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TickTickClient {
        &self.client
    }

    pub fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_get_task(project_id, task_id))?;
        self.client.parse_get_task(response)
    }

    pub fn create_task(&self, input: &TaskCreationRequest) -> Result<Task, ApiError> {
        let response = self.transport.execute(self.client.build_create_task(input)?)?;
        self.client.parse_create_task(response)
    }

    /// Nothing is sent when `task_id` and `input.id` disagree.
    pub fn update_task(&self, task_id: &str, input: &TaskUpdateRequest) -> Result<Task, ApiError> {
        let request = self.client.build_update_task(task_id, input)?;
        let response = self.transport.execute(request)?;
        self.client.parse_update_task(input, response)
    }

    pub fn complete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        let response = self
            .transport
            .execute(self.client.build_complete_task(project_id, task_id))?;
        self.client.parse_complete_task(response)
    }

    pub fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        let response = self
            .transport
            .execute(self.client.build_delete_task(project_id, task_id))?;
        self.client.parse_delete_task(response)
    }

    pub fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.transport.execute(self.client.build_get_projects())?;
        self.client.parse_get_projects(response)
    }

    pub fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_get_project(project_id))?;
        self.client.parse_get_project(response)
    }

    pub fn get_project_data(&self, project_id: &str) -> Result<ProjectData, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_get_project_data(project_id))?;
        self.client.parse_get_project_data(response)
    }

    pub fn create_project(&self, input: &ProjectCreationRequest) -> Result<Project, ApiError> {
        let response = self.transport.execute(self.client.build_create_project(input)?)?;
        self.client.parse_create_project(response)
    }

    pub fn update_project(
        &self,
        project_id: &str,
        input: &ProjectUpdateRequest,
    ) -> Result<Project, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_update_project(project_id, input)?)?;
        self.client.parse_update_project(response)
    }

    pub fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let response = self
            .transport
            .execute(self.client.build_delete_project(project_id))?;
        self.client.parse_delete_project(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Records every request and answers with a canned response.
    struct Recorder {
        requests: RefCell<Vec<HttpRequest>>,
        status: u16,
        body: String,
    }

    impl Recorder {
        fn new(status: u16, body: &str) -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
                status,
                body: body.to_string(),
            }
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    fn service(recorder: &Recorder) -> TickTickService<&Recorder> {
        TickTickService::new(TickTickClient::new("http://localhost:3000"), recorder)
    }

    #[test]
    fn update_task_id_mismatch_sends_nothing() {
        let recorder = Recorder::new(200, "{}");
        let input = TaskUpdateRequest::new("Y", "6226ff9877acee87727f6bca");
        let err = service(&recorder).update_task("X", &input).unwrap_err();
        assert!(matches!(err, ApiError::TaskIdMismatch { .. }));
        assert!(recorder.requests.borrow().is_empty());
    }

    #[test]
    fn update_task_empty_success_body_is_an_error() {
        let recorder = Recorder::new(200, "");
        let input = TaskUpdateRequest::new("X", "6226ff9877acee87727f6bca");
        let err = service(&recorder).update_task("X", &input).unwrap_err();
        assert_eq!(err.status(), Some(200));
        assert_eq!(recorder.requests.borrow().len(), 1);
    }

    #[test]
    fn get_projects_issues_a_single_get() {
        let recorder = Recorder::new(200, "[]");
        let projects = service(&recorder).get_projects().unwrap();
        assert!(projects.is_empty());
        let requests = recorder.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].path, "http://localhost:3000/open/v1/project");
        assert!(!requests[0].path.contains('?'));
    }

    #[test]
    fn get_projects_forbidden_returns_no_partial_list() {
        let recorder = Recorder::new(403, r#"[{"id":"p","name":"n","closed":false}]"#);
        let err = service(&recorder).get_projects().unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 403, .. }));
    }

    #[test]
    fn delete_task_succeeds_on_no_content() {
        let recorder = Recorder::new(204, "");
        service(&recorder)
            .delete_task("6226ff9877acee87727f6bca", "6247ee29630c800f064fd145")
            .unwrap();
        let requests = recorder.requests.borrow();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert_eq!(
            requests[0].path,
            "http://localhost:3000/open/v1/project/6226ff9877acee87727f6bca/task/6247ee29630c800f064fd145"
        );
    }
}
