//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each operation vector describes inputs, the expected request, a simulated
//! response, and either the expected parse result or the expected HTTP
//! status of the error. Comparing parsed JSON (not raw strings) avoids false
//! negatives from field-ordering differences.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use ticktick_core::{
    ApiError, ChecklistItem, HttpMethod, HttpRequest, HttpResponse, Project,
    ProjectCreationRequest, ProjectData, ProjectKind, ProjectUpdateRequest, Task,
    TaskCreationRequest, TaskUpdateRequest, TickTickClient, ViewMode,
};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> TickTickClient {
    TickTickClient::new(BASE_URL)
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn str_arg<'a>(case: &'a Value, key: &str) -> &'a str {
    case[key].as_str().unwrap_or_else(|| panic!("missing {key}"))
}

fn input<T: DeserializeOwned>(case: &Value) -> T {
    serde_json::from_value(case["input"].clone()).unwrap()
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(
        req.method,
        parse_method(expected["method"].as_str().unwrap()),
        "{name}: method"
    );
    assert_eq!(
        req.path,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: path"
    );

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .map(|headers| {
            headers
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (
                        arr[0].as_str().unwrap().to_string(),
                        arr[1].as_str().unwrap().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match &expected["body"] {
        Value::Null => assert!(req.body.is_none(), "{name}: unexpected body"),
        body => {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Check a parse result against `expected_result` or `expected_error`.
/// A case without either expects a successful unit result.
fn check_outcome<T>(name: &str, case: &Value, result: Result<T, ApiError>)
where
    T: DeserializeOwned + PartialEq + Debug,
{
    match case["expected_error"].as_u64() {
        Some(status) => {
            let err = result.expect_err(name);
            assert_eq!(err.status(), Some(status as u16), "{name}: error status");
        }
        None => {
            let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// decode -> encode reproduces the fixture, and decoding again is a fixed point.
fn round_trip<T>(name: &str, json: &Value)
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let decoded: T = serde_json::from_value(json.clone()).unwrap();
    let encoded = serde_json::to_value(&decoded).unwrap();
    assert_eq!(&encoded, json, "{name}: re-encoded json");
    let again: T = serde_json::from_value(encoded).unwrap();
    assert_eq!(again, decoded, "{name}: second decode");
}

#[test]
fn entity_test_vectors() {
    for case in load(include_str!("../../test-vectors/entities.json")) {
        let name = str_arg(&case, "name");
        let json = &case["json"];
        match str_arg(&case, "kind") {
            "project" => round_trip::<Project>(name, json),
            "task" => round_trip::<Task>(name, json),
            "checklist_item" => round_trip::<ChecklistItem>(name, json),
            "project_data" => round_trip::<ProjectData>(name, json),
            other => panic!("{name}: unknown kind {other}"),
        }
    }
}

#[test]
fn created_project_matches_fixture() {
    let cases = load(include_str!("../../test-vectors/projects.json"));
    let case = cases
        .iter()
        .find(|c| c["name"] == "create project")
        .unwrap();

    let project = client().parse_create_project(simulated(case)).unwrap();
    assert_eq!(
        project,
        Project {
            id: "6226ff9877acee87727f6bca".to_string(),
            name: "project name".to_string(),
            color: Some("#F18181".to_string()),
            sort_order: None,
            is_closed: false,
            group_id: Some("6436176a47fd2e05f26ef56e".to_string()),
            view_mode: Some(ViewMode::List),
            permission: None,
            kind: Some(ProjectKind::Task),
        }
    );
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[test]
fn project_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/projects.json")) {
        let name = str_arg(&case, "name");
        let expected_req = &case["expected_request"];

        match str_arg(&case, "operation") {
            "get_projects" => {
                check_request(name, &c.build_get_projects(), expected_req);
                check_outcome(name, &case, c.parse_get_projects(simulated(&case)));
            }
            "get_project" => {
                let req = c.build_get_project(str_arg(&case, "project_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_get_project(simulated(&case)));
            }
            "get_project_data" => {
                let req = c.build_get_project_data(str_arg(&case, "project_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_get_project_data(simulated(&case)));
            }
            "create_project" => {
                let body: ProjectCreationRequest = input(&case);
                let req = c.build_create_project(&body).unwrap();
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_create_project(simulated(&case)));
            }
            "update_project" => {
                let body: ProjectUpdateRequest = input(&case);
                let req = c
                    .build_update_project(str_arg(&case, "project_id"), &body)
                    .unwrap();
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_update_project(simulated(&case)));
            }
            "delete_project" => {
                let req = c.build_delete_project(str_arg(&case, "project_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_delete_project(simulated(&case)));
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[test]
fn task_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/tasks.json")) {
        let name = str_arg(&case, "name");
        let expected_req = &case["expected_request"];

        match str_arg(&case, "operation") {
            "get_task" => {
                let req = c.build_get_task(str_arg(&case, "project_id"), str_arg(&case, "task_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_get_task(simulated(&case)));
            }
            "create_task" => {
                let body: TaskCreationRequest = input(&case);
                let req = c.build_create_task(&body).unwrap();
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_create_task(simulated(&case)));
            }
            "update_task" => {
                let body: TaskUpdateRequest = input(&case);
                let req = c.build_update_task(str_arg(&case, "task_id"), &body).unwrap();
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_update_task(&body, simulated(&case)));
            }
            "complete_task" => {
                let req =
                    c.build_complete_task(str_arg(&case, "project_id"), str_arg(&case, "task_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_complete_task(simulated(&case)));
            }
            "delete_task" => {
                let req =
                    c.build_delete_task(str_arg(&case, "project_id"), str_arg(&case, "task_id"));
                check_request(name, &req, expected_req);
                check_outcome(name, &case, c.parse_delete_task(simulated(&case)));
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

#[test]
fn update_task_with_mismatched_id_builds_nothing() {
    let input = TaskUpdateRequest::new("63b7bebb91c0a5474805fcd4", "6226ff9877acee87727f6bca");
    let err = client().build_update_task("someone-else", &input).unwrap_err();
    assert!(matches!(err, ApiError::TaskIdMismatch { .. }));
}
