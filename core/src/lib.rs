//! Client library for the TickTick open API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A [`Transport`] executes the
//! round-trip; [`TickTickService`] composes both into one call per operation.
//! The [`auth`] module runs the OAuth2 authorization-code flow that yields
//! the bearer token the transport sends.
//!
//! # Design
//! - `TickTickClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Any non-2xx status becomes [`ApiError::Http`] carrying the raw body.

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use auth::{ApplicationConfig, Authenticator, OAuthToken, Scope};
pub use client::{TickTickClient, DEFAULT_API_URL};
pub use error::{ApiError, AuthError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::TickTickService;
pub use transport::{Transport, UreqTransport};
pub use types::{
    ChecklistItem, ChecklistItemEdit, ChecklistItemStatus, Column, Priority, Project,
    ProjectCreationRequest, ProjectData, ProjectKind, ProjectUpdateRequest, Task,
    TaskCreationRequest, TaskStatus, TaskUpdateRequest, ViewMode,
};
