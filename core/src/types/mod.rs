//! Domain DTOs for the TickTick open API.
//!
//! # Design
//! Every type mirrors a JSON payload of the service and is exchanged by
//! value. Closed enumerations are Rust enums with explicit wire codes, so an
//! unknown code fails decoding instead of being silently dropped. Optional
//! fields are omitted from serialized JSON rather than sent as `null`.

mod project;
mod task;

use thiserror::Error;

pub use project::{
    Column, Permission, Project, ProjectCreationRequest, ProjectData, ProjectKind,
    ProjectUpdateRequest, ViewMode,
};
pub use task::{
    ChecklistItem, ChecklistItemEdit, ChecklistItemStatus, Priority, Task, TaskCreationRequest,
    TaskStatus, TaskUpdateRequest,
};

/// A numeric wire code outside the closed set of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}
