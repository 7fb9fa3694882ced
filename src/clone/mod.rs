//! Container cloning
//!
//! [`ContainerCloner`] resolves the source and destination containers and
//! copies variables, triggers and tags in that order, remapping each tag's
//! trigger references onto the newly created triggers.

pub mod cloner;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod remap;
pub mod report;
pub mod resolver;

pub use cloner::{STRIPPED_FIELDS, strip_server_fields};
pub use error::CloneError;
pub use orchestrator::{CloneRequest, ContainerCloner};
pub use remap::TriggerRemap;
pub use report::{CategoryReport, CloneReport, EntityOutcome, StaleTriggerRef};
pub use resolver::{first_workspace_id, resolve_destination, resolve_source};
