//! Google Tag Manager v2 API
//!
//! The cloning code only ever talks to [`TagManagerApi`]: list and create
//! calls scoped by parent path. [`TagManagerClient`] is the HTTP
//! implementation; tests substitute an in-memory one.

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod resilience;

use async_trait::async_trait;
use serde_json::Value;

pub use client::TagManagerClient;
pub use error::ApiError;
pub use models::{
    Container, Entity, EntityKind, NewContainer, Tag, Trigger, Variable, Workspace, WorkspacePath,
};
pub use resilience::{ResilienceConfig, RetryConfig, RetryPolicy, RetryableError};

/// The slice of the Tag Manager API this tool needs
#[async_trait]
pub trait TagManagerApi: Send + Sync {
    /// `GET accounts/{a}/containers`, all pages
    async fn list_containers(&self, account_id: &str) -> Result<Vec<Container>, ApiError>;

    /// `POST accounts/{a}/containers`
    async fn create_container(
        &self,
        account_id: &str,
        container: &NewContainer,
    ) -> Result<Container, ApiError>;

    /// `GET accounts/{a}/containers/{c}/workspaces`, in server order
    async fn list_workspaces(&self, container: &Container) -> Result<Vec<Workspace>, ApiError>;

    /// `GET .../workspaces/{w}/{tags|triggers|variables}` as raw JSON objects
    async fn list_entities(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
    ) -> Result<Vec<Value>, ApiError>;

    /// `POST .../workspaces/{w}/{tags|triggers|variables}`, returns the created entity
    async fn create_entity(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
        body: &Value,
    ) -> Result<Value, ApiError>;
}
