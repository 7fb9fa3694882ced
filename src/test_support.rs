//! In-memory Tag Manager for exercising the cloner without the network.
//!
//! Entities are stored per workspace path and per kind, in insertion order.
//! Created entities get fresh numeric IDs and the same server-owned fields
//! the real API adds, so stripped-field checks see realistic input.

use crate::api::{
    ApiError, Container, EntityKind, NewContainer, TagManagerApi, Workspace, WorkspacePath,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One recorded call against the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListContainers(String),
    CreateContainer(String),
    ListWorkspaces(String),
    ListEntities(EntityKind, String),
    CreateEntity(EntityKind, String, Value),
}

#[derive(Default)]
struct State {
    containers: Vec<Container>,
    workspaces: HashMap<String, Vec<Workspace>>,
    entities: HashMap<(String, EntityKind), Vec<Value>>,
    calls: Vec<Call>,
    fail_create: HashSet<(EntityKind, String)>,
    fail_workspaces: HashSet<String>,
    /// Listings still allowed to succeed before every later one fails
    fail_list: HashMap<(String, EntityKind), usize>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        (1000 + self.next_id).to_string()
    }

    fn add_container(&mut self, account_id: &str, name: &str, public_id: &str) -> Container {
        let container_id = self.next_id();
        let container = Container {
            account_id: account_id.to_string(),
            container_id: container_id.clone(),
            name: name.to_string(),
            public_id: public_id.to_string(),
            usage_context: vec!["web".to_string()],
            fields: Map::new(),
        };

        let workspace = Workspace {
            account_id: account_id.to_string(),
            container_id,
            workspace_id: self.next_id(),
            name: "Default Workspace".to_string(),
            fields: Map::new(),
        };
        self.workspaces.insert(container.path(), vec![workspace]);
        self.containers.push(container.clone());
        container
    }
}

#[derive(Default)]
pub struct FakeTagManager {
    state: Mutex<State>,
}

impl FakeTagManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a container with a single default workspace
    pub fn add_container(&self, account_id: &str, name: &str, public_id: &str) -> Container {
        self.state().add_container(account_id, name, public_id)
    }

    /// Path of the first workspace of `container`
    pub fn workspace(&self, container: &Container) -> WorkspacePath {
        let id = self.state().workspaces.get(&container.path()).and_then(|ws| {
            ws.first().map(|w| w.workspace_id.clone())
        });
        WorkspacePath::new(container, id)
    }

    /// Store an entity as the API would return it. The ID in `entity` is
    /// kept as given; path and the other server fields are filled in.
    pub fn seed(&self, container: &Container, kind: EntityKind, entity: Value) {
        let workspace = self.workspace(container);
        let Some(parent) = workspace.parent() else {
            return;
        };
        let id = entity
            .get(kind.id_field())
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut state = self.state();
        let id = id.unwrap_or_else(|| state.next_id());
        let stored = with_server_fields(kind, &workspace, &parent, &id, entity);
        state.entities.entry((parent, kind)).or_default().push(stored);
    }

    /// Make every create of `kind` named `name` fail with a 400
    pub fn fail_create(&self, kind: EntityKind, name: &str) {
        self.state().fail_create.insert((kind, name.to_string()));
    }

    /// Make workspace listing fail for `container`
    pub fn fail_workspaces(&self, container: &Container) {
        self.state().fail_workspaces.insert(container.path());
    }

    /// Make listing `kind` fail in the first workspace of `container`
    pub fn fail_list(&self, container: &Container, kind: EntityKind) {
        self.fail_list_after(container, kind, 0);
    }

    /// Let `successes` listings of `kind` through, then fail every later one
    pub fn fail_list_after(&self, container: &Container, kind: EntityKind, successes: usize) {
        if let Some(parent) = self.workspace(container).parent() {
            self.state().fail_list.insert((parent, kind), successes);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Bodies of every create call, in call order
    pub fn created_bodies(&self) -> Vec<(EntityKind, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateEntity(kind, _, body) => Some((kind, body)),
                _ => None,
            })
            .collect()
    }

    /// Entities currently stored in the first workspace of `container`
    pub fn entities(&self, container: &Container, kind: EntityKind) -> Vec<Value> {
        let Some(parent) = self.workspace(container).parent() else {
            return Vec::new();
        };
        self.state()
            .entities
            .get(&(parent, kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn containers(&self, account_id: &str) -> Vec<Container> {
        self.state()
            .containers
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect()
    }
}

fn with_server_fields(
    kind: EntityKind,
    workspace: &WorkspacePath,
    parent: &str,
    id: &str,
    entity: Value,
) -> Value {
    let mut object = match entity {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    object.insert(kind.id_field().to_string(), json!(id));
    object.insert(
        "path".to_string(),
        json!(format!("{}/{}/{}", parent, kind.collection(), id)),
    );
    object.insert("accountId".to_string(), json!(workspace.account_id));
    object.insert("containerId".to_string(), json!(workspace.container_id));
    object.insert("workspaceId".to_string(), json!(workspace.workspace_id));
    object.insert("fingerprint".to_string(), json!("1700000000000"));
    object.insert(
        "tagManagerUrl".to_string(),
        json!(format!("https://tagmanager.google.com/#/container/{}", parent)),
    );
    Value::Object(object)
}

fn missing_workspace(workspace: &WorkspacePath) -> ApiError {
    ApiError::MissingWorkspace {
        account_id: workspace.account_id.clone(),
        container_id: workspace.container_id.clone(),
    }
}

fn bad_request(method: &str, url: &str, message: &str) -> ApiError {
    ApiError::Http {
        status: 400,
        method: method.to_string(),
        url: url.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl TagManagerApi for FakeTagManager {
    async fn list_containers(&self, account_id: &str) -> Result<Vec<Container>, ApiError> {
        self.state()
            .calls
            .push(Call::ListContainers(account_id.to_string()));
        Ok(self.containers(account_id))
    }

    async fn create_container(
        &self,
        account_id: &str,
        container: &NewContainer,
    ) -> Result<Container, ApiError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::CreateContainer(container.name.clone()));
        let public_id = format!("GTM-FAKE{}", state.next_id);
        Ok(state.add_container(account_id, &container.name, &public_id))
    }

    async fn list_workspaces(&self, container: &Container) -> Result<Vec<Workspace>, ApiError> {
        let path = container.path();
        let mut state = self.state();
        state.calls.push(Call::ListWorkspaces(path.clone()));

        if state.fail_workspaces.contains(&path) {
            return Err(ApiError::Http {
                status: 403,
                method: "GET".to_string(),
                url: format!("{}/workspaces", path),
                message: "The caller does not have permission".to_string(),
            });
        }
        Ok(state.workspaces.get(&path).cloned().unwrap_or_default())
    }

    async fn list_entities(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
    ) -> Result<Vec<Value>, ApiError> {
        let parent = workspace.parent().ok_or_else(|| missing_workspace(workspace))?;
        let mut state = self.state();
        state.calls.push(Call::ListEntities(kind, parent.clone()));

        let key = (parent, kind);
        if let Some(remaining) = state.fail_list.get_mut(&key) {
            if *remaining == 0 {
                return Err(bad_request("GET", &key.0, "listing disabled"));
            }
            *remaining -= 1;
        }
        Ok(state.entities.get(&key).cloned().unwrap_or_default())
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        workspace: &WorkspacePath,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let parent = workspace.parent().ok_or_else(|| missing_workspace(workspace))?;
        let mut state = self.state();
        state
            .calls
            .push(Call::CreateEntity(kind, parent.clone(), body.clone()));

        let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
        if state.fail_create.contains(&(kind, name.to_string())) {
            return Err(bad_request("POST", &parent, "Invalid entity"));
        }

        let id = state.next_id();
        let created = with_server_fields(kind, workspace, &parent, &id, body.clone());
        state
            .entities
            .entry((parent, kind))
            .or_default()
            .push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_created_entities_are_listed_with_server_fields() {
        let fake = FakeTagManager::new();
        let container = fake.add_container("1", "c", "GTM-A");
        let workspace = fake.workspace(&container);

        fake.create_entity(EntityKind::Trigger, &workspace, &json!({"name": "t"}))
            .await
            .unwrap();

        let listed = fake
            .list_entities(EntityKind::Trigger, &workspace)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "t");
        assert!(listed[0].get("triggerId").is_some());
        assert!(listed[0].get("fingerprint").is_some());
    }

    #[tokio::test]
    async fn test_listing_fails_after_allowed_successes() {
        let fake = FakeTagManager::new();
        let container = fake.add_container("1", "c", "GTM-A");
        let workspace = fake.workspace(&container);
        fake.fail_list_after(&container, EntityKind::Trigger, 1);

        assert!(fake.list_entities(EntityKind::Trigger, &workspace).await.is_ok());
        assert!(fake.list_entities(EntityKind::Trigger, &workspace).await.is_err());
        assert!(fake.list_entities(EntityKind::Trigger, &workspace).await.is_err());
        assert!(fake.list_entities(EntityKind::Tag, &workspace).await.is_ok());
    }

    #[tokio::test]
    async fn test_unresolved_workspace_is_rejected() {
        let fake = FakeTagManager::new();
        let container = fake.add_container("1", "c", "GTM-A");
        let workspace = WorkspacePath::new(&container, None);

        let err = fake
            .list_entities(EntityKind::Tag, &workspace)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingWorkspace { .. }));
    }
}
