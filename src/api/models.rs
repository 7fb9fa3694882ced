//! Tag Manager resources as the v2 API returns them
//!
//! Only the fields this tool reads are typed. Everything else lands in the
//! flattened `fields` map so it is sent back unchanged when an entity is
//! re-created in another container.

use super::constants;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub account_id: String,
    pub container_id: String,
    #[serde(default)]
    pub name: String,
    /// "GTM-XXXXXXX"
    #[serde(default)]
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_context: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Container {
    pub fn path(&self) -> String {
        constants::container_path(&self.account_id, &self.container_id)
    }
}

/// Request body for `accounts.containers.create`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    pub name: String,
    pub usage_context: Vec<String>,
}

impl NewContainer {
    pub fn web(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage_context: vec![constants::WEB_USAGE_CONTEXT.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Parent of tags, triggers and variables. `workspace_id` is `None` when the
/// workspace lookup failed; every call against such a path fails on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePath {
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: Option<String>,
}

impl WorkspacePath {
    pub fn new(container: &Container, workspace_id: Option<String>) -> Self {
        Self {
            account_id: container.account_id.clone(),
            container_id: container.container_id.clone(),
            workspace_id,
        }
    }

    /// `accounts/{a}/containers/{c}/workspaces/{w}`, if the workspace is known
    pub fn parent(&self) -> Option<String> {
        self.workspace_id
            .as_deref()
            .map(|w| constants::workspace_path(&self.account_id, &self.container_id, w))
    }
}

impl fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/workspaces/{}",
            constants::container_path(&self.account_id, &self.container_id),
            self.workspace_id.as_deref().unwrap_or("<unresolved>")
        )
    }
}

/// The three workspace collections this tool clones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tag,
    Trigger,
    Variable,
}

impl EntityKind {
    /// URL segment, e.g. `tags`
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Tag => "tags",
            EntityKind::Trigger => "triggers",
            EntityKind::Variable => "variables",
        }
    }

    /// Array field of the list response, e.g. `{"tag": [...]}`
    pub fn list_field(self) -> &'static str {
        match self {
            EntityKind::Tag => "tag",
            EntityKind::Trigger => "trigger",
            EntityKind::Variable => "variable",
        }
    }

    /// Server-assigned id field, e.g. `tagId`
    pub fn id_field(self) -> &'static str {
        match self {
            EntityKind::Tag => "tagId",
            EntityKind::Trigger => "triggerId",
            EntityKind::Variable => "variableId",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Tag => "Tag",
            EntityKind::Trigger => "Trigger",
            EntityKind::Variable => "Variable",
        })
    }
}

/// A workspace entity that can be listed from one container and created in another
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Option<&str>;
    fn clear_id(&mut self);
    fn name(&self) -> &str;
    fn fields_mut(&mut self) -> &mut Map<String, Value>;
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr, $id:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> Option<&str> {
                self.$id.as_deref()
            }

            fn clear_id(&mut self) {
                self.$id = None;
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn fields_mut(&mut self) -> &mut Map<String, Value> {
                &mut self.fields
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub firing_trigger_id: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl_entity!(Tag, EntityKind::Tag, tag_id);
impl_entity!(Trigger, EntityKind::Trigger, trigger_id);
impl_entity!(Variable, EntityKind::Variable, variable_id);
