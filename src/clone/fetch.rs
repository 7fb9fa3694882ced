//! Typed listing of workspace entities

use super::report::EntityOutcome;
use crate::api::{ApiError, Entity, Tag, TagManagerApi, Trigger, Variable, WorkspacePath};
use log::warn;
use serde_json::Value;

/// Entities of one kind as listed, split into those that decoded and those
/// that did not fit the typed model
#[derive(Debug, Clone)]
pub struct Listing<E> {
    pub entities: Vec<E>,
    pub undecodable: Vec<EntityOutcome>,
}

impl<E> Listing<E> {
    pub fn len(&self) -> usize {
        self.entities.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List every entity of kind `E` in the workspace. Only the listing call
/// itself can fail; an entity that does not decode becomes a
/// [`EntityOutcome::Failed`] in [`Listing::undecodable`].
pub async fn list_entities<E: Entity>(
    api: &dyn TagManagerApi,
    workspace: &WorkspacePath,
) -> Result<Listing<E>, ApiError> {
    let raw = api.list_entities(E::KIND, workspace).await?;

    let mut listing = Listing {
        entities: Vec::with_capacity(raw.len()),
        undecodable: Vec::new(),
    };
    for value in raw {
        match decode::<E>(value, workspace) {
            Ok(entity) => listing.entities.push(entity),
            Err(outcome) => listing.undecodable.push(outcome),
        }
    }
    Ok(listing)
}

fn decode<E: Entity>(value: Value, workspace: &WorkspacePath) -> Result<E, EntityOutcome> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();
    let source_id = value
        .get(E::KIND.id_field())
        .and_then(Value::as_str)
        .map(str::to_string);

    serde_json::from_value(value).map_err(|e| {
        let error = ApiError::Decode {
            url: format!("{}/{}", workspace, E::KIND.collection()),
            message: e.to_string(),
        };
        warn!("Skipping {} '{}': {}", E::KIND, name, error);
        EntityOutcome::Failed {
            name,
            source_id,
            error: error.to_string(),
        }
    })
}

pub async fn list_tags(
    api: &dyn TagManagerApi,
    workspace: &WorkspacePath,
) -> Result<Listing<Tag>, ApiError> {
    list_entities(api, workspace).await
}

pub async fn list_triggers(
    api: &dyn TagManagerApi,
    workspace: &WorkspacePath,
) -> Result<Listing<Trigger>, ApiError> {
    list_entities(api, workspace).await
}

pub async fn list_variables(
    api: &dyn TagManagerApi,
    workspace: &WorkspacePath,
) -> Result<Listing<Variable>, ApiError> {
    list_entities(api, workspace).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EntityKind;
    use crate::test_support::FakeTagManager;
    use serde_json::json;

    #[tokio::test]
    async fn test_lists_each_kind_typed() {
        let fake = FakeTagManager::new();
        let container = fake.add_container("1", "c", "GTM-A");
        fake.seed(&container, EntityKind::Tag, json!({"tagId": "9", "name": "tag", "firingTriggerId": ["4"]}));
        fake.seed(&container, EntityKind::Trigger, json!({"triggerId": "4", "name": "trigger"}));
        fake.seed(&container, EntityKind::Variable, json!({"variableId": "2", "name": "var"}));
        let workspace = fake.workspace(&container);

        let tags = list_tags(&fake, &workspace).await.unwrap();
        let triggers = list_triggers(&fake, &workspace).await.unwrap();
        let variables = list_variables(&fake, &workspace).await.unwrap();

        assert_eq!(tags.entities[0].firing_trigger_id, vec!["4"]);
        assert_eq!(triggers.entities[0].trigger_id.as_deref(), Some("4"));
        assert_eq!(variables.entities[0].name, "var");
        assert_eq!(variables.entities[0].fields["fingerprint"], "1700000000000");
        assert!(tags.undecodable.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entity_fails_alone() {
        let fake = FakeTagManager::new();
        let container = fake.add_container("1", "c", "GTM-A");
        fake.seed(&container, EntityKind::Tag, json!({"tagId": "9", "name": "broken", "firingTriggerId": "not-a-list"}));
        fake.seed(&container, EntityKind::Tag, json!({"tagId": "10", "name": "fine", "firingTriggerId": ["4"]}));

        let tags = list_tags(&fake, &fake.workspace(&container)).await.unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.entities.len(), 1);
        assert_eq!(tags.entities[0].name, "fine");
        match &tags.undecodable[..] {
            [EntityOutcome::Failed { name, source_id, error }] => {
                assert_eq!(name, "broken");
                assert_eq!(source_id.as_deref(), Some("9"));
                assert!(error.contains("tags"), "{error}");
            }
            other => panic!("unexpected outcomes: {other:?}"),
        }
    }
}
