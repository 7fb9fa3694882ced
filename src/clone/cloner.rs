//! Re-creating single entities in the destination workspace

use super::remap::TriggerRemap;
use super::report::EntityOutcome;
use crate::api::{Entity, Tag, TagManagerApi, WorkspacePath};
use log::{error, info};
use serde_json::Value;

/// Fields scoped to the source container or assigned by the server; the
/// create endpoint rejects or overrides them.
pub const STRIPPED_FIELDS: [&str; 6] = [
    "path",
    "accountId",
    "containerId",
    "workspaceId",
    "fingerprint",
    "tagManagerUrl",
];

/// Copy of the entity without its ID and without any [`STRIPPED_FIELDS`]
pub fn strip_server_fields<E: Entity>(entity: &E) -> E {
    let mut stripped = entity.clone();
    stripped.clear_id();

    let fields = stripped.fields_mut();
    for field in STRIPPED_FIELDS {
        fields.remove(field);
    }
    fields.remove(E::KIND.id_field());

    stripped
}

/// Create one entity in the destination. Failures are logged and returned as
/// [`EntityOutcome::Failed`]; they never abort the caller's batch.
pub async fn clone_entity<E: Entity>(
    api: &dyn TagManagerApi,
    destination: &WorkspacePath,
    entity: &E,
) -> EntityOutcome {
    let name = entity.name().to_string();
    let source_id = entity.id().map(str::to_string);

    let body = match serde_json::to_value(strip_server_fields(entity)) {
        Ok(body) => body,
        Err(e) => {
            error!("Could not serialize {} '{}': {}", E::KIND, name, e);
            return EntityOutcome::Failed {
                name,
                source_id,
                error: e.to_string(),
            };
        }
    };

    match api.create_entity(E::KIND, destination, &body).await {
        Ok(created) => {
            info!("{} created: {}", E::KIND, name);
            let new_id = created
                .get(E::KIND.id_field())
                .and_then(Value::as_str)
                .map(str::to_string);
            EntityOutcome::Created {
                name,
                source_id,
                new_id,
            }
        }
        Err(e) => {
            error!("Failed to create {} '{}' in {}: {}", E::KIND, name, destination, e);
            EntityOutcome::Failed {
                name,
                source_id,
                error: e.to_string(),
            }
        }
    }
}

/// Rewrite the tag's trigger references through `remap`, then create it.
/// Also returns the source trigger IDs that were carried over unmapped.
pub async fn clone_tag(
    api: &dyn TagManagerApi,
    destination: &WorkspacePath,
    tag: &Tag,
    remap: &TriggerRemap,
) -> (EntityOutcome, Vec<String>) {
    let mut tag = tag.clone();
    let stale = remap.rewrite_tag(&mut tag);
    (clone_entity(api, destination, &tag).await, stale)
}
