//! Locating the source container and finding or creating the destination

use super::error::CloneError;
use crate::api::{Container, NewContainer, TagManagerApi};
use log::{debug, info};

/// Find the container whose public ID ("GTM-XXXXXXX") matches
pub async fn resolve_source(
    api: &dyn TagManagerApi,
    public_id: &str,
    account_id: &str,
) -> Result<Container, CloneError> {
    let containers = api.list_containers(account_id).await?;
    debug!("Account {} has {} containers", account_id, containers.len());

    containers
        .into_iter()
        .find(|c| c.public_id == public_id)
        .ok_or_else(|| CloneError::SourceContainerNotFound {
            public_id: public_id.to_string(),
            account_id: account_id.to_string(),
        })
}

/// Return the container named `name`, creating a web container with that
/// name when none exists. Listing and creating are separate calls, so two
/// concurrent runs could both create one.
pub async fn resolve_destination(
    api: &dyn TagManagerApi,
    name: &str,
    account_id: &str,
) -> Result<Container, CloneError> {
    let containers = api.list_containers(account_id).await?;

    if let Some(existing) = containers.into_iter().find(|c| c.name == name) {
        info!(
            "Using existing container '{}' ({})",
            existing.name,
            existing.path()
        );
        return Ok(existing);
    }

    let created = api
        .create_container(account_id, &NewContainer::web(name))
        .await?;
    info!("Created container '{}' ({})", created.name, created.path());
    Ok(created)
}

/// ID of the first workspace the API lists for the container
pub async fn first_workspace_id(
    api: &dyn TagManagerApi,
    container: &Container,
) -> Result<String, CloneError> {
    api.list_workspaces(container)
        .await?
        .into_iter()
        .next()
        .map(|w| w.workspace_id)
        .ok_or_else(|| CloneError::NoWorkspace {
            path: container.path(),
        })
}
