//! Sequencing of a full container clone
//!
//! Variables, then triggers, then tags. Tags go last because their trigger
//! references can only be remapped once the destination triggers exist.
//! Every create is awaited before the next one starts.

use super::cloner::{clone_entity, clone_tag};
use super::error::CloneError;
use super::fetch::{Listing, list_entities, list_tags, list_triggers};
use super::remap::TriggerRemap;
use super::report::{CategoryReport, CloneReport, StaleTriggerRef};
use super::resolver::{first_workspace_id, resolve_destination, resolve_source};
use crate::api::{
    ApiError, Container, Entity, EntityKind, TagManagerApi, Trigger, Variable, WorkspacePath,
};
use log::{error, info, warn};
use std::sync::Arc;

/// What to clone and where to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Account holding the source container
    pub account_id: String,
    /// Public ID of the source container, e.g. "GTM-PR4BRDT"
    pub source_public_id: String,
    /// Name of the destination container; created when missing
    pub destination_name: String,
    /// Defaults to `account_id`
    pub destination_account_id: Option<String>,
}

impl CloneRequest {
    pub fn destination_account_id(&self) -> &str {
        self.destination_account_id
            .as_deref()
            .unwrap_or(&self.account_id)
    }
}

pub struct ContainerCloner {
    api: Arc<dyn TagManagerApi>,
}

impl ContainerCloner {
    pub fn new(api: Arc<dyn TagManagerApi>) -> Self {
        Self { api }
    }

    /// Resolve both containers, then copy every variable, trigger and tag.
    ///
    /// Only container resolution can fail the call. Once both containers are
    /// known, failures are recorded in the returned report.
    pub async fn clone_container(&self, request: &CloneRequest) -> Result<CloneReport, CloneError> {
        info!(
            "Cloning container {} (account {}) into '{}' (account {})",
            request.source_public_id,
            request.account_id,
            request.destination_name,
            request.destination_account_id()
        );

        let api = self.api.as_ref();
        let source = resolve_source(api, &request.source_public_id, &request.account_id).await?;
        let destination = resolve_destination(
            api,
            &request.destination_name,
            request.destination_account_id(),
        )
        .await?;

        Ok(self.clone_entities(source, destination).await)
    }

    pub async fn clone_entities(&self, source: Container, destination: Container) -> CloneReport {
        let mut report = CloneReport::new(source, destination);

        let (source_workspace, destination_workspace) = self.resolve_workspaces(&mut report).await;
        let source_path = WorkspacePath::new(&report.source, source_workspace);
        let destination_path = WorkspacePath::new(&report.destination, destination_workspace);

        report.variables = self
            .clone_all::<Variable>(&source_path, &destination_path)
            .await;
        report.triggers = self
            .clone_all::<Trigger>(&source_path, &destination_path)
            .await;
        self.clone_all_tags(&source_path, &destination_path, &mut report)
            .await;

        info!(
            "Container cloning completed: {} variables, {} triggers, {} tags created; {} failures",
            report.variables.created(),
            report.triggers.created(),
            report.tags.created(),
            report.failure_count()
        );
        report
    }

    /// First workspace of each container. A failure is recorded and the run
    /// carries on with whatever was resolved before it.
    async fn resolve_workspaces(&self, report: &mut CloneReport) -> (Option<String>, Option<String>) {
        let api = self.api.as_ref();

        let source = match first_workspace_id(api, &report.source).await {
            Ok(id) => id,
            Err(e) => {
                error!("Could not resolve source workspace: {}", e);
                report.workspace_error = Some(e.to_string());
                return (None, None);
            }
        };

        match first_workspace_id(api, &report.destination).await {
            Ok(id) => (Some(source), Some(id)),
            Err(e) => {
                error!("Could not resolve destination workspace: {}", e);
                report.workspace_error = Some(e.to_string());
                (Some(source), None)
            }
        }
    }

    async fn clone_all<E: Entity>(
        &self,
        source: &WorkspacePath,
        destination: &WorkspacePath,
    ) -> CategoryReport {
        let api = self.api.as_ref();
        let mut category = CategoryReport::new(E::KIND);

        let listing = match list_entities::<E>(api, source).await {
            Ok(listing) => listing,
            Err(e) => {
                error!("Could not list {} in {}: {}", E::KIND.collection(), source, e);
                category.fetch_error = Some(e.to_string());
                return category;
            }
        };

        info!("Cloning {} {}", listing.len(), E::KIND.collection());
        category.outcomes.extend(listing.undecodable);
        for entity in &listing.entities {
            category
                .outcomes
                .push(clone_entity(api, destination, entity).await);
        }
        category
    }

    async fn clone_all_tags(
        &self,
        source: &WorkspacePath,
        destination: &WorkspacePath,
        report: &mut CloneReport,
    ) {
        let api = self.api.as_ref();
        let mut category = CategoryReport::new(EntityKind::Tag);

        let tags = match list_tags(api, source).await {
            Ok(listing) => listing,
            Err(e) => {
                error!("Could not list tags in {}: {}", source, e);
                category.fetch_error = Some(e.to_string());
                report.tags = category;
                return;
            }
        };

        let remap = self.build_remap(source, destination, report).await;
        report.ambiguous_trigger_names = remap.ambiguous_names().iter().cloned().collect();

        info!("Cloning {} tags ({} trigger references remapped)", tags.len(), remap.len());
        category.outcomes.extend(tags.undecodable);
        for tag in &tags.entities {
            let (outcome, stale) = clone_tag(api, destination, tag, &remap).await;
            for trigger_id in stale {
                warn!(
                    "Tag '{}' keeps trigger reference {} which has no counterpart in the destination",
                    tag.name, trigger_id
                );
                report.stale_trigger_refs.push(StaleTriggerRef {
                    tag: tag.name.clone(),
                    trigger_id,
                });
            }
            category.outcomes.push(outcome);
        }

        report.tags = category;
    }

    /// Source triggers joined with the destination triggers as they are now,
    /// after trigger cloning. A failed listing leaves that side empty and is
    /// recorded in [`CloneReport::trigger_remap_error`].
    async fn build_remap(
        &self,
        source: &WorkspacePath,
        destination: &WorkspacePath,
        report: &mut CloneReport,
    ) -> TriggerRemap {
        let api = self.api.as_ref();

        let mut errors = Vec::new();
        let mut triggers_in = |side: &str, listed: Result<Listing<Trigger>, ApiError>| match listed {
            Ok(listing) => listing.entities,
            Err(e) => {
                warn!(
                    "Could not list {} triggers, tag references will be copied unchanged: {}",
                    side, e
                );
                errors.push(format!("{} triggers: {}", side, e));
                Vec::new()
            }
        };
        let source_triggers = triggers_in("source", list_triggers(api, source).await);
        let destination_triggers = triggers_in("destination", list_triggers(api, destination).await);

        if !errors.is_empty() {
            report.trigger_remap_error = Some(errors.join("; "));
        }
        TriggerRemap::build(&source_triggers, &destination_triggers)
    }
}
