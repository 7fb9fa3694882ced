//! Per-run summary of what was copied and what was not

use crate::api::{Container, EntityKind};

/// Result of re-creating one entity in the destination
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    Created {
        name: String,
        source_id: Option<String>,
        new_id: Option<String>,
    },
    Failed {
        name: String,
        source_id: Option<String>,
        error: String,
    },
}

impl EntityOutcome {
    pub fn name(&self) -> &str {
        match self {
            EntityOutcome::Created { name, .. } | EntityOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, EntityOutcome::Created { .. })
    }
}

/// Outcomes for one entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub kind: EntityKind,
    /// Set when the source listing failed and nothing of this kind was attempted
    pub fetch_error: Option<String>,
    pub outcomes: Vec<EntityOutcome>,
}

impl CategoryReport {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            fetch_error: None,
            outcomes: Vec::new(),
        }
    }

    pub fn created(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_created()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| !o.is_created())
    }

    pub fn is_clean(&self) -> bool {
        self.fetch_error.is_none() && self.failures().next().is_none()
    }
}

/// A tag trigger reference that had no destination counterpart and was copied as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleTriggerRef {
    pub tag: String,
    pub trigger_id: String,
}

#[derive(Debug, Clone)]
pub struct CloneReport {
    pub source: Container,
    pub destination: Container,
    /// Workspace lookup failure; every category will have failed after it
    pub workspace_error: Option<String>,
    pub variables: CategoryReport,
    pub triggers: CategoryReport,
    pub tags: CategoryReport,
    /// Trigger names shared by more than one trigger in source or destination
    pub ambiguous_trigger_names: Vec<String>,
    /// Trigger listing failure while building the remap; tags were copied
    /// with their source trigger references
    pub trigger_remap_error: Option<String>,
    pub stale_trigger_refs: Vec<StaleTriggerRef>,
}

impl CloneReport {
    pub fn new(source: Container, destination: Container) -> Self {
        Self {
            source,
            destination,
            workspace_error: None,
            variables: CategoryReport::new(EntityKind::Variable),
            triggers: CategoryReport::new(EntityKind::Trigger),
            tags: CategoryReport::new(EntityKind::Tag),
            ambiguous_trigger_names: Vec::new(),
            trigger_remap_error: None,
            stale_trigger_refs: Vec::new(),
        }
    }

    /// Categories in the order they were cloned
    pub fn categories(&self) -> [&CategoryReport; 3] {
        [&self.variables, &self.triggers, &self.tags]
    }

    pub fn failure_count(&self) -> usize {
        self.categories()
            .iter()
            .map(|c| c.failures().count() + usize::from(c.fetch_error.is_some()))
            .sum::<usize>()
            + usize::from(self.workspace_error.is_some())
            + usize::from(self.trigger_remap_error.is_some())
    }

    /// True when every entity was copied and nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }
}
