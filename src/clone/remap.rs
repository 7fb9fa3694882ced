//! Trigger reference remapping
//!
//! Tags point at triggers by server-assigned ID. Re-created triggers get new
//! IDs in the destination, so every `firingTriggerId` entry is translated
//! through a table joined on trigger name:
//!
//! 1. name -> source trigger ID (last one wins on a name collision)
//! 2. source trigger ID -> destination trigger ID, for every destination
//!    trigger whose name appears in (1)
//! 3. entries with no counterpart are left as they are
//!
//! Colliding names are still resolved last-write-wins, but they are kept in
//! [`TriggerRemap::ambiguous_names`] and logged so the operator can check the
//! affected tags by hand.

use crate::api::{Entity, Tag, Trigger};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct TriggerRemap {
    source_to_destination: HashMap<String, String>,
    source_ids: HashSet<String>,
    ambiguous_names: BTreeSet<String>,
}

impl TriggerRemap {
    /// Build the table from the source triggers and the destination triggers
    /// as they exist after trigger cloning finished.
    pub fn build(source: &[Trigger], destination: &[Trigger]) -> Self {
        let mut ambiguous_names = BTreeSet::new();

        let mut name_to_source_id: HashMap<&str, &str> = HashMap::new();
        for trigger in source {
            let Some(id) = trigger.id() else { continue };
            if let Some(previous) = name_to_source_id.insert(trigger.name(), id) {
                if previous != id {
                    ambiguous_names.insert(trigger.name().to_string());
                }
            }
        }

        let mut source_to_destination = HashMap::new();
        let mut matched_names: HashSet<&str> = HashSet::new();
        for trigger in destination {
            let Some(destination_id) = trigger.id() else { continue };
            let Some(source_id) = name_to_source_id.get(trigger.name()) else { continue };

            if !matched_names.insert(trigger.name()) {
                ambiguous_names.insert(trigger.name().to_string());
            }
            source_to_destination.insert(source_id.to_string(), destination_id.to_string());
        }

        for name in &ambiguous_names {
            warn!(
                "Trigger name '{}' is not unique; tags firing on it may point at the wrong trigger",
                name
            );
        }
        debug!(
            "Built trigger remap: {} of {} source triggers matched",
            source_to_destination.len(),
            name_to_source_id.len()
        );

        Self {
            source_to_destination,
            source_ids: source.iter().filter_map(|t| t.id()).map(str::to_string).collect(),
            ambiguous_names,
        }
    }

    /// Destination ID for a source trigger ID, or the ID itself when the
    /// trigger has no counterpart.
    pub fn remap<'a>(&'a self, source_id: &'a str) -> &'a str {
        self.destination_of(source_id).unwrap_or(source_id)
    }

    /// Destination ID for a source trigger ID, if its name was matched.
    /// A destination ID may equal the source ID since IDs are per container.
    pub fn destination_of(&self, source_id: &str) -> Option<&str> {
        self.source_to_destination.get(source_id).map(String::as_str)
    }

    /// Rewrite the tag's firing triggers in place. Returns the source trigger
    /// IDs that had no destination counterpart and were kept unchanged. IDs
    /// that never named a source trigger (built-in triggers such as All Pages
    /// share one ID across containers) pass through without being reported.
    pub fn rewrite_tag(&self, tag: &mut Tag) -> Vec<String> {
        let mut stale = Vec::new();
        for id in &mut tag.firing_trigger_id {
            match self.destination_of(id) {
                Some(destination_id) => *id = destination_id.to_string(),
                None if self.source_ids.contains(id.as_str()) => stale.push(id.clone()),
                None => {}
            }
        }
        stale
    }

    pub fn ambiguous_names(&self) -> &BTreeSet<String> {
        &self.ambiguous_names
    }

    pub fn len(&self) -> usize {
        self.source_to_destination.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_to_destination.is_empty()
    }
}
