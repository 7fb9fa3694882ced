//! End-to-end cloning against the in-memory Tag Manager

use gtm_clone::api::{Container, EntityKind};
use gtm_clone::clone::{
    CloneError, CloneRequest, ContainerCloner, EntityOutcome, STRIPPED_FIELDS, resolve_destination,
};
use gtm_clone::test_support::{Call, FakeTagManager};
use serde_json::{Value, json};
use std::sync::Arc;

const ACCOUNT: &str = "4131139637";
const SOURCE: &str = "GTM-PR4BRDT";
const DESTINATION: &str = "Onboarding Container - Ryan (Clone)";

fn request() -> CloneRequest {
    CloneRequest {
        account_id: ACCOUNT.to_string(),
        source_public_id: SOURCE.to_string(),
        destination_name: DESTINATION.to_string(),
        destination_account_id: None,
    }
}

/// One variable, one trigger with ID "T1" and one tag firing on it
fn seeded() -> (Arc<FakeTagManager>, Container) {
    let fake = Arc::new(FakeTagManager::new());
    let source = fake.add_container(ACCOUNT, "Onboarding Container", SOURCE);

    fake.seed(
        &source,
        EntityKind::Variable,
        json!({"variableId": "V1", "name": "v1", "type": "c", "parameter": [{"type": "template", "key": "value", "value": "42"}]}),
    );
    fake.seed(
        &source,
        EntityKind::Trigger,
        json!({"triggerId": "T1", "name": "t1", "type": "pageview"}),
    );
    fake.seed(
        &source,
        EntityKind::Tag,
        json!({"tagId": "G1", "name": "tag1", "type": "html", "firingTriggerId": ["T1"]}),
    );

    (fake, source)
}

fn destination(fake: &FakeTagManager) -> Container {
    fake.containers(ACCOUNT)
        .into_iter()
        .find(|c| c.name == DESTINATION)
        .expect("destination container exists")
}

fn id_of(entity: &Value, field: &str) -> String {
    entity[field].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_clone_remaps_tag_triggers_to_new_ids() {
    let (fake, _) = seeded();
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();
    assert!(report.is_complete(), "{report:?}");

    let destination = destination(&fake);
    let triggers = fake.entities(&destination, EntityKind::Trigger);
    let tags = fake.entities(&destination, EntityKind::Tag);
    assert_eq!(triggers.len(), 1);
    assert_eq!(tags.len(), 1);
    assert_eq!(fake.entities(&destination, EntityKind::Variable).len(), 1);

    let new_trigger_id = id_of(&triggers[0], "triggerId");
    assert_ne!(new_trigger_id, "T1");
    assert_eq!(tags[0]["firingTriggerId"], json!([new_trigger_id]));
    assert_eq!(tags[0]["type"], "html");

    assert_eq!(report.variables.created(), 1);
    assert_eq!(report.triggers.created(), 1);
    assert_eq!(report.tags.created(), 1);
    assert!(report.stale_trigger_refs.is_empty());
    assert!(
        matches!(&report.triggers.outcomes[0], EntityOutcome::Created { source_id: Some(s), new_id: Some(n), .. } if s == "T1" && *n == new_trigger_id)
    );
}

#[tokio::test]
async fn test_failed_trigger_leaves_tag_reference_unchanged() {
    let (fake, _) = seeded();
    fake.fail_create(EntityKind::Trigger, "t1");
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    let destination = destination(&fake);
    let tags = fake.entities(&destination, EntityKind::Tag);
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["firingTriggerId"], json!(["T1"]));

    assert_eq!(report.triggers.failures().count(), 1);
    assert_eq!(report.tags.created(), 1);
    assert_eq!(report.variables.created(), 1);
    assert_eq!(report.stale_trigger_refs.len(), 1);
    assert_eq!(report.stale_trigger_refs[0].trigger_id, "T1");
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_create_bodies_never_carry_server_fields() {
    let (fake, _) = seeded();
    let cloner = ContainerCloner::new(fake.clone());

    cloner.clone_container(&request()).await.unwrap();

    let bodies = fake.created_bodies();
    assert_eq!(bodies.len(), 3);
    for (kind, body) in bodies {
        let object = body.as_object().unwrap();
        for field in STRIPPED_FIELDS {
            assert!(!object.contains_key(field), "{kind} body kept {field}");
        }
        assert!(!object.contains_key(kind.id_field()), "{kind} body kept its id");
    }
}

#[tokio::test]
async fn test_every_trigger_is_created_before_any_tag() {
    let (fake, source) = seeded();
    fake.seed(
        &source,
        EntityKind::Trigger,
        json!({"triggerId": "T2", "name": "t2", "type": "click"}),
    );
    fake.seed(
        &source,
        EntityKind::Tag,
        json!({"tagId": "G2", "name": "tag2", "type": "html", "firingTriggerId": ["T2", "T1"]}),
    );
    let cloner = ContainerCloner::new(fake.clone());

    cloner.clone_container(&request()).await.unwrap();

    let kinds: Vec<EntityKind> = fake.created_bodies().into_iter().map(|(k, _)| k).collect();
    let last_trigger = kinds.iter().rposition(|k| *k == EntityKind::Trigger).unwrap();
    let first_tag = kinds.iter().position(|k| *k == EntityKind::Tag).unwrap();
    let last_variable = kinds.iter().rposition(|k| *k == EntityKind::Variable).unwrap();
    let first_trigger = kinds.iter().position(|k| *k == EntityKind::Trigger).unwrap();
    assert!(last_variable < first_trigger);
    assert!(last_trigger < first_tag);

    let destination = destination(&fake);
    let tag2 = fake
        .entities(&destination, EntityKind::Tag)
        .into_iter()
        .find(|t| t["name"] == "tag2")
        .unwrap();
    let new_ids: Vec<String> = fake
        .entities(&destination, EntityKind::Trigger)
        .iter()
        .map(|t| id_of(t, "triggerId"))
        .collect();
    // source order of references is preserved
    assert_eq!(tag2["firingTriggerId"], json!([new_ids[1], new_ids[0]]));
}

#[tokio::test]
async fn test_built_in_trigger_ids_pass_through() {
    let (fake, source) = seeded();
    fake.seed(
        &source,
        EntityKind::Tag,
        json!({"tagId": "G3", "name": "all pages tag", "type": "html", "firingTriggerId": ["2147479553"]}),
    );
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    let destination = destination(&fake);
    let tag = fake
        .entities(&destination, EntityKind::Tag)
        .into_iter()
        .find(|t| t["name"] == "all pages tag")
        .unwrap();
    assert_eq!(tag["firingTriggerId"], json!(["2147479553"]));
    assert!(report.stale_trigger_refs.is_empty());
}

#[tokio::test]
async fn test_existing_destination_is_reused() {
    let fake = FakeTagManager::new();
    fake.add_container(ACCOUNT, "Onboarding Container", SOURCE);

    let first = resolve_destination(&fake, DESTINATION, ACCOUNT).await.unwrap();
    let second = resolve_destination(&fake, DESTINATION, ACCOUNT).await.unwrap();

    assert_eq!(first.container_id, second.container_id);
    assert_eq!(first.usage_context, vec!["web"]);
    let creates = fake
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreateContainer(_)))
        .count();
    assert_eq!(creates, 1);
    assert_eq!(fake.containers(ACCOUNT).len(), 2);
}

#[tokio::test]
async fn test_unknown_source_is_fatal_and_creates_nothing() {
    let (fake, _) = seeded();
    let cloner = ContainerCloner::new(fake.clone());
    let request = CloneRequest {
        source_public_id: "GTM-NOPE".to_string(),
        ..request()
    };

    let error = cloner.clone_container(&request).await.unwrap_err();

    assert!(matches!(error, CloneError::SourceContainerNotFound { ref public_id, .. } if public_id == "GTM-NOPE"));
    assert!(
        fake.calls()
            .iter()
            .all(|c| matches!(c, Call::ListContainers(_)))
    );
}

#[tokio::test]
async fn test_destination_in_another_account() {
    let (fake, _) = seeded();
    let cloner = ContainerCloner::new(fake.clone());
    let request = CloneRequest {
        destination_account_id: Some("555".to_string()),
        ..request()
    };

    let report = cloner.clone_container(&request).await.unwrap();

    assert_eq!(report.destination.account_id, "555");
    assert!(fake.containers(ACCOUNT).iter().all(|c| c.name != DESTINATION));
    assert_eq!(
        fake.entities(&report.destination, EntityKind::Tag).len(),
        1
    );
}

#[tokio::test]
async fn test_destination_workspace_failure_is_reported() {
    let (fake, _) = seeded();
    let destination = fake.add_container(ACCOUNT, DESTINATION, "GTM-DEST");
    fake.fail_workspaces(&destination);
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert!(report.workspace_error.is_some());
    assert!(fake.created_bodies().is_empty());
    // source entities were listed but every create failed without a workspace
    assert_eq!(report.variables.failures().count(), 1);
    assert_eq!(report.triggers.failures().count(), 1);
    assert_eq!(report.tags.failures().count(), 1);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_listing_failure_skips_only_that_category() {
    let (fake, source) = seeded();
    fake.fail_list(&source, EntityKind::Variable);
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert!(report.variables.fetch_error.is_some());
    assert_eq!(report.triggers.created(), 1);
    assert_eq!(report.tags.created(), 1);
    assert_eq!(report.failure_count(), 1);
}

#[tokio::test]
async fn test_duplicate_trigger_names_are_flagged() {
    let (fake, source) = seeded();
    fake.seed(
        &source,
        EntityKind::Trigger,
        json!({"triggerId": "T9", "name": "t1", "type": "click"}),
    );
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert_eq!(report.ambiguous_trigger_names, vec!["t1".to_string()]);
    assert_eq!(report.triggers.created(), 2);
}

#[tokio::test]
async fn test_source_workspace_failure_skips_every_category() {
    let (fake, source) = seeded();
    fake.fail_workspaces(&source);
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert!(report.workspace_error.is_some());
    for category in report.categories() {
        assert!(category.fetch_error.is_some(), "{} was not skipped", category.kind);
        assert!(category.outcomes.is_empty());
    }
    assert!(fake.created_bodies().is_empty());
    assert_eq!(report.failure_count(), 4);
}

#[tokio::test]
async fn test_source_trigger_listing_failure_during_remap_is_reported() {
    let (fake, source) = seeded();
    // the first listing clones the triggers, the second builds the remap
    fake.fail_list_after(&source, EntityKind::Trigger, 1);
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert_eq!(report.triggers.created(), 1);
    assert_eq!(report.tags.created(), 1);
    let tags = fake.entities(&destination(&fake), EntityKind::Tag);
    assert_eq!(tags[0]["firingTriggerId"], json!(["T1"]));

    let error = report.trigger_remap_error.as_deref().unwrap();
    assert!(error.starts_with("source triggers"), "{error}");
    assert_eq!(report.failure_count(), 1);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_undecodable_tag_fails_without_skipping_the_others() {
    let (fake, source) = seeded();
    fake.seed(
        &source,
        EntityKind::Tag,
        json!({"tagId": "G9", "name": "broken tag", "type": "html", "firingTriggerId": "T1"}),
    );
    let cloner = ContainerCloner::new(fake.clone());

    let report = cloner.clone_container(&request()).await.unwrap();

    assert!(report.tags.fetch_error.is_none());
    assert_eq!(report.tags.created(), 1);
    let failed: Vec<&EntityOutcome> = report.tags.failures().collect();
    assert!(
        matches!(failed[..], [EntityOutcome::Failed { name, source_id, .. }] if name == "broken tag" && source_id.as_deref() == Some("G9"))
    );
    let names: Vec<Value> = fake
        .entities(&destination(&fake), EntityKind::Tag)
        .into_iter()
        .map(|t| t["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("tag1")]);
    assert_eq!(report.failure_count(), 1);
}
