use crate::cli::Cli;
use anyhow::Result;
use colored::*;
use gtm_clone::api::TagManagerClient;
use gtm_clone::auth::{self, OAuthCredentials};
use gtm_clone::clone::{CategoryReport, CloneReport, ContainerCloner, EntityOutcome};
use gtm_clone::config::Config;
use log::info;
use std::sync::Arc;

/// Authenticate, then copy every variable, trigger and tag
///
/// # Returns
/// * `Ok(())` - Clone finished; per-entity failures are printed, and only
///   fail the command with `--strict`
/// * `Err(anyhow::Error)` - Config, auth or container lookup failed
pub async fn clone_command(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides());
    let request = config.clone_request();

    let credentials = OAuthCredentials::from_env()?;
    let token = auth::authenticate(credentials).await?;

    let client = TagManagerClient::new(token.access_token, &config.to_resilience())?;
    let cloner = ContainerCloner::new(Arc::new(client));

    println!(
        "Cloning {} into '{}'...",
        request.source_public_id.bold(),
        request.destination_name.bold()
    );
    let report = cloner.clone_container(&request).await?;
    print_summary(&report);

    check_strict(&report, cli.strict)
}

fn check_strict(report: &CloneReport, strict: bool) -> Result<()> {
    if strict && !report.is_complete() {
        anyhow::bail!(
            "{} item(s) could not be copied (--strict)",
            report.failure_count()
        );
    }
    Ok(())
}

fn print_summary(report: &CloneReport) {
    info!("Printing clone summary");

    println!();
    println!(
        "{} {} → {} ({})",
        "Cloned".bold(),
        report.source.public_id,
        report.destination.name,
        report.destination.path()
    );

    if let Some(error) = &report.workspace_error {
        println!("  {} workspace lookup failed: {}", "✗".red(), error);
    }

    for category in report.categories() {
        print_category(category);
    }

    for name in &report.ambiguous_trigger_names {
        println!(
            "  {} trigger name '{}' is not unique; check the tags that fire on it",
            "!".yellow(),
            name
        );
    }
    if let Some(error) = &report.trigger_remap_error {
        println!(
            "  {} tag trigger references were not remapped: {}",
            "✗".red(),
            error
        );
    }
    for stale in &report.stale_trigger_refs {
        println!(
            "  {} tag '{}' still references source trigger {}",
            "!".yellow(),
            stale.tag,
            stale.trigger_id
        );
    }

    if report.is_complete() {
        println!("{}", "✓ Container cloning completed".green());
    } else {
        println!(
            "{}",
            format!(
                "Container cloning completed with {} failure(s)",
                report.failure_count()
            )
            .yellow()
        );
    }
}

fn print_category(category: &CategoryReport) {
    let label = category.kind.collection();

    if let Some(error) = &category.fetch_error {
        println!("  {} {}: could not list: {}", "✗".red(), label, error);
        return;
    }

    let failed: Vec<&EntityOutcome> = category.failures().collect();
    let marker = if failed.is_empty() { "✓".green() } else { "✗".red() };
    println!(
        "  {} {}: {} of {} created",
        marker,
        label,
        category.created(),
        category.outcomes.len()
    );

    for outcome in failed {
        if let EntityOutcome::Failed { name, error, .. } = outcome {
            println!("      {} {}", name.red(), error.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtm_clone::api::{Container, EntityKind};
    use serde_json::json;

    fn report() -> CloneReport {
        let container: Container =
            serde_json::from_value(json!({"accountId": "1", "containerId": "2"})).unwrap();
        CloneReport::new(container.clone(), container)
    }

    #[test]
    fn test_failures_only_fatal_when_strict() {
        let mut report = report();
        report.tags = CategoryReport::new(EntityKind::Tag);
        report.tags.outcomes.push(EntityOutcome::Failed {
            name: "tag1".to_string(),
            source_id: Some("9".to_string()),
            error: "400".to_string(),
        });

        assert!(check_strict(&report, false).is_ok());
        assert!(check_strict(&report, true).is_err());
    }

    #[test]
    fn test_unremapped_triggers_fail_strict() {
        let mut report = report();
        report.trigger_remap_error = Some("source triggers: 500".to_string());

        assert!(check_strict(&report, true).is_err());
    }

    #[test]
    fn test_clean_report_passes_strict() {
        assert!(check_strict(&report(), true).is_ok());
    }
}
