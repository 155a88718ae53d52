//! Paginated resolution and cleanup of managed layer versions. Layers have
//! no alias concept; only the retention window applies.

use std::collections::HashSet;

use janitor_core::outcome::{SkipReason, VersionDisposition};
use janitor_core::retention::eligible_for_deletion;
use janitor_core::retry::{RemoteError, RetryPlan};
use serde_json::json;

use crate::adapters::lambda_api::LayerApi;
use crate::logging::{log_error, log_info};
use crate::retry::execute_with_retry;

const COMPONENT: &str = "layer_resolver";

/// Lists every layer whose name starts with `prefix`. Unlike functions this
/// is an exact starts-with match, not a substring match.
pub async fn list_managed_layers(
    api: &impl LayerApi,
    plan: &RetryPlan,
    prefix: &str,
) -> Result<Vec<String>, RemoteError> {
    let mut layer_names = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page =
            execute_with_retry(plan, "listLayers", || api.list_layers_page(marker.clone())).await?;
        layer_names.extend(
            page.layer_names
                .into_iter()
                .filter(|name| name.starts_with(prefix)),
        );
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    log_info(
        COMPONENT,
        "layers_listed",
        json!({ "prefix": prefix, "count": layer_names.len() }),
    );
    Ok(layer_names)
}

pub async fn list_layer_versions(
    api: &impl LayerApi,
    plan: &RetryPlan,
    layer_name: &str,
) -> Result<Vec<u64>, RemoteError> {
    let mut versions = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = execute_with_retry(plan, "listLayerVersions", || {
            api.list_layer_versions_page(layer_name, marker.clone())
        })
        .await?;
        versions.extend(page.versions);
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    Ok(versions)
}

/// Cleans one layer. A layer whose version count does not exceed the window
/// is skipped outright, before any sorting or logging churn; deletion there
/// would be a no-op anyway.
pub async fn clean_layer(
    api: &impl LayerApi,
    plan: &RetryPlan,
    layer_name: &str,
    keep: usize,
) -> Result<Vec<(u64, VersionDisposition)>, RemoteError> {
    let versions = list_layer_versions(api, plan, layer_name).await?;
    if versions.len() <= keep {
        return Ok(Vec::new());
    }

    log_info(
        COMPONENT,
        "cleaning_layer",
        json!({ "layer": layer_name, "keep": keep, "total": versions.len() }),
    );

    let mut ordered = versions;
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    let eligible: HashSet<u64> = eligible_for_deletion(&ordered, keep, &HashSet::new())
        .into_iter()
        .collect();

    let mut dispositions = Vec::with_capacity(ordered.len());
    for version in &ordered {
        if !eligible.contains(version) {
            dispositions.push((
                *version,
                VersionDisposition::Skipped(SkipReason::WithinRetentionWindow),
            ));
            continue;
        }

        let outcome = execute_with_retry(plan, "deleteLayerVersion", || {
            api.delete_layer_version(layer_name, *version)
        })
        .await;
        match outcome {
            Ok(()) => {
                log_info(
                    COMPONENT,
                    "layer_version_deleted",
                    json!({ "layer": layer_name, "version": version }),
                );
                dispositions.push((*version, VersionDisposition::Deleted));
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "layer_version_delete_failed",
                    json!({
                        "layer": layer_name,
                        "version": version,
                        "error": error.message(),
                    }),
                );
                dispositions.push((
                    *version,
                    VersionDisposition::Failed(error.message().to_string()),
                ));
            }
        }
    }

    Ok(dispositions)
}
