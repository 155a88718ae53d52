//! Paginated resolution and cleanup of managed function versions.

use std::collections::HashSet;

use janitor_core::outcome::{SkipReason, VersionDisposition};
use janitor_core::retention::{eligible_for_deletion, order_versions_desc};
use janitor_core::retry::{RemoteError, RetryPlan};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

use crate::adapters::lambda_api::FunctionApi;
use crate::logging::{log_error, log_info};
use crate::retry::execute_with_retry;

const LATEST_PSEUDO_VERSION: &str = "$LATEST";

const COMPONENT: &str = "function_resolver";

/// Lists every function whose identifier contains `prefix`, in randomized
/// order. The shuffle keeps interrupted or time-boxed runs from always
/// starting on the same functions; the random source is caller-supplied so
/// tests can seed it.
pub async fn list_managed_functions(
    api: &impl FunctionApi,
    plan: &RetryPlan,
    prefix: &str,
    rng: &mut impl Rng,
) -> Result<Vec<String>, RemoteError> {
    let mut function_arns = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page =
            execute_with_retry(plan, "listFunctions", || api.list_functions_page(marker.clone()))
                .await?;
        function_arns.extend(
            page.function_arns
                .into_iter()
                .filter(|arn| arn.contains(prefix)),
        );
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    function_arns.shuffle(rng);
    log_info(
        COMPONENT,
        "functions_listed",
        json!({ "prefix": prefix, "count": function_arns.len() }),
    );
    Ok(function_arns)
}

/// All published version numbers of one function. The mutable-head
/// pseudo-version is excluded here, before any candidacy decision. No
/// ordering is guaranteed; callers sort.
pub async fn list_non_latest_versions(
    api: &impl FunctionApi,
    plan: &RetryPlan,
    function_arn: &str,
) -> Result<Vec<String>, RemoteError> {
    let mut versions = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = execute_with_retry(plan, "listVersionsByFunction", || {
            api.list_versions_page(function_arn, marker.clone())
        })
        .await?;
        versions.extend(
            page.versions
                .into_iter()
                .filter(|version| version != LATEST_PSEUDO_VERSION),
        );
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    Ok(versions)
}

/// Every version reachable through an alias: the alias target itself plus
/// all additional weighted-routing versions, deduplicated.
pub async fn list_protected_versions(
    api: &impl FunctionApi,
    plan: &RetryPlan,
    function_arn: &str,
) -> Result<HashSet<u64>, RemoteError> {
    let mut protected = HashSet::new();
    let mut marker: Option<String> = None;

    loop {
        let page = execute_with_retry(plan, "listAliases", || {
            api.list_aliases_page(function_arn, marker.clone())
        })
        .await?;
        for alias in page.aliases {
            if let Ok(version) = alias.function_version.parse::<u64>() {
                protected.insert(version);
            }
            for routed in alias.routing_versions {
                if let Ok(version) = routed.parse::<u64>() {
                    protected.insert(version);
                }
            }
        }
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    Ok(protected)
}

/// Cleans one function: resolves its versions and protected set concurrently,
/// keeps the `keep` most recent, then deletes the remaining unprotected
/// versions sequentially. A failed delete is recorded against that version
/// only; sibling deletions continue.
pub async fn clean_function(
    api: &impl FunctionApi,
    plan: &RetryPlan,
    function_arn: &str,
    keep: usize,
) -> Result<Vec<(u64, VersionDisposition)>, RemoteError> {
    log_info(
        COMPONENT,
        "cleaning_function",
        json!({ "function": function_arn }),
    );

    let (versions, protected) = tokio::join!(
        list_non_latest_versions(api, plan, function_arn),
        list_protected_versions(api, plan, function_arn),
    );
    let versions = versions?;
    let protected = protected?;

    let ordered = order_versions_desc(&versions);
    let eligible: HashSet<u64> = eligible_for_deletion(&ordered, keep, &protected)
        .into_iter()
        .collect();

    let mut dispositions = Vec::with_capacity(ordered.len());
    for (index, version) in ordered.iter().enumerate() {
        if index < keep {
            dispositions.push((
                *version,
                VersionDisposition::Skipped(SkipReason::WithinRetentionWindow),
            ));
            continue;
        }
        if !eligible.contains(version) {
            dispositions.push((*version, VersionDisposition::Skipped(SkipReason::Protected)));
            continue;
        }

        let qualifier = version.to_string();
        let outcome = execute_with_retry(plan, "deleteFunction", || {
            api.delete_version(function_arn, &qualifier)
        })
        .await;
        match outcome {
            Ok(()) => {
                log_info(
                    COMPONENT,
                    "version_deleted",
                    json!({ "function": function_arn, "version": version }),
                );
                dispositions.push((*version, VersionDisposition::Deleted));
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "version_delete_failed",
                    json!({
                        "function": function_arn,
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
