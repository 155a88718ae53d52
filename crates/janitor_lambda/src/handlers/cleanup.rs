//! End-to-end cleanup run: resolve candidates, apply the retention policy,
//! delete, and aggregate the outcome. Function and layer cleanup run as two
//! concurrent tasks; units of work inside each task are sequential so the
//! delete load against the API stays bounded.

use janitor_core::config::JanitorConfig;
use janitor_core::outcome::RunReport;
use janitor_core::retry::{RemoteError, RetryPlan};
use rand::Rng;
use serde_json::json;

use crate::adapters::lambda_api::{FunctionApi, LayerApi};
use crate::logging::{log_error, log_info};
use crate::resolvers::{functions, layers};

const COMPONENT: &str = "cleanup";

/// Function list for one run: fetched on first use, and each entry removed
/// only after that function is fully processed. Scoped to a single run; no
/// state survives the invocation.
struct FunctionListCache {
    pending: Option<Vec<String>>,
}

impl FunctionListCache {
    fn new() -> Self {
        Self { pending: None }
    }

    async fn snapshot(
        &mut self,
        api: &impl FunctionApi,
        plan: &RetryPlan,
        prefix: &str,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>, RemoteError> {
        if self.pending.is_none() {
            self.pending =
                Some(functions::list_managed_functions(api, plan, prefix, rng).await?);
        }
        Ok(self.pending.clone().unwrap_or_default())
    }

    fn mark_processed(&mut self, function_arn: &str) {
        if let Some(pending) = &mut self.pending {
            pending.retain(|arn| arn != function_arn);
        }
    }
}

/// Drives one full cleanup run and returns the aggregated report. Failures
/// inside one unit of work are recorded and the run moves on; there are no
/// retries at this level.
pub async fn run_cleanup(
    config: &JanitorConfig,
    function_api: &impl FunctionApi,
    layer_api: &impl LayerApi,
    rng: &mut impl Rng,
) -> RunReport {
    let mut function_report = RunReport::default();
    let mut layer_report = RunReport::default();

    tokio::join!(
        clean_all_functions(function_api, config, rng, &mut function_report),
        clean_all_layers(layer_api, config, &mut layer_report),
    );

    let mut report = function_report;
    report.absorb(layer_report);
    log_info(
        COMPONENT,
        "run_complete",
        json!({ "succeeded": report.succeeded(), "report": report }),
    );
    report
}

async fn clean_all_functions(
    api: &impl FunctionApi,
    config: &JanitorConfig,
    rng: &mut impl Rng,
    report: &mut RunReport,
) {
    let Some(prefix) = &config.function_prefix else {
        log_info(COMPONENT, "function_cleanup_disabled", json!({}));
        return;
    };

    let mut cache = FunctionListCache::new();
    let snapshot = match cache.snapshot(api, &config.retry, prefix, rng).await {
        Ok(functions) => functions,
        Err(error) => {
            log_error(
                COMPONENT,
                "function_listing_failed",
                json!({ "error": error.message() }),
            );
            report.record_unit_error("listFunctions", error.message());
            return;
        }
    };

    log_info(
        COMPONENT,
        "functions_to_clean",
        json!({ "count": snapshot.len() }),
    );

    for function_arn in snapshot {
        match functions::clean_function(api, &config.retry, &function_arn, config.versions_to_keep)
            .await
        {
            Ok(dispositions) => {
                report.functions_processed += 1;
                for (_, disposition) in &dispositions {
                    report.record_version(disposition);
                }
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "function_cleanup_failed",
                    json!({ "function": function_arn, "error": error.message() }),
                );
                report.record_unit_error(&function_arn, error.message());
            }
        }
        cache.mark_processed(&function_arn);
    }
}

async fn clean_all_layers(api: &impl LayerApi, config: &JanitorConfig, report: &mut RunReport) {
    let Some(prefix) = &config.layer_prefix else {
        log_info(COMPONENT, "layer_cleanup_disabled", json!({}));
        return;
    };

    let layer_names = match layers::list_managed_layers(api, &config.retry, prefix).await {
        Ok(names) => names,
        Err(error) => {
            log_error(
                COMPONENT,
                "layer_listing_failed",
                json!({ "error": error.message() }),
            );
            report.record_unit_error("listLayers", error.message());
            return;
        }
    };

    for layer_name in layer_names {
        match layers::clean_layer(api, &config.retry, &layer_name, config.versions_to_keep).await {
            Ok(dispositions) => {
                report.layers_processed += 1;
                for (_, disposition) in &dispositions {
                    report.record_version(disposition);
                }
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "layer_cleanup_failed",
                    json!({ "layer": layer_name, "error": error.message() }),
                );
                report.record_unit_error(&layer_name, error.message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::adapters::lambda_api::{
        AliasPage, FunctionPage, LayerPage, LayerVersionPage, VersionPage,
    };

    use super::*;

    struct FakeApi {
        functions: Vec<String>,
        function_versions: HashMap<String, Vec<String>>,
        broken_functions: HashSet<String>,
        layers: Vec<String>,
        layer_versions: HashMap<String, Vec<u64>>,
        deleted_function_versions: Mutex<Vec<(String, String)>>,
        deleted_layer_versions: Mutex<Vec<(String, u64)>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                functions: Vec::new(),
                function_versions: HashMap::new(),
                broken_functions: HashSet::new(),
                layers: Vec::new(),
                layer_versions: HashMap::new(),
                deleted_function_versions: Mutex::new(Vec::new()),
                deleted_layer_versions: Mutex::new(Vec::new()),
            }
        }

        fn deleted_function_versions(&self) -> Vec<(String, String)> {
            self.deleted_function_versions
                .lock()
                .expect("poisoned mutex")
                .clone()
        }

        fn deleted_layer_versions(&self) -> Vec<(String, u64)> {
            self.deleted_layer_versions
                .lock()
                .expect("poisoned mutex")
                .clone()
        }
    }

    impl FunctionApi for FakeApi {
        async fn list_functions_page(
            &self,
            _marker: Option<String>,
        ) -> Result<FunctionPage, RemoteError> {
            Ok(FunctionPage {
                function_arns: self.functions.clone(),
                next_marker: None,
            })
        }

        async fn list_versions_page(
            &self,
            function_arn: &str,
            _marker: Option<String>,
        ) -> Result<VersionPage, RemoteError> {
            if self.broken_functions.contains(function_arn) {
                return Err(RemoteError::terminal("AccessDeniedException"));
            }
            Ok(VersionPage {
                versions: self
                    .function_versions
                    .get(function_arn)
                    .cloned()
                    .unwrap_or_default(),
                next_marker: None,
            })
        }

        async fn list_aliases_page(
            &self,
            _function_arn: &str,
            _marker: Option<String>,
        ) -> Result<AliasPage, RemoteError> {
            Ok(AliasPage::default())
        }

        async fn delete_version(
            &self,
            function_arn: &str,
            qualifier: &str,
        ) -> Result<(), RemoteError> {
            self.deleted_function_versions
                .lock()
                .expect("poisoned mutex")
                .push((function_arn.to_string(), qualifier.to_string()));
            Ok(())
        }
    }

    impl LayerApi for FakeApi {
        async fn list_layers_page(
            &self,
            _marker: Option<String>,
        ) -> Result<LayerPage, RemoteError> {
            Ok(LayerPage {
                layer_names: self.layers.clone(),
                next_marker: None,
            })
        }

        async fn list_layer_versions_page(
            &self,
            layer_name: &str,
            _marker: Option<String>,
        ) -> Result<LayerVersionPage, RemoteError> {
            Ok(LayerVersionPage {
                versions: self.layer_versions.get(layer_name).cloned().unwrap_or_default(),
                next_marker: None,
            })
        }

        async fn delete_layer_version(
            &self,
            layer_name: &str,
            version: u64,
        ) -> Result<(), RemoteError> {
            self.deleted_layer_versions
                .lock()
                .expect("poisoned mutex")
                .push((layer_name.to_string(), version));
            Ok(())
        }
    }

    fn config(function_prefix: Option<&str>, layer_prefix: Option<&str>) -> JanitorConfig {
        JanitorConfig {
            function_prefix: function_prefix.map(str::to_string),
            layer_prefix: layer_prefix.map(str::to_string),
            versions_to_keep: 3,
            retry: RetryPlan {
                max_attempts: 1,
                ..RetryPlan::default()
            },
        }
    }

    #[tokio::test]
    async fn unset_prefixes_disable_both_sides_without_error() {
        let api = FakeApi::new();
        let mut rng = StdRng::seed_from_u64(0);

        let report = run_cleanup(&config(None, None), &api, &api, &mut rng).await;

        assert!(report.succeeded());
        assert_eq!(report.functions_processed, 0);
        assert_eq!(report.layers_processed, 0);
    }

    #[tokio::test]
    async fn functions_and_layers_are_cleaned_in_one_run() {
        let mut api = FakeApi::new();
        api.functions = vec!["arn:svc-api".to_string()];
        api.function_versions.insert(
            "arn:svc-api".to_string(),
            vec!["1", "2", "3", "4", "5"].into_iter().map(String::from).collect(),
        );
        api.layers = vec!["svc-deps".to_string()];
        api.layer_versions
            .insert("svc-deps".to_string(), vec![1, 2, 3, 4, 5]);

        let mut rng = StdRng::seed_from_u64(0);
        let report = run_cleanup(&config(Some("svc"), Some("svc")), &api, &api, &mut rng).await;

        assert!(report.succeeded());
        assert_eq!(report.functions_processed, 1);
        assert_eq!(report.layers_processed, 1);
        assert_eq!(report.versions_deleted, 4);

        let function_deletes: Vec<String> = api
            .deleted_function_versions()
            .into_iter()
            .map(|(_, q)| q)
            .collect();
        assert_eq!(function_deletes, vec!["2", "1"]);
        let layer_deletes: Vec<u64> = api
            .deleted_layer_versions()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(layer_deletes, vec![2, 1]);
    }

    #[tokio::test]
    async fn one_broken_function_does_not_stop_the_others() {
        let mut api = FakeApi::new();
        api.functions = vec!["arn:svc-a".to_string(), "arn:svc-b".to_string()];
        api.broken_functions.insert("arn:svc-a".to_string());
        api.function_versions.insert(
            "arn:svc-b".to_string(),
            vec!["1", "2", "3", "4"].into_iter().map(String::from).collect(),
        );

        let mut rng = StdRng::seed_from_u64(0);
        let report = run_cleanup(&config(Some("svc"), None), &api, &api, &mut rng).await;

        assert!(!report.succeeded());
        assert_eq!(report.functions_processed, 1);
        assert_eq!(report.versions_deleted, 1);
        assert_eq!(report.unit_errors.len(), 1);
        assert!(report.unit_errors[0].contains("arn:svc-a"));
    }

    #[tokio::test]
    async fn run_fails_when_functions_fail_even_with_layers_disabled() {
        let mut api = FakeApi::new();
        api.functions = vec!["arn:svc-a".to_string()];
        api.broken_functions.insert("arn:svc-a".to_string());

        let mut rng = StdRng::seed_from_u64(0);
        let report = run_cleanup(&config(Some("svc"), None), &api, &api, &mut rng).await;

        assert!(!report.succeeded());
        assert_eq!(report.layers_processed, 0);
    }

    #[tokio::test]
    async fn small_layers_produce_no_delete_calls() {
        let mut api = FakeApi::new();
        api.layers = vec!["svc-deps".to_string()];
        api.layer_versions.insert("svc-deps".to_string(), vec![1, 2, 3]);

        let mut rng = StdRng::seed_from_u64(0);
        let report = run_cleanup(&config(None, Some("svc")), &api, &api, &mut rng).await;

        assert!(report.succeeded());
        assert_eq!(report.layers_processed, 1);
        assert!(api.deleted_layer_versions().is_empty());
    }
}
