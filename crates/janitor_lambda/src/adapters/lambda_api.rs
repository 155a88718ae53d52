use janitor_core::retry::RemoteError;

use super::classify_sdk_error;

/// Page sizes match what the backing API tolerates well under sustained
/// listing; every pagination loop is strictly sequential because each marker
/// comes from the previous response.
pub const FUNCTIONS_PAGE_SIZE: i32 = 10;
pub const VERSIONS_PAGE_SIZE: i32 = 20;
pub const ALIASES_PAGE_SIZE: i32 = 20;
pub const LAYERS_PAGE_SIZE: i32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionPage {
    pub function_arns: Vec<String>,
    pub next_marker: Option<String>,
}

/// Raw version tokens as the API returns them, `$LATEST` included; the
/// resolver filters and parses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub versions: Vec<String>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRecord {
    pub function_version: String,
    /// Additional versions receiving traffic through weighted routing.
    pub routing_versions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasPage {
    pub aliases: Vec<AliasRecord>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerPage {
    pub layer_names: Vec<String>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerVersionPage {
    pub versions: Vec<u64>,
    pub next_marker: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait FunctionApi {
    async fn list_functions_page(&self, marker: Option<String>)
        -> Result<FunctionPage, RemoteError>;

    async fn list_versions_page(
        &self,
        function_arn: &str,
        marker: Option<String>,
    ) -> Result<VersionPage, RemoteError>;

    async fn list_aliases_page(
        &self,
        function_arn: &str,
        marker: Option<String>,
    ) -> Result<AliasPage, RemoteError>;

    async fn delete_version(&self, function_arn: &str, qualifier: &str)
        -> Result<(), RemoteError>;
}

#[allow(async_fn_in_trait)]
pub trait LayerApi {
    async fn list_layers_page(&self, marker: Option<String>) -> Result<LayerPage, RemoteError>;

    async fn list_layer_versions_page(
        &self,
        layer_name: &str,
        marker: Option<String>,
    ) -> Result<LayerVersionPage, RemoteError>;

    async fn delete_layer_version(&self, layer_name: &str, version: u64)
        -> Result<(), RemoteError>;
}

/// Production implementation of both API seams over one Lambda client.
#[derive(Clone)]
pub struct AwsLambdaApi {
    client: aws_sdk_lambda::Client,
}

impl AwsLambdaApi {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

impl FunctionApi for AwsLambdaApi {
    async fn list_functions_page(
        &self,
        marker: Option<String>,
    ) -> Result<FunctionPage, RemoteError> {
        let response = self
            .client
            .list_functions()
            .set_marker(marker)
            .max_items(FUNCTIONS_PAGE_SIZE)
            .send()
            .await
            .map_err(|error| classify_sdk_error("listFunctions", error))?;

        Ok(FunctionPage {
            function_arns: response
                .functions()
                .iter()
                .filter_map(|function| function.function_arn().map(str::to_string))
                .collect(),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn list_versions_page(
        &self,
        function_arn: &str,
        marker: Option<String>,
    ) -> Result<VersionPage, RemoteError> {
        let response = self
            .client
            .list_versions_by_function()
            .function_name(function_arn)
            .set_marker(marker)
            .max_items(VERSIONS_PAGE_SIZE)
            .send()
            .await
            .map_err(|error| classify_sdk_error("listVersionsByFunction", error))?;

        Ok(VersionPage {
            versions: response
                .versions()
                .iter()
                .filter_map(|function| function.version().map(str::to_string))
                .collect(),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn list_aliases_page(
        &self,
        function_arn: &str,
        marker: Option<String>,
    ) -> Result<AliasPage, RemoteError> {
        let response = self
            .client
            .list_aliases()
            .function_name(function_arn)
            .set_marker(marker)
            .max_items(ALIASES_PAGE_SIZE)
            .send()
            .await
            .map_err(|error| classify_sdk_error("listAliases", error))?;

        Ok(AliasPage {
            aliases: response
                .aliases()
                .iter()
                .filter_map(|alias| {
                    let function_version = alias.function_version()?.to_string();
                    let routing_versions = alias
                        .routing_config()
                        .and_then(|routing| routing.additional_version_weights())
                        .map(|weights| weights.keys().cloned().collect())
                        .unwrap_or_default();
                    Some(AliasRecord {
                        function_version,
                        routing_versions,
                    })
                })
                .collect(),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn delete_version(
        &self,
        function_arn: &str,
        qualifier: &str,
    ) -> Result<(), RemoteError> {
        self.client
            .delete_function()
            .function_name(function_arn)
            .qualifier(qualifier)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| classify_sdk_error("deleteFunction", error))
    }
}

impl LayerApi for AwsLambdaApi {
    async fn list_layers_page(&self, marker: Option<String>) -> Result<LayerPage, RemoteError> {
        let response = self
            .client
            .list_layers()
            .set_marker(marker)
            .max_items(LAYERS_PAGE_SIZE)
            .send()
            .await
            .map_err(|error| classify_sdk_error("listLayers", error))?;

        Ok(LayerPage {
            layer_names: response
                .layers()
                .iter()
                .filter_map(|layer| layer.layer_name().map(str::to_string))
                .collect(),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn list_layer_versions_page(
        &self,
        layer_name: &str,
        marker: Option<String>,
    ) -> Result<LayerVersionPage, RemoteError> {
        let response = self
            .client
            .list_layer_versions()
            .layer_name(layer_name)
            .set_marker(marker)
            .max_items(LAYERS_PAGE_SIZE)
            .send()
            .await
            .map_err(|error| classify_sdk_error("listLayerVersions", error))?;

        Ok(LayerVersionPage {
            versions: response
                .layer_versions()
                .iter()
                .filter_map(|item| u64::try_from(item.version()).ok())
                .collect(),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn delete_layer_version(
        &self,
        layer_name: &str,
        version: u64,
    ) -> Result<(), RemoteError> {
        self.client
            .delete_layer_version()
            .layer_name(layer_name)
            .version_number(version as i64)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| classify_sdk_error("deleteLayerVersion", error))
    }
}
