//! # Provider Abstraction Layer
//!
//! Read-only lookups (plus one deploy action) against the cloud control plane.
//!
//! ## Overview
//!
//! - [`CloudProvider`] - Core trait; one method per control-plane call
//! - [`AwsProvider`] - Production provider using the AWS SDK
//! - [`MockProvider`] - Test provider loaded from a TOML fixture
//!
//! Methods return typed summaries. An empty list is a normal answer; only a
//! failed call is an `Err`. Matching by name happens one layer up, in
//! [`crate::discovery`].
//!
//! ## Available Providers
//!
//! | Provider | Use Case | Requires |
//! |----------|----------|----------|
//! | `aws` | Production | AWS credentials, `AWS_DEFAULT_REGION` |
//! | `mock` | Testing, dry runs | Optional `--fixture` file |

mod aws;
mod mock;

pub use aws::AwsProvider;
pub use mock::{MockFixture, MockProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WebgenConfig;
use crate::error::{Result, WebgenError};

/// Control-plane operation names, used in errors and by the mock's failure list
pub mod op {
    pub const GET_REST_APIS: &str = "GetRestApis";
    pub const LIST_USER_POOLS: &str = "ListUserPools";
    pub const LIST_USER_POOL_CLIENTS: &str = "ListUserPoolClients";
    pub const LIST_ENDPOINTS: &str = "ListEndpoints";
    pub const LIST_IMAGES: &str = "ListImages";
    pub const UPDATE_SERVICE: &str = "UpdateService";
    pub const DESCRIBE_TABLE: &str = "DescribeTable";
    pub const DELETE_TABLE: &str = "DeleteTable";
    pub const DELETE_USER_POOL: &str = "DeleteUserPool";
    pub const DELETE_REPOSITORY: &str = "DeleteRepository";
    pub const LIST_ENDPOINT_CONFIGS: &str = "ListEndpointConfigs";
    pub const LIST_MODELS: &str = "ListModels";
    pub const DELETE_ENDPOINT: &str = "DeleteEndpoint";
    pub const DELETE_ENDPOINT_CONFIG: &str = "DeleteEndpointConfig";
    pub const DELETE_MODEL: &str = "DeleteModel";
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolClientSummary {
    pub client_id: String,
    pub client_name: String,
}

/// Model-serving endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEndpointSummary {
    pub name: String,
    /// Lifecycle state as reported by the provider (e.g. "InService")
    pub status: String,
    /// Creation time, seconds since the epoch
    pub created_at: i64,
}

/// Lifecycle state of a model endpoint that can serve requests
pub const IN_SERVICE: &str = "InService";

/// Model-serving resources, in the order they have to be torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelResource {
    Endpoint,
    EndpointConfig,
    Model,
}

impl ModelResource {
    pub const ALL: [ModelResource; 3] = [
        ModelResource::Endpoint,
        ModelResource::EndpointConfig,
        ModelResource::Model,
    ];

    pub fn list_op(self) -> &'static str {
        match self {
            ModelResource::Endpoint => op::LIST_ENDPOINTS,
            ModelResource::EndpointConfig => op::LIST_ENDPOINT_CONFIGS,
            ModelResource::Model => op::LIST_MODELS,
        }
    }

    pub fn delete_op(self) -> &'static str {
        match self {
            ModelResource::Endpoint => op::DELETE_ENDPOINT,
            ModelResource::EndpointConfig => op::DELETE_ENDPOINT_CONFIG,
            ModelResource::Model => op::DELETE_MODEL,
        }
    }
}

// ============================================================================
// PROVIDER TRAIT (ASYNC)
// ============================================================================

/// Core trait that all cloud providers must implement
///
/// Callers await one method at a time; implementations add no retries on top
/// of the SDK defaults.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name ("aws", "mock")
    fn name(&self) -> &str;

    /// All REST APIs in the region, in provider enumeration order
    async fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>>;

    /// First page of user pools, at most `max_results`
    async fn list_user_pools(&self, max_results: i32) -> Result<Vec<UserPoolSummary>>;

    /// First page of clients of `user_pool_id`, at most `max_results`
    async fn list_user_pool_clients(
        &self,
        user_pool_id: &str,
        max_results: i32,
    ) -> Result<Vec<UserPoolClientSummary>>;

    /// In-service model endpoints whose name contains `name_contains`, newest first
    async fn list_in_service_endpoints(
        &self,
        name_contains: &str,
    ) -> Result<Vec<ModelEndpointSummary>>;

    /// Number of images in the first page of `repository`; `None` if the
    /// repository does not exist
    async fn repository_image_count(&self, repository: &str) -> Result<Option<usize>>;

    /// Force a new deployment of a container service
    async fn force_new_deployment(&self, cluster: &str, service: &str) -> Result<()>;

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Delete a table; `false` if it did not exist
    async fn delete_table(&self, table: &str) -> Result<bool>;

    /// Delete a user pool by id; `false` if it did not exist
    async fn delete_user_pool(&self, user_pool_id: &str) -> Result<bool>;

    /// Delete an image repository and every image in it; `false` if it did
    /// not exist
    async fn delete_repository(&self, repository: &str) -> Result<bool>;

    /// Names of every `kind` resource whose name contains `name_contains`,
    /// any status, newest first
    async fn list_model_resources(
        &self,
        kind: ModelResource,
        name_contains: &str,
    ) -> Result<Vec<String>>;

    async fn delete_model_resource(&self, kind: ModelResource, name: &str) -> Result<()>;
}

// ============================================================================
// PROVIDER FACTORY
// ============================================================================

/// Create a provider instance by name
///
/// | Name | Description |
/// |------|-------------|
/// | `aws` | AWS SDK clients for `config.region` |
/// | `mock` | In-memory, from `config.fixture` (empty if none) |
pub async fn create_provider(name: &str, config: &WebgenConfig) -> Result<Box<dyn CloudProvider>> {
    match name.to_lowercase().as_str() {
        "aws" => Ok(Box::new(AwsProvider::new(&config.region).await)),
        "mock" => {
            let provider = match &config.fixture {
                Some(path) => MockProvider::from_fixture_file(path)?,
                None => MockProvider::new(),
            };
            Ok(Box::new(provider))
        }
        _ => Err(WebgenError::UnknownProvider {
            name: name.to_string(),
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
