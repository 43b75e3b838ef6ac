//! Mock provider for testing
//!
//! Serves resources from an in-memory fixture without making real API calls.
//! Applies the same filtering and ordering the control plane does, can fail
//! named operations, and records every call for assertions. Deleted
//! resources disappear from later listings.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    op, CloudProvider, ModelEndpointSummary, ModelResource, RestApiSummary,
    UserPoolClientSummary, UserPoolSummary, IN_SERVICE,
};
use crate::error::{Result, WebgenError};

/// Resources served by [`MockProvider`], loadable from TOML
///
/// ```toml
/// fail = ["ListEndpoints"]
///
/// [[rest_apis]]
/// id = "a1b2c3"
/// name = "MysfitsApi"
///
/// [[user_pool_clients]]
/// user_pool_id = "us-east-1_abc"
/// client_id = "5kd9"
/// client_name = "MysfitsUserPoolClient"
///
/// [repositories]
/// "mythicalmysfits/service" = 2
/// ```
///
/// Top-level lists (`fail`, `tables`, `endpoint_configs`, `models`) have to
/// come before the first `[[table]]` header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MockFixture {
    pub rest_apis: Vec<RestApiSummary>,
    pub user_pools: Vec<UserPoolSummary>,
    pub user_pool_clients: Vec<MockPoolClient>,
    pub endpoints: Vec<ModelEndpointSummary>,
    /// Repository name -> image count
    pub repositories: BTreeMap<String, usize>,
    pub tables: Vec<String>,
    /// Endpoint config names, newest first
    pub endpoint_configs: Vec<String>,
    /// Model names, newest first
    pub models: Vec<String>,
    /// Operations (see [`op`]) that fail with a provider error
    pub fail: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockPoolClient {
    pub user_pool_id: String,
    pub client_id: String,
    pub client_name: String,
}

/// Mock provider that serves a fixture
#[derive(Debug, Default)]
pub struct MockProvider {
    fixture: MockFixture,
    /// Every operation issued, in order
    calls: Mutex<Vec<String>>,
    /// (cluster, service) pairs redeployed
    deployments: Mutex<Vec<(String, String)>>,
    /// (delete operation, name or id) of every resource deleted
    removed: Mutex<Vec<(String, String)>>,
}

impl MockProvider {
    /// Create a mock with no resources
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: MockFixture) -> Self {
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Load a TOML fixture file
    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WebgenError::Fixture {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let fixture: MockFixture = toml::from_str(&content).map_err(|e| WebgenError::Fixture {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_rest_api(mut self, id: &str, name: &str) -> Self {
        self.fixture.rest_apis.push(RestApiSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_user_pool(mut self, id: &str, name: &str) -> Self {
        self.fixture.user_pools.push(UserPoolSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_user_pool_client(mut self, user_pool_id: &str, client_id: &str, name: &str) -> Self {
        self.fixture.user_pool_clients.push(MockPoolClient {
            user_pool_id: user_pool_id.to_string(),
            client_id: client_id.to_string(),
            client_name: name.to_string(),
        });
        self
    }

    pub fn with_endpoint(mut self, name: &str, status: &str, created_at: i64) -> Self {
        self.fixture.endpoints.push(ModelEndpointSummary {
            name: name.to_string(),
            status: status.to_string(),
            created_at,
        });
        self
    }

    pub fn with_repository(mut self, name: &str, images: usize) -> Self {
        self.fixture.repositories.insert(name.to_string(), images);
        self
    }

    pub fn with_table(mut self, name: &str) -> Self {
        self.fixture.tables.push(name.to_string());
        self
    }

    pub fn with_endpoint_config(mut self, name: &str) -> Self {
        self.fixture.endpoint_configs.push(name.to_string());
        self
    }

    pub fn with_model(mut self, name: &str) -> Self {
        self.fixture.models.push(name.to_string());
        self
    }

    /// Make `operation` fail with a provider error
    pub fn failing(mut self, operation: &str) -> Self {
        self.fixture.fail.push(operation.to_string());
        self
    }

    /// All operations issued so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// All (cluster, service) redeploys issued so far
    pub fn deployments(&self) -> Vec<(String, String)> {
        self.deployments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// (delete operation, name or id) of every resource deleted so far
    pub fn removed(&self) -> Vec<(String, String)> {
        self.removed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn is_removed(&self, delete_op: &str, name: &str) -> bool {
        self.removed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(o, n)| o == delete_op && n == name)
    }

    /// Mark `name` deleted; `false` if it was not there to begin with
    fn remove(&self, delete_op: &str, name: &str, exists: bool) -> bool {
        if !exists || self.is_removed(delete_op, name) {
            return false;
        }
        self.removed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((delete_op.to_string(), name.to_string()));
        true
    }

    fn record(&self, operation: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(operation.to_string());

        if self.fixture.fail.iter().any(|f| f == operation) {
            return Err(WebgenError::provider(
                "mock",
                operation,
                "simulated failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>> {
        self.record(op::GET_REST_APIS)?;
        Ok(self.fixture.rest_apis.clone())
    }

    async fn list_user_pools(&self, max_results: i32) -> Result<Vec<UserPoolSummary>> {
        self.record(op::LIST_USER_POOLS)?;
        let limit = usize::try_from(max_results).unwrap_or(0);
        Ok(self
            .fixture
            .user_pools
            .iter()
            .filter(|p| !self.is_removed(op::DELETE_USER_POOL, &p.id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_user_pool_clients(
        &self,
        user_pool_id: &str,
        max_results: i32,
    ) -> Result<Vec<UserPoolClientSummary>> {
        self.record(op::LIST_USER_POOL_CLIENTS)?;
        let limit = usize::try_from(max_results).unwrap_or(0);
        Ok(self
            .fixture
            .user_pool_clients
            .iter()
            .filter(|c| c.user_pool_id == user_pool_id)
            .take(limit)
            .map(|c| UserPoolClientSummary {
                client_id: c.client_id.clone(),
                client_name: c.client_name.clone(),
            })
            .collect())
    }

    async fn list_in_service_endpoints(
        &self,
        name_contains: &str,
    ) -> Result<Vec<ModelEndpointSummary>> {
        self.record(op::LIST_ENDPOINTS)?;
        let mut endpoints: Vec<_> = self
            .fixture
            .endpoints
            .iter()
            .filter(|e| e.status == IN_SERVICE && e.name.contains(name_contains))
            .filter(|e| !self.is_removed(op::DELETE_ENDPOINT, &e.name))
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(endpoints)
    }

    async fn repository_image_count(&self, repository: &str) -> Result<Option<usize>> {
        self.record(op::LIST_IMAGES)?;
        if self.is_removed(op::DELETE_REPOSITORY, repository) {
            return Ok(None);
        }
        Ok(self.fixture.repositories.get(repository).copied())
    }

    async fn force_new_deployment(&self, cluster: &str, service: &str) -> Result<()> {
        self.record(op::UPDATE_SERVICE)?;
        self.deployments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((cluster.to_string(), service.to_string()));
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.record(op::DESCRIBE_TABLE)?;
        Ok(self.fixture.tables.iter().any(|t| t == table)
            && !self.is_removed(op::DELETE_TABLE, table))
    }

    async fn delete_table(&self, table: &str) -> Result<bool> {
        self.record(op::DELETE_TABLE)?;
        let exists = self.fixture.tables.iter().any(|t| t == table);
        Ok(self.remove(op::DELETE_TABLE, table, exists))
    }

    async fn delete_user_pool(&self, user_pool_id: &str) -> Result<bool> {
        self.record(op::DELETE_USER_POOL)?;
        let exists = self.fixture.user_pools.iter().any(|p| p.id == user_pool_id);
        Ok(self.remove(op::DELETE_USER_POOL, user_pool_id, exists))
    }

    async fn delete_repository(&self, repository: &str) -> Result<bool> {
        self.record(op::DELETE_REPOSITORY)?;
        let exists = self.fixture.repositories.contains_key(repository);
        Ok(self.remove(op::DELETE_REPOSITORY, repository, exists))
    }

    async fn list_model_resources(
        &self,
        kind: ModelResource,
        name_contains: &str,
    ) -> Result<Vec<String>> {
        self.record(kind.list_op())?;
        let names: Vec<String> = match kind {
            ModelResource::Endpoint => {
                let mut endpoints: Vec<_> = self.fixture.endpoints.iter().collect();
                endpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                endpoints.into_iter().map(|e| e.name.clone()).collect()
            }
            ModelResource::EndpointConfig => self.fixture.endpoint_configs.clone(),
            ModelResource::Model => self.fixture.models.clone(),
        };
        Ok(names
            .into_iter()
            .filter(|n| n.contains(name_contains) && !self.is_removed(kind.delete_op(), n))
            .collect())
    }

    async fn delete_model_resource(&self, kind: ModelResource, name: &str) -> Result<()> {
        self.record(kind.delete_op())?;
        let exists = match kind {
            ModelResource::Endpoint => self.fixture.endpoints.iter().any(|e| e.name == name),
            ModelResource::EndpointConfig => self.fixture.endpoint_configs.iter().any(|c| c == name),
            ModelResource::Model => self.fixture.models.iter().any(|m| m == name),
        };
        if !self.remove(kind.delete_op(), name, exists) {
            return Err(WebgenError::provider(
                "mock",
                kind.delete_op(),
                format!("{} not found", name),
            ));
        }
        Ok(())
    }
}
