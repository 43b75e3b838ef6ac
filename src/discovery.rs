//! Endpoint and identity discovery
//!
//! Turns provider listings into single values looked up by logical name.
//! Absence is a [`Lookup::NotFound`], never an error; a failed provider call
//! is returned as `Err` untouched.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Result, WebgenError};
use crate::provider::CloudProvider;

/// Stage every REST API is deployed to
pub const DEPLOYMENT_STAGE: &str = "prod";

/// Page size for user pool and pool client listings
pub const IDENTITY_PAGE_SIZE: i32 = 10;

/// Typed outcome of a lookup that completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Found(v) => Lookup::Found(v),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Public base URL of a deployed REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEndpoint {
    /// Logical API name the endpoint was resolved from
    pub api_name: String,
    pub api_id: String,
    pub url: Url,
}

impl ResolvedEndpoint {
    /// Build the `prod` stage URL of API `api_id` in `region`
    ///
    /// The host is normalized to lowercase (REST API ids and region names
    /// are lowercase already); `api_id` keeps its original case. Fails with
    /// [`WebgenError::InvalidEndpoint`] if the parts do not form a valid host.
    pub fn new(api_name: &str, api_id: &str, region: &str) -> Result<Self> {
        let raw = format!(
            "https://{}.execute-api.{}.amazonaws.com/{}",
            api_id, region, DEPLOYMENT_STAGE
        );
        let url = Url::parse(&raw).map_err(|e| WebgenError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            api_name: api_name.to_string(),
            api_id: api_id.to_string(),
            url,
        })
    }

    /// URL text without the trailing slash `Url` would add to an empty path
    pub fn as_str(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

/// Find a REST API by exact name and build its `prod` base URL
///
/// With duplicate names the last one enumerated wins.
pub async fn find_http_endpoint(
    provider: &dyn CloudProvider,
    api_name: &str,
    region: &str,
) -> Result<Lookup<ResolvedEndpoint>> {
    let apis = provider.list_rest_apis().await?;
    let matched = apis.iter().rev().find(|api| api.name == api_name);

    debug!(api_name, found = matched.is_some(), "REST API lookup");

    match matched {
        Some(api) => Ok(Lookup::Found(ResolvedEndpoint::new(api_name, &api.id, region)?)),
        None => Ok(Lookup::NotFound),
    }
}

/// Find a user pool id by exact name within the first page of pools
pub async fn find_user_pool_id(
    provider: &dyn CloudProvider,
    pool_name: &str,
) -> Result<Lookup<String>> {
    let pools = provider.list_user_pools(IDENTITY_PAGE_SIZE).await?;
    let id = pools
        .into_iter()
        .rev()
        .find(|pool| pool.name == pool_name)
        .map(|pool| pool.id);

    debug!(pool_name, found = id.is_some(), "user pool lookup");
    Ok(id.into())
}

/// Find a pool client id by exact name within the first page of the pool's clients
pub async fn find_user_pool_client_id(
    provider: &dyn CloudProvider,
    client_name: &str,
    user_pool_id: &str,
) -> Result<Lookup<String>> {
    let clients = provider
        .list_user_pool_clients(user_pool_id, IDENTITY_PAGE_SIZE)
        .await?;
    let id = clients
        .into_iter()
        .rev()
        .find(|client| client.client_name == client_name)
        .map(|client| client.client_id);

    debug!(client_name, user_pool_id, found = id.is_some(), "user pool client lookup");
    Ok(id.into())
}

/// Most recently created in-service model endpoint whose name contains `prefix`
pub async fn find_inservice_model_endpoint(
    provider: &dyn CloudProvider,
    prefix: &str,
) -> Result<Lookup<String>> {
    let endpoints = provider.list_in_service_endpoints(prefix).await?;
    let name = endpoints.into_iter().next().map(|e| e.name);

    debug!(prefix, found = name.is_some(), "model endpoint lookup");
    Ok(name.into())
}
