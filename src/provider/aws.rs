//! AWS provider using the AWS SDK for Rust
//!
//! One client per service, all built from a single shared SDK config scoped
//! to the configured region. Credentials come from the default provider chain.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::operation::delete_user_pool::DeleteUserPoolError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_ecr::operation::delete_repository::DeleteRepositoryError;
use aws_sdk_ecr::operation::list_images::ListImagesError;
use aws_sdk_ecr::types::{ListImagesFilter, TagStatus};
use aws_sdk_sagemaker::primitives::DateTime;
use aws_sdk_sagemaker::types::{
    EndpointConfigSortKey, EndpointSortKey, EndpointStatus, ModelSortKey, OrderKey,
};
use tracing::debug;

use super::{
    op, CloudProvider, ModelEndpointSummary, ModelResource, RestApiSummary,
    UserPoolClientSummary, UserPoolSummary, IN_SERVICE,
};
use crate::error::{Result, WebgenError};

/// Page size for REST API enumeration (the service maximum)
const REST_API_PAGE_SIZE: i32 = 500;

/// Provider backed by the real AWS control plane
pub struct AwsProvider {
    apigateway: aws_sdk_apigateway::Client,
    cognito: aws_sdk_cognitoidentityprovider::Client,
    sagemaker: aws_sdk_sagemaker::Client,
    ecr: aws_sdk_ecr::Client,
    ecs: aws_sdk_ecs::Client,
    dynamodb: aws_sdk_dynamodb::Client,
}

impl AwsProvider {
    /// Load the shared SDK config for `region` and build the service clients
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            apigateway: aws_sdk_apigateway::Client::new(&sdk_config),
            cognito: aws_sdk_cognitoidentityprovider::Client::new(&sdk_config),
            sagemaker: aws_sdk_sagemaker::Client::new(&sdk_config),
            ecr: aws_sdk_ecr::Client::new(&sdk_config),
            ecs: aws_sdk_ecs::Client::new(&sdk_config),
            dynamodb: aws_sdk_dynamodb::Client::new(&sdk_config),
        }
    }

    async fn endpoint_names(&self, name_contains: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sagemaker
                .list_endpoints()
                .sort_by(EndpointSortKey::CreationTime)
                .sort_order(OrderKey::Descending)
                .name_contains(name_contains)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("sagemaker", op::LIST_ENDPOINTS, e))?;

            names.extend(output.endpoints().iter().filter_map(|endpoint| {
                let name: Option<&str> = endpoint.endpoint_name().into();
                name.map(str::to_string)
            }));

            match output.next_token() {
                Some(next) if !next.is_empty() => next_token = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn endpoint_config_names(&self, name_contains: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sagemaker
                .list_endpoint_configs()
                .sort_by(EndpointConfigSortKey::CreationTime)
                .sort_order(OrderKey::Descending)
                .name_contains(name_contains)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("sagemaker", op::LIST_ENDPOINT_CONFIGS, e))?;

            names.extend(output.endpoint_configs().iter().filter_map(|config| {
                let name: Option<&str> = config.endpoint_config_name().into();
                name.map(str::to_string)
            }));

            match output.next_token() {
                Some(next) if !next.is_empty() => next_token = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn model_names(&self, name_contains: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sagemaker
                .list_models()
                .sort_by(ModelSortKey::CreationTime)
                .sort_order(OrderKey::Descending)
                .name_contains(name_contains)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("sagemaker", op::LIST_MODELS, e))?;

            names.extend(output.models().iter().filter_map(|model| {
                let name: Option<&str> = model.model_name().into();
                name.map(str::to_string)
            }));

            match output.next_token() {
                Some(next) if !next.is_empty() => next_token = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(names)
    }
}

fn sdk_error<E: std::error::Error>(service: &str, operation: &str, err: E) -> WebgenError {
    WebgenError::provider(service, operation, DisplayErrorContext(err))
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    async fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>> {
        let mut apis = Vec::new();
        let mut position: Option<String> = None;

        loop {
            let output = self
                .apigateway
                .get_rest_apis()
                .limit(REST_API_PAGE_SIZE)
                .set_position(position.take())
                .send()
                .await
                .map_err(|e| sdk_error("apigateway", op::GET_REST_APIS, e))?;

            apis.extend(output.items().iter().filter_map(|api| {
                Some(RestApiSummary {
                    id: api.id()?.to_string(),
                    name: api.name()?.to_string(),
                })
            }));

            match output.position() {
                Some(next) if !next.is_empty() => position = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = apis.len(), "listed REST APIs");
        Ok(apis)
    }

    async fn list_user_pools(&self, max_results: i32) -> Result<Vec<UserPoolSummary>> {
        let output = self
            .cognito
            .list_user_pools()
            .max_results(max_results)
            .send()
            .await
            .map_err(|e| sdk_error("cognito-idp", op::LIST_USER_POOLS, e))?;

        Ok(output
            .user_pools()
            .iter()
            .filter_map(|pool| {
                Some(UserPoolSummary {
                    id: pool.id()?.to_string(),
                    name: pool.name()?.to_string(),
                })
            })
            .collect())
    }

    async fn list_user_pool_clients(
        &self,
        user_pool_id: &str,
        max_results: i32,
    ) -> Result<Vec<UserPoolClientSummary>> {
        let output = self
            .cognito
            .list_user_pool_clients()
            .user_pool_id(user_pool_id)
            .max_results(max_results)
            .send()
            .await
            .map_err(|e| sdk_error("cognito-idp", op::LIST_USER_POOL_CLIENTS, e))?;

        Ok(output
            .user_pool_clients()
            .iter()
            .filter_map(|client| {
                Some(UserPoolClientSummary {
                    client_id: client.client_id()?.to_string(),
                    client_name: client.client_name()?.to_string(),
                })
            })
            .collect())
    }

    async fn list_in_service_endpoints(
        &self,
        name_contains: &str,
    ) -> Result<Vec<ModelEndpointSummary>> {
        let output = self
            .sagemaker
            .list_endpoints()
            .sort_by(EndpointSortKey::CreationTime)
            .sort_order(OrderKey::Descending)
            .name_contains(name_contains)
            .status_equals(EndpointStatus::InService)
            .send()
            .await
            .map_err(|e| sdk_error("sagemaker", op::LIST_ENDPOINTS, e))?;

        Ok(output
            .endpoints()
            .iter()
            .filter_map(|endpoint| {
                // Required members; accept both optional and plain accessors
                let name: Option<&str> = endpoint.endpoint_name().into();
                let created: Option<&DateTime> = endpoint.creation_time().into();
                Some(ModelEndpointSummary {
                    name: name?.to_string(),
                    status: IN_SERVICE.to_string(),
                    created_at: created.map(DateTime::secs).unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn repository_image_count(&self, repository: &str) -> Result<Option<usize>> {
        let filter = ListImagesFilter::builder()
            .tag_status(TagStatus::Any)
            .build();

        match self
            .ecr
            .list_images()
            .repository_name(repository)
            .filter(filter)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output.image_ids().len())),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(ListImagesError::RepositoryNotFoundException(_))
                ) =>
            {
                debug!(repository, "repository not found");
                Ok(None)
            }
            Err(e) => Err(sdk_error("ecr", op::LIST_IMAGES, e)),
        }
    }

    async fn force_new_deployment(&self, cluster: &str, service: &str) -> Result<()> {
        self.ecs
            .update_service()
            .cluster(cluster)
            .service(service)
            .force_new_deployment(true)
            .send()
            .await
            .map_err(|e| sdk_error("ecs", op::UPDATE_SERVICE, e))?;

        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        match self.dynamodb.describe_table().table_name(table).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(DescribeTableError::ResourceNotFoundException(_))
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(sdk_error("dynamodb", op::DESCRIBE_TABLE, e)),
        }
    }

    async fn delete_table(&self, table: &str) -> Result<bool> {
        match self.dynamodb.delete_table().table_name(table).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(DeleteTableError::ResourceNotFoundException(_))
                ) =>
            {
                debug!(table, "table already gone");
                Ok(false)
            }
            Err(e) => Err(sdk_error("dynamodb", op::DELETE_TABLE, e)),
        }
    }

    async fn delete_user_pool(&self, user_pool_id: &str) -> Result<bool> {
        match self
            .cognito
            .delete_user_pool()
            .user_pool_id(user_pool_id)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(DeleteUserPoolError::ResourceNotFoundException(_))
                ) =>
            {
                debug!(user_pool_id, "user pool already gone");
                Ok(false)
            }
            Err(e) => Err(sdk_error("cognito-idp", op::DELETE_USER_POOL, e)),
        }
    }

    async fn delete_repository(&self, repository: &str) -> Result<bool> {
        match self
            .ecr
            .delete_repository()
            .repository_name(repository)
            .force(true)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(DeleteRepositoryError::RepositoryNotFoundException(_))
                ) =>
            {
                debug!(repository, "repository already gone");
                Ok(false)
            }
            Err(e) => Err(sdk_error("ecr", op::DELETE_REPOSITORY, e)),
        }
    }

    async fn list_model_resources(
        &self,
        kind: ModelResource,
        name_contains: &str,
    ) -> Result<Vec<String>> {
        let names = match kind {
            ModelResource::Endpoint => self.endpoint_names(name_contains).await?,
            ModelResource::EndpointConfig => self.endpoint_config_names(name_contains).await?,
            ModelResource::Model => self.model_names(name_contains).await?,
        };
        debug!(?kind, name_contains, count = names.len(), "listed model resources");
        Ok(names)
    }

    async fn delete_model_resource(&self, kind: ModelResource, name: &str) -> Result<()> {
        match kind {
            ModelResource::Endpoint => self
                .sagemaker
                .delete_endpoint()
                .endpoint_name(name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| sdk_error("sagemaker", kind.delete_op(), e)),
            ModelResource::EndpointConfig => self
                .sagemaker
                .delete_endpoint_config()
                .endpoint_config_name(name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| sdk_error("sagemaker", kind.delete_op(), e)),
            ModelResource::Model => self
                .sagemaker
                .delete_model()
                .model_name(name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| sdk_error("sagemaker", kind.delete_op(), e)),
        }
    }
}
