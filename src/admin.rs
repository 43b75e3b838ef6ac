//! One-off administrative commands
//!
//! - [`discover_all`]: every lookup `prepare` can make, without writing files
//! - [`inference_endpoint_absent`] / [`repository_empty`]: readiness checks
//!   printed as `true`/`false` for shell pipelines
//! - [`redeploy_service`]: force the container service onto a new image
//! - [`render`]: command-line bindings applied to an arbitrary template

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::WebgenConfig;
use crate::discovery::{
    find_http_endpoint, find_inservice_model_endpoint, find_user_pool_client_id,
    find_user_pool_id, Lookup, ResolvedEndpoint,
};
use crate::error::Result;
use crate::provider::CloudProvider;
use crate::template::{substitute, Binding, SubstitutionReport};

/// Everything the deployment tooling can discover in one region
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub region: String,
    /// (logical API name, lookup) in lookup order
    pub apis: Vec<(String, Lookup<ResolvedEndpoint>)>,
    pub user_pool: Lookup<String>,
    pub user_pool_client: Lookup<String>,
    pub model_endpoint: Lookup<String>,
}

impl DiscoveryReport {
    pub fn missing_count(&self) -> usize {
        let apis = self.apis.iter().filter(|(_, l)| !l.is_found()).count();
        let others = [&self.user_pool, &self.user_pool_client, &self.model_endpoint]
            .into_iter()
            .filter(|l| !l.is_found())
            .count();
        apis + others
    }
}

/// Run every lookup in sequence
pub async fn discover_all(
    provider: &dyn CloudProvider,
    config: &WebgenConfig,
) -> Result<DiscoveryReport> {
    let names = &config.names;
    let mut apis = Vec::new();

    for api_name in [
        &names.mysfits_api,
        &names.click_processing_api,
        &names.questions_api,
        &names.recommendations_api,
    ] {
        let lookup = find_http_endpoint(provider, api_name, &config.region).await?;
        apis.push((api_name.clone(), lookup));
    }

    let user_pool = find_user_pool_id(provider, &names.user_pool).await?;
    let user_pool_client = match &user_pool {
        Lookup::Found(pool_id) => {
            find_user_pool_client_id(provider, &names.user_pool_client, pool_id).await?
        }
        Lookup::NotFound => Lookup::NotFound,
    };
    let model_endpoint =
        find_inservice_model_endpoint(provider, &names.model_endpoint_prefix).await?;

    Ok(DiscoveryReport {
        region: config.region.clone(),
        apis,
        user_pool,
        user_pool_client,
        model_endpoint,
    })
}

/// True when no in-service inference endpoint matches the check prefix
pub async fn inference_endpoint_absent(
    provider: &dyn CloudProvider,
    config: &WebgenConfig,
) -> Result<bool> {
    let lookup =
        find_inservice_model_endpoint(provider, &config.names.inference_check_prefix).await?;
    Ok(!lookup.is_found())
}

/// True when the image repository holds no images or does not exist
pub async fn repository_empty(provider: &dyn CloudProvider, config: &WebgenConfig) -> Result<bool> {
    let count = provider
        .repository_image_count(&config.names.image_repository)
        .await?;
    Ok(count.unwrap_or(0) == 0)
}

pub async fn redeploy_service(provider: &dyn CloudProvider, config: &WebgenConfig) -> Result<()> {
    let names = &config.names;
    provider
        .force_new_deployment(&names.cluster, &names.service)
        .await?;
    info!(cluster = %names.cluster, service = %names.service, "forced new deployment");
    Ok(())
}

/// Apply bindings to `source`, writing to `output` (or back to `source`)
pub fn render(
    bindings: &[Binding],
    source: &Path,
    output: Option<&Path>,
) -> Result<SubstitutionReport> {
    let dest = output.unwrap_or(source);
    let report = substitute(bindings, source, dest)?;
    info!(source = %source.display(), dest = %dest.display(), replaced = report.total(), "rendered template");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{op, MockProvider, IN_SERVICE};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> WebgenConfig {
        let vars = HashMap::from([("AWS_DEFAULT_REGION".to_string(), "eu-west-1".to_string())]);
        WebgenConfig::from_vars(&vars, dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_discover_all() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new()
            .with_rest_api("mys1", "MysfitsApi")
            .with_rest_api("qst1", "QuestionsAPI")
            .with_user_pool("eu-west-1_p", "MysfitsUserPool")
            .with_user_pool_client("eu-west-1_p", "c1", "MysfitsUserPoolClient");

        let report = discover_all(&provider, &config(&dir)).await.unwrap();

        assert_eq!(report.apis.len(), 4);
        assert_eq!(report.apis[0].0, "MysfitsApi");
        assert!(report.apis[0].1.is_found());
        assert!(!report.apis[1].1.is_found());
        assert_eq!(report.user_pool_client, Lookup::Found("c1".to_string()));
        assert_eq!(report.model_endpoint, Lookup::NotFound);
        // ClickProcessingApi, RecommendationsAPI, model endpoint
        assert_eq!(report.missing_count(), 3);
    }

    #[tokio::test]
    async fn test_discover_all_json_shape() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new().with_rest_api("mys1", "MysfitsApi");

        let report = discover_all(&provider, &config(&dir)).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["region"], "eu-west-1");
        assert_eq!(json["apis"][0][0], "MysfitsApi");
        assert_eq!(
            json["apis"][0][1]["value"]["url"],
            "https://mys1.execute-api.eu-west-1.amazonaws.com/prod"
        );
        assert_eq!(json["user_pool"]["status"], "not_found");
    }

    #[tokio::test]
    async fn test_inference_endpoint_absent() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let empty = MockProvider::new().with_endpoint("knn-1", "Creating", 1);
        assert!(inference_endpoint_absent(&empty, &config).await.unwrap());

        let serving = MockProvider::new().with_endpoint("knn-1", IN_SERVICE, 1);
        assert!(!inference_endpoint_absent(&serving, &config).await.unwrap());
    }

    #[tokio::test]
    async fn test_repository_empty() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let missing = MockProvider::new();
        assert!(repository_empty(&missing, &config).await.unwrap());

        let empty = MockProvider::new().with_repository("mythicalmysfits/service", 0);
        assert!(repository_empty(&empty, &config).await.unwrap());

        let full = MockProvider::new().with_repository("mythicalmysfits/service", 3);
        assert!(!repository_empty(&full, &config).await.unwrap());

        let failing = MockProvider::new().failing(op::LIST_IMAGES);
        assert!(repository_empty(&failing, &config).await.is_err());
    }

    #[tokio::test]
    async fn test_redeploy_service() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new();

        redeploy_service(&provider, &config(&dir)).await.unwrap();

        assert_eq!(
            provider.deployments(),
            vec![(
                "MythicalMysfits-Cluster".to_string(),
                "MythicalMysfits-FargateService".to_string()
            )]
        );
    }

    #[test]
    fn test_render_to_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("swagger.json");
        let output = dir.path().join("swagger.rendered.json");
        fs::write(&source, r#"{"uri": "http://REPLACE_ME_NLB_DNS/mysfits", "region": "REPLACE_ME_REGION"}"#)
            .unwrap();

        let bindings = [
            Binding::found("REPLACE_ME_NLB_DNS", "nlb-123.elb.amazonaws.com"),
            Binding::missing("REPLACE_ME_REGION"),
        ];
        let report = render(&bindings, &source, Some(&output)).unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            r#"{"uri": "http://nlb-123.elb.amazonaws.com/mysfits", "region": "NOT_FOUND"}"#
        );
        assert!(fs::read_to_string(&source).unwrap().contains("REPLACE_ME_NLB_DNS"));
    }
}
