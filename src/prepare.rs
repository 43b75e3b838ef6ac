//! Deployment preparation modes
//!
//! Each mode looks up the values one deployment step needs and rewrites the
//! files that carry their placeholders, in place, relative to the project
//! root. One mode runs per invocation.
//!
//! | Mode | Files |
//! |------|-------|
//! | `replace_web_endpoints_and_cognito_ids` | `web/index.html`, `web/register.html`, `web/confirm.html` |
//! | `replace_clickprocessingapi_endpoint` | `webgen/kinesis_firehose_stack.py` |
//! | `replace_email` | `webgen/xray_stack.py` |
//! | `replace_recommendationsapi_endpoint` | `lambda_recommendations/service/recommendations.py` |
//!
//! Missing values are written as the sentinel and reported. The one hard stop
//! is a missing primary API in the web mode: nothing is written and the
//! outcome is [`PrepareOutcome::PrimaryApiMissing`].

use std::fmt;

use tracing::{debug, info};

use crate::config::WebgenConfig;
use crate::discovery::{
    find_http_endpoint, find_inservice_model_endpoint, find_user_pool_client_id,
    find_user_pool_id, Lookup, ResolvedEndpoint,
};
use crate::error::Result;
use crate::provider::CloudProvider;
use crate::template::{substitute, Binding, SubstitutionReport};

pub const INDEX_HTML: &str = "web/index.html";
pub const REGISTER_HTML: &str = "web/register.html";
pub const CONFIRM_HTML: &str = "web/confirm.html";
pub const KINESIS_STACK: &str = "webgen/kinesis_firehose_stack.py";
pub const XRAY_STACK: &str = "webgen/xray_stack.py";
pub const RECOMMENDATIONS_SERVICE: &str = "lambda_recommendations/service/recommendations.py";

/// Placeholder tokens found in the target files
pub mod tokens {
    pub const MYSFITS_API_ENDPOINT: &str = "REPLACE_ME_mysfitsApiEndpoint";
    pub const STREAMING_API_ENDPOINT: &str = "REPLACE_ME_streamingApiEndpoint";
    pub const QUESTIONS_API_ENDPOINT: &str = "REPLACE_ME_questionsApiEndpoint";
    pub const RECOMMENDATIONS_API_ENDPOINT: &str = "REPLACE_ME_recommendationsApiEndpoint";
    pub const REGION: &str = "REPLACE_ME_REGION";
    pub const USER_POOL_ID: &str = "REPLACE_ME_USER_POOL_ID";
    pub const USER_POOL_CLIENT_ID: &str = "REPLACE_ME_USER_POOL_CLIENT_ID";
    pub const API_URL: &str = "REPLACE_ME_API_URL";
    pub const RECEIVER_EMAIL: &str = "REPLACE_ME_RECEIVER_EMAIL";
    pub const SAGEMAKER_ENDPOINT_NAME: &str = "REPLACE_ME_SAGEMAKER_ENDPOINT_NAME";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    WebEndpointsAndCognitoIds,
    ClickProcessingApiEndpoint,
    Email,
    RecommendationsApiEndpoint,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::WebEndpointsAndCognitoIds,
        Mode::ClickProcessingApiEndpoint,
        Mode::Email,
        Mode::RecommendationsApiEndpoint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::WebEndpointsAndCognitoIds => "replace_web_endpoints_and_cognito_ids",
            Mode::ClickProcessingApiEndpoint => "replace_clickprocessingapi_endpoint",
            Mode::Email => "replace_email",
            Mode::RecommendationsApiEndpoint => "replace_recommendationsapi_endpoint",
        }
    }

    /// Exact match on the mode string
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that could not be discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingValue {
    Api(String),
    UserPool(String),
    UserPoolClient(String),
    ModelEndpoint(String),
    ReceiverEmail,
}

impl fmt::Display for MissingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingValue::Api(name) => write!(f, "Found no API {}", name),
            MissingValue::UserPool(name) => write!(f, "Found no user pool {}", name),
            MissingValue::UserPoolClient(name) => write!(f, "Found no user pool client {}", name),
            MissingValue::ModelEndpoint(prefix) => {
                write!(f, "Found no in-service model endpoint with prefix '{}'", prefix)
            }
            MissingValue::ReceiverEmail => write!(f, "Found no receiver email (RECEIVER_EMAIL)"),
        }
    }
}

/// What a completed mode did
#[derive(Debug, Clone)]
pub struct PrepareReport {
    pub mode: Mode,
    /// One entry per rewritten file, in write order
    pub files: Vec<SubstitutionReport>,
    /// Values written as the sentinel
    pub missing: Vec<MissingValue>,
}

#[derive(Debug, Clone)]
pub enum PrepareOutcome {
    Completed(PrepareReport),
    /// Web mode stopped before writing anything
    PrimaryApiMissing { api_name: String },
    /// Not a known mode; nothing was done
    UnknownMode { token: String },
}

/// Runs preparation modes against one provider and configuration
pub struct Preparer<'a> {
    provider: &'a dyn CloudProvider,
    config: &'a WebgenConfig,
}

impl<'a> Preparer<'a> {
    pub fn new(provider: &'a dyn CloudProvider, config: &'a WebgenConfig) -> Self {
        Self { provider, config }
    }

    /// Run the mode named by `token`; unknown tokens are a no-op
    pub async fn run(&self, token: &str) -> Result<PrepareOutcome> {
        match Mode::parse(token) {
            Some(mode) => self.run_mode(mode).await,
            None => {
                debug!(token, "unknown mode, nothing to do");
                Ok(PrepareOutcome::UnknownMode {
                    token: token.to_string(),
                })
            }
        }
    }

    pub async fn run_mode(&self, mode: Mode) -> Result<PrepareOutcome> {
        info!(%mode, provider = self.provider.name(), region = %self.config.region, "preparing files");

        let report = match mode {
            Mode::WebEndpointsAndCognitoIds => return self.web_files().await,
            Mode::ClickProcessingApiEndpoint => self.kinesis_file().await?,
            Mode::Email => self.xray_file()?,
            Mode::RecommendationsApiEndpoint => self.recommendations_file().await?,
        };
        Ok(PrepareOutcome::Completed(report))
    }

    async fn web_files(&self) -> Result<PrepareOutcome> {
        let names = &self.config.names;
        let region = &self.config.region;
        let mut missing = Vec::new();

        let api = find_http_endpoint(self.provider, &names.mysfits_api, region).await?;
        // The web site cannot work without its API
        let Lookup::Found(api) = api else {
            debug!("{}", MissingValue::Api(names.mysfits_api.clone()));
            return Ok(PrepareOutcome::PrimaryApiMissing {
                api_name: names.mysfits_api.clone(),
            });
        };

        let click = find_http_endpoint(self.provider, &names.click_processing_api, region).await?;
        let click = endpoint_value(click, &names.click_processing_api, &mut missing);

        let questions = find_http_endpoint(self.provider, &names.questions_api, region).await?;
        let questions = endpoint_value(questions, &names.questions_api, &mut missing);

        let recommendations =
            find_http_endpoint(self.provider, &names.recommendations_api, region).await?;
        let recommendations =
            endpoint_value(recommendations, &names.recommendations_api, &mut missing);

        let pool_id = find_user_pool_id(self.provider, &names.user_pool)
            .await?
            .into_option();
        if pool_id.is_none() {
            note(&mut missing, MissingValue::UserPool(names.user_pool.clone()));
        }

        // Without a pool there is nothing to scope the client lookup to
        let client_id = match &pool_id {
            Some(pool_id) => {
                find_user_pool_client_id(self.provider, &names.user_pool_client, pool_id)
                    .await?
                    .into_option()
            }
            None => None,
        };
        if client_id.is_none() {
            note(
                &mut missing,
                MissingValue::UserPoolClient(names.user_pool_client.clone()),
            );
        }

        let pool_bindings = || {
            vec![
                Binding::new(tokens::USER_POOL_ID, pool_id.clone()),
                Binding::new(tokens::USER_POOL_CLIENT_ID, client_id.clone()),
            ]
        };

        let mut index = vec![
            Binding::found(tokens::MYSFITS_API_ENDPOINT, api.as_str()),
            Binding::new(tokens::STREAMING_API_ENDPOINT, click),
            Binding::new(tokens::QUESTIONS_API_ENDPOINT, questions),
            Binding::new(tokens::RECOMMENDATIONS_API_ENDPOINT, recommendations),
            Binding::found(tokens::REGION, region.as_str()),
        ];
        index.extend(pool_bindings());

        let files = vec![
            self.rewrite(INDEX_HTML, &index)?,
            self.rewrite(REGISTER_HTML, &pool_bindings())?,
            self.rewrite(CONFIRM_HTML, &pool_bindings())?,
        ];

        Ok(PrepareOutcome::Completed(PrepareReport {
            mode: Mode::WebEndpointsAndCognitoIds,
            files,
            missing,
        }))
    }

    async fn kinesis_file(&self) -> Result<PrepareReport> {
        let names = &self.config.names;
        let mut missing = Vec::new();

        // The click stream proxies to the main API
        let api = find_http_endpoint(self.provider, &names.mysfits_api, &self.config.region).await?;
        let api = endpoint_value(api, &names.mysfits_api, &mut missing);

        let files = vec![self.rewrite(KINESIS_STACK, &[Binding::new(tokens::API_URL, api)])?];

        Ok(PrepareReport {
            mode: Mode::ClickProcessingApiEndpoint,
            files,
            missing,
        })
    }

    fn xray_file(&self) -> Result<PrepareReport> {
        let mut missing = Vec::new();
        let email = self.config.receiver_email.clone();
        if email.is_none() {
            note(&mut missing, MissingValue::ReceiverEmail);
        }

        let files = vec![self.rewrite(
            XRAY_STACK,
            &[Binding::new(tokens::RECEIVER_EMAIL, email)],
        )?];

        Ok(PrepareReport {
            mode: Mode::Email,
            files,
            missing,
        })
    }

    async fn recommendations_file(&self) -> Result<PrepareReport> {
        let prefix = &self.config.names.model_endpoint_prefix;
        let mut missing = Vec::new();

        let endpoint = find_inservice_model_endpoint(self.provider, prefix)
            .await?
            .into_option();
        if endpoint.is_none() {
            note(&mut missing, MissingValue::ModelEndpoint(prefix.clone()));
        }

        let files = vec![self.rewrite(
            RECOMMENDATIONS_SERVICE,
            &[Binding::new(tokens::SAGEMAKER_ENDPOINT_NAME, endpoint)],
        )?];

        Ok(PrepareReport {
            mode: Mode::RecommendationsApiEndpoint,
            files,
            missing,
        })
    }

    /// Rewrite a project file in place
    fn rewrite(&self, relative: &str, bindings: &[Binding]) -> Result<SubstitutionReport> {
        let path = self.config.path(relative);
        let report = substitute(bindings, &path, &path)?;
        debug!(file = %path.display(), replaced = report.total(), "rewrote file");
        Ok(report)
    }
}

fn note(missing: &mut Vec<MissingValue>, value: MissingValue) {
    debug!("{}", value);
    missing.push(value);
}

fn endpoint_value(
    lookup: Lookup<ResolvedEndpoint>,
    api_name: &str,
    missing: &mut Vec<MissingValue>,
) -> Option<String> {
    match lookup {
        Lookup::Found(endpoint) => Some(endpoint.as_str().to_string()),
        Lookup::NotFound => {
            note(missing, MissingValue::Api(api_name.to_string()));
            None
        }
    }
}
