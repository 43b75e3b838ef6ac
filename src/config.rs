//! Webgen Configuration
//!
//! [`WebgenConfig`] is built once in `main` from the process environment and
//! CLI options, then passed down. Nothing else reads the environment.
//!
//! ## Sources
//!
//! 1. Environment: `AWS_DEFAULT_REGION` (required), `RECEIVER_EMAIL` (optional)
//! 2. `<root>/webgen.toml`: overrides for [`ResourceNames`]
//! 3. Defaults: the Mythical Mysfits resource names

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebgenError};

pub const REGION_VAR: &str = "AWS_DEFAULT_REGION";
pub const RECEIVER_EMAIL_VAR: &str = "RECEIVER_EMAIL";
pub const CONFIG_FILE: &str = "webgen.toml";

/// Logical names of the deployed resources the tool looks up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceNames {
    /// Primary API; the web mode cannot run without it
    pub mysfits_api: String,
    pub click_processing_api: String,
    pub questions_api: String,
    pub recommendations_api: String,
    pub user_pool: String,
    pub user_pool_client: String,
    /// Prefix of the recommendation model endpoint rewritten into the lambda
    pub model_endpoint_prefix: String,
    /// Prefix used by `check inference-endpoint`
    pub inference_check_prefix: String,
    pub image_repository: String,
    pub cluster: String,
    pub service: String,
    /// What `clean` deletes, under `[teardown]`
    pub teardown: TeardownNames,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            mysfits_api: "MysfitsApi".to_string(),
            click_processing_api: "ClickProcessingApi".to_string(),
            questions_api: "QuestionsAPI".to_string(),
            recommendations_api: "RecommendationsAPI".to_string(),
            user_pool: "MysfitsUserPool".to_string(),
            user_pool_client: "MysfitsUserPoolClient".to_string(),
            model_endpoint_prefix: "knn-".to_string(),
            inference_check_prefix: "knn".to_string(),
            image_repository: "mythicalmysfits/service".to_string(),
            cluster: "MythicalMysfits-Cluster".to_string(),
            service: "MythicalMysfits-FargateService".to_string(),
            teardown: TeardownNames::default(),
        }
    }
}

/// Resources removed by `clean`, besides the user pool and image repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TeardownNames {
    /// Key-value tables, by exact name
    pub tables: Vec<String>,
    /// Substring matched against model endpoint names (any status)
    pub endpoint_prefix: String,
    pub endpoint_config_prefix: String,
    pub model_prefix: String,
}

impl Default for TeardownNames {
    fn default() -> Self {
        Self {
            tables: vec!["MysfitsTable".to_string(), "MysfitsQuestionsTable".to_string()],
            endpoint_prefix: "mysfits".to_string(),
            endpoint_config_prefix: "mysfits".to_string(),
            model_prefix: "knn".to_string(),
        }
    }
}

impl ResourceNames {
    /// Load `<root>/webgen.toml`, or defaults if the file doesn't exist
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| WebgenError::Config {
            path: path.clone(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| WebgenError::Config {
            path,
            reason: format!("Failed to parse config file: {}", e),
        })
    }
}

/// Everything a command needs, resolved up front
#[derive(Debug, Clone)]
pub struct WebgenConfig {
    pub region: String,
    pub receiver_email: Option<String>,
    /// Project root; target files are resolved against it
    pub root: PathBuf,
    pub names: ResourceNames,
    /// Fixture for the mock provider
    pub fixture: Option<PathBuf>,
}

impl WebgenConfig {
    /// Build from a snapshot of environment variables
    ///
    /// Takes the variables as a map so callers (and tests) decide where they
    /// come from. Empty values count as unset.
    pub fn from_vars(vars: &HashMap<String, String>, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        let region = get(REGION_VAR).ok_or_else(|| WebgenError::MissingEnv {
            name: REGION_VAR.to_string(),
        })?;

        Ok(Self {
            region,
            receiver_email: get(RECEIVER_EMAIL_VAR),
            names: ResourceNames::load(&root)?,
            root,
            fixture: None,
        })
    }

    /// Build from the current process environment
    ///
    /// Only the variables read here are inspected; a value that is not
    /// valid UTF-8 counts as unset.
    pub fn from_env(root: impl Into<PathBuf>) -> Result<Self> {
        let vars: HashMap<String, String> = [REGION_VAR, RECEIVER_EMAIL_VAR]
            .into_iter()
            .filter_map(|name| Some((name.to_string(), std::env::var(name).ok()?)))
            .collect();
        Self::from_vars(&vars, root)
    }

    pub fn with_fixture(mut self, fixture: Option<PathBuf>) -> Self {
        self.fixture = fixture;
        self
    }

    /// Resolve a project-relative path
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}
