//! Error types with fix suggestions
//!
//! Error code ranges:
//! - WEBGEN-000-009: Configuration errors
//! - WEBGEN-010-019: Provider errors
//! - WEBGEN-020-029: File access errors
//! - WEBGEN-030-039: Template/binding errors

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebgenError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum WebgenError {
    // ─────────────────────────────────────────────────────────────
    // Configuration errors (WEBGEN-000 to WEBGEN-009)
    // ─────────────────────────────────────────────────────────────
    #[error("[WEBGEN-001] Missing required environment variable: {name}")]
    MissingEnv { name: String },

    #[error("[WEBGEN-002] Failed to load config '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Provider errors (WEBGEN-010 to WEBGEN-019)
    // ─────────────────────────────────────────────────────────────
    #[error("[WEBGEN-010] {service} {operation} failed: {details}")]
    Provider {
        service: String,
        operation: String,
        details: String,
    },

    #[error("[WEBGEN-011] Unknown provider: '{name}'. Available: aws, mock")]
    UnknownProvider { name: String },

    #[error("[WEBGEN-012] Invalid mock fixture '{path}': {reason}")]
    Fixture { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────
    // File access errors (WEBGEN-020 to WEBGEN-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[WEBGEN-020] Cannot read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[WEBGEN-021] Cannot write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // Template/binding errors (WEBGEN-030 to WEBGEN-039)
    // ─────────────────────────────────────────────────────────────
    #[error("[WEBGEN-030] Invalid placeholder token '{token}'")]
    InvalidPlaceholder { token: String },

    #[error("[WEBGEN-031] Invalid binding '{raw}': expected TOKEN=VALUE")]
    InvalidBinding { raw: String },

    #[error("[WEBGEN-032] Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("[WEBGEN-040] JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebgenError {
    /// Build a provider error from any SDK error, keeping its whole cause chain
    pub fn provider(
        service: impl Into<String>,
        operation: impl Into<String>,
        details: impl std::fmt::Display,
    ) -> Self {
        WebgenError::Provider {
            service: service.into(),
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// True for failures of the cloud control plane (as opposed to local errors)
    pub fn is_provider_error(&self) -> bool {
        matches!(self, WebgenError::Provider { .. })
    }
}

impl FixSuggestion for WebgenError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WebgenError::MissingEnv { .. } => {
                Some("Export AWS_DEFAULT_REGION (or add it to .env) before running")
            }
            WebgenError::Config { .. } => Some("Check webgen.toml syntax and field names"),
            WebgenError::Provider { .. } => {
                Some("Check AWS credentials, permissions and network access, then re-run")
            }
            WebgenError::UnknownProvider { .. } => Some("Use --provider aws or --provider mock"),
            WebgenError::Fixture { .. } => Some("Check the fixture file passed with --fixture"),
            WebgenError::FileRead { .. } => {
                Some("Run from the project root or pass --root; check file permissions")
            }
            WebgenError::FileWrite { .. } => {
                Some("Check permissions; restore the file from a clean checkout and re-run")
            }
            WebgenError::InvalidPlaceholder { .. } => {
                Some("Placeholder tokens look like REPLACE_ME_<NAME>")
            }
            WebgenError::InvalidBinding { .. } => Some("Use --set REPLACE_ME_NAME=value"),
            WebgenError::InvalidEndpoint { .. } => None,
            WebgenError::Json(_) => None,
        }
    }
}
