//! Webgen - deployment preparation for the Mythical Mysfits demo application

pub mod admin;
pub mod config;
pub mod discovery;
pub mod error;
pub mod prepare;
pub mod provider;
pub mod teardown;
pub mod template;

pub use config::{ResourceNames, TeardownNames, WebgenConfig};
pub use discovery::{Lookup, ResolvedEndpoint};
pub use error::{FixSuggestion, Result, WebgenError};
pub use prepare::{Mode, PrepareOutcome, PrepareReport, Preparer};
pub use provider::{create_provider, CloudProvider};
pub use template::{Binding, SENTINEL};
