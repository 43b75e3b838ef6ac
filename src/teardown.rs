//! Resource teardown
//!
//! `clean` removes what a deployment leaves behind in one region: model
//! endpoints, endpoint configs and models (by name prefix), key-value tables
//! (by name), the user pool and the image repository.
//!
//! [`plan`] only lists what exists; [`execute`] deletes what a plan names, in
//! plan order. A resource that disappeared in between counts as already gone.

use std::fmt;

use tracing::{debug, info};

use crate::config::WebgenConfig;
use crate::discovery::{find_user_pool_id, Lookup};
use crate::error::Result;
use crate::provider::{CloudProvider, ModelResource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Model(ModelResource),
    Table,
    UserPool,
    Repository,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Model(ModelResource::Endpoint) => "model endpoint",
            ResourceKind::Model(ModelResource::EndpointConfig) => "endpoint config",
            ResourceKind::Model(ModelResource::Model) => "model",
            ResourceKind::Table => "table",
            ResourceKind::UserPool => "user pool",
            ResourceKind::Repository => "image repository",
        };
        f.write_str(label)
    }
}

/// One resource a teardown will delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownTarget {
    pub kind: ResourceKind,
    pub name: String,
    /// What the delete call takes: the pool id for user pools, else the name
    pub handle: String,
}

impl TeardownTarget {
    fn named(kind: ResourceKind, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind,
            handle: name.clone(),
            name,
        }
    }
}

impl fmt::Display for TeardownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.handle == self.name {
            write!(f, "{} {}", self.kind, self.name)
        } else {
            write!(f, "{} {} ({})", self.kind, self.name, self.handle)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    pub deleted: Vec<TeardownTarget>,
    pub already_gone: Vec<TeardownTarget>,
}

/// List every resource `clean` would delete, without deleting anything
///
/// Model resources come first, endpoints before their configs and configs
/// before models. An empty prefix skips that kind.
pub async fn plan(
    provider: &dyn CloudProvider,
    config: &WebgenConfig,
) -> Result<Vec<TeardownTarget>> {
    let names = &config.names;
    let teardown = &names.teardown;
    let mut targets = Vec::new();

    for kind in ModelResource::ALL {
        let prefix = match kind {
            ModelResource::Endpoint => &teardown.endpoint_prefix,
            ModelResource::EndpointConfig => &teardown.endpoint_config_prefix,
            ModelResource::Model => &teardown.model_prefix,
        };
        if prefix.is_empty() {
            debug!(?kind, "no prefix, skipping");
            continue;
        }
        for name in provider.list_model_resources(kind, prefix).await? {
            targets.push(TeardownTarget::named(ResourceKind::Model(kind), name));
        }
    }

    for table in &teardown.tables {
        if provider.table_exists(table).await? {
            targets.push(TeardownTarget::named(ResourceKind::Table, table.as_str()));
        }
    }

    if let Lookup::Found(pool_id) = find_user_pool_id(provider, &names.user_pool).await? {
        targets.push(TeardownTarget {
            kind: ResourceKind::UserPool,
            name: names.user_pool.clone(),
            handle: pool_id,
        });
    }

    if provider
        .repository_image_count(&names.image_repository)
        .await?
        .is_some()
    {
        targets.push(TeardownTarget::named(
            ResourceKind::Repository,
            names.image_repository.as_str(),
        ));
    }

    debug!(count = targets.len(), region = %config.region, "planned teardown");
    Ok(targets)
}

/// Delete every target in order; the first provider failure stops the run
pub async fn execute(
    provider: &dyn CloudProvider,
    targets: &[TeardownTarget],
) -> Result<TeardownReport> {
    let mut report = TeardownReport::default();

    for target in targets {
        let deleted = match target.kind {
            ResourceKind::Model(kind) => {
                provider.delete_model_resource(kind, &target.handle).await?;
                true
            }
            ResourceKind::Table => provider.delete_table(&target.handle).await?,
            ResourceKind::UserPool => provider.delete_user_pool(&target.handle).await?,
            ResourceKind::Repository => provider.delete_repository(&target.handle).await?,
        };

        if deleted {
            info!(kind = %target.kind, name = %target.name, "deleted");
            report.deleted.push(target.clone());
        } else {
            debug!(kind = %target.kind, name = %target.name, "already gone");
            report.already_gone.push(target.clone());
        }
    }

    Ok(report)
}
