//! Builds the configured node and drives it until shutdown.

use tracing::info;

use crate::config::{ConfigError, DemandConfig, DispatchConfig, GridConfig, NodeKind};
use crate::error::{Error, Result};
use crate::nodes::{AveragingNode, DemandNode, DispatchNode};
use crate::runtime::{run_node, run_tickgen};
use crate::tables::{LoadProfile, Schedule};

/// Loads the profile named by `config` and builds a demand node from it.
///
/// # Errors
///
/// Returns [`Error::Config`] if no profile file is configured, or
/// [`Error::Table`] if it cannot be loaded.
pub fn build_demand_node(config: &DemandConfig) -> Result<DemandNode> {
    let path = config
        .profile_file
        .as_deref()
        .ok_or_else(|| missing("demand.profile_file"))?;
    let profile = LoadProfile::from_csv_path(path, config.profile_column)?;
    info!(path = %path.display(), slots = profile.len(), "load profile loaded");
    Ok(DemandNode::new(
        config.base_topic.as_str(),
        profile,
        config.population_factor,
        config.jitter,
        config.seed,
    ))
}

/// Loads the schedule named by `config` and builds a dispatch node from it.
///
/// # Errors
///
/// Returns [`Error::Config`] if no schedule file is configured, or
/// [`Error::Table`] if it cannot be loaded.
pub fn build_dispatch_node(config: &DispatchConfig) -> Result<DispatchNode> {
    let path = config
        .schedule_file
        .as_deref()
        .ok_or_else(|| missing("dispatch.schedule_file"))?;
    let schedule = Schedule::from_json_path(path)?;
    info!(
        path = %path.display(),
        producers = schedule.producers().len(),
        "schedule loaded"
    );
    Ok(DispatchNode::new(config.base_topic.as_str(), schedule))
}

/// MQTT client id for the node of `kind`.
pub fn client_id(config: &GridConfig, kind: NodeKind) -> String {
    match kind {
        NodeKind::Sink => format!("sink_{}", config.sink.id),
        NodeKind::Demand => config.demand.name.clone(),
        NodeKind::Dispatch => config.dispatch.name.clone(),
        NodeKind::Tickgen => config.tickgen.name.clone(),
    }
}

/// Validates `config`, loads the tables for `kind` and runs its node.
///
/// # Errors
///
/// Returns every validation failure at once, a table error if startup data
/// cannot be loaded, or the error that ended the node.
pub async fn run(config: &GridConfig, kind: NodeKind) -> Result<()> {
    let errors = config.validate(kind);
    if !errors.is_empty() {
        return Err(Error::Config(errors));
    }

    let id = client_id(config, kind);
    match kind {
        NodeKind::Sink => run_node(&id, &config.broker, AveragingNode::new(&config.sink.id)).await,
        NodeKind::Demand => {
            let node = build_demand_node(&config.demand)?;
            run_node(&id, &config.broker, node).await
        }
        NodeKind::Dispatch => {
            let node = build_dispatch_node(&config.dispatch)?;
            run_node(&id, &config.broker, node).await
        }
        NodeKind::Tickgen => run_tickgen(&config.broker, &config.tickgen).await,
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError {
        field: field.to_owned(),
        message: "must be set".to_owned(),
    }
}
