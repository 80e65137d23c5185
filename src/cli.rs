use std::path::PathBuf;

use clap::{Parser, Subcommand};

use grid_nodes::config::{GridConfig, NodeKind};

/// Tick-reactive grid nodes on an MQTT bus.
///
/// Flags override the TOML file; each flag falls back to its environment
/// variable when not given.
#[derive(Debug, Parser)]
#[command(name = "grid-nodes", version)]
pub struct Args {
    /// TOML configuration file
    #[arg(long, env = "GRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST")]
    pub broker_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT")]
    pub broker_port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rolling average over a chaos sensor
    Sink(SinkArgs),
    /// Consumer demand from a load profile
    Demand(DemandArgs),
    /// Producer setpoints from an hourly schedule
    Dispatch(DispatchArgs),
    /// Publish simulated ticks
    Tickgen(TickgenArgs),
}

#[derive(Debug, clap::Args)]
pub struct SinkArgs {
    /// Sensor id
    #[arg(long, env = "ID")]
    pub id: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct DemandArgs {
    /// MQTT client name
    #[arg(long, env = "EC_NAME")]
    pub name: Option<String>,

    /// Topic prefix for demand and scale
    #[arg(long, env = "EC_MQTT_TOPIC")]
    pub base_topic: Option<String>,

    /// CSV load profile
    #[arg(long, env = "EC_SLP_FILE")]
    pub profile_file: Option<PathBuf>,

    /// Coefficient column in the profile
    #[arg(long, env = "EC_SLP_IDX")]
    pub profile_column: Option<usize>,

    /// Number of people the consumer represents
    #[arg(long, env = "EC_POPULATION_FACTOR")]
    pub population_factor: Option<u32>,

    /// Relative jitter amplitude
    #[arg(long)]
    pub jitter: Option<f64>,

    /// Jitter seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, clap::Args)]
pub struct DispatchArgs {
    /// MQTT client name
    #[arg(long, env = "SCHED_NAME")]
    pub name: Option<String>,

    /// Topic prefix for the mode control
    #[arg(long, env = "SCHED_BASE_TOPIC")]
    pub base_topic: Option<String>,

    /// JSON schedule
    #[arg(long, env = "SCHED_CONFIG_FILE")]
    pub schedule_file: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct TickgenArgs {
    /// First simulated instant
    #[arg(long)]
    pub start: Option<String>,

    /// Simulated minutes per tick
    #[arg(long)]
    pub step_minutes: Option<i64>,

    /// Wall-clock seconds between ticks
    #[arg(long)]
    pub interval_secs: Option<f64>,

    /// Stop after this many ticks
    #[arg(long)]
    pub count: Option<usize>,
}

impl Command {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Sink(_) => NodeKind::Sink,
            Self::Demand(_) => NodeKind::Demand,
            Self::Dispatch(_) => NodeKind::Dispatch,
            Self::Tickgen(_) => NodeKind::Tickgen,
        }
    }
}

/// Overwrites `target` when `value` is set.
fn set<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl Args {
    /// Applies every given flag on top of `config`.
    pub fn apply(&self, config: &mut GridConfig) {
        set(&mut config.broker.host, self.broker_host.as_ref());
        set(&mut config.broker.port, self.broker_port.as_ref());

        match &self.command {
            Command::Sink(args) => set(&mut config.sink.id, args.id.as_ref()),
            Command::Demand(args) => {
                let d = &mut config.demand;
                set(&mut d.name, args.name.as_ref());
                set(&mut d.base_topic, args.base_topic.as_ref());
                if let Some(path) = &args.profile_file {
                    d.profile_file = Some(path.clone());
                }
                set(&mut d.profile_column, args.profile_column.as_ref());
                set(&mut d.population_factor, args.population_factor.as_ref());
                set(&mut d.jitter, args.jitter.as_ref());
                if args.seed.is_some() {
                    d.seed = args.seed;
                }
            }
            Command::Dispatch(args) => {
                let d = &mut config.dispatch;
                set(&mut d.name, args.name.as_ref());
                set(&mut d.base_topic, args.base_topic.as_ref());
                if let Some(path) = &args.schedule_file {
                    d.schedule_file = Some(path.clone());
                }
            }
            Command::Tickgen(args) => {
                let t = &mut config.tickgen;
                if let Some(start) = &args.start {
                    t.start = Some(start.clone());
                }
                set(&mut t.step_minutes, args.step_minutes.as_ref());
                set(&mut t.interval_secs, args.interval_secs.as_ref());
                if args.count.is_some() {
                    t.count = args.count;
                }
            }
        }
    }
}
