//! Process-level errors.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::nodes::NodeError;
use crate::tables::TableError;

/// Anything that stops a node process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", join_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("cannot listen for interrupts: {0}")]
    Signal(#[source] io::Error),
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(vec![error])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
