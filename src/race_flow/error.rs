//! Setup errors. A race that fails setup never starts; there is no retry.

use crate::race_flow::competitor::CompetitorId;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("No competitors found")]
    NoCompetitors,

    #[error("Player {0} is not in the roster")]
    UnknownPlayer(CompetitorId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
