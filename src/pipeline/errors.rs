use thiserror::Error;

use crate::session::ControllerError;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Session task failed: {0}")]
    Task(String),
}
