//! Crate-level error type for hosts that wire several collaborators.

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::RenderError;
use crate::storage::StorageError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
