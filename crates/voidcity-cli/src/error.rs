use thiserror::Error;

use voidcity_core::error::CoreError;
use voidcity_runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}
