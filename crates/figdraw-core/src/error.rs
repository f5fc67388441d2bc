use thiserror::Error;

use crate::codec::CodecError;
use crate::command::CommandError;
use crate::config::ConfigError;
use crate::document::DocumentError;

/// Crate-level convenience error over the per-module errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, Error>;
