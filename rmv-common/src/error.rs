//! Errors raised by configuration handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Writing the config file or its directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable, unparsable or unserializable
    #[error("Configuration error: {0}")]
    Config(String),
}
