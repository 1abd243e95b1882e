//! Error types for pwmbank-engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] pwmbank_core::Error),

    #[error("Render resources already allocated")]
    AlreadyAllocated,
}

pub type Result<T> = std::result::Result<T, Error>;
