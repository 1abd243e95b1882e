//! Error type for the pwmbank umbrella crate.
//!
//! Wraps the member crate errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] pwmbank_core::Error),

    #[cfg(feature = "engine")]
    #[error("Engine: {0}")]
    Engine(#[from] pwmbank_engine::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
