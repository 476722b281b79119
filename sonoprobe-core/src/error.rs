//! Error types for SonoProbe

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SonoProbeError {
    /// The geometry backend could not answer a ray query this tick.
    #[error("Geometry query unavailable: {0}")]
    QueryUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Parameter sink error: {0}")]
    ParameterSink(String),
}

pub type Result<T> = std::result::Result<T, SonoProbeError>;
