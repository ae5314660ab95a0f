pub mod graph;
pub mod params;

pub use graph::{BusAttachment, BusPort, Component, ComponentKind, Endpoint, Link, Topology};
pub use params::{ParamSet, ParamValue};

use thiserror::Error;

/// Validation failures raised while a topology is being assembled.
///
/// Construction is deterministic, so none of these are retryable; the caller
/// discards the partial topology and aborts the configuration run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("core count must be at least 1, got {0}")]
    InvalidCoreCount(usize),

    #[error("duplicate component name `{0}`")]
    DuplicateComponentName(String),

    #[error("duplicate link name `{0}`")]
    DuplicateLinkName(String),

    #[error("port `{port}` on `{component}` is already connected")]
    PortConflict { component: String, port: String },

    #[error("unknown component `{0}`")]
    UnknownComponent(String),
}
