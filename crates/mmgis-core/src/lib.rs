//! Core types for the MMGIS adjacent servers.
//!
//! Service descriptors, the environment-derived configuration, and the
//! ports the proxy and runtime crates plug their collaborators into.
//! No HTTP serving and no process spawning happens here.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{AdjacentConfig, EXTERNAL_ROOT_PATH_VAR, ROOT_PATH_VAR};
pub use error::ConfigError;
pub use ports::{
    AnonymousOnly, Authorizer, Credential, Identity, MemorySink, ProcessOutputSink, StdoutSink,
};
pub use service::{AdjacentService, ServiceDescriptor};
