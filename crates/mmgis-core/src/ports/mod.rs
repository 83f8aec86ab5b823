//! Port definitions shared by the proxy and runtime crates.

pub mod authorizer;
pub mod process_output;

pub use authorizer::{AnonymousOnly, Authorizer, Credential, Identity};
pub use process_output::{MemorySink, ProcessOutputSink, StdoutSink};
