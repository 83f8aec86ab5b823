//! Process management for adjacent servers.
//!
//! # Structure
//!
//! - `SupervisedService` / `spawn_service` - launch one server through the shell
//! - `ChildProcessHandle` / `ProcessState` - observe and stop a launched server
//! - Output readers that echo readiness lines
//! - Graceful shutdown and the TCP readiness probe

mod health;
pub mod shutdown;
mod spawn;
mod stream;
mod types;

pub use health::wait_for_port;
pub use shutdown::{DEFAULT_GRACE, shutdown_child};
pub use spawn::{DEFAULT_BASE_DIR, SupervisedService, spawn_service, start_command};
pub use stream::{READY_MARKER, echo_line};
pub use types::{ChildProcessHandle, ProcessState};
