//! Status command handler.
//!
//! Prints one row per adjacent service without starting anything.

use std::path::Path;
use std::sync::Arc;

use mmgis_core::{AdjacentConfig, StdoutSink};
use mmgis_runtime::Supervisor;

/// Render the status table for `config`.
pub fn render(config: &AdjacentConfig, docker: bool, servers_dir: &Path) -> String {
    let plan = Supervisor::new(Arc::new(StdoutSink))
        .with_base_dir(servers_dir)
        .plan(config);
    let states = Supervisor::planned_states(&plan);

    let mut out = format!(
        "{:<16} {:<8} {:<6} {:<28} {:<36} {}\n",
        "SERVICE", "ENABLED", "PORT", "PATH", "TARGET", "ON SERVE"
    );
    for descriptor in &config.services {
        let process = states
            .iter()
            .find(|(name, _)| name == descriptor.name())
            .map_or_else(|| "external".to_string(), |(_, state)| state.to_string());
        out.push_str(&format!(
            "{:<16} {:<8} {:<6} {:<28} {:<36} {}\n",
            descriptor.name(),
            descriptor.enabled,
            descriptor.port,
            descriptor.mount_path(&config.root_path),
            descriptor.target(docker),
            process,
        ));
    }
    out
}

/// Execute the status command.
pub fn execute(config: &AdjacentConfig, docker: bool, servers_dir: &Path) {
    print!("{}", render(config, docker, servers_dir));
}
