//! Adjacent service catalog.
//!
//! The set of adjacent services is fixed at compile time. Everything that
//! varies per deployment (enable flag, port) lives in [`ServiceDescriptor`],
//! which is built once from the environment by
//! [`AdjacentConfig`](crate::config::AdjacentConfig).

use std::fmt;

use serde::Serialize;

/// The adjacent geospatial services MMGIS knows how to proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdjacentService {
    /// STAC catalog API (stac-fastapi).
    Stac,
    /// tipg vector tile / OGC features API.
    Tipg,
    /// TiTiler raster tile API.
    Titiler,
    /// TiTiler backed by pgSTAC mosaics.
    TitilerPgstac,
    /// Veloserver. Always externally managed.
    Veloserver,
}

impl AdjacentService {
    /// Every known service, in registration order.
    pub const ALL: [Self; 5] = [
        Self::Stac,
        Self::Tipg,
        Self::Titiler,
        Self::TitilerPgstac,
        Self::Veloserver,
    ];

    /// Symbolic name, also used for the start script and log prefixes.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stac => "stac",
            Self::Tipg => "tipg",
            Self::Titiler => "titiler",
            Self::TitilerPgstac => "titiler-pgstac",
            Self::Veloserver => "veloserver",
        }
    }

    /// Public path segment the service is mounted under (without slashes).
    pub const fn path_prefix(self) -> &'static str {
        match self {
            Self::TitilerPgstac => "titilerpgstac",
            other => other.name(),
        }
    }

    /// Hostname of the service on the container network.
    pub const fn docker_host(self) -> &'static str {
        match self {
            Self::Stac => "stac-fastapi",
            other => other.name(),
        }
    }

    /// Environment variable whose literal value `"true"` enables the service.
    pub const fn enable_var(self) -> &'static str {
        match self {
            Self::Stac => "WITH_STAC",
            Self::Tipg => "WITH_TIPG",
            Self::Titiler => "WITH_TITILER",
            Self::TitilerPgstac => "WITH_TITILER_PGSTAC",
            Self::Veloserver => "WITH_VELOSERVER",
        }
    }

    /// Environment variable holding the backend port.
    pub const fn port_var(self) -> &'static str {
        match self {
            Self::Stac => "STAC_PORT",
            Self::Tipg => "TIPG_PORT",
            Self::Titiler => "TITILER_PORT",
            Self::TitilerPgstac => "TITILER_PGSTAC_PORT",
            Self::Veloserver => "VELOSERVER_PORT",
        }
    }

    pub const fn default_port(self) -> u16 {
        match self {
            Self::Stac => 8881,
            Self::Tipg => 8882,
            Self::Titiler => 8883,
            Self::TitilerPgstac => 8884,
            Self::Veloserver => 8104,
        }
    }

    /// Whether the process supervisor launches this service itself.
    pub const fn is_supervised(self) -> bool {
        !matches!(self, Self::Veloserver)
    }

    /// Whether proxied responses get their API-doc URLs rewritten.
    pub const fn rewrites_responses(self) -> bool {
        !matches!(self, Self::Veloserver)
    }

    /// GET path suffixes that still require admin.
    pub const fn get_exceptions(self) -> &'static [&'static str] {
        match self {
            Self::Titiler => &["/cog/stac"],
            _ => &[],
        }
    }
}

impl fmt::Display for AdjacentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deployment-resolved facts about one adjacent service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub service: AdjacentService,
    pub enabled: bool,
    pub port: u16,
    pub path_prefix: String,
    pub get_exceptions: Vec<String>,
}

impl ServiceDescriptor {
    /// Descriptor with the service's static defaults.
    pub fn new(service: AdjacentService, enabled: bool, port: u16) -> Self {
        Self {
            service,
            enabled,
            port,
            path_prefix: service.path_prefix().to_string(),
            get_exceptions: service
                .get_exceptions()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.service.name()
    }

    /// Hostname used to reach the backend.
    pub fn host(&self, docker: bool) -> &'static str {
        if docker {
            self.service.docker_host()
        } else {
            "localhost"
        }
    }

    /// Internal base URL of the backend, e.g. `http://stac-fastapi:8881`.
    pub fn target(&self, docker: bool) -> String {
        format!("http://{}:{}", self.host(docker), self.port)
    }

    /// Public mount path of the service below `root_path`.
    pub fn mount_path(&self, root_path: &str) -> String {
        format!("{root_path}/{}", self.path_prefix)
    }
}
