//! Environment-derived configuration for the adjacent servers.
//!
//! The environment is read exactly once. Callers that need a different
//! source (tests, embedding hosts) go through [`AdjacentConfig::from_lookup`]
//! instead of mutating the process environment.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::service::{AdjacentService, ServiceDescriptor};

/// Environment variable for the public path prefix of every route.
pub const ROOT_PATH_VAR: &str = "ROOT_PATH";

/// Environment variable for the extra prefix used in externally visible URLs.
pub const EXTERNAL_ROOT_PATH_VAR: &str = "EXTERNAL_ROOT_PATH";

/// Immutable snapshot of the adjacent-server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacentConfig {
    /// One descriptor per [`AdjacentService`], in [`AdjacentService::ALL`] order.
    pub services: Vec<ServiceDescriptor>,
    /// Public prefix prepended to every proxy route, without trailing slash.
    pub root_path: String,
    /// Extra prefix for absolute URLs written into rewritten API documents.
    pub external_root_path: String,
}

impl AdjacentConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root_path = lookup(ROOT_PATH_VAR).unwrap_or_default();
        if !root_path.is_empty() && !root_path.starts_with('/') {
            return Err(ConfigError::InvalidRootPath {
                var: ROOT_PATH_VAR,
                value: root_path,
            });
        }
        let root_path = root_path.trim_end_matches('/').to_string();
        let external_root_path = lookup(EXTERNAL_ROOT_PATH_VAR).unwrap_or_default();

        let services = AdjacentService::ALL
            .into_iter()
            .map(|service| {
                let enabled = lookup(service.enable_var()).as_deref() == Some("true");
                let port = parse_port(service, lookup(service.port_var()))?;
                Ok(ServiceDescriptor::new(service, enabled, port))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = Self {
            services,
            root_path,
            external_root_path,
        };
        config.validate()?;

        debug!(
            root_path = %config.root_path,
            external_root_path = %config.external_root_path,
            enabled = ?config.enabled().map(ServiceDescriptor::name).collect::<Vec<_>>(),
            "Adjacent server configuration loaded"
        );

        Ok(config)
    }

    /// Check the cross-descriptor invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for descriptor in &self.services {
            if !seen.insert(descriptor.path_prefix.as_str()) {
                return Err(ConfigError::DuplicatePrefix(descriptor.path_prefix.clone()));
            }
        }
        Ok(())
    }

    /// Descriptors whose enable flag is set.
    pub fn enabled(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter().filter(|d| d.enabled)
    }

    pub fn descriptor(&self, service: AdjacentService) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|d| d.service == service)
    }

    /// `<EXTERNAL_ROOT_PATH><ROOT_PATH>`, the base of externally visible URLs.
    pub fn external_base(&self) -> String {
        format!("{}{}", self.external_root_path, self.root_path)
    }
}

/// Unset or empty falls back to the service default.
fn parse_port(service: AdjacentService, raw: Option<String>) -> Result<u16, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(service.default_port()),
        Some(value) => match value.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(ConfigError::InvalidPort {
                var: service.port_var(),
                value: value.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AdjacentConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.services.len(), 5);
        assert_eq!(config.enabled().count(), 0);
        assert_eq!(config.root_path, "");
        assert_eq!(config.external_root_path, "");

        let ports: Vec<u16> = config.services.iter().map(|d| d.port).collect();
        assert_eq!(ports, vec![8881, 8882, 8883, 8884, 8104]);
    }

    #[test]
    fn test_only_literal_true_enables() {
        let config = AdjacentConfig::from_lookup(lookup_from(&[
            ("WITH_STAC", "true"),
            ("WITH_TIPG", "TRUE"),
            ("WITH_TITILER", "1"),
            ("WITH_TITILER_PGSTAC", "false"),
            ("WITH_VELOSERVER", "true "),
        ]))
        .unwrap();

        let enabled: Vec<AdjacentService> = config.enabled().map(|d| d.service).collect();
        assert_eq!(enabled, vec![AdjacentService::Stac]);
    }

    #[test]
    fn test_stac_scenario_targets() {
        let config = AdjacentConfig::from_lookup(lookup_from(&[
            ("WITH_STAC", "true"),
            ("STAC_PORT", "9999"),
            ("ROOT_PATH", "/app"),
        ]))
        .unwrap();

        let stac = config.descriptor(AdjacentService::Stac).unwrap();
        assert_eq!(stac.target(true), "http://stac-fastapi:9999");
        assert_eq!(stac.target(false), "http://localhost:9999");
        assert_eq!(stac.mount_path(&config.root_path), "/app/stac");
    }

    #[test]
    fn test_empty_port_falls_back_to_default() {
        let config =
            AdjacentConfig::from_lookup(lookup_from(&[("TIPG_PORT", "")])).unwrap();
        assert_eq!(config.descriptor(AdjacentService::Tipg).unwrap().port, 8882);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = AdjacentConfig::from_lookup(lookup_from(&[("TITILER_PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                var: "TITILER_PORT",
                value: "eighty".to_string()
            }
        );

        assert!(AdjacentConfig::from_lookup(lookup_from(&[("STAC_PORT", "0")])).is_err());
        assert!(AdjacentConfig::from_lookup(lookup_from(&[("STAC_PORT", "70000")])).is_err());
    }

    #[test]
    fn test_root_path_must_be_absolute() {
        let err = AdjacentConfig::from_lookup(lookup_from(&[("ROOT_PATH", "mmgis")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRootPath { .. }));
    }

    #[test]
    fn test_root_path_trailing_slash_is_trimmed() {
        let config =
            AdjacentConfig::from_lookup(lookup_from(&[("ROOT_PATH", "/mmgis/")])).unwrap();
        assert_eq!(config.root_path, "/mmgis");

        let config = AdjacentConfig::from_lookup(lookup_from(&[("ROOT_PATH", "/")])).unwrap();
        assert_eq!(config.root_path, "");
    }

    #[test]
    fn test_external_base_concatenates() {
        let config = AdjacentConfig::from_lookup(lookup_from(&[
            ("ROOT_PATH", "/app"),
            ("EXTERNAL_ROOT_PATH", "/gateway"),
        ]))
        .unwrap();
        assert_eq!(config.external_base(), "/gateway/app");
    }

    #[test]
    fn test_duplicate_prefix_is_rejected() {
        let mut config = AdjacentConfig::from_lookup(lookup_from(&[])).unwrap();
        config.services[1].path_prefix = "stac".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePrefix("stac".to_string()))
        );
    }
}
