/*
 * This file is part of kvd, an in-memory key-value server.
 *
 * Copyright (c) 2024, the kvd authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # Server configuration (§12)
//!
//! A `ServerConfig` resolved from a small cascade, highest priority first:
//! CLI flags, then a `--config` YAML file, then hardcoded defaults. Mirrors
//! the teacher's layered `ConfigurationSet` resolution, trimmed down to the
//! handful of knobs this server actually has.

use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::Deserialize;

use kvd_core::{DEFAULT_PORT, K_MAX_ARGS, K_MAX_MSG};

const DEFAULT_HOST: [u8; 4] = [0, 0, 0, 0];
/// Bookkeeping only: the event loop is single-threaded and bounded by the
/// process' fd limit, not by an enforced connection semaphore.
const DEFAULT_MAX_CLIENTS: usize = 10_000;

#[derive(Debug, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub max_clients: usize,
    pub k_max_msg: usize,
    pub k_max_args: usize,
}

impl ServerConfig {
    pub const fn default() -> Self {
        ServerConfig {
            host: IpAddr::V4(std::net::Ipv4Addr::new(
                DEFAULT_HOST[0],
                DEFAULT_HOST[1],
                DEFAULT_HOST[2],
                DEFAULT_HOST[3],
            )),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            k_max_msg: K_MAX_MSG,
            k_max_args: K_MAX_ARGS,
        }
    }
}

/// The subset of `ServerConfig` that may appear in a YAML config file. Any
/// field not present falls back to the next layer down.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub max_clients: Option<usize>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config file: {e}"),
            ConfigError::Yaml(e) => write!(f, "could not parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn load_file(path: &PathBuf) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(ConfigError::Io)?;
    serde_yaml::from_str(&raw).map_err(ConfigError::Yaml)
}

/// Layers a parsed file config and explicit CLI overrides onto the
/// defaults, CLI winning over file, file winning over default.
pub fn resolve(file: Option<FileConfig>, cli_host: Option<IpAddr>, cli_port: Option<u16>) -> ServerConfig {
    let mut cfg = ServerConfig::default();
    if let Some(file) = file {
        if let Some(host) = file.host {
            cfg.host = host;
        }
        if let Some(port) = file.port {
            cfg.port = port;
        }
        if let Some(max_clients) = file.max_clients {
            cfg.max_clients = max_clients;
        }
    }
    if let Some(host) = cli_host {
        cfg.host = host;
    }
    if let Some(port) = cli_port {
        cfg.port = port;
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 1234);
        assert_eq!(cfg.k_max_msg, 32 * 1024 * 1024);
        assert_eq!(cfg.k_max_args, 200_000);
    }

    #[test]
    fn cli_overrides_file_overrides_default() {
        let file = FileConfig {
            host: None,
            port: Some(9999),
            max_clients: None,
        };
        let cfg = resolve(Some(file), None, Some(1111));
        assert_eq!(cfg.port, 1111);
        assert_eq!(cfg.max_clients, DEFAULT_MAX_CLIENTS);
    }

    #[test]
    fn no_overrides_keeps_defaults() {
        let cfg = resolve(None, None, None);
        assert_eq!(cfg, ServerConfig::default());
    }
}
