// OcProbe: OpenConfig conformance probes written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! This module contains the code for reading the lab configuration.
//!
//! The configuration is a single TOML file, `lab.toml`, placed in the directory given by the
//! environment variable `OCPROBE_LAB_CONFIG` (or passed explicitly with
//! [`LabConfig::from_file`]):
//!
//! ```toml
//! [dut]
//! name = "dut"
//! target = "192.168.0.10:6030"
//! username = "admin"
//! password = "admin"
//! skip_verify = true
//! port_speed = "SPEED_100GB"
//!
//! [dut.ports]
//! port1 = "Ethernet1"
//! port2 = "Ethernet2"
//!
//! [ate]
//! url = "https://192.168.0.20:8443"
//! insecure = true
//!
//! [ate.ports]
//! port1 = "192.168.0.21;1;1"
//! port2 = "192.168.0.21;1;2"
//!
//! [deviations]
//! interface_enabled = true
//! default_network_instance = "default"
//!
//! [timing]
//! observation_window_secs = 60
//! protocol_settle_secs = 10
//! ```

use std::{collections::BTreeMap, path::Path, str::FromStr, time::Duration};

use lazy_static::lazy_static;
use oc_model::{Deviations, PortSpeed};
use regex::Regex;
use serde::{de::Error as _, Deserialize, Deserializer};
use thiserror::Error;

/// Environment variable pointing to the directory containing `lab.toml`.
pub const CONFIG_ENV: &str = "OCPROBE_LAB_CONFIG";

/// Name of the configuration file within that directory.
pub const CONFIG_FILE: &str = "lab.toml";

/// The complete lab configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabConfig {
    /// The device under test
    pub dut: DutConfig,
    /// The traffic generator
    pub ate: AteConfig,
    /// Vendor deviations of the device under test
    #[serde(default)]
    pub deviations: Deviations,
    /// Default timing of the test procedures
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Encoding used for gNMI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// RFC 7951 JSON, with module prefixes on identities.
    #[default]
    JsonIetf,
    /// Plain JSON
    Json,
}

impl Encoding {
    /// Name as understood by `gnmic --encoding`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::JsonIetf => "json_ietf",
            Encoding::Json => "json",
        }
    }
}

/// Configuration of the device under test, reached via gNMI.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutConfig {
    /// Name used in logs
    #[serde(default = "default_dut_name")]
    pub name: String,
    /// gNMI target, as `host:port`.
    #[serde(deserialize_with = "deserialize_target")]
    pub target: String,
    /// Username for the gNMI session
    pub username: String,
    /// Password for the gNMI session
    pub password: String,
    /// Use an insecure (plain-text) connection.
    #[serde(default)]
    pub insecure: bool,
    /// Do not verify the certificate of the target.
    #[serde(default)]
    pub skip_verify: bool,
    /// Path to the `gnmic` binary.
    #[serde(default = "default_gnmic")]
    pub gnmic: String,
    /// Value encoding
    #[serde(default)]
    pub encoding: Encoding,
    /// Timeout for each gNMI call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Speed of the used ports, configured if the `explicit_port_speed` deviation is set.
    pub port_speed: Option<PortSpeed>,
    /// Mapping from port id (`port1`, `port2`, ...) to the interface name on the device.
    #[serde(deserialize_with = "deserialize_dut_ports")]
    pub ports: BTreeMap<String, String>,
}

/// Configuration of the traffic generator, reached via the Open Traffic Generator API.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AteConfig {
    /// Name used in logs
    #[serde(default = "default_ate_name")]
    pub name: String,
    /// Base URL of the OTG controller.
    #[serde(deserialize_with = "deserialize_url")]
    pub url: String,
    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,
    /// Timeout for each HTTP request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Mapping from port id (`port1`, `port2`, ...) to the port location on the traffic
    /// generator.
    #[serde(deserialize_with = "deserialize_ate_ports")]
    pub ports: BTreeMap<String, String>,
}

/// Timing of the test procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// How long traffic is sent before counters are read, in seconds.
    pub observation_window_secs: u64,
    /// How long to wait after starting protocols, in seconds.
    pub protocol_settle_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            observation_window_secs: 60,
            protocol_settle_secs: 10,
        }
    }
}

impl TimingConfig {
    /// The observation window
    pub fn observation_window(&self) -> Duration {
        Duration::from_secs(self.observation_window_secs)
    }

    /// The protocol settle delay
    pub fn protocol_settle(&self) -> Duration {
        Duration::from_secs(self.protocol_settle_secs)
    }
}

impl LabConfig {
    /// Load `lab.toml` from the directory in the environment variable `OCPROBE_LAB_CONFIG`.
    pub fn load() -> Result<Self, LabConfigError> {
        let dir = std::env::var(CONFIG_ENV).map_err(|_| LabConfigError::MissingEnv(CONFIG_ENV))?;
        Self::from_file(Path::new(&dir).join(CONFIG_FILE))
    }

    /// Load the configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LabConfigError> {
        let path = path.as_ref();
        log::debug!("[config] reading {}", path.display());
        let s = std::fs::read_to_string(path)
            .map_err(|e| LabConfigError::Io(path.display().to_string(), e))?;
        s.parse()
    }

    /// Get the interface name of a DUT port.
    pub fn dut_port(&self, id: &str) -> Result<&str, LabConfigError> {
        self.dut
            .ports
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| LabConfigError::UnknownPort("dut", id.to_string()))
    }

    /// Get the location of an ATE port.
    pub fn ate_port(&self, id: &str) -> Result<&str, LabConfigError> {
        self.ate
            .ports
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| LabConfigError::UnknownPort("ate", id.to_string()))
    }
}

impl FromStr for LabConfig {
    type Err = LabConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| LabConfigError::Parse(e.to_string()))
    }
}

/// Error while reading the lab configuration.
#[derive(Debug, Error)]
pub enum LabConfigError {
    /// The environment variable is not set.
    #[error("Environment variable '{0}' is not defined!")]
    MissingEnv(&'static str),
    /// Cannot read the file.
    #[error("Cannot read '{0}': {1}")]
    Io(String, std::io::Error),
    /// Cannot parse the file.
    #[error("Cannot parse the lab configuration: {0}")]
    Parse(String),
    /// The port is not part of the configuration.
    #[error("The {0} has no port {1}")]
    UnknownPort(&'static str, String),
}

fn default_dut_name() -> String {
    String::from("dut")
}

fn default_ate_name() -> String {
    String::from("ate")
}

fn default_gnmic() -> String {
    String::from("gnmic")
}

fn default_timeout() -> u64 {
    30
}

fn deserialize_target<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lazy_static! {
        static ref TARGET_RE: Regex =
            Regex::new(r"^(\[[0-9a-fA-F:.]+\]|[^\s:\[\]]+):[0-9]{1,5}$").unwrap();
    }
    let target = String::deserialize(de)?;
    if TARGET_RE.is_match(&target) {
        Ok(target)
    } else {
        Err(D::Error::custom(format!(
            "Invalid gNMI target: {target} (should be 'host:port')"
        )))
    }
}

fn deserialize_url<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/]+(/[^\s]*)?$").unwrap();
    }
    let url = String::deserialize(de)?;
    if URL_RE.is_match(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(D::Error::custom(format!(
            "Invalid URL: {url} (should be 'http(s)://host[:port]')"
        )))
    }
}

lazy_static! {
    static ref PORT_ID_RE: Regex = Regex::new(r"^port[0-9]+$").unwrap();
}

fn deserialize_dut_ports<'de, D>(de: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    lazy_static! {
        static ref IFACE_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9\-_]*([0-9/:.]+)?$").unwrap();
    }
    let ports = BTreeMap::<String, String>::deserialize(de)?;
    for (id, iface) in ports.iter() {
        if !PORT_ID_RE.is_match(id) {
            return Err(D::Error::custom(format!(
                "Invalid port id: {id} (should be 'portX')"
            )));
        }
        if !IFACE_RE.is_match(iface) {
            return Err(D::Error::custom(format!(
                "Invalid interface name for {id}: {iface} (should be like 'Ethernet1/1')"
            )));
        }
    }
    Ok(ports)
}

fn deserialize_ate_ports<'de, D>(de: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ports = BTreeMap::<String, String>::deserialize(de)?;
    for (id, location) in ports.iter() {
        if !PORT_ID_RE.is_match(id) {
            return Err(D::Error::custom(format!(
                "Invalid port id: {id} (should be 'portX')"
            )));
        }
        if location.trim().is_empty() {
            return Err(D::Error::custom(format!("Empty location for {id}")));
        }
    }
    Ok(ports)
}
