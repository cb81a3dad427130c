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

//! Module containing all basic type definitions

use std::{fmt, str::FromStr};

use hex::FromHex;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Ethernet MAC address, written as `02:00:01:01:01:01`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Mac(pub [u8; 6]);

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|b| format!("{b:02x}")).join(":"))
    }
}

impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mac({self})")
    }
}

impl FromStr for Mac {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.trim().split(':').collect_vec();
        if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
            return Err(ModelError::InvalidMac(s.to_string()));
        }
        let bytes: [u8; 6] = FromHex::from_hex(parts.concat())
            .map_err(|_| ModelError::InvalidMac(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Mac {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mac {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Differentiated Services Code Point. Only the six DSCP bits are valid, i.e., `0..=63`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Dscp(u8);

impl Dscp {
    /// Largest valid code point.
    pub const MAX: u8 = 63;

    /// Create a new DSCP value, checking the range.
    pub fn new(value: u8) -> Result<Self, ModelError> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidDscp(value))
        }
    }

    /// Parse a whole set of DSCP values at once.
    pub fn set(values: &[u8]) -> Result<Vec<Self>, ModelError> {
        values.iter().map(|v| Self::new(*v)).collect()
    }

    /// Get the raw value
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Dscp {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Dscp> for u8 {
    fn from(x: Dscp) -> Self {
        x.0
    }
}

impl fmt::Display for Dscp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IEEE 802.1Q VLAN identifier, in the range `1..=4094`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Create a new VLAN id, checking the range.
    pub fn new(id: u16) -> Result<Self, ModelError> {
        if (1..=4094).contains(&id) {
            Ok(Self(id))
        } else {
            Err(ModelError::InvalidVlan(id))
        }
    }

    /// Get the raw value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ModelError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VlanId> for u16 {
    fn from(x: VlanId) -> Self {
        x.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address family of a flow, a match rule or a classifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

impl IpFamily {
    /// Both families, IPv4 first.
    pub const ALL: [IpFamily; 2] = [IpFamily::Ipv4, IpFamily::Ipv6];

    /// Name used in OpenConfig containers and in the names of ATE endpoints (`ipv4` or `ipv6`).
    pub fn as_str(&self) -> &'static str {
        match self {
            IpFamily::Ipv4 => "ipv4",
            IpFamily::Ipv6 => "ipv6",
        }
    }

    /// Maximum prefix length
    pub fn max_prefix_len(&self) -> u8 {
        match self {
            IpFamily::Ipv4 => 32,
            IpFamily::Ipv6 => 128,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error thrown while building configuration trees, paths or fixtures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The MAC address cannot be parsed.
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),
    /// The DSCP value does not fit into six bits.
    #[error("DSCP value {0} is larger than 63")]
    InvalidDscp(u8),
    /// The VLAN id is out of range.
    #[error("VLAN id {0} is not in the range 1..=4094")]
    InvalidVlan(u16),
    /// The prefix length is too large for the address family.
    #[error("Invalid {0} prefix length: {1}")]
    PrefixLen(IpFamily, u8),
    /// The endpoint has no address of that family.
    #[error("Endpoint {0} has no {1} address")]
    MissingAddress(String, IpFamily),
    /// Two rules of the same policy share a sequence id.
    #[error("Policy {0} already contains a rule with sequence id {1}")]
    DuplicateSequenceId(String, u32),
    /// Two terms of the same classifier share an id.
    #[error("Classifier {0} already contains a term with id {1}")]
    DuplicateTerm(String, String),
    /// Two inputs of the same scheduler share an id.
    #[error("Scheduler {0} of policy {1} already contains an input {2}")]
    DuplicateSchedulerInput(u32, String, String),
    /// A keyed list already contains that key.
    #[error("List {0} already contains an entry with key {1}")]
    DuplicateKey(&'static str, String),
    /// The classifier already exists with a different type.
    #[error("Classifier {0} exists with a different type")]
    ClassifierType(String),
    /// WRED thresholds are not ordered.
    #[error("WRED min-threshold {0} is larger than max-threshold {1}")]
    WredThresholds(u64, u64),
    /// Probability is not a percentage.
    #[error("Drop probability {0}% is larger than 100%")]
    DropProbability(u8),
    /// A path cannot be parsed.
    #[error("Invalid path {0}: {1}")]
    InvalidPath(String, &'static str),
    /// The fixture file cannot be parsed.
    #[error("Cannot parse fixtures: {0}")]
    Fixtures(String),
    /// The fixture set does not contain the requested endpoint.
    #[error("Unknown fixture endpoint: {0}")]
    UnknownFixture(String),
}
