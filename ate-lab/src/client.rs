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

//! The configuration client seam.

use async_trait::async_trait;
use oc_model::Path;
use serde_json::Value;
use thiserror::Error;

/// Client applying configuration to a device and reading state back, addressed by [`Path`].
///
/// Values are OpenConfig JSON trees, as produced by the `to_json` methods of `oc_model`.
#[async_trait]
pub trait ConfigClient: Send {
    /// Name of the device, used in logs.
    fn name(&self) -> &str;

    /// Replace the subtree at `path` with `value`.
    async fn replace(&mut self, path: &Path, value: &Value) -> Result<(), ClientError>;

    /// Merge `value` into the subtree at `path`.
    async fn update(&mut self, path: &Path, value: &Value) -> Result<(), ClientError>;

    /// Delete the subtree at `path`.
    async fn delete(&mut self, path: &Path) -> Result<(), ClientError>;

    /// Read the configuration subtree at `path`.
    async fn get(&self, path: &Path) -> Result<Value, ClientError>;

    /// Read the operational state at `path`. Every `config` container of the answer is replaced
    /// by its sibling `state` container, as reported by the device.
    async fn get_state(&self, path: &Path) -> Result<Value, ClientError>;
}

/// Error thrown by a [`ConfigClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O Error
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    /// The call did not finish in time.
    #[error("Timeout while executing {0}")]
    Timeout(String),
    /// The client program exited with an error.
    #[error("Non-zero exit code of {1} on {0}: {2}")]
    Command(String, String, i32),
    /// Cannot parse the response.
    #[error("Cannot parse the response: {0}")]
    Json(#[from] serde_json::Error),
    /// The response has an unexpected shape.
    #[error("Unexpected response for {0}: {1}")]
    UnexpectedResponse(String, String),
    /// Nothing exists at that path.
    #[error("No data at {0}")]
    NotFound(Path),
    /// The device refused the request.
    #[error("{0} rejected the request at {1}")]
    Rejected(String, Path),
}
