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

//! Module for talking to a device via the `gnmic` command line client.

use std::{
    ffi::OsString,
    process::{Output, Stdio},
    time::Duration,
};

use async_trait::async_trait;
use itertools::Itertools;
use oc_model::Path;
use serde_json::Value;
use tokio::{process::Command, time::timeout};

use crate::{
    client::{ClientError, ConfigClient},
    config::{DutConfig, Encoding},
};

/// A gNMI session with the device under test. Every call spawns `gnmic` as a child process;
/// values are handed over through temporary files.
///
/// The password is passed through the environment (`GNMIC_PASSWORD`) and never appears on the
/// command line.
#[derive(Debug, Clone)]
pub struct GnmicSession {
    name: String,
    binary: String,
    target: String,
    username: String,
    password: String,
    insecure: bool,
    skip_verify: bool,
    encoding: Encoding,
    timeout: Duration,
}

/// Kind of `gnmic set` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetOp {
    Replace,
    Update,
}

/// Datastore read by `gnmic get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DataType {
    Config,
    State,
}

impl DataType {
    fn as_str(&self) -> &'static str {
        match self {
            DataType::Config => "config",
            DataType::State => "state",
        }
    }
}

impl SetOp {
    fn flags(&self) -> (&'static str, &'static str) {
        match self {
            SetOp::Replace => ("--replace-path", "--replace-file"),
            SetOp::Update => ("--update-path", "--update-file"),
        }
    }
}

impl GnmicSession {
    /// Create a session without checking the connection.
    pub fn new(cfg: &DutConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            binary: cfg.gnmic.clone(),
            target: cfg.target.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            insecure: cfg.insecure,
            skip_verify: cfg.skip_verify,
            encoding: cfg.encoding,
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    /// Create a session and check that the target answers a capabilities request.
    pub async fn connect(cfg: &DutConfig) -> Result<Self, ClientError> {
        let this = Self::new(cfg);
        log::trace!("[{}] connecting to {}...", this.name, this.target);
        this.run(vec!["capabilities".into()]).await?;
        log::debug!("[{}] connection established!", this.name);
        Ok(this)
    }

    /// Arguments shared by all calls.
    pub(crate) fn base_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--address".into(),
            self.target.clone().into(),
            "--username".into(),
            self.username.clone().into(),
            "--encoding".into(),
            self.encoding.as_str().into(),
            "--timeout".into(),
            format!("{}s", self.timeout.as_secs()).into(),
        ];
        if self.insecure {
            args.push("--insecure".into());
        }
        if self.skip_verify {
            args.push("--skip-verify".into());
        }
        args
    }

    /// Arguments of a `set` call replacing or updating `path` with the content of `file`.
    pub(crate) fn set_args(op: SetOp, path: &Path, file: &std::path::Path) -> Vec<OsString> {
        let (path_flag, file_flag) = op.flags();
        vec![
            "set".into(),
            path_flag.into(),
            path.to_string().into(),
            file_flag.into(),
            file.as_os_str().to_owned(),
        ]
    }

    /// Arguments of a `get` call reading `path` from the given datastore.
    pub(crate) fn get_args(data: DataType, path: &Path) -> Vec<OsString> {
        vec![
            "get".into(),
            "--type".into(),
            data.as_str().into(),
            "--path".into(),
            path.to_string().into(),
            "--format".into(),
            "json".into(),
        ]
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(self.base_args())
            .args(args)
            .env("GNMIC_PASSWORD", &self.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        log::trace!("[tokio::process::Command] {:?}", cmd);
        cmd
    }

    /// Run `gnmic` with the given arguments, returning stdout.
    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>, ClientError> {
        let cmd_str = || args.iter().map(|a| a.to_string_lossy()).join(" ");
        // give the process a bit more time than the gNMI call itself.
        let limit = self.timeout + Duration::from_secs(5);
        let output = match timeout(limit, self.command(&args).output()).await {
            Ok(output) => output?,
            Err(_) => {
                log::error!("[{}] timeout while executing gnmic {}", self.name, cmd_str());
                return Err(ClientError::Timeout(cmd_str()));
            }
        };
        check_output(&self.name, output, cmd_str)
    }

    async fn set(&self, op: SetOp, path: &Path, value: &Value) -> Result<(), ClientError> {
        let tempdir = tempfile::tempdir()?;
        let file = tempdir.path().join("value.json");
        tokio::fs::write(&file, serde_json::to_vec_pretty(value)?).await?;
        self.run(Self::set_args(op, path, &file)).await?;
        // the directory is removed once the call has returned.
        drop(tempdir);
        Ok(())
    }
}

#[async_trait]
impl ConfigClient for GnmicSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn replace(&mut self, path: &Path, value: &Value) -> Result<(), ClientError> {
        log::debug!("[{}] replace {path}", self.name);
        self.set(SetOp::Replace, path, value).await
    }

    async fn update(&mut self, path: &Path, value: &Value) -> Result<(), ClientError> {
        log::debug!("[{}] update {path}", self.name);
        self.set(SetOp::Update, path, value).await
    }

    async fn delete(&mut self, path: &Path) -> Result<(), ClientError> {
        log::debug!("[{}] delete {path}", self.name);
        self.run(vec!["set".into(), "--delete".into(), path.to_string().into()])
            .await
            .map(|_| ())
    }

    async fn get(&self, path: &Path) -> Result<Value, ClientError> {
        log::debug!("[{}] get {path}", self.name);
        let stdout = self.run(Self::get_args(DataType::Config, path)).await?;
        parse_get_response(&stdout, path)
    }

    async fn get_state(&self, path: &Path) -> Result<Value, ClientError> {
        log::debug!("[{}] get state {path}", self.name);
        let stdout = self.run(Self::get_args(DataType::State, path)).await?;
        parse_get_response(&stdout, path)
    }
}

/// Extract the value from the output of `gnmic get --format json`. The output is a list of
/// notifications, each with a list of updates, each mapping the path to its value:
///
/// ```json
/// [{"source": "dut:6030", "updates": [{"Path": "qos", "values": {"qos": {...}}}]}]
/// ```
pub(crate) fn parse_get_response(stdout: &[u8], path: &Path) -> Result<Value, ClientError> {
    let notifications: Value = serde_json::from_slice(stdout)?;
    let unexpected = |what: &str| ClientError::UnexpectedResponse(path.to_string(), what.into());

    let notifications = notifications
        .as_array()
        .ok_or_else(|| unexpected("expected a list of notifications"))?;
    let update = notifications
        .iter()
        .filter_map(|n| n.get("updates").and_then(Value::as_array))
        .flatten()
        .next()
        .ok_or_else(|| ClientError::NotFound(path.clone()))?;
    let values = update
        .get("values")
        .and_then(Value::as_object)
        .ok_or_else(|| unexpected("update without values"))?;
    match values.values().exactly_one() {
        Ok(v) => Ok(v.clone()),
        Err(_) => Err(unexpected("expected exactly one value per update")),
    }
}

/// Check the output for successful exit code
fn check_output<F, S>(name: &str, output: Output, cmd: F) -> Result<Vec<u8>, ClientError>
where
    F: FnOnce() -> S,
    S: std::fmt::Display,
{
    if output.status.success() {
        Ok(output.stdout)
    } else {
        let cmd = cmd().to_string();
        log::error!(
            "[{}] gnmic {} exited with exit code {}{}",
            name,
            cmd,
            output.status.code().unwrap_or_default(),
            if !output.stderr.is_empty() {
                format!("\nSTDERR:\n{}", String::from_utf8_lossy(&output.stderr))
            } else {
                String::new()
            }
        );
        Err(ClientError::Command(
            name.to_string(),
            cmd,
            output.status.code().unwrap_or_default(),
        ))
    }
}
