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

use std::ffi::OsString;

use oc_model::Path;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
    client::ClientError,
    config::LabConfig,
    gnmic::{parse_get_response, DataType, GnmicSession, SetOp},
};

fn args(v: Vec<OsString>) -> Vec<String> {
    v.into_iter().map(|a| a.to_string_lossy().to_string()).collect()
}

#[test]
fn base_args() {
    let cfg: LabConfig = super::LAB.parse().unwrap();
    let session = GnmicSession::new(&cfg.dut);
    let args = args(session.base_args());
    assert_eq!(
        args,
        vec![
            "--address",
            "192.168.0.10:6030",
            "--username",
            "admin",
            "--encoding",
            "json_ietf",
            "--timeout",
            "10s",
            "--skip-verify"
        ]
    );
    // the password is passed through the environment
    assert!(!args.iter().any(|a| a.contains("secret")));
}

#[test]
fn set_args() {
    let path = Path::qos();
    let file = std::path::Path::new("/tmp/x/value.json");
    assert_eq!(
        args(GnmicSession::set_args(SetOp::Replace, &path, file)),
        vec!["set", "--replace-path", "/qos", "--replace-file", "/tmp/x/value.json"]
    );
    assert_eq!(
        args(GnmicSession::set_args(
            SetOp::Update,
            &Path::interface("Ethernet1/1"),
            file
        )),
        vec![
            "set",
            "--update-path",
            "/interfaces/interface[name=Ethernet1/1]",
            "--update-file",
            "/tmp/x/value.json"
        ]
    );
}

#[test]
fn get_args() {
    let path = Path::qos();
    assert_eq!(
        args(GnmicSession::get_args(DataType::Config, &path)),
        vec!["get", "--type", "config", "--path", "/qos", "--format", "json"]
    );
    assert_eq!(
        args(GnmicSession::get_args(DataType::State, &path)),
        vec!["get", "--type", "state", "--path", "/qos", "--format", "json"]
    );
}

#[test]
fn parse_get() {
    let path = Path::qos();
    let stdout = json!([{
        "source": "192.168.0.10:6030",
        "timestamp": 1666000000000000000u64,
        "updates": [{
            "Path": "openconfig-qos:qos",
            "values": {"openconfig-qos:qos": {"queues": {"queue": [{"name": "BE1"}]}}}
        }]
    }])
    .to_string();
    assert_eq!(
        parse_get_response(stdout.as_bytes(), &path).unwrap(),
        json!({"queues": {"queue": [{"name": "BE1"}]}})
    );
}

#[test]
fn parse_get_empty() {
    let path = Path::qos();
    let stdout = json!([{"source": "dut", "updates": []}]).to_string();
    assert!(matches!(
        parse_get_response(stdout.as_bytes(), &path),
        Err(ClientError::NotFound(p)) if p == path
    ));
}

#[test]
fn parse_get_malformed() {
    let path = Path::qos();
    assert!(matches!(
        parse_get_response(b"{\"updates\": []}", &path),
        Err(ClientError::UnexpectedResponse(_, _))
    ));
    assert!(matches!(
        parse_get_response(b"not json", &path),
        Err(ClientError::Json(_))
    ));
    let two = json!([{"updates": [{"values": {"a": 1, "b": 2}}]}]).to_string();
    assert!(matches!(
        parse_get_response(two.as_bytes(), &path),
        Err(ClientError::UnexpectedResponse(_, _))
    ));
}
