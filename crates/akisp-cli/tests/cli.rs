// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Integration tests for the akisp CLI
//!
//! These tests run the binary end-to-end with assert_cmd. Bring-up runs on
//! the simulated board, so no hardware or vendor library is needed.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::{env, fs, path::PathBuf};

/// Helper to create a Command for the akisp binary
/// Uses AKISP_BIN environment variable if set, otherwise the cargo-built binary
fn akisp_cmd() -> Command {
    if let Ok(bin_path) = env::var("AKISP_BIN") {
        Command::new(bin_path)
    } else {
        Command::cargo_bin("akisp").expect("akisp binary")
    }
}

/// Get the test data directory (target/testdata/akisp-cli)
/// Creates it if it doesn't exist
fn get_test_data_dir() -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target")
        .join("testdata")
        .join("akisp-cli");

    fs::create_dir_all(&test_dir).expect("Failed to create test data directory");
    test_dir
}

fn json_stdout(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

#[test]
fn test_cli_help() {
    akisp_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("akisp CLI"))
        .stdout(predicate::str::contains("pins"))
        .stdout(predicate::str::contains("bringup"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_cli_version() {
    akisp_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("akisp"));
}

#[test]
fn test_bringup_help() {
    akisp_cmd()
        .args(["bringup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--board"))
        .stdout(predicate::str::contains("--interface"))
        .stdout(predicate::str::contains("--lanes"))
        .stdout(predicate::str::contains("--buffers"));
}

#[test]
fn test_unknown_subcommand() {
    akisp_cmd().arg("capture").assert().failure().code(2);
}

// =============================================================================
// pins
// =============================================================================

#[test]
fn test_pins_text() {
    akisp_cmd()
        .arg("pins")
        .assert()
        .success()
        .stdout(predicate::str::contains("mipi0_2lane"))
        .stdout(predicate::str::contains("csi1_sclk"))
        .stdout(predicate::str::contains("dvp1_8bits"));
}

#[test]
fn test_pins_json() {
    let output = akisp_cmd().args(["pins", "--json"]).output().unwrap();
    assert!(output.status.success());

    let pins = json_stdout(&output.stdout);
    let pins = pins.as_array().expect("array of pins");
    assert_eq!(pins.len(), 12);
    assert_eq!(pins[0]["name"], "mipi0_2lane");
    assert_eq!(pins[5]["name"], "csi1_sclk");
    assert_eq!(pins[5]["input"], 1);
}

// =============================================================================
// bringup
// =============================================================================

#[test]
fn test_bringup_default_mipi() {
    akisp_cmd()
        .arg("bringup")
        .assert()
        .success()
        .stdout(predicate::str::contains("pinctrl mipi0_2lane"))
        .stdout(predicate::str::contains("mipi prepare single"))
        .stdout(predicate::str::contains("isp 0 start"))
        .stdout(predicate::str::contains("video0_0"))
        .stdout(predicate::str::contains("streaming"));
}

#[test]
fn test_bringup_dvp_text() {
    akisp_cmd()
        .args(["bringup", "--interface", "dvp", "--bits", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pinctrl dvp0_10bits"))
        .stdout(predicate::str::contains("dvp port 0 3.3V 10 bits"))
        .stdout(predicate::str::contains("mipi").not());
}

#[test]
fn test_bringup_dual_json() {
    let output = akisp_cmd()
        .args(["bringup", "--inputs", "2", "--buffers", "6", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json_stdout(&output.stdout);
    assert_eq!(report["dual"], true);
    assert_eq!(report["mipi_prepared"], true);
    assert_eq!(report["dual_sensors_initialized"], true);
    assert_eq!(report["internal_pclk_mhz"], 100);

    let inputs = report["inputs"].as_array().unwrap();
    assert_eq!(inputs.len(), 2);
    for input in inputs {
        assert_eq!(input["route_initialized"], true);
        assert_eq!(input["isp_mode"], "rgb_out");
        assert_eq!(input["isp_status"], "Running");
        for chn in input["channels"].as_array().unwrap() {
            assert_eq!(chn["buffers"], 6);
            assert_eq!(chn["state"], "AllBufferInit");
            assert_eq!(chn["streaming"], true);
        }
    }

    let events: Vec<&str> = report["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e.as_str())
        .collect();
    assert_eq!(events.iter().filter(|e| **e == "mipi prepare dual").count(), 1);
    assert_eq!(events.iter().filter(|e| e.ends_with(" init")).count(), 4);
}

#[test]
fn test_bringup_unsupported_lanes() {
    akisp_cmd()
        .args(["bringup", "--lanes", "3"])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("pinctrl csi0_sclk"))
        .stdout(predicate::str::contains("route not initialized"))
        .stderr(predicate::str::contains("mipi lanes 3 not supported"));
}

#[test]
fn test_bringup_rejects_bad_buffer_count() {
    akisp_cmd()
        .args(["bringup", "--buffers", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_bringup_board_file() {
    let path = get_test_data_dir().join("dvp_yuv_board.json");
    fs::write(
        &path,
        r#"{
            "inputs": [
                { "interface": "dvp", "bits": 12, "io_level": "1.8", "bus": "yuv", "scan": "interlaced" }
            ]
        }"#,
    )
    .unwrap();

    let output = akisp_cmd()
        .args(["bringup", "--json", "--board"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json_stdout(&output.stdout);
    let input = &report["inputs"][0];
    assert_eq!(input["isp_mode"], "yuv_video_out");
    assert_eq!(input["scan_method"], "Interlaced");
    let events = report["events"].as_array().unwrap();
    assert!(events.contains(&serde_json::json!("pinctrl dvp0_12bits")));
    assert!(events.contains(&serde_json::json!("dvp port 0 1.8V 12 bits")));
}

#[test]
fn test_bringup_missing_board_file() {
    akisp_cmd()
        .args(["bringup", "--board", "/nonexistent/board.json"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Board file not found"));
}

// =============================================================================
// status
// =============================================================================

#[test]
fn test_status_unknown_section() {
    akisp_cmd()
        .args(["status", "--section", "md_stat"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown section"));
}

#[test]
#[serial]
fn test_status_without_library() {
    akisp_cmd()
        .env("AKISP_LIBRARY", "/nonexistent/libakisp.so")
        .arg("status")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("ISP unavailable"));
}
