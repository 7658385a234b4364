// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Board description for the simulated bring-up
//!
//! A board file is JSON:
//!
//! ```json
//! {
//!   "default_sclk_mhz": 24,
//!   "inputs": [
//!     { "interface": "mipi", "lanes": 2, "mhz": 24 },
//!     { "interface": "dvp", "bits": 10, "io_level": "2.5" }
//!   ]
//! }
//! ```

use crate::error::CliError;
use akisp::{
    sim::{SimBoard, SimIspConfig, SimSensorConfig},
    DeviceConfig,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    Dvp,
    #[default]
    Mipi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bus {
    #[default]
    Raw,
    Yuv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IoLevel {
    #[serde(rename = "1.8")]
    V1_8,
    #[serde(rename = "2.5")]
    V2_5,
    #[default]
    #[serde(rename = "3.3")]
    V3_3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scan {
    #[default]
    Progressive,
    Interlaced,
}

/// One sensor attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub interface: Interface,
    pub lanes: i32,
    pub mhz: i32,
    /// DVP data width taken from the ISP configuration.
    pub bits: i32,
    pub io_level: IoLevel,
    pub bus: Bus,
    pub pclk_edge: Edge,
    /// `None` leaves the sensor unable to answer.
    pub scan: Option<Scan>,
    /// Sensor master clock in MHz, 0 when unknown.
    pub mclk: i32,
    pub sensor_id: i32,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            interface: Interface::Mipi,
            lanes: 2,
            mhz: 24,
            bits: 8,
            io_level: IoLevel::V3_3,
            bus: Bus::Raw,
            pclk_edge: Edge::Rising,
            scan: Some(Scan::Progressive),
            mclk: 24,
            sensor_id: 0x2053,
        }
    }
}

impl InputConfig {
    fn sensor(&self) -> SimSensorConfig {
        let mut sensor = match self.interface {
            Interface::Dvp => SimSensorConfig::dvp(),
            Interface::Mipi => SimSensorConfig::mipi(self.lanes, self.mhz),
        };
        sensor.io_level = match self.io_level {
            IoLevel::V1_8 => 0,
            IoLevel::V2_5 => 1,
            IoLevel::V3_3 => 2,
        };
        sensor.bus_type = match self.bus {
            Bus::Raw => 0,
            Bus::Yuv => 1,
        };
        sensor.scan_method = self.scan.map(|scan| match scan {
            Scan::Progressive => 0,
            Scan::Interlaced => 1,
        });
        sensor.mclk = self.mclk;
        sensor.sensor_id = self.sensor_id;
        sensor
    }

    fn isp(&self) -> SimIspConfig {
        SimIspConfig {
            bits_width: self.bits,
            pclk_polarity: match self.pclk_edge {
                Edge::Rising => 0,
                Edge::Falling => 1,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub default_sclk_mhz: i32,
    pub internal_pclk_mhz: u32,
    pub inputs: Vec<InputConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let device = DeviceConfig::default();
        BoardConfig {
            default_sclk_mhz: device.default_sclk_mhz(),
            internal_pclk_mhz: device.internal_pclk_mhz(),
            inputs: vec![InputConfig::default()],
        }
    }
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CliError::BoardNotFound(format!("{}: {}", path.display(), e)))?;
        let board: BoardConfig = serde_json::from_str(&text)
            .map_err(|e| CliError::InvalidArgs(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded board {}: {:?}", path.display(), board);
        Ok(board)
    }

    /// Same sensor on `count` inputs.
    pub fn uniform(input: InputConfig, count: usize) -> Self {
        BoardConfig {
            inputs: vec![input; count],
            ..BoardConfig::default()
        }
    }

    pub fn sim_board(&self) -> SimBoard {
        let config = DeviceConfig::default()
            .with_default_sclk(self.default_sclk_mhz)
            .with_internal_pclk(self.internal_pclk_mhz);
        self.inputs
            .iter()
            .fold(SimBoard::new().with_config(config), |board, input| {
                board.with_input(input.sensor()).with_isp_config(input.isp())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board() {
        let board: BoardConfig = serde_json::from_str(
            r#"{
                "inputs": [
                    { "interface": "dvp", "bits": 10, "io_level": "2.5", "pclk_edge": "falling" },
                    { "lanes": 1, "mhz": 400, "scan": null }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(board.default_sclk_mhz, 24);
        assert_eq!(board.inputs.len(), 2);
        let dvp = &board.inputs[0];
        assert_eq!(dvp.interface, Interface::Dvp);
        assert_eq!(dvp.sensor().io_level, 1);
        assert_eq!(dvp.isp().bits_width, 10);
        assert_eq!(dvp.isp().pclk_polarity, 1);

        let mipi = &board.inputs[1];
        assert_eq!(mipi.interface, Interface::Mipi);
        assert_eq!(mipi.sensor().mipi_lanes, 1);
        assert_eq!(mipi.sensor().scan_method, None);
    }

    #[test]
    fn test_unknown_field_value() {
        let res: Result<BoardConfig, _> =
            serde_json::from_str(r#"{ "inputs": [ { "interface": "lvds" } ] }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_uniform_board_builds() {
        let board = BoardConfig::uniform(InputConfig::default(), 2);
        let (device, _) = board.sim_board().build().unwrap();
        assert!(device.is_dual());
    }
}
