// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;

/// DVP pad voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoLevel {
    V1_8,
    V2_5,
    #[default]
    V3_3,
}

impl fmt::Display for IoLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IoLevel::V1_8 => write!(f, "1.8V"),
            IoLevel::V2_5 => write!(f, "2.5V"),
            IoLevel::V3_3 => write!(f, "3.3V"),
        }
    }
}

/// MIPI receiver operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipiMode {
    Single,
    Dual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipiPort {
    Port0,
    Port1,
}

impl MipiPort {
    pub const fn for_input(primary: bool) -> MipiPort {
        if primary {
            MipiPort::Port0
        } else {
            MipiPort::Port1
        }
    }
}

/// Camera controller register interface.
///
/// Each call returns the platform status on failure.
pub trait CameraCtrl: Send + Sync {
    /// Configure the parallel port of `input` for `bits` data lines.
    fn set_dvp_port(&self, input: usize, level: IoLevel, bits: i32) -> Result<(), i32>;

    /// Program the internal MIPI CSI pixel clock, returning the rate the PLL
    /// settled on.
    fn set_mipi_csi_pclk(&self, mhz: u32) -> Result<u32, i32>;

    /// Reset and prepare the MIPI receiver. Shared by both ports.
    fn mipi_ip_prepare(&self, mode: MipiMode) -> Result<(), i32>;

    /// Commit lane timing of one MIPI port.
    fn mipi_ip_port_cfg(&self, port: MipiPort, mhz: i32, lanes: i32) -> Result<(), i32>;

    fn set_pclk_polar(&self, input: usize, rising: bool) -> Result<(), i32>;

    /// Sensor clock output of the secondary input, in MHz.
    fn set_sclk1(&self, mhz: i32) -> Result<(), i32>;
}
