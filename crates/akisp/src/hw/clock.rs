// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;

/// Clock sources the video-input block gates directly.
///
/// The secondary input's sensor clock is not a framework clock; it is
/// programmed through [`CameraCtrl::set_sclk1`](super::CameraCtrl::set_sclk1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockId {
    /// ISP pixel clock gate (VCLK).
    Isp,
    /// Sensor master clock of the primary input.
    Sclk0,
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClockId::Isp => write!(f, "isp_clk"),
            ClockId::Sclk0 => write!(f, "sclk0"),
        }
    }
}

/// A clock framework handle.
///
/// Enabling an already enabled clock must succeed.
pub trait Clock: Send + Sync {
    fn prepare_enable(&self) -> Result<(), i32>;

    fn set_rate(&self, hz: u64) -> Result<(), i32>;

    /// Rate the clock actually runs at, which may differ from the request.
    fn rate(&self) -> u64;
}
