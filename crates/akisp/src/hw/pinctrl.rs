// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::{fmt, str::FromStr};

/// Named pin-control states of the video-input block.
///
/// Exactly one state is active at a time. The MIPI and DVP states route the
/// data lanes of one port, the `csi*_sclk` states route only the sensor
/// clock output and are applied when an input is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinState {
    Mipi0TwoLane,
    Mipi0OneLane,
    Mipi1TwoLane,
    Mipi1OneLane,
    Csi0Sclk,
    Csi1Sclk,
    Dvp0Bits12,
    Dvp0Bits10,
    Dvp0Bits8,
    Dvp1Bits12,
    Dvp1Bits10,
    Dvp1Bits8,
}

impl PinState {
    /// Every state, in the order the board's pin-control table lists them.
    pub const ALL: [PinState; 12] = [
        PinState::Mipi0TwoLane,
        PinState::Mipi0OneLane,
        PinState::Mipi1TwoLane,
        PinState::Mipi1OneLane,
        PinState::Csi0Sclk,
        PinState::Csi1Sclk,
        PinState::Dvp0Bits12,
        PinState::Dvp0Bits10,
        PinState::Dvp0Bits8,
        PinState::Dvp1Bits12,
        PinState::Dvp1Bits10,
        PinState::Dvp1Bits8,
    ];

    /// Name of the state in the device tree pin-control table.
    pub const fn name(self) -> &'static str {
        match self {
            PinState::Mipi0TwoLane => "mipi0_2lane",
            PinState::Mipi0OneLane => "mipi0_1lane",
            PinState::Mipi1TwoLane => "mipi1_2lane",
            PinState::Mipi1OneLane => "mipi1_1lane",
            PinState::Csi0Sclk => "csi0_sclk",
            PinState::Csi1Sclk => "csi1_sclk",
            PinState::Dvp0Bits12 => "dvp0_12bits",
            PinState::Dvp0Bits10 => "dvp0_10bits",
            PinState::Dvp0Bits8 => "dvp0_8bits",
            PinState::Dvp1Bits12 => "dvp1_12bits",
            PinState::Dvp1Bits10 => "dvp1_10bits",
            PinState::Dvp1Bits8 => "dvp1_8bits",
        }
    }

    /// MIPI data lane routing of the primary or secondary port. Two lanes
    /// select the 2-lane group, any other count the 1-lane group.
    pub const fn mipi(primary: bool, lanes: i32) -> PinState {
        match (primary, lanes == 2) {
            (true, true) => PinState::Mipi0TwoLane,
            (true, false) => PinState::Mipi0OneLane,
            (false, true) => PinState::Mipi1TwoLane,
            (false, false) => PinState::Mipi1OneLane,
        }
    }

    /// DVP data routing. Widths other than 12 and 10 use the 8-bit group.
    pub const fn dvp(primary: bool, bits: i32) -> PinState {
        match (primary, bits) {
            (true, 12) => PinState::Dvp0Bits12,
            (true, 10) => PinState::Dvp0Bits10,
            (true, _) => PinState::Dvp0Bits8,
            (false, 12) => PinState::Dvp1Bits12,
            (false, 10) => PinState::Dvp1Bits10,
            (false, _) => PinState::Dvp1Bits8,
        }
    }

    pub const fn sclk(primary: bool) -> PinState {
        if primary {
            PinState::Csi0Sclk
        } else {
            PinState::Csi1Sclk
        }
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PinState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PinState::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| format!("unknown pin state: {}", s))
    }
}

/// Platform pin-control handle.
///
/// Mirrors the lookup/select split of the kernel pinctrl API: a lookup can
/// fail because the board does not describe the state, a select because the
/// pin multiplexer refused it.
pub trait PinController: Send + Sync {
    /// Whether the board describes a state with this name.
    fn has_state(&self, name: &str) -> bool;

    /// Apply the named state, returning the platform status on failure.
    fn select_state(&self, name: &str) -> Result<(), i32>;
}
