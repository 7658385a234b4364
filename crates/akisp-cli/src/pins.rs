// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use akisp::PinState;
use clap::Args as ClapArgs;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {}

#[derive(Debug, Serialize)]
struct PinInfo {
    name: &'static str,
    input: usize,
    function: &'static str,
}

fn describe(state: PinState) -> PinInfo {
    use PinState::*;
    let (input, function) = match state {
        Mipi0TwoLane => (0, "mipi 2 lanes"),
        Mipi0OneLane => (0, "mipi 1 lane"),
        Mipi1TwoLane => (1, "mipi 2 lanes"),
        Mipi1OneLane => (1, "mipi 1 lane"),
        Csi0Sclk => (0, "sensor clock"),
        Csi1Sclk => (1, "sensor clock"),
        Dvp0Bits12 => (0, "dvp 12 bits"),
        Dvp0Bits10 => (0, "dvp 10 bits"),
        Dvp0Bits8 => (0, "dvp 8 bits"),
        Dvp1Bits12 => (1, "dvp 12 bits"),
        Dvp1Bits10 => (1, "dvp 10 bits"),
        Dvp1Bits8 => (1, "dvp 8 bits"),
    };
    PinInfo {
        name: state.name(),
        input,
        function,
    }
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing pins command: {:?}", args);

    let pins: Vec<PinInfo> = PinState::ALL.into_iter().map(describe).collect();

    if json {
        let json_str = serde_json::to_string_pretty(&pins)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        for pin in &pins {
            println!("{:<14} input {}  {}", pin.name, pin.input, pin.function);
        }
    }

    Ok(())
}
