// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{
    board::{BoardConfig, InputConfig, Interface},
    error::CliError,
    utils::{buffer_addr, describe_event},
};
use akisp::{sim::EventLog, ChannelId, Device};
use clap::Args as ClapArgs;
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Board description file (JSON), overrides the sensor flags
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Number of sensor inputs (2 selects dual-sensor mode)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    inputs: u8,

    /// Sensor bus interface
    #[arg(long, value_enum, default_value_t = Interface::Mipi)]
    interface: Interface,

    /// MIPI data lanes
    #[arg(long, default_value_t = 2)]
    lanes: i32,

    /// MIPI lane rate in MHz
    #[arg(long, default_value_t = 24)]
    mhz: i32,

    /// DVP data width reported by the ISP configuration
    #[arg(long, default_value_t = 8)]
    bits: i32,

    /// Buffers queued per channel
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=32))]
    buffers: u32,
}

impl Args {
    fn board_config(&self) -> Result<BoardConfig, CliError> {
        if let Some(path) = &self.board {
            return BoardConfig::load(path);
        }

        let input = InputConfig {
            interface: self.interface,
            lanes: self.lanes,
            mhz: self.mhz,
            bits: self.bits,
            ..InputConfig::default()
        };
        Ok(BoardConfig::uniform(input, usize::from(self.inputs)))
    }
}

#[derive(Debug, Serialize)]
struct ChannelReport {
    channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    format: String,
    buffers: usize,
    state: String,
    streaming: bool,
}

#[derive(Debug, Serialize)]
struct InputReport {
    id: usize,
    route_initialized: bool,
    isp_mode: String,
    isp_status: String,
    scan_method: String,
    channels: Vec<ChannelReport>,
}

#[derive(Debug, Serialize)]
struct Report {
    dual: bool,
    mipi_prepared: bool,
    dual_sensors_initialized: bool,
    internal_pclk_mhz: u32,
    inputs: Vec<InputReport>,
    events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing bringup command: {:?}", args);

    let board = args.board_config()?;
    let (device, log) = board.sim_board().build()?;

    let result = run(&device, args.buffers as usize);
    if let Err(err) = &result {
        log::error!("bring-up stopped: {}", err);
    }

    let report = report(&device, &log, result.as_ref().err());
    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_report(&report);
    }

    result.map_err(CliError::from)
}

/// Register every input, open every channel, then bind buffers and start
/// streaming channel by channel.
fn run(device: &Device, buffers: usize) -> Result<(), akisp::Error> {
    let inputs = 0..device.input_count();

    for id in inputs.clone() {
        device.register_input(id)?;
    }
    for id in inputs.clone() {
        for chn in ChannelId::ALL {
            device.open(id, chn)?;
        }
    }

    for id in inputs {
        for chn in ChannelId::ALL {
            let setup = device.queue_setup(id, chn, buffers)?;
            log::debug!(
                "input {} {}: {} buffers of {} bytes",
                id,
                chn,
                setup.count,
                setup.size
            );
            for index in 0..setup.count {
                device.buffer_init(id, chn, index, buffer_addr(id, chn, index))?;
            }
            device.start_streaming(id, chn)?;
        }
    }
    Ok(())
}

fn report(device: &Device, log: &EventLog, error: Option<&akisp::Error>) -> Report {
    let hw = device.hardware();
    let inputs = (0..device.input_count())
        .map(|id| InputReport {
            id,
            route_initialized: device.is_route_initialized(id).unwrap_or(false),
            isp_mode: device
                .isp_mode(id)
                .map(|mode| mode.to_string())
                .unwrap_or_default(),
            isp_status: device
                .isp_status(id)
                .map(|status| format!("{:?}", status))
                .unwrap_or_default(),
            scan_method: device
                .scan_method(id)
                .map(|scan| format!("{:?}", scan))
                .unwrap_or_default(),
            channels: ChannelId::ALL
                .into_iter()
                .filter_map(|chn| device.channel(id, chn).ok())
                .map(|chn| ChannelReport {
                    channel: chn.id().to_string(),
                    name: chn.name().map(str::to_owned),
                    format: chn.format().to_string(),
                    buffers: chn.vb_num(),
                    state: format!("{:?}", chn.state()),
                    streaming: chn.is_streaming(),
                })
                .collect(),
        })
        .collect();

    Report {
        dual: device.is_dual(),
        mipi_prepared: hw.mipi_prepared(),
        dual_sensors_initialized: hw.dual_sensors_initialized(),
        internal_pclk_mhz: hw.internal_pclk_res(),
        inputs,
        events: log.snapshot().iter().map(describe_event).collect(),
        error: error.map(|err| err.to_string()),
    }
}

fn print_text_report(report: &Report) {
    println!("Hardware trace");
    println!("==============");
    for (i, event) in report.events.iter().enumerate() {
        println!("{:4}  {}", i, event);
    }
    println!();

    for input in &report.inputs {
        println!(
            "Input {}: mode {}, isp {}, scan {}{}",
            input.id,
            input.isp_mode,
            input.isp_status,
            input.scan_method,
            if input.route_initialized {
                ""
            } else {
                ", route not initialized"
            }
        );
        for chn in &input.channels {
            println!(
                "  {:<9} {:<6} {:<16} {:>2} buffers  {:<13} {}",
                chn.name.as_deref().unwrap_or("-"),
                chn.channel,
                chn.format,
                chn.buffers,
                chn.state,
                if chn.streaming { "streaming" } else { "idle" }
            );
        }
    }

    if report.dual {
        println!(
            "Dual sensors initialized: {}",
            if report.dual_sensors_initialized {
                "yes"
            } else {
                "no"
            }
        );
    }
    if report.mipi_prepared {
        println!("MIPI receiver pclk: {}MHz", report.internal_pclk_mhz);
    }
}
