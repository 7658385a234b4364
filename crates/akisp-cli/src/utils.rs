// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use akisp::{
    hw::{MipiMode, MipiPort},
    sim::HwEvent,
    ChannelId,
};

/// Base of the fake physical buffer pool handed to the simulated ISP
const BUFFER_POOL_BASE: u64 = 0x8000_0000;

/// Physical address of buffer `index` of `channel` on `input`
///
/// Each channel gets a 16 MiB window and each buffer 1 MiB inside it.
pub fn buffer_addr(input: usize, channel: ChannelId, index: usize) -> u64 {
    let window = (input * 3 + channel.index()) as u64;
    BUFFER_POOL_BASE + window * 0x0100_0000 + index as u64 * 0x0010_0000
}

/// One-line description of a hardware event
pub fn describe_event(event: &HwEvent) -> String {
    match event {
        HwEvent::PinSelect(state) => format!("pinctrl {}", state),
        HwEvent::ClockEnable(clk) => format!("clk {} enable", clk),
        HwEvent::ClockRate(clk, hz) => format!("clk {} rate {}", clk, hz),
        HwEvent::DvpPort { input, level, bits } => {
            format!("dvp port {} {} {} bits", input, level, bits)
        }
        HwEvent::MipiPclk(mhz) => format!("mipi csi pclk {}MHz", mhz),
        HwEvent::MipiPrepare(mode) => format!(
            "mipi prepare {}",
            match mode {
                MipiMode::Single => "single",
                MipiMode::Dual => "dual",
            }
        ),
        HwEvent::MipiPortCfg { port, mhz, lanes } => format!(
            "mipi {} {}MHz {} lanes",
            match port {
                MipiPort::Port0 => "port0",
                MipiPort::Port1 => "port1",
            },
            mhz,
            lanes
        ),
        HwEvent::PclkPolar { input, rising } => format!(
            "pclk {} {}",
            input,
            if *rising { "rising" } else { "falling" }
        ),
        HwEvent::Sclk1(mhz) => format!("sclk1 {}MHz", mhz),
        HwEvent::SensorPowerOn(input) => format!("sensor {} power on", input),
        HwEvent::SensorInit(input) => format!("sensor {} init", input),
        HwEvent::SubdevCtrl { input, id } => format!("subdev {} s_ctrl {:#010x}", input, id),
        HwEvent::IspMisc { input, timing } => format!(
            "isp {} timing oneline {} hblank {}",
            input, timing.oneline, timing.hblank
        ),
        HwEvent::IspAeFast(input) => format!("isp {} ae fast default", input),
        HwEvent::IspMode { input, mode } => format!("isp {} mode {}", input, mode),
        HwEvent::IspBufferAddr {
            input,
            channel,
            slot,
            addr,
        } => format!("isp {} {} slot {} addr {:#x}", input, channel, slot, addr),
        HwEvent::IspBufferEnable {
            input,
            channel,
            slot,
        } => format!("isp {} {} enable slot {}", input, channel, slot),
        HwEvent::IspBufferDisable {
            input,
            channel,
            slot,
        } => format!("isp {} {} disable slot {}", input, channel, slot),
        HwEvent::IspStart(input) => format!("isp {} start", input),
        HwEvent::IspStop(input) => format!("isp {} stop", input),
    }
}
