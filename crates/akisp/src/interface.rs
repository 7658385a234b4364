// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// Interface bring-up: sensor bus selection, pins, clocks and ISP mode, in
// the order the hardware requires. The ISP configuration file must already
// be loaded since the DVP width and pixel clock edge come from it.

use crate::{
    device::{Device, Input},
    gate::GateOutcome,
    hw::{IoLevel, MipiMode, MipiPort, PinState},
    isp::{IspMode, OutputFormat, PclkPolarity},
    lock,
    sensor::{BusInterface, BusType, SensorParam},
    Error,
};
use log::{debug, error, info, warn};

impl Device {
    /// Run interface bring-up of one input outside the buffer path.
    pub fn vi_interface_init(&self, input: usize) -> Result<(), Error> {
        let input = self.input(input)?;
        self.vi_interface_init_input(input)
    }

    pub(crate) fn vi_interface_init_input(&self, input: &Input) -> Result<(), Error> {
        self.set_interface(input)?;
        self.set_pclk_polar(input)?;
        self.set_sclk(input, 0)?;
        self.set_isp_mode(input);
        Ok(())
    }

    pub(crate) fn set_interface(&self, input: &Input) -> Result<(), Error> {
        let raw = input.sensor.query(SensorParam::Interface)?;

        if input.is_primary() {
            self.hw.enable_isp_clock()?;
        }

        match BusInterface::from_raw(raw) {
            Some(BusInterface::Dvp) => {
                info!("input {} dvp", input.id);
                self.dvp_init(input)
            }
            Some(BusInterface::Mipi) => {
                info!("input {} mipi", input.id);
                self.mipi_init(input)
            }
            None => {
                debug!("input {} interface:{} not support", input.id, raw);
                Ok(())
            }
        }
    }

    pub(crate) fn dvp_init(&self, input: &Input) -> Result<(), Error> {
        let primary = input.is_primary();

        let level = match input.sensor.query(SensorParam::IoLevel) {
            Ok(raw) => IoLevel::from_raw(raw).unwrap_or_default(),
            Err(err) => {
                warn!("input {} get io_level fail: {}", input.id, err);
                IoLevel::default()
            }
        };

        let bits = match input.isp.bits_width() {
            Ok(bits @ (8 | 10 | 12)) => bits,
            Ok(bits) => {
                error!("input {} bits:{} not support", input.id, bits);
                8
            }
            Err(err) => {
                error!("input {} bits width unknown: {}", input.id, err);
                8
            }
        };

        self.hw.select_pin_state(PinState::dvp(primary, bits))?;

        // the secondary port derives its configuration from the primary one
        if primary {
            self.hw
                .ctrl()
                .set_dvp_port(input.id, level, bits)
                .map_err(|code| Error::Platform {
                    call: "set_dvp_port",
                    code,
                })?;
        }

        debug!("input {} dvp {} bits at {}", input.id, bits, level);
        Ok(())
    }

    /// Prepare the MIPI receiver once for the lifetime of the device.
    pub(crate) fn mipi_cfg_once(&self) -> Result<(), Error> {
        let mode = if self.is_dual() {
            MipiMode::Dual
        } else {
            MipiMode::Single
        };

        let outcome = self.hw.mipi_once.run(|| {
            let res = self.hw.set_internal_pclk(self.config.internal_pclk_mhz())?;
            debug!("internal pclk {}MHz", res);
            self.hw
                .ctrl()
                .mipi_ip_prepare(mode)
                .map_err(|code| Error::Platform {
                    call: "mipi_ip_prepare",
                    code,
                })
        })?;

        if outcome == GateOutcome::Skipped {
            debug!("mipi receiver already prepared");
        }
        Ok(())
    }

    pub(crate) fn mipi_init(&self, input: &Input) -> Result<(), Error> {
        let primary = input.is_primary();

        let lanes = input
            .sensor
            .query(SensorParam::MipiLanes)
            .map_err(|err| {
                error!("input {} get lanes fail: {}", input.id, err);
                err
            })?;
        if !(0..=2).contains(&lanes) {
            error!("input {} lanes:{} not support", input.id, lanes);
            return Err(Error::UnsupportedLanes(lanes));
        }

        self.hw.select_pin_state(PinState::mipi(primary, lanes))?;
        self.mipi_cfg_once()?;

        let mhz = input
            .sensor
            .query(SensorParam::MipiMhz)
            .map_err(|err| {
                error!("input {} get mipi mhz fail: {}", input.id, err);
                err
            })?;

        self.hw
            .ctrl()
            .mipi_ip_port_cfg(MipiPort::for_input(primary), mhz, lanes)
            .map_err(|code| Error::Platform {
                call: "mipi_ip_port_cfg",
                code,
            })
    }

    pub(crate) fn set_pclk_polar(&self, input: &Input) -> Result<(), Error> {
        let raw = input.isp.pclk_polarity()?;
        let rising = match PclkPolarity::from_raw(raw) {
            Some(PclkPolarity::Rising) => true,
            Some(PclkPolarity::Falling) => false,
            None => {
                error!("input {} pclk polar wrong: {}", input.id, raw);
                return Err(Error::UnknownPolarity(raw));
            }
        };

        debug!(
            "input {} pclk edge is {}",
            input.id,
            if rising { "rising" } else { "falling" }
        );
        self.hw
            .ctrl()
            .set_pclk_polar(input.id, rising)
            .map_err(|code| Error::Platform {
                call: "set_pclk_polar",
                code,
            })
    }

    /// Enable and program the sensor clock of `input`.
    ///
    /// A non-positive `force_mhz` asks the sensor for its native clock and
    /// falls back to the configured default when the sensor does not know.
    pub(crate) fn set_sclk(&self, input: &Input, force_mhz: i32) -> Result<(), Error> {
        let mut mhz = force_mhz;
        if mhz <= 0 {
            // the sensor driver may not be attached yet
            mhz = input.sensor.ops().get_mclk();
            if mhz <= 0 {
                mhz = self.config.default_sclk_mhz();
                warn!("input {} set default sclk:{}MHZ", input.id, mhz);
            }
        }

        if input.is_primary() {
            let hz = u64::try_from(mhz).unwrap_or(0) * 1_000_000;
            let rate = self.hw.configure_sclk0(hz)?;
            debug!("input {} sclk0 rate {}", input.id, rate);
            Ok(())
        } else {
            self.hw
                .ctrl()
                .set_sclk1(mhz)
                .map_err(|code| Error::Platform {
                    call: "set_sclk1",
                    code,
                })
        }
    }

    /// Derive the ISP working mode from the bus type. An unknown bus type
    /// keeps the current mode.
    pub(crate) fn set_isp_mode(&self, input: &Input) {
        let bus = input.sensor.ops().get_bus_type();
        let dual = self.is_dual();
        let mut state = lock(&input.state);

        match (BusType::from_raw(bus), dual) {
            (Some(BusType::Raw), true) => state.isp_mode = IspMode::RgbOut,
            (Some(BusType::Raw), false) => state.isp_mode = IspMode::RgbVideoOut,
            (Some(BusType::Yuv), true) => state.isp_mode = IspMode::YuvOut,
            (Some(BusType::Yuv), false) => state.isp_mode = IspMode::YuvVideoOut,
            (None, _) => error!("input {} bus:{} not support", input.id, bus),
        }

        // TODO: take the output format from the channel once the ISP core
        // exposes formats other than semi-planar 4:2:0
        state.output_format = OutputFormat::Yuv420SemiPlanar;
    }
}
