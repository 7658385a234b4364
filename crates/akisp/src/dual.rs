// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{
    device::{Device, Input},
    gate::GateOutcome,
    Error,
};
use log::{debug, info};
use std::sync::atomic::Ordering;

impl Device {
    /// Whether every input has at least one open channel.
    pub fn all_inputs_opened(&self) -> bool {
        self.inputs
            .iter()
            .all(|input| input.opened.load(Ordering::Acquire) > 0)
    }

    /// Program the registers of every sensor on a dual-sensor board.
    ///
    /// Waits, by returning without effect, until every input is open. Then
    /// powers every sensor on in input order and runs the init table of
    /// every sensor twice, since master/slave pairs differ in which side
    /// must be programmed first.
    pub(crate) fn dual_sensor_regs_init(&self) -> Result<(), Error> {
        if self.hw.dual_sensors.is_done() {
            return Ok(());
        }

        if !self.all_inputs_opened() {
            debug!("dual sensors wait for every input to open");
            return Ok(());
        }

        let outcome = self.hw.dual_sensors.run(|| {
            for input in &self.inputs {
                input.sensor.power_on()?;
            }
            for _pass in 0..2 {
                for input in &self.inputs {
                    input.sensor.init_regs()?;
                }
            }
            Ok::<(), Error>(())
        })?;

        if outcome == GateOutcome::Ran {
            info!("dual sensors initialized");
        }
        Ok(())
    }

    pub(crate) fn sensor_regs_init(&self, input: &Input) -> Result<(), Error> {
        input.sensor.power_on()?;
        input.sensor.init_regs()
    }
}
