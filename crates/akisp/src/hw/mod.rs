// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Shared hardware resources of the video-input block
//!
//! Both sensor inputs share one pin multiplexer, the ISP clock gate and the
//! MIPI receiver. [`Hardware`] owns the platform handles for these and the
//! device-wide one-shot gates that arbitrate them.
//!
//! | Resource | Shared | Arbitration |
//! |----------|--------|-------------|
//! | Pin-control state | yes | serialized by [`Hardware::select_pin_state`] |
//! | `isp_clk` | yes | enabled by the primary input only |
//! | `sclk0` / sclk1 | no | one per input |
//! | MIPI receiver PLL | yes | one-shot gate |
//! | Sensor register init | dual mode | one-shot gate |

mod clock;
mod ctrl;
mod pinctrl;

pub use clock::{Clock, ClockId};
pub use ctrl::{CameraCtrl, IoLevel, MipiMode, MipiPort};
pub use pinctrl::{PinController, PinState};

use crate::{gate::OnceGate, lock, Error};
use log::{debug, error};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
};

/// Platform resources of one video-input block.
pub struct Hardware {
    pinctrl: Arc<dyn PinController>,
    active_pin: Mutex<Option<PinState>>,
    isp_clk: Option<Arc<dyn Clock>>,
    sclk0: Option<Arc<dyn Clock>>,
    ctrl: Arc<dyn CameraCtrl>,
    internal_pclk_res: AtomicU32,
    pub(crate) mipi_once: OnceGate,
    pub(crate) dual_sensors: OnceGate,
}

impl fmt::Debug for Hardware {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hardware")
            .field("active_pin", &self.active_pin_state())
            .field("isp_clk", &self.isp_clk.is_some())
            .field("sclk0", &self.sclk0.is_some())
            .field("internal_pclk_res", &self.internal_pclk_res())
            .field("mipi_once", &self.mipi_once.is_done())
            .field("dual_sensors", &self.dual_sensors.is_done())
            .finish()
    }
}

impl Hardware {
    /// Resource block with no clocks registered. Bring-up of the primary
    /// input fails with [`Error::ClockUnavailable`] until both
    /// [`with_isp_clock`](Self::with_isp_clock) and
    /// [`with_sclk0`](Self::with_sclk0) are supplied.
    pub fn new(pinctrl: Arc<dyn PinController>, ctrl: Arc<dyn CameraCtrl>) -> Self {
        Hardware {
            pinctrl,
            active_pin: Mutex::new(None),
            isp_clk: None,
            sclk0: None,
            ctrl,
            internal_pclk_res: AtomicU32::new(0),
            mipi_once: OnceGate::new(),
            dual_sensors: OnceGate::new(),
        }
    }

    pub fn with_isp_clock(self, clk: Arc<dyn Clock>) -> Self {
        Hardware {
            isp_clk: Some(clk),
            ..self
        }
    }

    pub fn with_sclk0(self, clk: Arc<dyn Clock>) -> Self {
        Hardware {
            sclk0: Some(clk),
            ..self
        }
    }

    pub fn ctrl(&self) -> &dyn CameraCtrl {
        self.ctrl.as_ref()
    }

    /// Switch the pin multiplexer to `state`.
    ///
    /// An unknown state leaves the current one in place. Once the lookup
    /// succeeds the current state is dropped before the switch, so a
    /// rejected switch leaves no state recorded as active.
    pub fn select_pin_state(&self, state: PinState) -> Result<(), Error> {
        let mut active = lock(&self.active_pin);

        if !self.pinctrl.has_state(state.name()) {
            error!("pinctrl couldn't find {} state", state);
            return Err(Error::PinStateNotFound(state));
        }

        *active = None;

        if let Err(code) = self.pinctrl.select_state(state.name()) {
            error!("pinctrl select {} fail ret:{}", state, code);
            return Err(Error::PinSelectFailed { state, code });
        }

        debug!("pinctrl state {}", state);
        *active = Some(state);
        Ok(())
    }

    pub fn active_pin_state(&self) -> Option<PinState> {
        *lock(&self.active_pin)
    }

    /// Open the ISP clock gate.
    pub fn enable_isp_clock(&self) -> Result<(), Error> {
        let clk = self
            .isp_clk
            .as_ref()
            .ok_or(Error::ClockUnavailable(ClockId::Isp))?;
        clk.prepare_enable().map_err(|code| {
            error!("prepare & enable isp_clk fail: {}", code);
            Error::Clock {
                clock: ClockId::Isp,
                code,
            }
        })
    }

    /// Enable the primary sensor clock and program it to `hz`, returning the
    /// rate the clock settled on.
    pub fn configure_sclk0(&self, hz: u64) -> Result<u64, Error> {
        let clk = self
            .sclk0
            .as_ref()
            .ok_or(Error::ClockUnavailable(ClockId::Sclk0))?;
        let clock_err = |code| Error::Clock {
            clock: ClockId::Sclk0,
            code,
        };

        clk.prepare_enable().map_err(|code| {
            error!("prepare & enable sclk0 fail: {}", code);
            clock_err(code)
        })?;
        clk.set_rate(hz).map_err(clock_err)?;
        let rate = clk.rate();
        debug!("sclk0 rate {} requested {}", rate, hz);
        Ok(rate)
    }

    /// Program the internal MIPI pixel clock and remember the result.
    pub(crate) fn set_internal_pclk(&self, mhz: u32) -> Result<u32, Error> {
        let res = self
            .ctrl
            .set_mipi_csi_pclk(mhz)
            .map_err(|code| Error::Platform {
                call: "set_mipi_csi_pclk",
                code,
            })?;
        self.internal_pclk_res.store(res, Ordering::Release);
        Ok(res)
    }

    /// Internal MIPI pixel clock the PLL settled on, 0 before MIPI bring-up.
    pub fn internal_pclk_res(&self) -> u32 {
        self.internal_pclk_res.load(Ordering::Acquire)
    }

    /// Whether the shared MIPI receiver preparation has completed.
    pub fn mipi_prepared(&self) -> bool {
        self.mipi_once.is_done()
    }

    /// Whether dual-sensor register programming has completed.
    pub fn dual_sensors_initialized(&self) -> bool {
        self.dual_sensors.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EventLog, HwEvent, SimCameraCtrl, SimClock, SimPinController};

    fn hardware(pins: SimPinController, log: &EventLog) -> Hardware {
        Hardware::new(Arc::new(pins), Arc::new(SimCameraCtrl::new(log.clone())))
    }

    #[test]
    fn test_select_pin_state() {
        let log = EventLog::default();
        let hw = hardware(SimPinController::new(log.clone()), &log);
        assert_eq!(hw.active_pin_state(), None);

        hw.select_pin_state(PinState::Dvp0Bits10).unwrap();
        assert_eq!(hw.active_pin_state(), Some(PinState::Dvp0Bits10));
        assert_eq!(
            log.snapshot(),
            vec![HwEvent::PinSelect(PinState::Dvp0Bits10)]
        );
    }

    #[test]
    fn test_unknown_state_keeps_current() {
        let log = EventLog::default();
        let pins = SimPinController::new(log.clone()).without_state(PinState::Mipi1TwoLane);
        let hw = hardware(pins, &log);

        hw.select_pin_state(PinState::Csi1Sclk).unwrap();
        let err = hw.select_pin_state(PinState::Mipi1TwoLane).unwrap_err();
        assert!(matches!(err, Error::PinStateNotFound(PinState::Mipi1TwoLane)));
        assert_eq!(hw.active_pin_state(), Some(PinState::Csi1Sclk));
    }

    #[test]
    fn test_rejected_select_clears_state() {
        let log = EventLog::default();
        let pins = SimPinController::new(log.clone()).failing(PinState::Mipi0OneLane, -16);
        let hw = hardware(pins, &log);

        hw.select_pin_state(PinState::Csi0Sclk).unwrap();
        let err = hw.select_pin_state(PinState::Mipi0OneLane).unwrap_err();
        assert!(matches!(
            err,
            Error::PinSelectFailed {
                state: PinState::Mipi0OneLane,
                code: -16
            }
        ));
        assert_eq!(hw.active_pin_state(), None);
    }

    #[test]
    fn test_missing_clocks() {
        let log = EventLog::default();
        let hw = hardware(SimPinController::new(log.clone()), &log);
        assert!(matches!(
            hw.enable_isp_clock(),
            Err(Error::ClockUnavailable(ClockId::Isp))
        ));
        assert!(matches!(
            hw.configure_sclk0(24_000_000),
            Err(Error::ClockUnavailable(ClockId::Sclk0))
        ));
    }

    #[test]
    fn test_configure_sclk0() {
        let log = EventLog::default();
        let sclk0 = Arc::new(SimClock::new(ClockId::Sclk0, log.clone()));
        let hw = hardware(SimPinController::new(log.clone()), &log).with_sclk0(sclk0.clone());

        assert_eq!(hw.configure_sclk0(27_000_000).unwrap(), 27_000_000);
        assert_eq!(hw.configure_sclk0(24_000_000).unwrap(), 24_000_000);
        assert_eq!(sclk0.enable_count(), 2);
        assert_eq!(sclk0.rate(), 24_000_000);
    }
}
