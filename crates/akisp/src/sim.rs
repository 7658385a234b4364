// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! In-memory board
//!
//! Every simulated component appends the hardware-visible effect of each call
//! to a shared [`EventLog`], so a test or the CLI can inspect exactly which
//! pins, clocks and registers a bring-up touched and in what order.
//!
//! ```
//! use akisp::sim::{HwEvent, SimBoard, SimSensorConfig};
//! use akisp::PinState;
//!
//! let (device, log) = SimBoard::new()
//!     .with_input(SimSensorConfig::dvp())
//!     .build()?;
//! device.vi_interface_init(0)?;
//! assert!(log.snapshot().contains(&HwEvent::PinSelect(PinState::Dvp0Bits8)));
//! # Ok::<(), akisp::Error>(())
//! ```

use crate::{
    device::{ChannelId, Device, DeviceConfig, InputDesc},
    errno,
    hw::{CameraCtrl, Clock, ClockId, Hardware, IoLevel, MipiMode, MipiPort, PinController, PinState},
    isp::{
        AeAttr, AeRunInfo, AfStat, AwbStat, FrameRateAttr, IspCore, IspMode, IspTiming, MeAttr,
        Nr3dStat, OutputFormat, UvnrAttr, ISP_BUFFER_SLOTS,
    },
    lock,
    sensor::{AeFastDefault, ParamValue, SensorInitPara, SensorOps, SensorParam, SensorReg},
    subdev::{Control, CropCap, Subdev, TimingCallback},
    Error,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// One hardware-visible action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    PinSelect(PinState),
    ClockEnable(ClockId),
    ClockRate(ClockId, u64),
    DvpPort {
        input: usize,
        level: IoLevel,
        bits: i32,
    },
    MipiPclk(u32),
    MipiPrepare(MipiMode),
    MipiPortCfg {
        port: MipiPort,
        mhz: i32,
        lanes: i32,
    },
    PclkPolar {
        input: usize,
        rising: bool,
    },
    Sclk1(i32),
    SensorPowerOn(usize),
    SensorInit(usize),
    SubdevCtrl {
        input: usize,
        id: u32,
    },
    IspMisc {
        input: usize,
        timing: IspTiming,
    },
    IspAeFast(usize),
    IspMode {
        input: usize,
        mode: IspMode,
    },
    IspBufferAddr {
        input: usize,
        channel: ChannelId,
        slot: usize,
        addr: u64,
    },
    IspBufferEnable {
        input: usize,
        channel: ChannelId,
        slot: usize,
    },
    IspBufferDisable {
        input: usize,
        channel: ChannelId,
        slot: usize,
    },
    IspStart(usize),
    IspStop(usize),
}

/// Shared, ordered record of [`HwEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<HwEvent>>>);

impl EventLog {
    pub fn push(&self, event: HwEvent) {
        lock(&self.0).push(event);
    }

    pub fn snapshot(&self) -> Vec<HwEvent> {
        lock(&self.0).clone()
    }

    pub fn count(&self, pred: impl Fn(&HwEvent) -> bool) -> usize {
        lock(&self.0).iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

/// Pin multiplexer describing all twelve states unless told otherwise.
#[derive(Debug)]
pub struct SimPinController {
    states: HashSet<PinState>,
    failing: HashMap<PinState, i32>,
    log: EventLog,
}

impl SimPinController {
    pub fn new(log: EventLog) -> Self {
        SimPinController {
            states: PinState::ALL.into_iter().collect(),
            failing: HashMap::new(),
            log,
        }
    }

    /// Drop a state from the board description.
    pub fn without_state(mut self, state: PinState) -> Self {
        self.states.remove(&state);
        self
    }

    /// Make selecting `state` fail with `code`.
    pub fn failing(mut self, state: PinState, code: i32) -> Self {
        self.failing.insert(state, code);
        self
    }
}

impl PinController for SimPinController {
    fn has_state(&self, name: &str) -> bool {
        name.parse::<PinState>()
            .map(|state| self.states.contains(&state))
            .unwrap_or(false)
    }

    fn select_state(&self, name: &str) -> Result<(), i32> {
        let state = name.parse::<PinState>().map_err(|_| -errno::EINVAL)?;
        if let Some(code) = self.failing.get(&state) {
            return Err(*code);
        }
        self.log.push(HwEvent::PinSelect(state));
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimClock {
    id: ClockId,
    enabled: AtomicUsize,
    rate: AtomicU64,
    log: EventLog,
}

impl SimClock {
    pub fn new(id: ClockId, log: EventLog) -> Self {
        SimClock {
            id,
            enabled: AtomicUsize::new(0),
            rate: AtomicU64::new(0),
            log,
        }
    }

    pub fn enable_count(&self) -> usize {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Clock for SimClock {
    fn prepare_enable(&self) -> Result<(), i32> {
        self.enabled.fetch_add(1, Ordering::AcqRel);
        self.log.push(HwEvent::ClockEnable(self.id));
        Ok(())
    }

    fn set_rate(&self, hz: u64) -> Result<(), i32> {
        self.rate.store(hz, Ordering::Release);
        self.log.push(HwEvent::ClockRate(self.id, hz));
        Ok(())
    }

    fn rate(&self) -> u64 {
        self.rate.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SimCameraCtrl {
    log: EventLog,
}

impl SimCameraCtrl {
    pub fn new(log: EventLog) -> Self {
        SimCameraCtrl { log }
    }
}

impl CameraCtrl for SimCameraCtrl {
    fn set_dvp_port(&self, input: usize, level: IoLevel, bits: i32) -> Result<(), i32> {
        self.log.push(HwEvent::DvpPort { input, level, bits });
        Ok(())
    }

    fn set_mipi_csi_pclk(&self, mhz: u32) -> Result<u32, i32> {
        self.log.push(HwEvent::MipiPclk(mhz));
        Ok(mhz)
    }

    fn mipi_ip_prepare(&self, mode: MipiMode) -> Result<(), i32> {
        self.log.push(HwEvent::MipiPrepare(mode));
        Ok(())
    }

    fn mipi_ip_port_cfg(&self, port: MipiPort, mhz: i32, lanes: i32) -> Result<(), i32> {
        self.log.push(HwEvent::MipiPortCfg { port, mhz, lanes });
        Ok(())
    }

    fn set_pclk_polar(&self, input: usize, rising: bool) -> Result<(), i32> {
        self.log.push(HwEvent::PclkPolar { input, rising });
        Ok(())
    }

    fn set_sclk1(&self, mhz: i32) -> Result<(), i32> {
        self.log.push(HwEvent::Sclk1(mhz));
        Ok(())
    }
}

/// Raw answers of a [`SimSensor`], in the sensor driver's own codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSensorConfig {
    /// 0 DVP, 1 MIPI.
    pub interface: i32,
    /// 0 1.8V, 1 2.5V, 2 3.3V.
    pub io_level: i32,
    pub mipi_lanes: i32,
    pub mipi_mhz: i32,
    /// 0 RAW, 1 YUV.
    pub bus_type: i32,
    /// `None` makes the scan method query fail.
    pub scan_method: Option<i32>,
    pub mclk: i32,
    pub ae_fast: Option<AeFastDefault>,
    pub sensor_id: i32,
    pub resolution: (i32, i32),
    /// Queries that fail with `-EIO`.
    pub fail_params: Vec<SensorParam>,
    pub fail_init: bool,
}

impl SimSensorConfig {
    /// 8-bit parallel RAW sensor at 3.3V.
    pub fn dvp() -> Self {
        SimSensorConfig {
            interface: 0,
            io_level: 2,
            mipi_lanes: 0,
            mipi_mhz: 0,
            bus_type: 0,
            scan_method: Some(0),
            mclk: 24,
            ae_fast: Some(AeFastDefault::default()),
            sensor_id: 0x2053,
            resolution: (1920, 1080),
            fail_params: Vec::new(),
            fail_init: false,
        }
    }

    /// RAW sensor on `lanes` MIPI lanes at `mhz`.
    pub fn mipi(lanes: i32, mhz: i32) -> Self {
        SimSensorConfig {
            interface: 1,
            mipi_lanes: lanes,
            mipi_mhz: mhz,
            ..SimSensorConfig::dvp()
        }
    }
}

#[derive(Debug)]
pub struct SimSensor {
    input: usize,
    config: SimSensorConfig,
    log: EventLog,
    init_calls: AtomicUsize,
}

impl SimSensor {
    pub fn new(input: usize, config: SimSensorConfig, log: EventLog) -> Self {
        SimSensor {
            input,
            config,
            log,
            init_calls: AtomicUsize::new(0),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::Acquire)
    }
}

impl SensorOps for SimSensor {
    fn get_parameter(&self, param: SensorParam) -> Result<ParamValue, i32> {
        if self.config.fail_params.contains(&param) {
            return Err(-errno::EIO);
        }
        let value = match param {
            SensorParam::Interface => self.config.interface,
            SensorParam::IoLevel => self.config.io_level,
            SensorParam::MipiLanes => self.config.mipi_lanes,
            SensorParam::MipiMhz => self.config.mipi_mhz,
            SensorParam::BusType => self.config.bus_type,
            SensorParam::ScanMethod => self.config.scan_method.ok_or(-errno::EINVAL)?,
            SensorParam::AeFastDefault => {
                return self
                    .config
                    .ae_fast
                    .map(ParamValue::AeFast)
                    .ok_or(-errno::ENOTTY)
            }
        };
        Ok(ParamValue::Int(value))
    }

    fn get_mclk(&self) -> i32 {
        self.config.mclk
    }

    fn get_bus_type(&self) -> i32 {
        self.config.bus_type
    }

    fn read_id(&self) -> Result<i32, i32> {
        Ok(self.config.sensor_id)
    }

    fn get_resolution(&self) -> Result<(i32, i32), i32> {
        Ok(self.config.resolution)
    }

    fn set_power_on(&self) -> Result<(), i32> {
        self.log.push(HwEvent::SensorPowerOn(self.input));
        Ok(())
    }

    fn init(&self, _para: &SensorInitPara) -> Result<(), i32> {
        if self.config.fail_init {
            return Err(-errno::EIO);
        }
        self.init_calls.fetch_add(1, Ordering::AcqRel);
        self.log.push(HwEvent::SensorInit(self.input));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimIspConfig {
    pub bits_width: i32,
    /// 0 rising, 1 falling.
    pub pclk_polarity: i32,
    /// Status `start_capturing` fails with, if any.
    pub start_error: Option<i32>,
}

impl Default for SimIspConfig {
    fn default() -> Self {
        SimIspConfig {
            bits_width: 8,
            pclk_polarity: 0,
            start_error: None,
        }
    }
}

/// ISP core answering from its config and returning fixed statistics.
#[derive(Debug)]
pub struct SimIsp {
    input: usize,
    config: SimIspConfig,
    log: EventLog,
    me: Mutex<MeAttr>,
    uvnr: Mutex<UvnrAttr>,
}

impl SimIsp {
    pub fn new(input: usize, config: SimIspConfig, log: EventLog) -> Self {
        SimIsp {
            input,
            config,
            log,
            me: Mutex::new(MeAttr::default()),
            uvnr: Mutex::new(UvnrAttr::default()),
        }
    }
}

impl IspCore for SimIsp {
    fn is_attached(&self) -> bool {
        true
    }

    fn bits_width(&self) -> Result<i32, Error> {
        Ok(self.config.bits_width)
    }

    fn pclk_polarity(&self) -> Result<i32, Error> {
        Ok(self.config.pclk_polarity)
    }

    fn apply_mode(&self, mode: IspMode) -> Result<(), Error> {
        self.log.push(HwEvent::IspMode {
            input: self.input,
            mode,
        });
        Ok(())
    }

    fn set_misc_attr(&self, timing: &IspTiming) -> Result<(), Error> {
        self.log.push(HwEvent::IspMisc {
            input: self.input,
            timing: *timing,
        });
        Ok(())
    }

    fn set_ae_fast_default(&self, _ae: &AeFastDefault) -> Result<(), Error> {
        self.log.push(HwEvent::IspAeFast(self.input));
        Ok(())
    }

    fn set_buffer_addr(&self, channel: ChannelId, slot: usize, addr: u64) -> Result<(), Error> {
        if slot >= ISP_BUFFER_SLOTS {
            return Err(Error::InvalidBufferIndex {
                index: slot,
                capacity: ISP_BUFFER_SLOTS,
            });
        }
        self.log.push(HwEvent::IspBufferAddr {
            input: self.input,
            channel,
            slot,
            addr,
        });
        Ok(())
    }

    fn enable_buffer(&self, channel: ChannelId, slot: usize) -> Result<(), Error> {
        self.log.push(HwEvent::IspBufferEnable {
            input: self.input,
            channel,
            slot,
        });
        Ok(())
    }

    fn disable_buffer(&self, channel: ChannelId, slot: usize) -> Result<(), Error> {
        self.log.push(HwEvent::IspBufferDisable {
            input: self.input,
            channel,
            slot,
        });
        Ok(())
    }

    fn start_capturing(&self, _format: OutputFormat) -> Result<(), Error> {
        if let Some(code) = self.config.start_error {
            return Err(Error::Isp {
                call: "ak_isp_vi_start_capturing_compat",
                code,
            });
        }
        self.log.push(HwEvent::IspStart(self.input));
        Ok(())
    }

    fn stop_capturing(&self) -> Result<(), Error> {
        self.log.push(HwEvent::IspStop(self.input));
        Ok(())
    }

    fn version(&self) -> Result<String, Error> {
        Ok("sim-isp".to_owned())
    }

    fn ae_run_info(&self) -> Result<AeRunInfo, Error> {
        Ok(AeRunInfo {
            current_calc_avg_lumi: 128,
            current_exp_time: 33,
            ..Default::default()
        })
    }

    fn frame_rate(&self) -> Result<FrameRateAttr, Error> {
        Ok(FrameRateAttr {
            high_light_frame_rate: 25,
            low_light_frame_rate: 12,
            ..Default::default()
        })
    }

    fn af_stat(&self) -> Result<AfStat, Error> {
        Ok(AfStat {
            af_statics: [1, 2, 3, 4, 5],
        })
    }

    fn awb_stat(&self) -> Result<AwbStat, Error> {
        Ok(AwbStat {
            r_gain: 256,
            g_gain: 256,
            b_gain: 256,
            ..Default::default()
        })
    }

    fn nr3d_stat(&self) -> Result<Nr3dStat, Error> {
        let mut stat = Nr3dStat {
            md_level: 2,
            ..Default::default()
        };
        for (row, cells) in stat.md_stat.iter_mut().enumerate() {
            cells.iter_mut().for_each(|cell| *cell = row as u16);
        }
        Ok(stat)
    }

    fn ae_attr(&self) -> Result<AeAttr, Error> {
        Ok(AeAttr {
            exp_time_max: 1125,
            exp_time_min: 1,
            ..Default::default()
        })
    }

    fn set_me_attr(&self, attr: &MeAttr) -> Result<(), Error> {
        *lock(&self.me) = *attr;
        Ok(())
    }

    fn me_attr(&self) -> Result<MeAttr, Error> {
        Ok(*lock(&self.me))
    }

    fn set_uvnr_attr(&self, attr: &UvnrAttr) -> Result<(), Error> {
        *lock(&self.uvnr) = *attr;
        Ok(())
    }

    fn uvnr_attr(&self) -> Result<UvnrAttr, Error> {
        Ok(*lock(&self.uvnr))
    }

    fn set_ae_work_suspend(&self, _suspend: i32) -> Result<(), Error> {
        Ok(())
    }
}

/// Sensor control object that keeps the timing callback it is handed.
pub struct SimSubdev {
    input: usize,
    log: EventLog,
    callback: Mutex<Option<TimingCallback>>,
    cropcap: Option<CropCap>,
}

impl SimSubdev {
    pub fn new(input: usize, log: EventLog) -> Self {
        SimSubdev {
            input,
            log,
            callback: Mutex::new(None),
            cropcap: None,
        }
    }

    pub fn with_cropcap(self, cropcap: CropCap) -> Self {
        SimSubdev {
            cropcap: Some(cropcap),
            ..self
        }
    }

    /// Report a timing change the way the sensor driver would.
    pub fn fire_timing(&self, timing: &IspTiming) -> Result<(), Error> {
        let callback = lock(&self.callback)
            .clone()
            .ok_or(Error::NotSupported("timing callback"))?;
        callback(timing)
    }
}

impl Subdev for SimSubdev {
    fn g_ctrl(&self, _id: u32) -> Result<i32, Error> {
        Ok(0)
    }

    fn s_ctrl(&self, ctrl: Control) -> Result<(), Error> {
        self.log.push(HwEvent::SubdevCtrl {
            input: self.input,
            id: ctrl.id(),
        });
        if let Control::IspTimingCallback(callback) = ctrl {
            *lock(&self.callback) = Some(callback);
        }
        Ok(())
    }

    fn cropcap(&self) -> Result<CropCap, Error> {
        self.cropcap.ok_or(Error::NotSupported("cropcap"))
    }
}

#[derive(Debug, Clone)]
struct SimInput {
    sensor: SimSensorConfig,
    isp: SimIspConfig,
    subdev: bool,
}

/// Builder for a simulated [`Device`].
#[derive(Debug, Clone, Default)]
pub struct SimBoard {
    inputs: Vec<SimInput>,
    config: DeviceConfig,
    missing_pins: Vec<PinState>,
    no_clocks: bool,
}

impl SimBoard {
    pub fn new() -> Self {
        SimBoard::default()
    }

    pub fn with_input(mut self, sensor: SimSensorConfig) -> Self {
        self.inputs.push(SimInput {
            sensor,
            isp: SimIspConfig::default(),
            subdev: false,
        });
        self
    }

    /// ISP answers of the most recently added input.
    pub fn with_isp_config(mut self, isp: SimIspConfig) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.isp = isp;
        }
        self
    }

    /// Give the most recently added input a driver-supplied [`SimSubdev`].
    pub fn with_external_subdev(mut self) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.subdev = true;
        }
        self
    }

    pub fn with_config(self, config: DeviceConfig) -> Self {
        SimBoard { config, ..self }
    }

    pub fn without_pin_state(mut self, state: PinState) -> Self {
        self.missing_pins.push(state);
        self
    }

    /// Leave `isp_clk` and `sclk0` unregistered.
    pub fn without_clocks(self) -> Self {
        SimBoard {
            no_clocks: true,
            ..self
        }
    }

    pub fn build(self) -> Result<(Device, EventLog), Error> {
        let log = EventLog::default();

        let pins = self
            .missing_pins
            .iter()
            .fold(SimPinController::new(log.clone()), |pins, state| {
                pins.without_state(*state)
            });
        let mut hw = Hardware::new(Arc::new(pins), Arc::new(SimCameraCtrl::new(log.clone())));
        if !self.no_clocks {
            hw = hw
                .with_isp_clock(Arc::new(SimClock::new(ClockId::Isp, log.clone())))
                .with_sclk0(Arc::new(SimClock::new(ClockId::Sclk0, log.clone())));
        }

        let inputs = self
            .inputs
            .into_iter()
            .enumerate()
            .map(|(id, input)| {
                let desc = InputDesc::new(
                    Arc::new(SimSensor::new(id, input.sensor, log.clone())),
                    Arc::new(SimIsp::new(id, input.isp, log.clone())),
                )
                .with_init_para(SensorInitPara {
                    regs: vec![SensorReg {
                        addr: 0x0100,
                        value: 0x0001,
                    }],
                });
                if input.subdev {
                    desc.with_subdev(Arc::new(SimSubdev::new(id, log.clone())))
                } else {
                    desc
                }
            })
            .collect();

        let device = Device::new(hw, self.config, inputs)?;
        Ok((device, log))
    }
}
