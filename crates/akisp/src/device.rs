// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Inputs, channels and the buffer state machine
//!
//! A [`Device`] owns one or two sensor inputs, each with
//! [`CHN_NUM_PER_INPUT`] capture channels. The buffer queue framework drives
//! it through [`Device::queue_setup`] and [`Device::buffer_init`]; binding
//! the last buffer of a channel triggers interface bring-up of the owning
//! input once per streaming session.
//!
//! Channel states:
//!
//! ```text
//! Unqueued --buffer_init--> AddressBound --buffer_init(last)--> AllBufferInit
//!     ^                                                              |
//!     +------------------- stop_streaming / queue_setup -------------+
//! ```

use crate::{
    format::PixelFormat,
    fourcc::FourCC,
    hw::{Hardware, PinState},
    isp::{IspCore, IspMode, IspStatus, OutputFormat, ISP_BUFFER_SLOTS},
    lock,
    sensor::{ScanMethod, Sensor, SensorInitPara, SensorOps, SensorParam},
    subdev::{self, Control, CropCap, Subdev, TimingCallback},
    Error,
};
use log::{debug, error, info, warn};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

pub const CHN_NUM_PER_INPUT: usize = 3;
pub const MAX_INPUTS: usize = 2;
pub const MAX_BUFFERS_PER_CHANNEL: usize = 32;

/// Output stream of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    Main,
    Sub,
    Third,
}

impl ChannelId {
    pub const ALL: [ChannelId; CHN_NUM_PER_INPUT] =
        [ChannelId::Main, ChannelId::Sub, ChannelId::Third];

    pub const fn index(self) -> usize {
        match self {
            ChannelId::Main => 0,
            ChannelId::Sub => 1,
            ChannelId::Third => 2,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChannelId::Main),
            1 => Some(ChannelId::Sub),
            2 => Some(ChannelId::Third),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelId::Main => write!(f, "main"),
            ChannelId::Sub => write!(f, "sub"),
            ChannelId::Third => write!(f, "third"),
        }
    }
}

/// Device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Sensor clock used when neither the caller nor the sensor names one.
    default_sclk_mhz: i32,

    /// Internal MIPI pixel clock requested during receiver preparation.
    internal_pclk_mhz: u32,

    /// Initial negotiated format of each channel.
    formats: [PixelFormat; CHN_NUM_PER_INPUT],
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            default_sclk_mhz: 24,
            internal_pclk_mhz: 100,
            formats: [
                PixelFormat::new(1920, 1080, FourCC::NV12),
                PixelFormat::new(640, 480, FourCC::NV12),
                PixelFormat::new(320, 240, FourCC::NV12),
            ],
        }
    }
}

impl DeviceConfig {
    pub fn with_default_sclk(self, mhz: i32) -> Self {
        DeviceConfig {
            default_sclk_mhz: mhz,
            ..self
        }
    }

    pub fn with_internal_pclk(self, mhz: u32) -> Self {
        DeviceConfig {
            internal_pclk_mhz: mhz,
            ..self
        }
    }

    pub fn with_format(mut self, channel: ChannelId, format: PixelFormat) -> Self {
        self.formats[channel.index()] = format;
        self
    }

    pub fn default_sclk_mhz(&self) -> i32 {
        self.default_sclk_mhz
    }

    pub fn internal_pclk_mhz(&self) -> u32 {
        self.internal_pclk_mhz
    }

    pub fn format(&self, channel: ChannelId) -> PixelFormat {
        self.formats[channel.index()]
    }
}

/// Everything the board supplies for one sensor input.
pub struct InputDesc {
    pub sensor: Arc<dyn SensorOps>,
    pub isp: Arc<dyn IspCore>,
    pub subdev: Option<Arc<dyn Subdev>>,
    pub init_para: SensorInitPara,
}

impl InputDesc {
    pub fn new(sensor: Arc<dyn SensorOps>, isp: Arc<dyn IspCore>) -> Self {
        InputDesc {
            sensor,
            isp,
            subdev: None,
            init_para: SensorInitPara::default(),
        }
    }

    pub fn with_subdev(self, subdev: Arc<dyn Subdev>) -> Self {
        InputDesc {
            subdev: Some(subdev),
            ..self
        }
    }

    pub fn with_init_para(self, init_para: SensorInitPara) -> Self {
        InputDesc { init_para, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    #[default]
    Unqueued,
    AddressBound,
    AllBufferInit,
}

/// Result of [`Device::queue_setup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSetup {
    pub count: usize,
    pub planes: usize,
    pub size: u32,
}

/// Snapshot of one capture channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    id: ChannelId,
    name: Option<String>,
    format: PixelFormat,
    addrs: Vec<Option<u64>>,
    vb_num: usize,
    state: ChannelState,
    streaming: bool,
    /// ISP slots of this channel currently enabled, from slot 0.
    armed: usize,
}

impl Channel {
    fn new(id: ChannelId, format: PixelFormat) -> Self {
        Channel {
            id,
            name: None,
            format,
            addrs: vec![None; MAX_BUFFERS_PER_CHANNEL],
            vb_num: 0,
            state: ChannelState::Unqueued,
            streaming: false,
            armed: 0,
        }
    }

    fn reset(&mut self) {
        self.addrs.iter_mut().for_each(|addr| *addr = None);
        self.vb_num = 0;
        self.state = ChannelState::Unqueued;
        self.streaming = false;
        self.armed = 0;
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Video node name, set while the input is registered.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn vb_num(&self) -> usize {
        self.vb_num
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Number of this channel's ISP slots the hardware may write.
    pub fn armed_slots(&self) -> usize {
        self.armed
    }

    pub fn addr(&self, index: usize) -> Option<u64> {
        self.addrs.get(index).copied().flatten()
    }

    /// Bound addresses of the current batch, in index order.
    pub fn bound_addrs(&self) -> Vec<u64> {
        self.addrs[..self.vb_num].iter().flatten().copied().collect()
    }
}

#[derive(Debug)]
pub(crate) struct InputState {
    pub(crate) channels: [Channel; CHN_NUM_PER_INPUT],
    pub(crate) route_init: bool,
    pub(crate) isp_mode: IspMode,
    pub(crate) output_format: OutputFormat,
    pub(crate) isp_status: IspStatus,
    pub(crate) scan_method: ScanMethod,
}

/// One physical sensor attachment.
pub(crate) struct Input {
    pub(crate) id: usize,
    pub(crate) sensor: Sensor,
    pub(crate) isp: Arc<dyn IspCore>,
    pub(crate) state: Mutex<InputState>,
    pub(crate) opened: AtomicUsize,
    registered: AtomicBool,
    /// Serializes route initialization of this input.
    bringup: Mutex<()>,
}

impl Input {
    fn new(id: usize, desc: InputDesc, config: &DeviceConfig) -> Self {
        let channels = ChannelId::ALL.map(|chn| Channel::new(chn, config.format(chn)));
        Input {
            id,
            sensor: Sensor::new(desc.sensor, desc.init_para, desc.subdev),
            isp: desc.isp,
            state: Mutex::new(InputState {
                channels,
                route_init: false,
                isp_mode: IspMode::default(),
                output_format: OutputFormat::default(),
                isp_status: IspStatus::Stop,
                scan_method: ScanMethod::default(),
            }),
            opened: AtomicUsize::new(0),
            registered: AtomicBool::new(false),
            bringup: Mutex::new(()),
        }
    }

    /// The primary input owns `isp_clk`, `sclk0` and port 0 of each bus.
    pub(crate) fn is_primary(&self) -> bool {
        self.id == 0
    }
}

/// Video-input device: shared hardware plus one or two inputs.
pub struct Device {
    pub(crate) hw: Hardware,
    pub(crate) config: DeviceConfig,
    pub(crate) inputs: Vec<Input>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Device")
            .field("hw", &self.hw)
            .field("config", &self.config)
            .field("inputs", &self.inputs.len())
            .finish()
    }
}

impl Device {
    pub fn new(hw: Hardware, config: DeviceConfig, inputs: Vec<InputDesc>) -> Result<Self, Error> {
        if inputs.is_empty() || inputs.len() > MAX_INPUTS {
            return Err(Error::InvalidInputCount(inputs.len()));
        }

        let inputs = inputs
            .into_iter()
            .enumerate()
            .map(|(id, desc)| Input::new(id, desc, &config))
            .collect();

        Ok(Device { hw, config, inputs })
    }

    pub fn hardware(&self) -> &Hardware {
        &self.hw
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_dual(&self) -> bool {
        self.inputs.len() > 1
    }

    pub(crate) fn input(&self, id: usize) -> Result<&Input, Error> {
        self.inputs.get(id).ok_or(Error::InvalidInput(id))
    }

    fn registered_input(&self, id: usize) -> Result<&Input, Error> {
        let input = self.input(id)?;
        if !input.registered.load(Ordering::Acquire) {
            return Err(Error::InputNotRegistered(id));
        }
        Ok(input)
    }

    pub fn sensor(&self, input: usize) -> Result<&Sensor, Error> {
        Ok(&self.input(input)?.sensor)
    }

    pub fn isp(&self, input: usize) -> Result<Arc<dyn IspCore>, Error> {
        Ok(self.input(input)?.isp.clone())
    }

    pub fn channel(&self, input: usize, channel: ChannelId) -> Result<Channel, Error> {
        let input = self.input(input)?;
        let state = lock(&input.state);
        Ok(state.channels[channel.index()].clone())
    }

    pub fn is_registered(&self, input: usize) -> Result<bool, Error> {
        Ok(self.input(input)?.registered.load(Ordering::Acquire))
    }

    pub fn opened_count(&self, input: usize) -> Result<usize, Error> {
        Ok(self.input(input)?.opened.load(Ordering::Acquire))
    }

    /// Whether interface bring-up has run in the current streaming session.
    pub fn is_route_initialized(&self, input: usize) -> Result<bool, Error> {
        Ok(lock(&self.input(input)?.state).route_init)
    }

    pub fn isp_mode(&self, input: usize) -> Result<IspMode, Error> {
        Ok(lock(&self.input(input)?.state).isp_mode)
    }

    pub fn isp_status(&self, input: usize) -> Result<IspStatus, Error> {
        Ok(lock(&self.input(input)?.state).isp_status)
    }

    /// Scan method cached at the end of route initialization.
    pub fn scan_method(&self, input: usize) -> Result<ScanMethod, Error> {
        Ok(lock(&self.input(input)?.state).scan_method)
    }

    /// Create the video nodes of an input and park its sensor clock.
    ///
    /// Clock and pin failures here are not fatal: the sensor driver may not
    /// be attached yet and bring-up configures both again.
    pub fn register_input(&self, id: usize) -> Result<(), Error> {
        let input = self.input(id)?;
        if input.registered.load(Ordering::Acquire) {
            debug!("input {} already registered", id);
            return Ok(());
        }

        debug!("register input {}", id);
        {
            let mut state = lock(&input.state);
            for chn in state.channels.iter_mut() {
                chn.name = Some(format!("video{}_{}", id, chn.id.index()));
            }
        }

        if let Err(err) = self.set_sclk(input, self.config.default_sclk_mhz) {
            warn!("input {} set sclk fail: {}", id, err);
        }
        if let Err(err) = self.hw.select_pin_state(PinState::sclk(input.is_primary())) {
            warn!("input {} sclk pins: {}", id, err);
        }

        if let Err(err) = subdev::ensure_subdev(&input.sensor) {
            error!("input {} create dummy subdev failed: {}", id, err);
            let mut state = lock(&input.state);
            state.channels.iter_mut().for_each(|chn| chn.name = None);
            return Err(err);
        }

        input.registered.store(true, Ordering::Release);
        info!("input {} registered", id);
        Ok(())
    }

    /// Tear down the video nodes of an input. A fallback control object is
    /// released; one supplied by the sensor driver stays bound.
    pub fn unregister_input(&self, id: usize) -> Result<(), Error> {
        let input = self.registered_input(id)?;

        for chn in ChannelId::ALL {
            let streaming = lock(&input.state).channels[chn.index()].streaming;
            if streaming {
                if let Err(err) = self.stop_streaming(id, chn) {
                    warn!("input {} {} stop on unregister: {}", id, chn, err);
                }
            }
        }

        if subdev::release_fallback(&input.sensor) {
            debug!("input {} dummy subdev released", id);
        }

        let mut state = lock(&input.state);
        state.channels.iter_mut().for_each(|chn| chn.name = None);
        input.registered.store(false, Ordering::Release);
        info!("input {} unregistered", id);
        Ok(())
    }

    /// Open a channel's video node.
    pub fn open(&self, input: usize, channel: ChannelId) -> Result<(), Error> {
        let input = self.registered_input(input)?;
        let count = input.opened.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("input {} {} open, count {}", input.id, channel, count);
        Ok(())
    }

    /// Close a channel's video node. Closing a streaming channel stops it;
    /// the last close of an input ends its streaming session.
    pub fn close(&self, id: usize, channel: ChannelId) -> Result<(), Error> {
        let input = self.registered_input(id)?;

        let streaming = lock(&input.state).channels[channel.index()].streaming;
        if streaming {
            self.stop_streaming(id, channel)?;
        }

        let prev = input
            .opened
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev == 1 {
            debug!("input {} last close, route released", id);
            lock(&input.state).route_init = false;
        }
        Ok(())
    }

    /// Negotiate a channel format. The ISP writes semi-planar YUV 4:2:0
    /// only, so the pixel format is forced to NV12.
    pub fn set_format(
        &self,
        input: usize,
        channel: ChannelId,
        format: PixelFormat,
    ) -> Result<PixelFormat, Error> {
        let input = self.input(input)?;
        let mut state = lock(&input.state);
        let chn = &mut state.channels[channel.index()];
        if chn.streaming || chn.state != ChannelState::Unqueued {
            return Err(Error::ChannelBusy {
                input: input.id,
                channel,
            });
        }

        chn.format = PixelFormat::new(format.width, format.height, FourCC::NV12);
        Ok(chn.format)
    }

    /// Size the buffer queue of a channel.
    ///
    /// Records the buffer count, at most [`MAX_BUFFERS_PER_CHANNEL`], and
    /// reports one plane sized from the negotiated format.
    pub fn queue_setup(
        &self,
        input: usize,
        channel: ChannelId,
        count: usize,
    ) -> Result<QueueSetup, Error> {
        let input = self.input(input)?;
        let mut state = lock(&input.state);
        let chn = &mut state.channels[channel.index()];
        if chn.streaming {
            return Err(Error::ChannelBusy {
                input: input.id,
                channel,
            });
        }

        chn.reset();
        chn.vb_num = count.clamp(1, MAX_BUFFERS_PER_CHANNEL);
        let setup = QueueSetup {
            count: chn.vb_num,
            planes: 1,
            size: chn.format.sizeimage(),
        };
        debug!(
            "queue_setup input {} {} count {} sizeimage {}",
            input.id, channel, setup.count, setup.size
        );
        Ok(setup)
    }

    /// Bind the physical address of buffer `index`.
    ///
    /// The last buffer of the batch runs route initialization of the input
    /// if this streaming session has not done so yet, then moves the
    /// channel to [`ChannelState::AllBufferInit`]. Only route
    /// initialization failures are returned.
    pub fn buffer_init(
        &self,
        input: usize,
        channel: ChannelId,
        index: usize,
        phys_addr: u64,
    ) -> Result<(), Error> {
        let input = self.input(input)?;
        debug!("buffer_init input {} {} index {}", input.id, channel, index);

        {
            let mut state = lock(&input.state);
            let chn = &mut state.channels[channel.index()];
            if index >= chn.vb_num {
                return Err(Error::InvalidBufferIndex {
                    index,
                    capacity: chn.vb_num,
                });
            }

            chn.addrs[index] = Some(phys_addr);
            if chn.state == ChannelState::Unqueued {
                chn.state = ChannelState::AddressBound;
            }
            if index != chn.vb_num - 1 {
                return Ok(());
            }
        }

        self.route_init(input)?;

        let mut state = lock(&input.state);
        state.channels[channel.index()].state = ChannelState::AllBufferInit;
        Ok(())
    }

    /// Pins, clocks and sensor programming for the first completed channel
    /// of a streaming session.
    fn route_init(&self, input: &Input) -> Result<(), Error> {
        let _bringup = lock(&input.bringup);
        if lock(&input.state).route_init {
            return Ok(());
        }

        if let Err(err) = self.vi_interface_init_input(input) {
            error!("input {} vi interface init fail: {}", input.id, err);
            return Err(err);
        }

        if let Err(err) = self.set_isp_timing_cb(input) {
            error!("input {} set timing callback fail: {}", input.id, err);
        }

        match input.sensor.ae_fast_default() {
            Ok(ae) => {
                if let Err(err) = input.isp.set_ae_fast_default(&ae) {
                    debug!("input {} ae fast default not applied: {}", input.id, err);
                }
            }
            Err(_) => debug!("input {} get ae fast default NONE", input.id),
        }

        if self.is_dual() {
            self.dual_sensor_regs_init()?;
        } else if lock(&input.state).isp_status == IspStatus::Stop {
            self.sensor_regs_init(input)?;
        } else {
            debug!("input {} isp reused, sensor keeps its registers", input.id);
        }

        let scan_method = match input.sensor.query(SensorParam::ScanMethod) {
            Ok(raw) => ScanMethod::from_raw(raw).unwrap_or_default(),
            Err(_) => {
                debug!("input {} scan method NONE, set PROGRESSIVE", input.id);
                ScanMethod::Progressive
            }
        };

        let mut state = lock(&input.state);
        state.scan_method = scan_method;
        state.route_init = true;
        info!("input {} route initialized", input.id);
        Ok(())
    }

    /// Hand the sensor driver a callback that forwards line timing to the
    /// ISP of this input.
    fn set_isp_timing_cb(&self, input: &Input) -> Result<(), Error> {
        let sd = input
            .sensor
            .subdev()
            .ok_or(Error::NotSupported("s_ctrl"))?;
        let isp = input.isp.clone();
        let id = input.id;
        let callback: TimingCallback = Arc::new(move |timing| {
            debug!("input {} isp timing {:?}", id, timing);
            isp.set_misc_attr(timing)
        });
        sd.s_ctrl(Control::IspTimingCallback(callback))
    }

    /// Program the ISP buffer slots of a channel and start capture.
    ///
    /// Each channel has [`ISP_BUFFER_SLOTS`] address slots; the first bound
    /// buffers of the batch fill them. Later buffers stay bound in the
    /// channel table until frame completion hands a slot back.
    pub fn start_streaming(&self, input: usize, channel: ChannelId) -> Result<(), Error> {
        let input = self.registered_input(input)?;
        let mut state = lock(&input.state);
        let chn = &state.channels[channel.index()];
        if chn.state != ChannelState::AllBufferInit {
            return Err(Error::ChannelNotReady {
                input: input.id,
                channel,
            });
        }
        if chn.streaming {
            return Ok(());
        }

        let addrs: Vec<u64> = chn
            .bound_addrs()
            .into_iter()
            .take(ISP_BUFFER_SLOTS)
            .collect();
        for (slot, addr) in addrs.iter().enumerate() {
            let armed = input
                .isp
                .set_buffer_addr(channel, slot, *addr)
                .and_then(|()| input.isp.enable_buffer(channel, slot));
            if let Err(err) = armed {
                disarm_slots(input, channel, slot);
                return Err(err);
            }
        }

        if state.isp_status == IspStatus::Stop {
            let started = input
                .isp
                .apply_mode(state.isp_mode)
                .and_then(|()| input.isp.start_capturing(state.output_format));
            if let Err(err) = started {
                disarm_slots(input, channel, addrs.len());
                return Err(err);
            }
            state.isp_status = IspStatus::Running;
            info!("input {} capture started, mode {}", input.id, state.isp_mode);
        }

        let chn = &mut state.channels[channel.index()];
        chn.armed = addrs.len();
        chn.streaming = true;
        Ok(())
    }

    /// Stop a channel and return it to [`ChannelState::Unqueued`]. Capture
    /// stops with the last streaming channel of the input.
    pub fn stop_streaming(&self, input: usize, channel: ChannelId) -> Result<(), Error> {
        let input = self.registered_input(input)?;
        let mut state = lock(&input.state);
        let chn = &mut state.channels[channel.index()];
        let was_streaming = chn.streaming;
        let armed = chn.armed;
        chn.reset();
        // the buffers go back to the client, the hardware must not keep them
        disarm_slots(input, channel, armed);
        if !was_streaming {
            return Ok(());
        }

        if state.channels.iter().any(|chn| chn.streaming) {
            debug!("input {} {} stopped, capture continues", input.id, channel);
            return Ok(());
        }

        state.isp_status = IspStatus::Stop;
        info!("input {} capture stopped", input.id);
        input.isp.stop_capturing()
    }

    /// Cropping capabilities of a channel, from the sensor's control object
    /// when it can answer and [`CropCap::default`] otherwise.
    pub fn cropcap(&self, input: usize, channel: ChannelId) -> Result<CropCap, Error> {
        let input = self.input(input)?;
        debug!("cropcap input {} {}", input.id, channel);

        let Some(sd) = input.sensor.subdev() else {
            warn!("input {} subdev is NULL, using defaults", input.id);
            return Ok(CropCap::default());
        };

        match sd.cropcap() {
            Ok(cap) => Ok(cap),
            Err(err) => {
                warn!("input {} subdev cropcap failed ({}), falling back", input.id, err);
                Ok(CropCap::default())
            }
        }
    }
}

/// Disable slots `0..count` of a channel, logging failures.
fn disarm_slots(input: &Input, channel: ChannelId, count: usize) {
    for slot in 0..count {
        if let Err(err) = input.isp.disable_buffer(channel, slot) {
            warn!("input {} {} disable slot {}: {}", input.id, channel, slot, err);
        }
    }
}
