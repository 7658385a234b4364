// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Anyka ISP video-input glue for Rust
//!
//! This crate drives the video-input side of the Anyka ISP: it brings up the
//! sensor interface (DVP or MIPI), arbitrates the pin groups and clocks that
//! two sensor inputs share, sequences sensor register programming for
//! dual-sensor boards, and binds capture buffers to ISP channel slots.
//!
//! The closed-source ISP core is reached through [`isp::IspCore`]. The
//! production implementation, [`isp::VendorIsp`], forwards to
//! `libakisp.so` at runtime and reports [`Error::NotImplemented`] for every
//! entry point the installed SDK does not export.
//!
//! # Quick Start
//!
//! ```
//! use akisp::sim::{SimBoard, SimSensorConfig};
//! use akisp::ChannelId;
//!
//! let (device, log) = SimBoard::new()
//!     .with_input(SimSensorConfig::mipi(2, 24))
//!     .build()?;
//!
//! device.register_input(0)?;
//! device.open(0, ChannelId::Main)?;
//! let setup = device.queue_setup(0, ChannelId::Main, 4)?;
//! for index in 0..setup.count {
//!     device.buffer_init(0, ChannelId::Main, index, 0x8000_0000 + (index as u64) * 0x40_0000)?;
//! }
//! assert!(device.is_route_initialized(0)?);
//! assert!(!log.snapshot().is_empty());
//! # Ok::<(), akisp::Error>(())
//! ```
//!
//! # Bring-up order
//!
//! Nothing touches the sensor interface until the last buffer of a channel
//! is initialised. That call runs, once per input and streaming session:
//!
//! 1. interface selection and pin/clock setup ([`Device`] bring-up),
//! 2. the ISP timing callback and AE fast defaults,
//! 3. sensor register programming (deferred until every input is open on
//!    dual-sensor boards),
//! 4. the scan-method query.

use std::{
    error, fmt, io, str,
    sync::{Mutex, MutexGuard, PoisonError},
};

use akisp_sys as ffi;

/// Kernel status codes used by [`Error::errno`].
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EBUSY: i32 = 16;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;
    pub const ENOSYS: i32 = 38;
}

/// Error type for ISP glue operations
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The vendor ISP core (libakisp.so) could not be loaded at runtime
    LibraryNotLoaded(ffi::libloading::Error),

    /// The vendor ISP core does not provide this entry point
    NotImplemented(&'static str),

    /// A vendor ISP call returned a negative status
    Isp { call: &'static str, code: i32 },

    /// The vendor adapter has no per-input core handle for this call
    IspDetached(&'static str),

    /// The pin controller has no state with this name on this board
    PinStateNotFound(PinState),

    /// The pin controller rejected the transition to this state
    PinSelectFailed { state: PinState, code: i32 },

    /// The clock source was never registered with the device
    ClockUnavailable(ClockId),

    /// A clock framework call failed
    Clock { clock: ClockId, code: i32 },

    /// A camera controller register call failed
    Platform { call: &'static str, code: i32 },

    /// MIPI lane count outside 0..=2
    UnsupportedLanes(i32),

    /// Pixel clock polarity reported by the ISP is neither rising nor falling
    UnknownPolarity(i32),

    /// The sensor driver failed a capability query
    SensorQuery { param: SensorParam, code: i32 },

    /// The sensor driver failed an operation
    Sensor { op: &'static str, code: i32 },

    /// The capability object does not implement this operation
    NotSupported(&'static str),

    /// A fallback capability object could not be created
    OutOfMemory,

    /// No input with this id exists on the device
    InvalidInput(usize),

    /// Buffer index outside the channel's slot table
    InvalidBufferIndex { index: usize, capacity: usize },

    /// The input has not been registered yet
    InputNotRegistered(usize),

    /// A device is built from one or two inputs
    InvalidInputCount(usize),

    /// The channel has not finished buffer initialisation
    ChannelNotReady { input: usize, channel: ChannelId },

    /// The channel is streaming and cannot be reconfigured
    ChannelBusy { input: usize, channel: ChannelId },

    /// A parameter command was given the wrong kind of argument
    InvalidParam(&'static str),

    /// I/O error from underlying system calls
    Io(io::Error),

    /// UTF-8 conversion error when converting C strings to Rust strings
    Utf8(str::Utf8Error),
}

/// Error classes used by callers to decide between retry, fallback and abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unsupported pin name, lane count or polarity. The bring-up attempt is
    /// aborted and may be retried on the next buffer-init trigger.
    Configuration,
    /// Clock, pin-control or register call failure.
    ResourceUnavailable,
    /// The vendor entry point is absent.
    NotImplemented,
    /// A fallback object could not be created.
    Allocation,
    /// The caller addressed something that does not exist.
    InvalidArgument,
    /// System I/O or string conversion.
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PinStateNotFound(_)
            | Error::UnsupportedLanes(_)
            | Error::UnknownPolarity(_)
            | Error::SensorQuery { .. } => ErrorKind::Configuration,
            Error::PinSelectFailed { .. }
            | Error::ClockUnavailable(_)
            | Error::Clock { .. }
            | Error::Platform { .. }
            | Error::Sensor { .. }
            | Error::Isp { .. }
            | Error::IspDetached(_) => ErrorKind::ResourceUnavailable,
            Error::LibraryNotLoaded(_) | Error::NotImplemented(_) | Error::NotSupported(_) => {
                ErrorKind::NotImplemented
            }
            Error::OutOfMemory => ErrorKind::Allocation,
            Error::InvalidInput(_)
            | Error::InvalidBufferIndex { .. }
            | Error::InputNotRegistered(_)
            | Error::InvalidInputCount(_)
            | Error::ChannelNotReady { .. }
            | Error::ChannelBusy { .. }
            | Error::InvalidParam(_) => ErrorKind::InvalidArgument,
            Error::Io(_) | Error::Utf8(_) => ErrorKind::Io,
        }
    }

    /// Negative kernel status equivalent to this error.
    pub fn errno(&self) -> i32 {
        match self {
            Error::Isp { code, .. }
            | Error::Clock { code, .. }
            | Error::Platform { code, .. }
            | Error::Sensor { code, .. }
                if *code < 0 =>
            {
                *code
            }
            Error::LibraryNotLoaded(_) | Error::NotImplemented(_) => -errno::ENOSYS,
            Error::NotSupported(_) => -errno::ENOTTY,
            Error::OutOfMemory => -errno::ENOMEM,
            Error::ClockUnavailable(_) | Error::Clock { .. } | Error::IspDetached(_) => {
                -errno::ENODEV
            }
            Error::ChannelBusy { .. } => -errno::EBUSY,
            Error::InvalidParam(_) => -errno::EFAULT,
            Error::Io(err) => err.raw_os_error().map(|e| -e).unwrap_or(-errno::EIO),
            Error::Isp { .. } | Error::Platform { .. } | Error::Sensor { .. } => -errno::EIO,
            _ => -errno::EINVAL,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LibraryNotLoaded(err) => {
                write!(f, "ISP core library could not be loaded: {}", err)
            }
            Error::NotImplemented(call) => write!(f, "ISP core does not implement {}", call),
            Error::Isp { call, code } => write!(f, "{} failed: {}", call, code),
            Error::IspDetached(call) => write!(f, "{} needs an attached ISP core", call),
            Error::PinStateNotFound(state) => {
                write!(f, "pinctrl state {} not found", state.name())
            }
            Error::PinSelectFailed { state, code } => {
                write!(f, "pinctrl select {} failed: {}", state.name(), code)
            }
            Error::ClockUnavailable(clock) => write!(f, "clock {} not registered", clock),
            Error::Clock { clock, code } => write!(f, "clock {} failed: {}", clock, code),
            Error::Platform { call, code } => write!(f, "{} failed: {}", call, code),
            Error::UnsupportedLanes(lanes) => write!(f, "mipi lanes {} not supported", lanes),
            Error::UnknownPolarity(polar) => write!(f, "pclk polarity {} unknown", polar),
            Error::SensorQuery { param, code } => {
                write!(f, "sensor query {:?} failed: {}", param, code)
            }
            Error::Sensor { op, code } => write!(f, "sensor {} failed: {}", op, code),
            Error::NotSupported(op) => write!(f, "{} not supported", op),
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::InvalidInput(input) => write!(f, "no input {}", input),
            Error::InvalidBufferIndex { index, capacity } => {
                write!(f, "buffer index {} outside {} slots", index, capacity)
            }
            Error::InputNotRegistered(input) => write!(f, "input {} not registered", input),
            Error::InvalidInputCount(count) => {
                write!(f, "{} inputs requested, expected 1 or 2", count)
            }
            Error::ChannelNotReady { input, channel } => {
                write!(f, "input {} channel {} buffers not initialised", input, channel)
            }
            Error::ChannelBusy { input, channel } => {
                write!(f, "input {} channel {} is streaming", input, channel)
            }
            Error::InvalidParam(cmd) => write!(f, "bad argument for {}", cmd),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Utf8(err) => write!(f, "UTF-8 conversion error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LibraryNotLoaded(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ffi::libloading::Error> for Error {
    fn from(err: ffi::libloading::Error) -> Self {
        Error::LibraryNotLoaded(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<str::Utf8Error> for Error {
    fn from(err: str::Utf8Error) -> Self {
        Error::Utf8(err)
    }
}

/// Call an optional vendor entry point.
///
/// Evaluates to `Ok(return value)` when the library is loaded and exports the
/// symbol, and to `Err(Error::NotImplemented(name))` otherwise.
#[macro_export]
macro_rules! isp_call {
    ($lib:expr, $fn_name:ident($($args:expr),*)) => {
        {
            #[allow(clippy::macro_metavars_in_unsafe)]
            let result = match $lib {
                Some(lib) => match &lib.$fn_name {
                    Ok(func) => Ok(unsafe { (*func)($($args),*) }),
                    Err(_) => Err($crate::Error::NotImplemented(stringify!($fn_name))),
                },
                None => Err($crate::Error::NotImplemented(stringify!($fn_name))),
            };
            result
        }
    };
}

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Every mutex in this crate guards flags and address tables that stay
/// consistent across a panic, so poisoning carries no information.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The fourcc module provides portable handling of fourcc codes.
pub mod fourcc;

/// The format module describes negotiated channel pixel formats.
pub mod format;

/// The hw module owns the pin-control, clock and camera-controller resources.
pub mod hw;

/// The sensor module wraps the sensor driver's capability table.
pub mod sensor;

/// The subdev module provides capability objects and their fallback.
pub mod subdev;

/// The isp module defines the ISP core capability interface.
pub mod isp;

/// The gate module provides the once-only gates shared by both inputs.
pub mod gate;

/// The device module holds inputs, channels and the buffer state machine.
pub mod device;

mod dual;
mod interface;

/// The param module implements the parameter device commands.
pub mod param;

/// The diagnostics module renders ISP statistics as text.
pub mod diagnostics;

/// The sim module provides an in-memory board for tests and bring-up.
pub mod sim;

pub use device::{
    Channel, ChannelId, ChannelState, Device, DeviceConfig, InputDesc, QueueSetup,
    CHN_NUM_PER_INPUT, MAX_BUFFERS_PER_CHANNEL, MAX_INPUTS,
};
pub use hw::{ClockId, Hardware, PinState};
pub use sensor::SensorParam;

/// Get the vendor ISP core version string
///
/// Returns an error if the library is not loaded or does not export
/// `ak_isp_get_version`.
pub fn version() -> Result<String, Error> {
    use isp::IspCore;
    isp::VendorIsp::load()?.version()
}
