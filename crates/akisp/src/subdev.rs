// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{isp::IspTiming, lock, sensor::Sensor, Error};
use log::{debug, info};
use std::{fmt, sync::Arc};

/// Control id of the timing callback installed through `s_ctrl`.
pub const SET_ISP_MISC_CALLBACK: u32 = 0x0800_0001;

/// Callback a sensor driver invokes when its line timing changes.
pub type TimingCallback = Arc<dyn Fn(&IspTiming) -> Result<(), Error> + Send + Sync>;

/// Argument of [`Subdev::s_ctrl`].
#[derive(Clone)]
pub enum Control {
    Value { id: u32, value: i32 },
    IspTimingCallback(TimingCallback),
}

impl Control {
    pub fn id(&self) -> u32 {
        match self {
            Control::Value { id, .. } => *id,
            Control::IspTimingCallback(_) => SET_ISP_MISC_CALLBACK,
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Control::Value { id, value } => f
                .debug_struct("Value")
                .field("id", id)
                .field("value", value)
                .finish(),
            Control::IspTimingCallback(_) => f.write_str("IspTimingCallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.left, self.top, self.width, self.height
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufType {
    #[default]
    VideoCapture,
}

/// Cropping capabilities of a capture channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropCap {
    pub bounds: Rect,
    pub defrect: Rect,
    pub buf_type: BufType,
}

impl CropCap {
    pub const fn new(bounds: Rect) -> Self {
        CropCap {
            bounds,
            defrect: bounds,
            buf_type: BufType::VideoCapture,
        }
    }
}

impl Default for CropCap {
    /// Full HD at the origin, used when the sensor cannot describe itself.
    fn default() -> Self {
        CropCap::new(Rect::new(0, 0, 1920, 1080))
    }
}

/// Control surface of a sensor.
pub trait Subdev: Send + Sync {
    fn g_ctrl(&self, id: u32) -> Result<i32, Error>;

    fn s_ctrl(&self, ctrl: Control) -> Result<(), Error>;

    fn cropcap(&self) -> Result<CropCap, Error> {
        Err(Error::NotSupported("cropcap"))
    }
}

/// Control object bound when the sensor driver supplies none.
#[derive(Debug, Default)]
pub struct DummySubdev;

impl Subdev for DummySubdev {
    fn g_ctrl(&self, _id: u32) -> Result<i32, Error> {
        Err(Error::NotSupported("g_ctrl"))
    }

    fn s_ctrl(&self, ctrl: Control) -> Result<(), Error> {
        debug!("dummy subdev ignores ctrl {:#x}", ctrl.id());
        Ok(())
    }
}

/// Who owns the control object bound to a sensor.
#[derive(Clone)]
pub enum SubdevSlot {
    /// Supplied by the sensor driver, never released here.
    External(Arc<dyn Subdev>),
    /// Created by [`ensure_subdev`] and released on unregister.
    Fallback(Arc<DummySubdev>),
}

impl SubdevSlot {
    pub fn subdev(&self) -> Arc<dyn Subdev> {
        match self {
            SubdevSlot::External(sd) => sd.clone(),
            SubdevSlot::Fallback(sd) => sd.clone(),
        }
    }
}

impl fmt::Debug for SubdevSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubdevSlot::External(_) => f.write_str("External"),
            SubdevSlot::Fallback(_) => f.write_str("Fallback"),
        }
    }
}

/// Bind a [`DummySubdev`] to `sensor` unless it already has a control
/// object.
pub fn ensure_subdev(sensor: &Sensor) -> Result<(), Error> {
    let mut slot = lock(sensor.subdev_slot());
    if slot.is_none() {
        info!("sensor has no subdev, binding dummy");
        *slot = Some(SubdevSlot::Fallback(Arc::new(DummySubdev)));
    }
    Ok(())
}

/// Drop the control object of `sensor` if [`ensure_subdev`] created it.
/// Returns whether anything was released.
pub fn release_fallback(sensor: &Sensor) -> bool {
    let mut slot = lock(sensor.subdev_slot());
    if matches!(*slot, Some(SubdevSlot::Fallback(_))) {
        *slot = None;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sensor::SensorInitPara,
        sim::{EventLog, SimSensor, SimSensorConfig, SimSubdev},
    };

    fn sensor(subdev: Option<Arc<dyn Subdev>>) -> Sensor {
        Sensor::new(
            Arc::new(SimSensor::new(0, SimSensorConfig::dvp(), EventLog::default())),
            SensorInitPara::default(),
            subdev,
        )
    }

    #[test]
    fn test_dummy_controls() {
        let sd = DummySubdev;
        assert!(matches!(sd.g_ctrl(1), Err(Error::NotSupported(_))));
        assert!(sd.s_ctrl(Control::Value { id: 1, value: 2 }).is_ok());
        assert!(sd.cropcap().is_err());
    }

    #[test]
    fn test_ensure_and_release_fallback() {
        let sensor = sensor(None);
        ensure_subdev(&sensor).unwrap();
        assert!(sensor.has_fallback_subdev());
        let first = sensor.subdev().unwrap();

        // a second call keeps the bound object
        ensure_subdev(&sensor).unwrap();
        assert!(Arc::ptr_eq(&first, &sensor.subdev().unwrap()));

        assert!(release_fallback(&sensor));
        assert!(sensor.subdev().is_none());
        assert!(!release_fallback(&sensor));
    }

    #[test]
    fn test_external_subdev_is_kept() {
        let external: Arc<dyn Subdev> = Arc::new(SimSubdev::new(0, EventLog::default()));
        let sensor = sensor(Some(external.clone()));

        ensure_subdev(&sensor).unwrap();
        assert!(!sensor.has_fallback_subdev());
        assert!(!release_fallback(&sensor));
        assert!(Arc::ptr_eq(&external, &sensor.subdev().unwrap()));
    }

    #[test]
    fn test_default_cropcap() {
        let cap = CropCap::default();
        assert_eq!(cap.bounds, Rect::new(0, 0, 1920, 1080));
        assert_eq!(cap.defrect, cap.bounds);
        assert_eq!(cap.buf_type, BufType::VideoCapture);
    }
}
