// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{
    errno,
    hw::IoLevel,
    lock,
    subdev::{Subdev, SubdevSlot},
    Error,
};
use std::{
    fmt,
    sync::{Arc, Mutex},
};

/// Keys accepted by [`SensorOps::get_parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorParam {
    ScanMethod,
    IoLevel,
    MipiLanes,
    MipiMhz,
    Interface,
    AeFastDefault,
    BusType,
}

/// Words of the AE fast-start hint handed from the sensor driver to the ISP.
pub const AE_FAST_WORDS: usize = akisp_sys::AK_ISP_AE_FAST_WORDS;

/// Exposure starting point the sensor driver recommends to the ISP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AeFastDefault {
    pub words: [i32; AE_FAST_WORDS],
}

/// Answer to a [`SensorOps::get_parameter`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Int(i32),
    AeFast(AeFastDefault),
}

/// Physical sensor interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusInterface {
    Dvp,
    Mipi,
}

impl BusInterface {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(BusInterface::Dvp),
            1 => Some(BusInterface::Mipi),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            BusInterface::Dvp => 0,
            BusInterface::Mipi => 1,
        }
    }
}

/// Pixel data carried on the sensor bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusType {
    Raw,
    Yuv,
}

impl BusType {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(BusType::Raw),
            1 => Some(BusType::Yuv),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            BusType::Raw => 0,
            BusType::Yuv => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanMethod {
    #[default]
    Progressive,
    Interlaced,
}

impl ScanMethod {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ScanMethod::Progressive),
            1 => Some(ScanMethod::Interlaced),
            _ => None,
        }
    }
}

impl IoLevel {
    /// Decode the sensor driver's IO level code.
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(IoLevel::V1_8),
            1 => Some(IoLevel::V2_5),
            2 => Some(IoLevel::V3_3),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            IoLevel::V1_8 => 0,
            IoLevel::V2_5 => 1,
            IoLevel::V3_3 => 2,
        }
    }
}

/// One register write of the sensor's init table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReg {
    pub addr: u16,
    pub value: u16,
}

/// Register table handed to [`SensorOps::init`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorInitPara {
    pub regs: Vec<SensorReg>,
}

/// Capability table supplied by a sensor driver.
///
/// Status codes are the driver's own negative values. The optional
/// operations default to `-ENOTTY`.
pub trait SensorOps: Send + Sync {
    fn get_parameter(&self, param: SensorParam) -> Result<ParamValue, i32>;

    /// Native master clock in MHz, or a non-positive value when the driver
    /// does not know it yet.
    fn get_mclk(&self) -> i32;

    /// Raw bus type code, see [`BusType::from_raw`].
    fn get_bus_type(&self) -> i32;

    /// First valid pixel as `(left, top)`.
    fn get_valid_coordinate(&self) -> Result<(i32, i32), i32> {
        Err(-errno::ENOTTY)
    }

    fn read_reg(&self, _reg: i32) -> Result<i32, i32> {
        Err(-errno::ENOTTY)
    }

    fn write_reg(&self, _reg: i32, _value: i32) -> Result<(), i32> {
        Err(-errno::ENOTTY)
    }

    fn read_id(&self) -> Result<i32, i32> {
        Err(-errno::ENOTTY)
    }

    /// Native resolution as `(width, height)`.
    fn get_resolution(&self) -> Result<(i32, i32), i32> {
        Err(-errno::ENOTTY)
    }

    fn set_power_on(&self) -> Result<(), i32>;

    fn init(&self, para: &SensorInitPara) -> Result<(), i32>;
}

/// Sensor binding of one input: the driver's capability table, its init
/// parameters and the control object used for `s_ctrl`/`g_ctrl`.
pub struct Sensor {
    ops: Arc<dyn SensorOps>,
    para: SensorInitPara,
    subdev: Mutex<Option<SubdevSlot>>,
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("para", &self.para)
            .field("subdev", &*lock(&self.subdev))
            .finish()
    }
}

impl Sensor {
    pub fn new(
        ops: Arc<dyn SensorOps>,
        para: SensorInitPara,
        subdev: Option<Arc<dyn Subdev>>,
    ) -> Self {
        Sensor {
            ops,
            para,
            subdev: Mutex::new(subdev.map(SubdevSlot::External)),
        }
    }

    pub fn ops(&self) -> &dyn SensorOps {
        self.ops.as_ref()
    }

    pub fn para(&self) -> &SensorInitPara {
        &self.para
    }

    /// Integer parameter query.
    pub fn query(&self, param: SensorParam) -> Result<i32, Error> {
        match self.ops.get_parameter(param) {
            Ok(ParamValue::Int(value)) => Ok(value),
            Ok(ParamValue::AeFast(_)) => Err(Error::SensorQuery {
                param,
                code: -errno::EINVAL,
            }),
            Err(code) => Err(Error::SensorQuery { param, code }),
        }
    }

    pub fn ae_fast_default(&self) -> Result<AeFastDefault, Error> {
        let param = SensorParam::AeFastDefault;
        match self.ops.get_parameter(param) {
            Ok(ParamValue::AeFast(ae)) => Ok(ae),
            Ok(ParamValue::Int(_)) => Err(Error::SensorQuery {
                param,
                code: -errno::EINVAL,
            }),
            Err(code) => Err(Error::SensorQuery { param, code }),
        }
    }

    pub fn power_on(&self) -> Result<(), Error> {
        self.ops.set_power_on().map_err(|code| Error::Sensor {
            op: "set_power_on",
            code,
        })
    }

    /// Program the sensor registers from the init table.
    pub fn init_regs(&self) -> Result<(), Error> {
        self.ops
            .init(&self.para)
            .map_err(|code| Error::Sensor { op: "init", code })
    }

    pub fn read_id(&self) -> Result<i32, Error> {
        self.ops
            .read_id()
            .map_err(|code| Error::Sensor { op: "read_id", code })
    }

    /// Control object bound to this sensor, if any.
    pub fn subdev(&self) -> Option<Arc<dyn Subdev>> {
        lock(&self.subdev).as_ref().map(SubdevSlot::subdev)
    }

    /// Whether the bound control object is the local fallback.
    pub fn has_fallback_subdev(&self) -> bool {
        matches!(*lock(&self.subdev), Some(SubdevSlot::Fallback(_)))
    }

    pub(crate) fn subdev_slot(&self) -> &Mutex<Option<SubdevSlot>> {
        &self.subdev
    }
}
