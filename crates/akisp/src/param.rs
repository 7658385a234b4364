// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Private parameter commands of a video node
//!
//! User space tunes the ISP through a small set of numbered commands beyond
//! the standard video controls. [`Device::param_ioctl`] dispatches them to
//! the ISP or the sensor of one input.

use crate::{
    device::Device,
    errno,
    isp::{MeAttr, UvnrAttr},
    Error,
};
use log::{debug, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamCommand {
    SetMeAttr,
    GetMeAttr,
    SetUvnrAttr,
    GetUvnrAttr,
    ProbeSensorId,
    SetAeSuspend,
}

impl ParamCommand {
    pub const ALL: [ParamCommand; 6] = [
        ParamCommand::SetMeAttr,
        ParamCommand::GetMeAttr,
        ParamCommand::SetUvnrAttr,
        ParamCommand::GetUvnrAttr,
        ParamCommand::ProbeSensorId,
        ParamCommand::SetAeSuspend,
    ];

    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x2000 => Some(ParamCommand::SetMeAttr),
            0x2001 => Some(ParamCommand::GetMeAttr),
            0x2002 => Some(ParamCommand::SetUvnrAttr),
            0x2003 => Some(ParamCommand::GetUvnrAttr),
            0x2004 => Some(ParamCommand::ProbeSensorId),
            0x2005 => Some(ParamCommand::SetAeSuspend),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> u32 {
        match self {
            ParamCommand::SetMeAttr => 0x2000,
            ParamCommand::GetMeAttr => 0x2001,
            ParamCommand::SetUvnrAttr => 0x2002,
            ParamCommand::GetUvnrAttr => 0x2003,
            ParamCommand::ProbeSensorId => 0x2004,
            ParamCommand::SetAeSuspend => 0x2005,
        }
    }
}

impl fmt::Display for ParamCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamCommand::SetMeAttr => "set_me_attr",
            ParamCommand::GetMeAttr => "get_me_attr",
            ParamCommand::SetUvnrAttr => "set_uvnr_attr",
            ParamCommand::GetUvnrAttr => "get_uvnr_attr",
            ParamCommand::ProbeSensorId => "probe_sensor_id",
            ParamCommand::SetAeSuspend => "set_ae_suspend",
        };
        f.write_str(name)
    }
}

/// Argument passed with a parameter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamArg {
    None,
    Me(MeAttr),
    Uvnr(UvnrAttr),
    Value(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamReply {
    Done,
    Me(MeAttr),
    Uvnr(UvnrAttr),
    SensorId(i32),
}

impl Device {
    /// Run the raw parameter command `cmd` on `input`.
    ///
    /// Unknown command numbers fail with [`Error::NotSupported`]. An
    /// argument of the wrong shape fails with [`Error::InvalidParam`]
    /// before anything reaches the hardware.
    pub fn param_ioctl(&self, input: usize, cmd: u32, arg: ParamArg) -> Result<ParamReply, Error> {
        let Some(command) = ParamCommand::from_raw(cmd) else {
            warn!("input {} unknown param command {:#x}", input, cmd);
            return Err(Error::NotSupported("param command"));
        };
        self.param_command(input, command, arg)
    }

    pub fn param_command(
        &self,
        input: usize,
        command: ParamCommand,
        arg: ParamArg,
    ) -> Result<ParamReply, Error> {
        let input = self.input(input)?;
        debug!("input {} param {}", input.id, command);

        match (command, arg) {
            (ParamCommand::SetMeAttr, ParamArg::Me(attr)) => {
                input.isp.set_me_attr(&attr)?;
                Ok(ParamReply::Done)
            }
            (ParamCommand::GetMeAttr, _) => input.isp.me_attr().map(ParamReply::Me),
            (ParamCommand::SetUvnrAttr, ParamArg::Uvnr(attr)) => {
                input.isp.set_uvnr_attr(&attr)?;
                Ok(ParamReply::Done)
            }
            (ParamCommand::GetUvnrAttr, _) => input.isp.uvnr_attr().map(ParamReply::Uvnr),
            (ParamCommand::ProbeSensorId, _) => match input.sensor.read_id() {
                Ok(id) => Ok(ParamReply::SensorId(id)),
                Err(err) => {
                    warn!("input {} sensor id read: {}", input.id, err);
                    Err(Error::Sensor {
                        op: "read_id",
                        code: -errno::ENODEV,
                    })
                }
            },
            (ParamCommand::SetAeSuspend, ParamArg::Value(suspend)) => {
                input.isp.set_ae_work_suspend(suspend)?;
                Ok(ParamReply::Done)
            }
            (ParamCommand::SetMeAttr, _) => Err(Error::InvalidParam("me attribute")),
            (ParamCommand::SetUvnrAttr, _) => Err(Error::InvalidParam("uvnr attribute")),
            (ParamCommand::SetAeSuspend, _) => Err(Error::InvalidParam("ae suspend value")),
        }
    }
}
