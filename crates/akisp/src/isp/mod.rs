// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! ISP core capability interface
//!
//! [`IspCore`] is the surface the video-input glue needs from the vendor ISP
//! core. Every method defaults to [`Error::NotImplemented`], so an adapter
//! only overrides what its backend actually provides.

mod stats;
pub(crate) mod vendor;

pub use stats::{
    AeAttr, AeRunInfo, AfStat, AwbStat, FrameRateAttr, MeAttr, Nr3dStat, UvnrAttr,
    AF_STAT_WINDOWS, MD_COLS, MD_ROWS,
};
pub use vendor::{IspHandle, VendorIsp};

use crate::{device::ChannelId, sensor::AeFastDefault, subdev::Rect, Error};
use std::fmt;

/// Buffer address slots the ISP rotates through per channel.
pub const ISP_BUFFER_SLOTS: usize = 4;

/// Working mode applied before capture starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IspMode {
    /// RAW sensor, dual-sensor board.
    RgbOut,
    /// RAW sensor, single sensor.
    #[default]
    RgbVideoOut,
    /// YUV sensor, dual-sensor board.
    YuvOut,
    /// YUV sensor, single sensor.
    YuvVideoOut,
}

impl IspMode {
    pub const fn to_raw(self) -> i32 {
        match self {
            IspMode::RgbOut => 0,
            IspMode::RgbVideoOut => 1,
            IspMode::YuvOut => 2,
            IspMode::YuvVideoOut => 3,
        }
    }
}

impl fmt::Display for IspMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IspMode::RgbOut => write!(f, "rgb_out"),
            IspMode::RgbVideoOut => write!(f, "rgb_video_out"),
            IspMode::YuvOut => write!(f, "yuv_out"),
            IspMode::YuvVideoOut => write!(f, "yuv_video_out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Yuv420SemiPlanar,
}

impl OutputFormat {
    pub const fn to_raw(self) -> i32 {
        match self {
            OutputFormat::Yuv420SemiPlanar => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IspStatus {
    #[default]
    Stop,
    Running,
}

/// Pixel clock sampling edge reported by the ISP configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PclkPolarity {
    Rising,
    Falling,
}

impl PclkPolarity {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(PclkPolarity::Rising),
            1 => Some(PclkPolarity::Falling),
            _ => None,
        }
    }
}

/// Line timing a sensor driver reports through the timing callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IspTiming {
    pub oneline: i32,
    pub fsden: i32,
    pub hblank: i32,
    pub fsdnum: i32,
}

/// Vendor ISP core operations used by the video-input glue.
pub trait IspCore: Send + Sync {
    /// Whether a core instance is attached to this input.
    fn is_attached(&self) -> bool {
        false
    }

    /// DVP data width from the loaded ISP configuration.
    fn bits_width(&self) -> Result<i32, Error> {
        Err(Error::NotImplemented("ak_isp_get_bits_width_compat"))
    }

    /// Raw pixel clock polarity code, see [`PclkPolarity::from_raw`].
    fn pclk_polarity(&self) -> Result<i32, Error> {
        Err(Error::NotImplemented("ak_isp_get_pclk_polar_compat"))
    }

    fn apply_mode(&self, _mode: IspMode) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vi_apply_mode_compat"))
    }

    fn set_crop(&self, _rect: Rect) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vi_set_crop_compat"))
    }

    fn crop(&self) -> Result<Rect, Error> {
        Err(Error::NotImplemented("ak_isp_vi_get_crop"))
    }

    fn set_misc_attr(&self, _timing: &IspTiming) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_set_misc_attr_ex"))
    }

    fn set_ae_fast_default(&self, _ae: &AeFastDefault) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_set_ae_fast_struct_default"))
    }

    /// Bind `addr` to buffer `slot` of `channel`. Each channel has its own
    /// slot table.
    fn set_buffer_addr(&self, _channel: ChannelId, _slot: usize, _addr: u64) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vo_set_main_buffer_addr"))
    }

    /// Arm buffer `slot` of `channel` for the hardware to write.
    fn enable_buffer(&self, _channel: ChannelId, _slot: usize) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vo_enable_buffer_main"))
    }

    fn disable_buffer(&self, _channel: ChannelId, _slot: usize) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vo_disable_buffer_main"))
    }

    fn start_capturing(&self, _format: OutputFormat) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vi_start_capturing_compat"))
    }

    fn stop_capturing(&self) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vi_stop_capturing_compat"))
    }

    /// Bitmask of slots the hardware has finished writing.
    fn check_irq_status(&self) -> Result<i32, Error> {
        Err(Error::NotImplemented("ak_isp_vo_check_irq_status_compat"))
    }

    fn clear_irq_status(&self, _bit: i32) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vo_clear_irq_status_compat"))
    }

    fn version(&self) -> Result<String, Error> {
        Err(Error::NotImplemented("ak_isp_get_version"))
    }

    fn ae_run_info(&self) -> Result<AeRunInfo, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_ae_run_info"))
    }

    fn frame_rate(&self) -> Result<FrameRateAttr, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_frame_rate"))
    }

    fn af_stat(&self) -> Result<AfStat, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_af_stat_info"))
    }

    fn awb_stat(&self) -> Result<AwbStat, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_awb_stat_info"))
    }

    fn nr3d_stat(&self) -> Result<Nr3dStat, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_3d_nr_stat_info"))
    }

    fn ae_attr(&self) -> Result<AeAttr, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_ae_attr"))
    }

    fn set_me_attr(&self, _attr: &MeAttr) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vp_set_me_attr"))
    }

    fn me_attr(&self) -> Result<MeAttr, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_me_attr"))
    }

    fn set_uvnr_attr(&self, _attr: &UvnrAttr) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_vp_set_uvnr_attr"))
    }

    fn uvnr_attr(&self) -> Result<UvnrAttr, Error> {
        Err(Error::NotImplemented("ak_isp_vp_get_uvnr_attr"))
    }

    fn set_ae_work_suspend(&self, _suspend: i32) -> Result<(), Error> {
        Err(Error::NotImplemented("ak_isp_set_ae_work_suspend"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl IspCore for Bare {}

    #[test]
    fn test_defaults_are_not_implemented() {
        let isp = Bare;
        assert!(!isp.is_attached());
        assert!(matches!(
            isp.bits_width(),
            Err(Error::NotImplemented("ak_isp_get_bits_width_compat"))
        ));
        assert!(matches!(
            isp.set_buffer_addr(ChannelId::Third, 0, 0x1000),
            Err(Error::NotImplemented(_))
        ));
        assert!(isp.disable_buffer(ChannelId::Sub, 1).is_err());
        assert!(isp.stop_capturing().is_err());
    }

    #[test]
    fn test_polarity_codes() {
        assert_eq!(PclkPolarity::from_raw(0), Some(PclkPolarity::Rising));
        assert_eq!(PclkPolarity::from_raw(1), Some(PclkPolarity::Falling));
        assert_eq!(PclkPolarity::from_raw(2), None);
    }
}
