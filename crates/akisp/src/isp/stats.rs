// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use akisp_sys as ffi;

pub const AF_STAT_WINDOWS: usize = ffi::AK_ISP_AF_STAT_WINDOWS;
pub const MD_ROWS: usize = ffi::AK_ISP_MD_ROWS;
pub const MD_COLS: usize = ffi::AK_ISP_MD_COLS;

/// Live auto-exposure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AeRunInfo {
    pub current_calc_avg_lumi: u32,
    pub current_calc_avg_compensation_lumi: u32,
    pub current_a_gain: u32,
    pub current_d_gain: u32,
    pub current_isp_d_gain: u32,
    pub current_exp_time: u32,
    pub current_exp_time_step: u32,
}

impl From<ffi::AK_ISP_AE_RUN_INFO> for AeRunInfo {
    fn from(raw: ffi::AK_ISP_AE_RUN_INFO) -> Self {
        AeRunInfo {
            current_calc_avg_lumi: raw.current_calc_avg_lumi,
            current_calc_avg_compensation_lumi: raw.current_calc_avg_compensation_lumi,
            current_a_gain: raw.current_a_gain,
            current_d_gain: raw.current_d_gain,
            current_isp_d_gain: raw.current_isp_d_gain,
            current_exp_time: raw.current_exp_time,
            current_exp_time_step: raw.current_exp_time_step,
        }
    }
}

/// Frame rate policy for bright and dark scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameRateAttr {
    pub high_light_frame_rate: u32,
    pub high_light_max_exp_time: u32,
    pub low_light_frame_rate: u32,
    pub low_light_max_exp_time: u32,
    pub low_light_to_high_light_gain: u32,
}

impl From<ffi::AK_ISP_FRAME_RATE_ATTR> for FrameRateAttr {
    fn from(raw: ffi::AK_ISP_FRAME_RATE_ATTR) -> Self {
        FrameRateAttr {
            high_light_frame_rate: raw.hight_light_frame_rate,
            high_light_max_exp_time: raw.hight_light_max_exp_time,
            low_light_frame_rate: raw.low_light_frame_rate,
            low_light_max_exp_time: raw.low_light_max_exp_time,
            low_light_to_high_light_gain: raw.low_light_to_hight_light_gain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AfStat {
    pub af_statics: [u32; AF_STAT_WINDOWS],
}

impl From<ffi::AK_ISP_AF_STAT_INFO> for AfStat {
    fn from(raw: ffi::AK_ISP_AF_STAT_INFO) -> Self {
        AfStat {
            af_statics: raw.af_statics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AwbStat {
    pub r_gain: u16,
    pub g_gain: u16,
    pub b_gain: u16,
    pub r_offset: u16,
    pub g_offset: u16,
    pub b_offset: u16,
    pub current_colortemp_index: u16,
}

impl From<ffi::AK_ISP_AWB_STAT_INFO> for AwbStat {
    fn from(raw: ffi::AK_ISP_AWB_STAT_INFO) -> Self {
        AwbStat {
            r_gain: raw.r_gain,
            g_gain: raw.g_gain,
            b_gain: raw.b_gain,
            r_offset: raw.r_offset,
            g_offset: raw.g_offset,
            b_offset: raw.b_offset,
            current_colortemp_index: raw.current_colortemp_index,
        }
    }
}

/// 3D noise reduction motion statistics, one cell per 32x24 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nr3dStat {
    pub md_level: u16,
    pub md_stat: [[u16; MD_COLS]; MD_ROWS],
}

impl Default for Nr3dStat {
    fn default() -> Self {
        Nr3dStat {
            md_level: 0,
            md_stat: [[0; MD_COLS]; MD_ROWS],
        }
    }
}

impl From<ffi::AK_ISP_3D_NR_STAT_INFO> for Nr3dStat {
    fn from(raw: ffi::AK_ISP_3D_NR_STAT_INFO) -> Self {
        Nr3dStat {
            md_level: raw.MD_level,
            md_stat: raw.MD_stat,
        }
    }
}

/// Auto-exposure limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AeAttr {
    pub exp_time_max: u32,
    pub exp_time_min: u32,
    pub d_gain_max: u32,
    pub d_gain_min: u32,
    pub isp_d_gain_max: u32,
    pub isp_d_gain_min: u32,
    pub a_gain_max: u32,
    pub a_gain_min: u32,
    pub exp_step: u32,
    pub exp_stable_range: u32,
}

impl From<ffi::AK_ISP_AE_ATTR> for AeAttr {
    fn from(raw: ffi::AK_ISP_AE_ATTR) -> Self {
        AeAttr {
            exp_time_max: raw.exp_time_max,
            exp_time_min: raw.exp_time_min,
            d_gain_max: raw.d_gain_max,
            d_gain_min: raw.d_gain_min,
            isp_d_gain_max: raw.isp_d_gain_max,
            isp_d_gain_min: raw.isp_d_gain_min,
            a_gain_max: raw.a_gain_max,
            a_gain_min: raw.a_gain_min,
            exp_step: raw.exp_step,
            exp_stable_range: raw.exp_stable_range,
        }
    }
}

/// Motion estimation attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeAttr {
    pub enable: bool,
    pub threshold: i32,
}

impl From<ffi::AK_ISP_ME_ATTR> for MeAttr {
    fn from(raw: ffi::AK_ISP_ME_ATTR) -> Self {
        MeAttr {
            enable: raw.enable != 0,
            threshold: raw.threshold,
        }
    }
}

impl From<MeAttr> for ffi::AK_ISP_ME_ATTR {
    fn from(attr: MeAttr) -> Self {
        ffi::AK_ISP_ME_ATTR {
            enable: attr.enable.into(),
            threshold: attr.threshold,
        }
    }
}

/// Chroma noise reduction attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UvnrAttr {
    pub enable: bool,
}

impl From<ffi::AK_ISP_UVNR_ATTR> for UvnrAttr {
    fn from(raw: ffi::AK_ISP_UVNR_ATTR) -> Self {
        UvnrAttr {
            enable: raw.enable != 0,
        }
    }
}

impl From<UvnrAttr> for ffi::AK_ISP_UVNR_ATTR {
    fn from(attr: UvnrAttr) -> Self {
        ffi::AK_ISP_UVNR_ATTR {
            enable: attr.enable.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_field_names() {
        let raw = ffi::AK_ISP_FRAME_RATE_ATTR {
            hight_light_frame_rate: 25,
            hight_light_max_exp_time: 40,
            low_light_frame_rate: 12,
            low_light_max_exp_time: 80,
            low_light_to_hight_light_gain: 3,
        };
        let attr = FrameRateAttr::from(raw);
        assert_eq!(attr.high_light_frame_rate, 25);
        assert_eq!(attr.low_light_to_high_light_gain, 3);
    }

    #[test]
    fn test_me_attr_conversion() {
        let raw: ffi::AK_ISP_ME_ATTR = MeAttr {
            enable: true,
            threshold: 9,
        }
        .into();
        assert_eq!(raw.enable, 1);
        assert_eq!(MeAttr::from(raw).threshold, 9);
        assert!(!MeAttr::from(ffi::AK_ISP_ME_ATTR::default()).enable);
    }
}
