// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// Runtime bindings for the subset of the ISP core used by the video glue.
// Video-path calls go through the compat entry points, which take the
// per-input core handle; statistics and tuning calls are process-wide.
// Every symbol is resolved independently: the ISP core shipped with each SDK
// release exports a different subset, and a missing symbol must only disable
// the calls that need it.

use std::os::raw::{c_char, c_int, c_uint, c_ulong, c_ushort, c_void};

/// Opaque per-input core handle (`isp_struct`) owned by the ISP core driver.
pub type isp_ctx = *mut c_void;

pub const AK_ISP_BUFFER_ONE: c_int = 0;
pub const AK_ISP_BUFFER_TWO: c_int = 1;
pub const AK_ISP_BUFFER_THREE: c_int = 2;
pub const AK_ISP_BUFFER_FOUR: c_int = 3;

/// `yuv420_type` argument of `ak_isp_vi_start_capturing_compat`.
pub const YUV420_SEMI_PLANAR: c_int = 3;

pub const AK_ISP_MD_ROWS: usize = 24;
pub const AK_ISP_MD_COLS: usize = 32;
pub const AK_ISP_AF_STAT_WINDOWS: usize = 5;
pub const AK_ISP_AE_FAST_WORDS: usize = 8;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_AE_RUN_INFO {
    pub current_calc_avg_lumi: c_uint,
    pub current_calc_avg_compensation_lumi: c_uint,
    pub current_a_gain: c_uint,
    pub current_d_gain: c_uint,
    pub current_isp_d_gain: c_uint,
    pub current_exp_time: c_uint,
    pub current_exp_time_step: c_uint,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_FRAME_RATE_ATTR {
    pub hight_light_frame_rate: c_uint,
    pub hight_light_max_exp_time: c_uint,
    pub low_light_frame_rate: c_uint,
    pub low_light_max_exp_time: c_uint,
    pub low_light_to_hight_light_gain: c_uint,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_AF_STAT_INFO {
    pub af_statics: [c_uint; AK_ISP_AF_STAT_WINDOWS],
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_AWB_STAT_INFO {
    pub r_gain: c_ushort,
    pub g_gain: c_ushort,
    pub b_gain: c_ushort,
    pub r_offset: c_ushort,
    pub g_offset: c_ushort,
    pub b_offset: c_ushort,
    pub current_colortemp_index: c_ushort,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct AK_ISP_3D_NR_STAT_INFO {
    pub MD_level: c_ushort,
    pub MD_stat: [[c_ushort; AK_ISP_MD_COLS]; AK_ISP_MD_ROWS],
}

impl Default for AK_ISP_3D_NR_STAT_INFO {
    fn default() -> Self {
        AK_ISP_3D_NR_STAT_INFO {
            MD_level: 0,
            MD_stat: [[0; AK_ISP_MD_COLS]; AK_ISP_MD_ROWS],
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_AE_ATTR {
    pub exp_time_max: c_uint,
    pub exp_time_min: c_uint,
    pub d_gain_max: c_uint,
    pub d_gain_min: c_uint,
    pub isp_d_gain_max: c_uint,
    pub isp_d_gain_min: c_uint,
    pub a_gain_max: c_uint,
    pub a_gain_min: c_uint,
    pub exp_step: c_uint,
    pub exp_stable_range: c_uint,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_ME_ATTR {
    pub enable: c_int,
    pub threshold: c_int,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AK_ISP_UVNR_ATTR {
    pub enable: c_int,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct ae_fast_struct {
    pub words: [c_int; AK_ISP_AE_FAST_WORDS],
}

pub struct AkIspLibrary {
    __library: ::libloading::Library,
    // per-input entry points, first argument is the core handle
    pub ak_isp_get_bits_width_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_get_pclk_polar_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vi_apply_mode_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx, mode: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vi_set_crop_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx, sx: c_int, sy: c_int, width: c_int, height: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vi_get_crop: Result<
        unsafe extern "C" fn(ctx: isp_ctx, sx: *mut c_int, sy: *mut c_int, width: *mut c_int, height: *mut c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_set_misc_attr_ex: Result<
        unsafe extern "C" fn(ctx: isp_ctx, oneline: c_int, fsden: c_int, hblank: c_int, fsdnum: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_set_ae_fast_struct_default: Result<
        unsafe extern "C" fn(ctx: isp_ctx, ae_fast: *const ae_fast_struct) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_set_main_buffer_addr: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int, yaddr: c_ulong) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_set_sub_buffer_addr: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int, yaddr: c_ulong) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_set_ch3_buffer_addr: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int, yaddr: c_ulong) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_enable_buffer_main: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_enable_buffer_sub: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_enable_buffer_ch3: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_disable_buffer_main: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_disable_buffer_sub: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_disable_buffer_ch3: Result<
        unsafe extern "C" fn(ctx: isp_ctx, id: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vi_start_capturing_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx, yuv420_type: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vi_stop_capturing_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_check_irq_status_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vo_clear_irq_status_compat: Result<
        unsafe extern "C" fn(ctx: isp_ctx, bit: c_int) -> c_int,
        ::libloading::Error,
    >,
    // process-wide entry points
    pub ak_isp_get_version: Result<
        unsafe extern "C" fn(version: *mut c_char, size: c_int) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_ae_run_info: Result<
        unsafe extern "C" fn(info: *mut AK_ISP_AE_RUN_INFO) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_frame_rate: Result<
        unsafe extern "C" fn(attr: *mut AK_ISP_FRAME_RATE_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_af_stat_info: Result<
        unsafe extern "C" fn(info: *mut AK_ISP_AF_STAT_INFO) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_awb_stat_info: Result<
        unsafe extern "C" fn(info: *mut AK_ISP_AWB_STAT_INFO) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_3d_nr_stat_info: Result<
        unsafe extern "C" fn(info: *mut AK_ISP_3D_NR_STAT_INFO) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_ae_attr: Result<
        unsafe extern "C" fn(attr: *mut AK_ISP_AE_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_set_me_attr: Result<
        unsafe extern "C" fn(me: *const AK_ISP_ME_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_me_attr: Result<
        unsafe extern "C" fn(me: *mut AK_ISP_ME_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_set_uvnr_attr: Result<
        unsafe extern "C" fn(uvnr: *const AK_ISP_UVNR_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_vp_get_uvnr_attr: Result<
        unsafe extern "C" fn(uvnr: *mut AK_ISP_UVNR_ATTR) -> c_int,
        ::libloading::Error,
    >,
    pub ak_isp_set_ae_work_suspend: Result<
        unsafe extern "C" fn(val: c_int) -> c_int,
        ::libloading::Error,
    >,
}

impl AkIspLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = ::libloading::Library::new(path)?;
        Self::from_library(library)
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let ak_isp_get_bits_width_compat = __library.get(b"ak_isp_get_bits_width_compat\0").map(|sym| *sym);
        let ak_isp_get_pclk_polar_compat = __library.get(b"ak_isp_get_pclk_polar_compat\0").map(|sym| *sym);
        let ak_isp_vi_apply_mode_compat = __library.get(b"ak_isp_vi_apply_mode_compat\0").map(|sym| *sym);
        let ak_isp_vi_set_crop_compat = __library.get(b"ak_isp_vi_set_crop_compat\0").map(|sym| *sym);
        let ak_isp_vi_get_crop = __library.get(b"ak_isp_vi_get_crop\0").map(|sym| *sym);
        let ak_isp_set_misc_attr_ex = __library.get(b"ak_isp_set_misc_attr_ex\0").map(|sym| *sym);
        let ak_isp_set_ae_fast_struct_default = __library.get(b"ak_isp_set_ae_fast_struct_default\0").map(|sym| *sym);
        let ak_isp_vo_set_main_buffer_addr = __library.get(b"ak_isp_vo_set_main_buffer_addr\0").map(|sym| *sym);
        let ak_isp_vo_set_sub_buffer_addr = __library.get(b"ak_isp_vo_set_sub_buffer_addr\0").map(|sym| *sym);
        let ak_isp_vo_set_ch3_buffer_addr = __library.get(b"ak_isp_vo_set_ch3_buffer_addr\0").map(|sym| *sym);
        let ak_isp_vo_enable_buffer_main = __library.get(b"ak_isp_vo_enable_buffer_main\0").map(|sym| *sym);
        let ak_isp_vo_enable_buffer_sub = __library.get(b"ak_isp_vo_enable_buffer_sub\0").map(|sym| *sym);
        let ak_isp_vo_enable_buffer_ch3 = __library.get(b"ak_isp_vo_enable_buffer_ch3\0").map(|sym| *sym);
        let ak_isp_vo_disable_buffer_main = __library.get(b"ak_isp_vo_disable_buffer_main\0").map(|sym| *sym);
        let ak_isp_vo_disable_buffer_sub = __library.get(b"ak_isp_vo_disable_buffer_sub\0").map(|sym| *sym);
        let ak_isp_vo_disable_buffer_ch3 = __library.get(b"ak_isp_vo_disable_buffer_ch3\0").map(|sym| *sym);
        let ak_isp_vi_start_capturing_compat = __library.get(b"ak_isp_vi_start_capturing_compat\0").map(|sym| *sym);
        let ak_isp_vi_stop_capturing_compat = __library.get(b"ak_isp_vi_stop_capturing_compat\0").map(|sym| *sym);
        let ak_isp_vo_check_irq_status_compat = __library.get(b"ak_isp_vo_check_irq_status_compat\0").map(|sym| *sym);
        let ak_isp_vo_clear_irq_status_compat = __library.get(b"ak_isp_vo_clear_irq_status_compat\0").map(|sym| *sym);
        let ak_isp_get_version = __library.get(b"ak_isp_get_version\0").map(|sym| *sym);
        let ak_isp_vp_get_ae_run_info = __library.get(b"ak_isp_vp_get_ae_run_info\0").map(|sym| *sym);
        let ak_isp_vp_get_frame_rate = __library.get(b"ak_isp_vp_get_frame_rate\0").map(|sym| *sym);
        let ak_isp_vp_get_af_stat_info = __library.get(b"ak_isp_vp_get_af_stat_info\0").map(|sym| *sym);
        let ak_isp_vp_get_awb_stat_info = __library.get(b"ak_isp_vp_get_awb_stat_info\0").map(|sym| *sym);
        let ak_isp_vp_get_3d_nr_stat_info = __library.get(b"ak_isp_vp_get_3d_nr_stat_info\0").map(|sym| *sym);
        let ak_isp_vp_get_ae_attr = __library.get(b"ak_isp_vp_get_ae_attr\0").map(|sym| *sym);
        let ak_isp_vp_set_me_attr = __library.get(b"ak_isp_vp_set_me_attr\0").map(|sym| *sym);
        let ak_isp_vp_get_me_attr = __library.get(b"ak_isp_vp_get_me_attr\0").map(|sym| *sym);
        let ak_isp_vp_set_uvnr_attr = __library.get(b"ak_isp_vp_set_uvnr_attr\0").map(|sym| *sym);
        let ak_isp_vp_get_uvnr_attr = __library.get(b"ak_isp_vp_get_uvnr_attr\0").map(|sym| *sym);
        let ak_isp_set_ae_work_suspend = __library.get(b"ak_isp_set_ae_work_suspend\0").map(|sym| *sym);
        Ok(AkIspLibrary {
            __library,
            ak_isp_get_bits_width_compat,
            ak_isp_get_pclk_polar_compat,
            ak_isp_vi_apply_mode_compat,
            ak_isp_vi_set_crop_compat,
            ak_isp_vi_get_crop,
            ak_isp_set_misc_attr_ex,
            ak_isp_set_ae_fast_struct_default,
            ak_isp_vo_set_main_buffer_addr,
            ak_isp_vo_set_sub_buffer_addr,
            ak_isp_vo_set_ch3_buffer_addr,
            ak_isp_vo_enable_buffer_main,
            ak_isp_vo_enable_buffer_sub,
            ak_isp_vo_enable_buffer_ch3,
            ak_isp_vo_disable_buffer_main,
            ak_isp_vo_disable_buffer_sub,
            ak_isp_vo_disable_buffer_ch3,
            ak_isp_vi_start_capturing_compat,
            ak_isp_vi_stop_capturing_compat,
            ak_isp_vo_check_irq_status_compat,
            ak_isp_vo_clear_irq_status_compat,
            ak_isp_get_version,
            ak_isp_vp_get_ae_run_info,
            ak_isp_vp_get_frame_rate,
            ak_isp_vp_get_af_stat_info,
            ak_isp_vp_get_awb_stat_info,
            ak_isp_vp_get_3d_nr_stat_info,
            ak_isp_vp_get_ae_attr,
            ak_isp_vp_set_me_attr,
            ak_isp_vp_get_me_attr,
            ak_isp_vp_set_uvnr_attr,
            ak_isp_vp_get_uvnr_attr,
            ak_isp_set_ae_work_suspend,
        })
    }

    /// Names of the vendor symbols this build of the ISP core does not export.
    pub fn missing_symbols(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        macro_rules! check_symbols {
            ($($sym:ident),* $(,)?) => {
                $(
                    if self.$sym.is_err() {
                        missing.push(stringify!($sym));
                    }
                )*
            };
        }
        check_symbols!(
            ak_isp_get_bits_width_compat,
            ak_isp_get_pclk_polar_compat,
            ak_isp_vi_apply_mode_compat,
            ak_isp_vi_set_crop_compat,
            ak_isp_vi_get_crop,
            ak_isp_set_misc_attr_ex,
            ak_isp_set_ae_fast_struct_default,
            ak_isp_vo_set_main_buffer_addr,
            ak_isp_vo_set_sub_buffer_addr,
            ak_isp_vo_set_ch3_buffer_addr,
            ak_isp_vo_enable_buffer_main,
            ak_isp_vo_enable_buffer_sub,
            ak_isp_vo_enable_buffer_ch3,
            ak_isp_vo_disable_buffer_main,
            ak_isp_vo_disable_buffer_sub,
            ak_isp_vo_disable_buffer_ch3,
            ak_isp_vi_start_capturing_compat,
            ak_isp_vi_stop_capturing_compat,
            ak_isp_vo_check_irq_status_compat,
            ak_isp_vo_clear_irq_status_compat,
            ak_isp_get_version,
            ak_isp_vp_get_ae_run_info,
            ak_isp_vp_get_frame_rate,
            ak_isp_vp_get_af_stat_info,
            ak_isp_vp_get_awb_stat_info,
            ak_isp_vp_get_3d_nr_stat_info,
            ak_isp_vp_get_ae_attr,
            ak_isp_vp_set_me_attr,
            ak_isp_vp_get_me_attr,
            ak_isp_vp_set_uvnr_attr,
            ak_isp_vp_get_uvnr_attr,
            ak_isp_set_ae_work_suspend,
        );
        missing
    }
}
